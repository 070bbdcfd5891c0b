pub mod patches;
pub mod policy;
pub mod trajectories;
