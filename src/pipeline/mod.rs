pub mod convert;
pub mod evaluate;
pub mod irl_export;
pub mod segment;
pub mod targets;
