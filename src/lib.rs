pub mod input;
pub mod irl;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod report;

#[cfg(test)]
#[path = "../tests/src_inline/support.rs"]
pub(crate) mod test_support;
