pub mod config;
pub mod dataset;
pub mod profile;
pub mod scanpath;

#[cfg(test)]
#[path = "../../tests/src_inline/model/tests.rs"]
mod tests;
