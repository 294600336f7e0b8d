//! Test helpers
//!
//! Chain builders and an in-process peer provider used by the unit tests
//! across the crate.

pub mod test_utils;

pub use test_utils::*;
