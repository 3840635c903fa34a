#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod random_test;
mod test_logger;
mod typed_index;

pub use random_test::*;
pub use test_logger::*;
pub use typed_index::*;
