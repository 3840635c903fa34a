#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod composition;
mod synthesize;

pub use composition::*;
pub use synthesize::*;
