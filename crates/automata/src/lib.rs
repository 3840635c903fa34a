#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod automaton;
mod bit_matrix;
mod event_set;
mod inverse_transitions;
mod random_automaton;
mod reachability;

pub use automaton::*;
pub use event_set::*;
pub use inverse_transitions::*;
pub use random_automaton::*;
