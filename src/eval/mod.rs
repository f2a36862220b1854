//! Value model and built-in function table for front ends.
//!
//! A front end evaluates declarations such as `V = [1:1:100]` to [`Value`]s and
//! calls [`builtins::call`] for the fixed set of built-in functions. Only the
//! resulting algebraic values reach the graph analyses.

pub mod value;
pub mod builtins;

pub use value::Value;
pub use builtins::{call, Builtin};
