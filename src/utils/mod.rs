//! Utility modules shared across the library.
//!
//! Currently only the error types.

pub mod errors;

// Re-exports
pub use errors::*;
