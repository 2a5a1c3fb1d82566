//! ui
//!
//! Terminal output layer.

pub mod output;

pub use output::Verbosity;
