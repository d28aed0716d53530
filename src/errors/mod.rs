//! Diagnostics and runtime error types.

pub mod errors;

pub use errors::{Diagnostic, RuntimeError, RuntimeErrorKind};

#[cfg(test)]
mod tests;
