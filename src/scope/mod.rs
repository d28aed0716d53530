//! Scope chain shared by the static and runtime passes.

pub mod scope;

pub use scope::{ScopeStack, SymbolInfo};

#[cfg(test)]
mod tests;
