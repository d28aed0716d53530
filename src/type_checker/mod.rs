//! Static type and shape checking.
//!
//! The checker performs one pass over the AST, resolving expression
//! types through an operator compatibility table and inferring
//! vector/matrix shapes. Problems are collected as line-tagged
//! diagnostics; checking always continues past them.

pub mod type_checker;

pub use type_checker::{check, TypeChecker};
