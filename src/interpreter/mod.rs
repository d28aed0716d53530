//! Tree-walking evaluation of checked (or unchecked) programs.
//!
//! The interpreter walks the AST directly, holding variable bindings
//! in a stack of runtime frames. Loop-control and `return` signals
//! travel as ordinary return values, so frames unwind on every path.

pub mod interpreter;
pub mod value;

pub use interpreter::{Flow, Interpreter, DEFAULT_MAX_DEPTH};
pub use value::Value;
