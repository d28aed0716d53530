//! Abstract syntax tree definitions.
//!
//! The AST is a fixed set of tagged-union node variants built by the
//! external parser. Every node carries its source line; expression
//! nodes additionally carry a [`types::NodeMeta`] slot that the type
//! checker fills in with the inferred type and shape.

pub mod expressions;
pub mod statements;
pub mod types;

pub use expressions::{BinOp, BuiltinFunc, CmpOp, Expr, ExprKind};
pub use statements::{AssignOp, AssignTarget, Program, Stmt, StmtKind};
pub use types::{NodeMeta, Shape, ValueType};
