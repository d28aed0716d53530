#![allow(clippy::module_inception)]

//! Semantic analysis and evaluation for a small matrix scripting
//! language. The crate consumes an already-parsed [`ast::Program`];
//! lexing and parsing live with the caller.
//!
//! Analysis is two independent passes:
//!
//! * [`type_checker::check`] resolves types and shapes in place and
//!   collects diagnostics without ever failing;
//! * [`interpreter::Interpreter`] walks the tree and produces output,
//!   failing fast on the first runtime error.

use std::io::{self, Write};

pub mod ast;
pub mod errors;
pub mod interpreter;
pub mod scope;
pub mod type_checker;

pub use ast::{Expr, ExprKind, Program, Stmt, StmtKind};
pub use errors::{Diagnostic, RuntimeError, RuntimeErrorKind};
pub use interpreter::{Interpreter, Value};
pub use type_checker::check;

/// Checks and then runs `program`, printing program output to stdout
/// and diagnostics to stderr.
///
/// Static diagnostics do not block execution: the checker is
/// advisory, and code paths it flagged may never be reached at
/// runtime. Callers wanting a strict mode can call [`check`] and stop
/// on a non-empty result themselves.
pub fn run(program: &mut Program) -> Result<Option<Value>, RuntimeError> {
    run_with_output(program, io::stdout(), io::stderr()).map(|(value, _)| value)
}

/// [`run`] with explicit output and diagnostic sinks. Returns the
/// program's result together with the output sink.
pub fn run_with_output<W, D>(
    program: &mut Program,
    out: W,
    mut diag: D,
) -> Result<(Option<Value>, W), RuntimeError>
where
    W: Write,
    D: Write,
{
    for diagnostic in check(program) {
        let _ = writeln!(diag, "{}", diagnostic);
    }
    let mut interpreter = Interpreter::with_output(out);
    let result = interpreter.execute(program)?;
    Ok((result, interpreter.into_output()))
}
