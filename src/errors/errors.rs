use std::fmt::{self, Display};

use thiserror::Error;

/// A static problem found by the type checker.
///
/// Diagnostics are collected, never thrown: the checker reports every
/// problem it can find in one pass and leaves the offending nodes
/// unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: u32,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        Diagnostic {
            line,
            message: message.into(),
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.line, self.message)
    }
}

/// A fatal runtime failure, tagged with the offending source line.
///
/// Propagation stops interpretation of the program; open runtime
/// frames are still unwound cleanly on the way out.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{line}: {kind}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub line: u32,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, line: u32) -> Self {
        RuntimeError { kind, line }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            RuntimeErrorKind::UndefinedVariable { .. } => "UndefinedVariable",
            RuntimeErrorKind::DivisionByZero => "DivisionByZero",
            RuntimeErrorKind::IndexOutOfBounds { .. } => "IndexOutOfBounds",
            RuntimeErrorKind::ShapeMismatch { .. } => "ShapeMismatch",
            RuntimeErrorKind::TypeMismatch { .. } => "TypeMismatch",
            RuntimeErrorKind::InvalidOperands { .. } => "InvalidOperands",
            RuntimeErrorKind::RecursionLimitExceeded { .. } => "RecursionLimitExceeded",
            RuntimeErrorKind::OutputWrite => "OutputWrite",
        }
    }
}

/// Runtime failure taxonomy.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RuntimeErrorKind {
    #[error("undefined variable `{name}`")]
    UndefinedVariable { name: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("index {index} out of bounds for dimension of size {size}")]
    IndexOutOfBounds { index: i64, size: usize },
    #[error("operand shapes do not match: {left} vs {right}")]
    ShapeMismatch { left: String, right: String },
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("invalid operation {left} {op} {right}")]
    InvalidOperands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("recursion limit of {limit} exceeded")]
    RecursionLimitExceeded { limit: usize },
    #[error("failed to write program output")]
    OutputWrite,
}
