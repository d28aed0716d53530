//! Unit tests for error handling.
//!
//! This module contains tests for diagnostic formatting and runtime
//! error types.

use crate::errors::{Diagnostic, RuntimeError, RuntimeErrorKind};

#[test]
fn test_diagnostic_display() {
    let diagnostic = Diagnostic::new(12, "invalid operation int + string");
    assert_eq!(diagnostic.to_string(), "12: invalid operation int + string");
}

#[test]
fn test_runtime_error_carries_line() {
    let error = RuntimeError::new(
        RuntimeErrorKind::UndefinedVariable {
            name: "x".to_string(),
        },
        42,
    );

    assert_eq!(error.line, 42);
    assert_eq!(error.kind_name(), "UndefinedVariable");
}

#[test]
fn test_undefined_variable_display() {
    let error = RuntimeError::new(
        RuntimeErrorKind::UndefinedVariable {
            name: "foo".to_string(),
        },
        3,
    );

    assert_eq!(error.to_string(), "3: undefined variable `foo`");
}

#[test]
fn test_division_by_zero_error() {
    let error = RuntimeError::new(RuntimeErrorKind::DivisionByZero, 7);
    assert_eq!(error.kind_name(), "DivisionByZero");
    assert_eq!(error.to_string(), "7: division by zero");
}

#[test]
fn test_index_out_of_bounds_error() {
    let error = RuntimeError::new(RuntimeErrorKind::IndexOutOfBounds { index: 5, size: 3 }, 9);
    assert_eq!(
        error.to_string(),
        "9: index 5 out of bounds for dimension of size 3"
    );
}

#[test]
fn test_shape_mismatch_error() {
    let error = RuntimeError::new(
        RuntimeErrorKind::ShapeMismatch {
            left: "1x3".to_string(),
            right: "1x2".to_string(),
        },
        4,
    );

    assert_eq!(error.kind_name(), "ShapeMismatch");
    assert_eq!(error.to_string(), "4: operand shapes do not match: 1x3 vs 1x2");
}

#[test]
fn test_invalid_operands_error() {
    let error = RuntimeError::new(
        RuntimeErrorKind::InvalidOperands {
            op: "+",
            left: "int",
            right: "string",
        },
        1,
    );

    assert_eq!(error.to_string(), "1: invalid operation int + string");
}

#[test]
fn test_recursion_limit_error() {
    let error = RuntimeError::new(
        RuntimeErrorKind::RecursionLimitExceeded { limit: 100 },
        2,
    );

    assert_eq!(error.kind_name(), "RecursionLimitExceeded");
    assert_eq!(error.to_string(), "2: recursion limit of 100 exceeded");
}
