use std::fmt::{self, Display};

/// A concrete runtime value.
///
/// Assignment rebinds whole values; there is no reference sharing
/// between bindings. Matrices are row-major sequences of rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Vector(Vec<Value>),
    Matrix(Vec<Vec<Value>>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Vector(_) => "vector",
            Value::Matrix(_) => "matrix",
        }
    }

    /// Truthiness used by `if`/`while` conditions. Only booleans and
    /// numbers have one.
    pub fn truthy(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            Value::Int(value) => Some(*value != 0),
            Value::Float(value) => Some(*value != 0.0),
            _ => None,
        }
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, row: &[Value]) -> fmt::Result {
    write!(f, "[")?;
    for (i, element) in row.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", element)?;
    }
    write!(f, "]")
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{}", value),
            Value::Bool(value) => write!(f, "{}", value),
            Value::Str(value) => write!(f, "{}", value),
            Value::Vector(elements) => write_row(f, elements),
            Value::Matrix(rows) => {
                write!(f, "[")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_row(f, row)?;
                }
                write!(f, "]")
            }
        }
    }
}
