use std::fmt::{self, Display};

/// The type a checked expression resolves to.
///
/// `Vector` and `Matrix` values additionally carry a [`Shape`] in the
/// node's metadata; scalars never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Int,
    Float,
    Bool,
    Str,
    Vector,
    Matrix,
}

impl Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
            ValueType::Str => "string",
            ValueType::Vector => "vector",
            ValueType::Matrix => "matrix",
        };
        write!(f, "{}", name)
    }
}

/// The `(rows, cols)` dimensionality of a vector or matrix.
///
/// Vectors are always `(1, n)`; a transpose reverses the tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Shape { rows, cols }
    }

    /// Shape of a one-row vector of length `n`.
    pub fn vector(n: usize) -> Self {
        Shape { rows: 1, cols: n }
    }

    /// The shape with rows and columns swapped.
    pub fn transposed(&self) -> Self {
        Shape {
            rows: self.cols,
            cols: self.rows,
        }
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Checker annotations written into every expression node.
///
/// All fields start out `None`; the type checker fills them in during
/// its pass. A node whose `ty` is still `None` after checking is
/// unresolved, which suppresses cascading diagnostics downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeMeta {
    pub ty: Option<ValueType>,
    pub shape: Option<Shape>,
    /// Element type of a vector/matrix-typed node, when known.
    pub elem: Option<ValueType>,
}

impl NodeMeta {
    pub fn unresolved() -> Self {
        NodeMeta::default()
    }

    pub fn scalar(ty: ValueType) -> Self {
        NodeMeta {
            ty: Some(ty),
            shape: None,
            elem: None,
        }
    }
}
