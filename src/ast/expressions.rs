use std::fmt::{self, Display};

use super::types::NodeMeta;

/// Arithmetic and elementwise operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    DotAdd,
    DotSub,
    DotMul,
    DotDiv,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::DotAdd => ".+",
            BinOp::DotSub => ".-",
            BinOp::DotMul => ".*",
            BinOp::DotDiv => "./",
        }
    }

    /// Whether this is one of the `.`-prefixed elementwise operators.
    pub fn is_elementwise(&self) -> bool {
        matches!(
            self,
            BinOp::DotAdd | BinOp::DotSub | BinOp::DotMul | BinOp::DotDiv
        )
    }

    /// The scalar operator applied position-by-position by an
    /// elementwise operator.
    pub fn scalar_base(&self) -> BinOp {
        match self {
            BinOp::DotAdd => BinOp::Add,
            BinOp::DotSub => BinOp::Sub,
            BinOp::DotMul => BinOp::Mul,
            BinOp::DotDiv => BinOp::Div,
            other => *other,
        }
    }
}

impl Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Comparison operators, used by `Condition` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

impl CmpOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Gt => ">",
            CmpOp::Le => "<=",
            CmpOp::Ge => ">=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
        }
    }
}

impl Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Matrix constructor builtins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFunc {
    Eye,
    Ones,
    Zeros,
}

impl BuiltinFunc {
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinFunc::Eye => "eye",
            BuiltinFunc::Ones => "ones",
            BuiltinFunc::Zeros => "zeros",
        }
    }
}

impl Display for BuiltinFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An expression node: the variant, its source line, and the slot the
/// type checker annotates in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: u32,
    pub meta: NodeMeta,
}

impl Expr {
    pub fn new(kind: ExprKind, line: u32) -> Self {
        Expr {
            kind,
            line,
            meta: NodeMeta::unresolved(),
        }
    }
}

/// Expression variants.
///
/// `Matrix` rows are expected to be `Vector` literals; the checker
/// reports a diagnostic for anything else. `VectorIndex`/`MatrixIndex`
/// indices may be `Range` nodes (slices).
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Condition {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryMinus(Box<Expr>),
    Var(String),
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    Range {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Transpose(Box<Expr>),
    Vector {
        elements: Vec<Expr>,
    },
    Matrix {
        rows: Vec<Expr>,
    },
    VectorIndex {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    MatrixIndex {
        target: Box<Expr>,
        row: Box<Expr>,
        col: Box<Expr>,
    },
    Builtin {
        func: BuiltinFunc,
        args: Vec<Expr>,
    },
}
