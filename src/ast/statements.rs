use std::fmt::{self, Display};

use super::expressions::{BinOp, Expr};

/// Assignment operators. Compound forms combine the existing binding
/// with the right-hand side through the matching arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

impl AssignOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
        }
    }

    /// The arithmetic operator behind a compound assignment, `None`
    /// for plain `=`.
    pub fn base_op(&self) -> Option<BinOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(BinOp::Add),
            AssignOp::SubAssign => Some(BinOp::Sub),
            AssignOp::MulAssign => Some(BinOp::Mul),
            AssignOp::DivAssign => Some(BinOp::Div),
        }
    }
}

impl Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// The left-hand side of an assignment.
///
/// Element targets may carry single or range indices on each axis
/// independently; a range index makes the assignment apply to the
/// whole cross product of the index sets.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Name(String),
    VectorElement { name: String, index: Expr },
    MatrixElement { name: String, row: Expr, col: Expr },
}

impl AssignTarget {
    pub fn name(&self) -> &str {
        match self {
            AssignTarget::Name(name) => name,
            AssignTarget::VectorElement { name, .. } => name,
            AssignTarget::MatrixElement { name, .. } => name,
        }
    }
}

/// A statement node with its source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: u32,
}

impl Stmt {
    pub fn new(kind: StmtKind, line: u32) -> Self {
        Stmt { kind, line }
    }
}

/// Statement variants.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Assignment {
        op: AssignOp,
        target: AssignTarget,
        value: Expr,
    },
    If {
        cond: Expr,
        body: Box<Stmt>,
    },
    IfElse {
        cond: Expr,
        then_body: Box<Stmt>,
        else_body: Box<Stmt>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    For {
        var: String,
        start: Expr,
        end: Expr,
        body: Box<Stmt>,
    },
    Block(Vec<Stmt>),
    Break,
    Continue,
    Return(Expr),
    Print(Vec<Expr>),
}

/// A fully parsed program, as handed over by the external parser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Program { statements }
    }
}
