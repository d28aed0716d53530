use std::io::{self, Write};

use crate::ast::{
    AssignOp, AssignTarget, BinOp, BuiltinFunc, CmpOp, Expr, ExprKind, Program, Stmt, StmtKind,
};
use crate::errors::{RuntimeError, RuntimeErrorKind};
use crate::scope::ScopeStack;

use super::value::Value;

/// Default bound on recursive descent depth.
pub const DEFAULT_MAX_DEPTH: usize = 10_000;

/// The non-local exit signal returned by every statement execution.
///
/// Loops absorb `Break` and `Continue`; everything else re-propagates
/// the signal upward after performing its own scope cleanup.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// The runtime pass: a depth-first tree-walking evaluator over the
/// AST. It does not require the checker to have run; problems the
/// checker would have caught surface as runtime failures instead.
pub struct Interpreter<W: Write> {
    memory: ScopeStack<Value>,
    out: W,
    max_depth: usize,
    depth: usize,
}

impl Interpreter<io::Stdout> {
    /// An interpreter printing to standard output.
    pub fn new() -> Self {
        Interpreter::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl<W: Write> Interpreter<W> {
    /// An interpreter printing to the given sink.
    pub fn with_output(out: W) -> Self {
        Interpreter {
            memory: ScopeStack::new(),
            out,
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
        }
    }

    /// Overrides the recursion depth limit.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Consumes the interpreter and hands back its output sink.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Number of runtime frames currently open.
    pub fn frame_depth(&self) -> usize {
        self.memory.depth()
    }

    /// Executes the program. Returns the value of a top-level `return`
    /// when one was reached, `None` when the program ran to its end.
    pub fn execute(&mut self, program: &Program) -> Result<Option<Value>, RuntimeError> {
        for stmt in &program.statements {
            match self.exec_stmt(stmt)? {
                Flow::Return(value) => return Ok(Some(value)),
                Flow::Normal | Flow::Break | Flow::Continue => {}
            }
        }
        Ok(None)
    }

    fn enter(&mut self, line: u32) -> Result<(), RuntimeError> {
        if self.depth >= self.max_depth {
            return Err(RuntimeError::new(
                RuntimeErrorKind::RecursionLimitExceeded {
                    limit: self.max_depth,
                },
                line,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        self.enter(stmt.line)?;
        let result = self.exec_stmt_inner(stmt);
        self.leave();
        result
    }

    fn exec_stmt_inner(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        let line = stmt.line;
        match &stmt.kind {
            StmtKind::Assignment { op, target, value } => {
                self.exec_assignment(*op, target, value, line)?;
                Ok(Flow::Normal)
            }
            StmtKind::If { cond, body } => {
                if self.eval_cond(cond)? {
                    self.exec_body("if", body)
                } else {
                    Ok(Flow::Normal)
                }
            }
            StmtKind::IfElse {
                cond,
                then_body,
                else_body,
            } => {
                if self.eval_cond(cond)? {
                    self.exec_body("if", then_body)
                } else {
                    self.exec_body("else", else_body)
                }
            }
            StmtKind::While { cond, body } => {
                // One frame for the loop's whole lifetime: bindings
                // made inside persist across iterations and are
                // visible to the next condition check.
                self.memory.push("while");
                let result = self.run_while(cond, body);
                self.memory.pop();
                result
            }
            StmtKind::For {
                var,
                start,
                end,
                body,
            } => {
                let start = self.eval_int(start)?;
                let end = self.eval_int(end)?;
                self.memory.push("for");
                self.memory.declare(var, Value::Int(start));
                let result = self.run_for(var, end, body, line);
                self.memory.pop();
                result
            }
            StmtKind::Block(statements) => self.exec_sequence(statements),
            StmtKind::Break => Ok(Flow::Break),
            StmtKind::Continue => Ok(Flow::Continue),
            StmtKind::Return(expr) => Ok(Flow::Return(self.eval_expr(expr)?)),
            StmtKind::Print(items) => {
                let mut rendered = Vec::with_capacity(items.len());
                for item in items {
                    rendered.push(self.eval_expr(item)?.to_string());
                }
                writeln!(self.out, "{}", rendered.join(" "))
                    .map_err(|_| RuntimeError::new(RuntimeErrorKind::OutputWrite, line))?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Runs statements in sequence, stopping at the first signal.
    fn exec_sequence(&mut self, statements: &[Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in statements {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                signal => return Ok(signal),
            }
        }
        Ok(Flow::Normal)
    }

    /// Executes a compound-statement body in a fresh frame. The frame
    /// is popped on every path out, including errors and signals.
    fn exec_body(&mut self, name: &'static str, body: &Stmt) -> Result<Flow, RuntimeError> {
        self.memory.push(name);
        let result = self.exec_stmt(body);
        self.memory.pop();
        result
    }

    fn run_while(&mut self, cond: &Expr, body: &Stmt) -> Result<Flow, RuntimeError> {
        while self.eval_cond(cond)? {
            match self.exec_stmt(body)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal | Flow::Continue => {}
            }
        }
        Ok(Flow::Normal)
    }

    fn run_for(
        &mut self,
        var: &str,
        end: i64,
        body: &Stmt,
        line: u32,
    ) -> Result<Flow, RuntimeError> {
        loop {
            let current = match self.lookup(var, line)? {
                Value::Int(value) => *value,
                other => {
                    let found = other.type_name();
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::TypeMismatch {
                            expected: "int",
                            found,
                        },
                        line,
                    ));
                }
            };
            if current > end {
                break;
            }
            match self.exec_stmt(body)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                // `continue` skips the rest of the body; the loop
                // variable still advances.
                Flow::Normal | Flow::Continue => {}
            }
            if let Some(Value::Int(value)) = self.memory.get(var) {
                let next = value + 1;
                self.memory.assign(var, Value::Int(next));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_assignment(
        &mut self,
        op: AssignOp,
        target: &AssignTarget,
        value: &Expr,
        line: u32,
    ) -> Result<(), RuntimeError> {
        let rhs = self.eval_expr(value)?;
        match target {
            AssignTarget::Name(name) => match op.base_op() {
                None => self.memory.assign(name, rhs),
                Some(base) => {
                    let existing = self.lookup(name, line)?.clone();
                    let combined = apply_binary(base, &existing, &rhs, line)?;
                    self.memory.assign(name, combined);
                }
            },
            AssignTarget::VectorElement { name, index } => {
                let mut elements = match self.lookup(name, line)?.clone() {
                    Value::Vector(elements) => elements,
                    other => {
                        return Err(type_mismatch("vector", &other, line));
                    }
                };
                let positions = self.expand_index(index, elements.len(), line)?;
                for i in positions {
                    elements[i] = match op.base_op() {
                        None => rhs.clone(),
                        Some(base) => apply_binary(base, &elements[i], &rhs, line)?,
                    };
                }
                self.memory.assign(name, Value::Vector(elements));
            }
            AssignTarget::MatrixElement { name, row, col } => {
                let mut rows = match self.lookup(name, line)?.clone() {
                    Value::Matrix(rows) => rows,
                    other => {
                        return Err(type_mismatch("matrix", &other, line));
                    }
                };
                let row_set = self.expand_index(row, rows.len(), line)?;
                let col_count = rows.first().map(|row| row.len()).unwrap_or(0);
                let col_set = self.expand_index(col, col_count, line)?;
                // The assignment covers the full cross product of the
                // row and column index sets.
                for &i in &row_set {
                    for &j in &col_set {
                        rows[i][j] = match op.base_op() {
                            None => rhs.clone(),
                            Some(base) => apply_binary(base, &rows[i][j], &rhs, line)?,
                        };
                    }
                }
                self.memory.assign(name, Value::Matrix(rows));
            }
        }
        Ok(())
    }

    fn lookup(&self, name: &str, line: u32) -> Result<&Value, RuntimeError> {
        self.memory.get(name).ok_or_else(|| {
            RuntimeError::new(
                RuntimeErrorKind::UndefinedVariable {
                    name: name.to_string(),
                },
                line,
            )
        })
    }

    fn eval_cond(&mut self, cond: &Expr) -> Result<bool, RuntimeError> {
        let value = self.eval_expr(cond)?;
        value
            .truthy()
            .ok_or_else(|| type_mismatch("bool", &value, cond.line))
    }

    fn eval_int(&mut self, expr: &Expr) -> Result<i64, RuntimeError> {
        match self.eval_expr(expr)? {
            Value::Int(value) => Ok(value),
            other => Err(type_mismatch("int", &other, expr.line)),
        }
    }

    /// Expands one index expression into the set of positions it
    /// denotes, bounds-checked against `size`. A range `a:b` covers
    /// the half-open span `[a, b)`.
    fn expand_index(
        &mut self,
        index: &Expr,
        size: usize,
        line: u32,
    ) -> Result<Vec<usize>, RuntimeError> {
        let check = |value: i64, limit: usize| -> Result<usize, RuntimeError> {
            if value < 0 || value as usize >= limit {
                Err(RuntimeError::new(
                    RuntimeErrorKind::IndexOutOfBounds { index: value, size },
                    line,
                ))
            } else {
                Ok(value as usize)
            }
        };
        match &index.kind {
            ExprKind::Range { left, right } => {
                let left = self.eval_int(left)?;
                let right = self.eval_int(right)?;
                if right > size as i64 {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::IndexOutOfBounds { index: right, size },
                        line,
                    ));
                }
                (left..right).map(|i| check(i, size)).collect()
            }
            _ => Ok(vec![check(self.eval_int(index)?, size)?]),
        }
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        self.enter(expr.line)?;
        let result = self.eval_expr_inner(expr);
        self.leave();
        result
    }

    fn eval_expr_inner(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        let line = expr.line;
        match &expr.kind {
            ExprKind::IntLiteral(value) => Ok(Value::Int(*value)),
            ExprKind::FloatLiteral(value) => Ok(Value::Float(*value)),
            ExprKind::StringLiteral(value) => Ok(Value::Str(value.clone())),
            ExprKind::Var(name) => self.lookup(name, line).cloned(),
            ExprKind::Binary { op, left, right } => {
                let lhs = self.eval_expr(left)?;
                let rhs = self.eval_expr(right)?;
                apply_binary(*op, &lhs, &rhs, line)
            }
            ExprKind::Condition { op, left, right } => {
                let lhs = self.eval_expr(left)?;
                let rhs = self.eval_expr(right)?;
                apply_compare(*op, &lhs, &rhs, line)
            }
            ExprKind::UnaryMinus(inner) => {
                let value = self.eval_expr(inner)?;
                negate(value, line)
            }
            ExprKind::Range { .. } => Err(RuntimeError::new(
                RuntimeErrorKind::TypeMismatch {
                    expected: "value",
                    found: "range",
                },
                line,
            )),
            ExprKind::Transpose(inner) => match self.eval_expr(inner)? {
                Value::Matrix(rows) => Ok(Value::Matrix(transpose(rows, line)?)),
                // A vector's transpose changes only its static shape;
                // the runtime value carries no shape to flip.
                Value::Vector(elements) => Ok(Value::Vector(elements)),
                other => Err(type_mismatch("matrix or vector", &other, line)),
            },
            ExprKind::Vector { elements } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expr(element)?);
                }
                Ok(Value::Vector(values))
            }
            ExprKind::Matrix { rows } => {
                let mut values = Vec::with_capacity(rows.len());
                for row in rows {
                    match self.eval_expr(row)? {
                        Value::Vector(elements) => values.push(elements),
                        other => return Err(type_mismatch("vector", &other, row.line)),
                    }
                }
                Ok(Value::Matrix(values))
            }
            ExprKind::VectorIndex { target, index } => {
                let elements = match self.eval_expr(target)? {
                    Value::Vector(elements) => elements,
                    other => return Err(type_mismatch("vector", &other, line)),
                };
                let positions = self.expand_index(index, elements.len(), line)?;
                if matches!(index.kind, ExprKind::Range { .. }) {
                    Ok(Value::Vector(
                        positions.iter().map(|&i| elements[i].clone()).collect(),
                    ))
                } else {
                    Ok(elements[positions[0]].clone())
                }
            }
            ExprKind::MatrixIndex { target, row, col } => {
                let rows = match self.eval_expr(target)? {
                    Value::Matrix(rows) => rows,
                    other => return Err(type_mismatch("matrix", &other, line)),
                };
                let row_set = self.expand_index(row, rows.len(), line)?;
                let col_count = rows.first().map(|row| row.len()).unwrap_or(0);
                let col_set = self.expand_index(col, col_count, line)?;
                let row_ranged = matches!(row.kind, ExprKind::Range { .. });
                let col_ranged = matches!(col.kind, ExprKind::Range { .. });
                match (row_ranged, col_ranged) {
                    (false, false) => Ok(rows[row_set[0]][col_set[0]].clone()),
                    (true, true) => Ok(Value::Matrix(
                        row_set
                            .iter()
                            .map(|&i| col_set.iter().map(|&j| rows[i][j].clone()).collect())
                            .collect(),
                    )),
                    (true, false) => Ok(Value::Vector(
                        row_set
                            .iter()
                            .map(|&i| rows[i][col_set[0]].clone())
                            .collect(),
                    )),
                    (false, true) => Ok(Value::Vector(
                        col_set
                            .iter()
                            .map(|&j| rows[row_set[0]][j].clone())
                            .collect(),
                    )),
                }
            }
            ExprKind::Builtin { func, args } => {
                let mut dims = Vec::with_capacity(args.len());
                for arg in args {
                    let value = self.eval_int(arg)?;
                    if value < 0 {
                        return Err(RuntimeError::new(
                            RuntimeErrorKind::TypeMismatch {
                                expected: "non-negative dimension",
                                found: "negative int",
                            },
                            line,
                        ));
                    }
                    dims.push(value as usize);
                }
                eval_builtin(*func, &dims, line)
            }
        }
    }
}

fn type_mismatch(expected: &'static str, found: &Value, line: u32) -> RuntimeError {
    RuntimeError::new(
        RuntimeErrorKind::TypeMismatch {
            expected,
            found: found.type_name(),
        },
        line,
    )
}

fn invalid_operands(op: &'static str, lhs: &Value, rhs: &Value, line: u32) -> RuntimeError {
    RuntimeError::new(
        RuntimeErrorKind::InvalidOperands {
            op,
            left: lhs.type_name(),
            right: rhs.type_name(),
        },
        line,
    )
}

fn apply_binary(op: BinOp, lhs: &Value, rhs: &Value, line: u32) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) if !op.is_elementwise() => int_arith(op, *a, *b, line),
        (Value::Int(a), Value::Float(b)) if !op.is_elementwise() => {
            float_arith(op, *a as f64, *b, line)
        }
        (Value::Float(a), Value::Int(b)) if !op.is_elementwise() => {
            float_arith(op, *a, *b as f64, line)
        }
        (Value::Float(a), Value::Float(b)) if !op.is_elementwise() => float_arith(op, *a, *b, line),
        (Value::Vector(_), Value::Vector(_)) | (Value::Matrix(_), Value::Matrix(_)) => {
            apply_elementwise(op, lhs, rhs, line)
        }
        _ => Err(invalid_operands(op.symbol(), lhs, rhs, line)),
    }
}

fn int_arith(op: BinOp, a: i64, b: i64, line: u32) -> Result<Value, RuntimeError> {
    let value = match op {
        BinOp::Add | BinOp::DotAdd => a.wrapping_add(b),
        BinOp::Sub | BinOp::DotSub => a.wrapping_sub(b),
        BinOp::Mul | BinOp::DotMul => a.wrapping_mul(b),
        BinOp::Div | BinOp::DotDiv => {
            if b == 0 {
                return Err(RuntimeError::new(RuntimeErrorKind::DivisionByZero, line));
            }
            a.wrapping_div(b)
        }
    };
    Ok(Value::Int(value))
}

fn float_arith(op: BinOp, a: f64, b: f64, line: u32) -> Result<Value, RuntimeError> {
    let value = match op {
        BinOp::Add | BinOp::DotAdd => a + b,
        BinOp::Sub | BinOp::DotSub => a - b,
        BinOp::Mul | BinOp::DotMul => a * b,
        BinOp::Div | BinOp::DotDiv => {
            if b == 0.0 {
                return Err(RuntimeError::new(RuntimeErrorKind::DivisionByZero, line));
            }
            a / b
        }
    };
    Ok(Value::Float(value))
}

/// Applies an operator position-by-position over two vectors or two
/// row/column-matched matrices. Shapes must agree; a mismatch the
/// checker did not see is a reported runtime failure, not a crash.
fn apply_elementwise(op: BinOp, lhs: &Value, rhs: &Value, line: u32) -> Result<Value, RuntimeError> {
    let base = op.scalar_base();
    match (lhs, rhs) {
        (Value::Vector(a), Value::Vector(b)) => {
            if a.len() != b.len() {
                return Err(shape_mismatch(lhs, rhs, line));
            }
            let mut elements = Vec::with_capacity(a.len());
            for (x, y) in a.iter().zip(b.iter()) {
                elements.push(apply_binary(base, x, y, line)?);
            }
            Ok(Value::Vector(elements))
        }
        (Value::Matrix(a), Value::Matrix(b)) => {
            if a.len() != b.len() {
                return Err(shape_mismatch(lhs, rhs, line));
            }
            let mut rows = Vec::with_capacity(a.len());
            for (row_a, row_b) in a.iter().zip(b.iter()) {
                if row_a.len() != row_b.len() {
                    return Err(shape_mismatch(lhs, rhs, line));
                }
                let mut row = Vec::with_capacity(row_a.len());
                for (x, y) in row_a.iter().zip(row_b.iter()) {
                    row.push(apply_binary(base, x, y, line)?);
                }
                rows.push(row);
            }
            Ok(Value::Matrix(rows))
        }
        _ => Err(invalid_operands(op.symbol(), lhs, rhs, line)),
    }
}

fn dims_of(value: &Value) -> String {
    match value {
        Value::Vector(elements) => format!("1x{}", elements.len()),
        Value::Matrix(rows) => format!(
            "{}x{}",
            rows.len(),
            rows.first().map(|row| row.len()).unwrap_or(0)
        ),
        other => other.type_name().to_string(),
    }
}

fn shape_mismatch(lhs: &Value, rhs: &Value, line: u32) -> RuntimeError {
    RuntimeError::new(
        RuntimeErrorKind::ShapeMismatch {
            left: dims_of(lhs),
            right: dims_of(rhs),
        },
        line,
    )
}

fn apply_compare(op: CmpOp, lhs: &Value, rhs: &Value, line: u32) -> Result<Value, RuntimeError> {
    let result = match (op, lhs, rhs) {
        // Equality is structural; mixed int/float compares numerically.
        (CmpOp::Eq, _, _) => compare_eq(lhs, rhs),
        (CmpOp::Ne, _, _) => !compare_eq(lhs, rhs),
        (_, Value::Int(a), Value::Int(b)) => ordering(op, (*a).cmp(b)),
        (_, Value::Str(a), Value::Str(b)) => ordering(op, a.cmp(b)),
        _ => {
            let (a, b) = match (lhs, rhs) {
                (Value::Int(a), Value::Float(b)) => (*a as f64, *b),
                (Value::Float(a), Value::Int(b)) => (*a, *b as f64),
                (Value::Float(a), Value::Float(b)) => (*a, *b),
                _ => return Err(invalid_operands(op.symbol(), lhs, rhs, line)),
            };
            match op {
                CmpOp::Lt => a < b,
                CmpOp::Gt => a > b,
                CmpOp::Le => a <= b,
                CmpOp::Ge => a >= b,
                CmpOp::Eq | CmpOp::Ne => unreachable!("handled above"),
            }
        }
    };
    Ok(Value::Bool(result))
}

fn compare_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
        _ => lhs == rhs,
    }
}

fn ordering(op: CmpOp, order: std::cmp::Ordering) -> bool {
    match op {
        CmpOp::Lt => order.is_lt(),
        CmpOp::Gt => order.is_gt(),
        CmpOp::Le => order.is_le(),
        CmpOp::Ge => order.is_ge(),
        CmpOp::Eq => order.is_eq(),
        CmpOp::Ne => order.is_ne(),
    }
}

/// Negates a scalar or, recursively, every element of a vector/matrix.
fn negate(value: Value, line: u32) -> Result<Value, RuntimeError> {
    match value {
        Value::Int(v) => Ok(Value::Int(-v)),
        Value::Float(v) => Ok(Value::Float(-v)),
        Value::Vector(elements) => Ok(Value::Vector(
            elements
                .into_iter()
                .map(|element| negate(element, line))
                .collect::<Result<_, _>>()?,
        )),
        Value::Matrix(rows) => {
            let mut negated = Vec::with_capacity(rows.len());
            for row in rows {
                negated.push(
                    row.into_iter()
                        .map(|element| negate(element, line))
                        .collect::<Result<_, _>>()?,
                );
            }
            Ok(Value::Matrix(negated))
        }
        other => Err(type_mismatch("number, vector or matrix", &other, line)),
    }
}

fn transpose(rows: Vec<Vec<Value>>, line: u32) -> Result<Vec<Vec<Value>>, RuntimeError> {
    let cols = rows.first().map(|row| row.len()).unwrap_or(0);
    let mut transposed = Vec::with_capacity(cols);
    for j in 0..cols {
        let mut column = Vec::with_capacity(rows.len());
        for row in &rows {
            let element = row.get(j).cloned().ok_or_else(|| {
                RuntimeError::new(
                    RuntimeErrorKind::ShapeMismatch {
                        left: format!("{}x{}", rows.len(), cols),
                        right: format!("row of length {}", row.len()),
                    },
                    line,
                )
            })?;
            column.push(element);
        }
        transposed.push(column);
    }
    Ok(transposed)
}

fn eval_builtin(func: BuiltinFunc, dims: &[usize], line: u32) -> Result<Value, RuntimeError> {
    let arity_error = || {
        RuntimeError::new(
            RuntimeErrorKind::TypeMismatch {
                expected: "matrix dimensions",
                found: "wrong number of arguments",
            },
            line,
        )
    };
    match func {
        BuiltinFunc::Eye => {
            let &[n] = dims else {
                return Err(arity_error());
            };
            let rows = (0..n)
                .map(|i| {
                    (0..n)
                        .map(|j| Value::Int(if i == j { 1 } else { 0 }))
                        .collect()
                })
                .collect();
            Ok(Value::Matrix(rows))
        }
        BuiltinFunc::Ones | BuiltinFunc::Zeros => {
            let (rows, cols) = match dims {
                &[n] => (n, n),
                &[r, c] => (r, c),
                _ => return Err(arity_error()),
            };
            let fill = if func == BuiltinFunc::Ones { 1 } else { 0 };
            Ok(Value::Matrix(vec![vec![Value::Int(fill); cols]; rows]))
        }
    }
}
