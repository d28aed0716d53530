use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::ast::{
    AssignOp, AssignTarget, BinOp, BuiltinFunc, Expr, ExprKind, NodeMeta, Program, Shape, Stmt,
    StmtKind, ValueType,
};
use crate::errors::Diagnostic;
use crate::scope::{ScopeStack, SymbolInfo};

lazy_static! {
    /// Operator compatibility table: `(operator, lhs, rhs) -> result`.
    /// Any combination absent from the table is an invalid operation.
    static ref ALLOWED_OPS: HashMap<(&'static str, ValueType, ValueType), ValueType> = {
        use ValueType::*;

        let mut ops = HashMap::new();
        let numeric = [
            (Int, Int, Int),
            (Int, Float, Float),
            (Float, Int, Float),
            (Float, Float, Float),
        ];

        for op in ["+", "-", "*", "/"] {
            for &(lhs, rhs, result) in &numeric {
                ops.insert((op, lhs, rhs), result);
            }
            ops.insert((op, Vector, Vector), Vector);
        }

        for op in ["<", ">", "<=", ">=", "==", "!="] {
            for &(lhs, rhs, _) in &numeric {
                ops.insert((op, lhs, rhs), Bool);
            }
            ops.insert((op, Vector, Vector), Bool);
        }

        for op in [".+", ".-", ".*", "./"] {
            ops.insert((op, Vector, Vector), Vector);
            ops.insert((op, Matrix, Matrix), Matrix);
        }

        ops
    };
}

/// The static pass: resolves types through the operator table, infers
/// vector/matrix shapes, validates indices and records symbol types
/// into its own scope chain. Never fails; every problem becomes a
/// collected [`Diagnostic`] and the offending node stays unresolved.
pub struct TypeChecker {
    scopes: ScopeStack<SymbolInfo>,
    loop_depth: usize,
    diagnostics: Vec<Diagnostic>,
}

/// Checks `program` in a single pass, annotating expression metadata
/// in place, and returns every diagnostic found.
pub fn check(program: &mut Program) -> Vec<Diagnostic> {
    let mut checker = TypeChecker::new();
    for stmt in &mut program.statements {
        checker.check_stmt(stmt);
    }
    checker.diagnostics
}

fn type_name(ty: Option<ValueType>) -> String {
    match ty {
        Some(ty) => ty.to_string(),
        None => "unresolved".to_string(),
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        TypeChecker {
            scopes: ScopeStack::new(),
            loop_depth: 0,
            diagnostics: Vec::new(),
        }
    }

    fn report(&mut self, line: u32, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(line, message));
    }

    /// Resolves `(op, lhs, rhs)` through the table. A missing entry,
    /// including one caused by an unresolved operand, reports exactly
    /// one diagnostic and yields unresolved.
    fn verify_operation(
        &mut self,
        op: &'static str,
        lhs: Option<ValueType>,
        rhs: Option<ValueType>,
        line: u32,
    ) -> Option<ValueType> {
        let result = match (lhs, rhs) {
            (Some(lhs), Some(rhs)) => ALLOWED_OPS.get(&(op, lhs, rhs)).copied(),
            _ => None,
        };
        if result.is_none() {
            self.report(
                line,
                format!(
                    "invalid operation {} {} {}",
                    type_name(lhs),
                    op,
                    type_name(rhs)
                ),
            );
        }
        result
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) {
        let line = stmt.line;
        match &mut stmt.kind {
            StmtKind::Assignment { op, target, value } => {
                let op = *op;
                self.check_expr(value);
                let value_meta = value.meta;
                self.check_assignment(op, target, value_meta, line);
            }
            StmtKind::If { cond, body } => {
                self.check_expr(cond);
                self.scopes.push("if");
                self.check_stmt(body);
                self.scopes.pop();
            }
            StmtKind::IfElse {
                cond,
                then_body,
                else_body,
            } => {
                self.check_expr(cond);
                self.scopes.push("if");
                self.check_stmt(then_body);
                self.scopes.pop();
                self.scopes.push("else");
                self.check_stmt(else_body);
                self.scopes.pop();
            }
            StmtKind::While { cond, body } => {
                self.scopes.push("while");
                self.loop_depth += 1;
                self.check_expr(cond);
                self.check_stmt(body);
                self.scopes.pop();
                self.loop_depth -= 1;
            }
            StmtKind::For {
                var,
                start,
                end,
                body,
            } => {
                self.scopes.push("for");
                self.loop_depth += 1;
                let start_ty = self.check_expr(start);
                let end_ty = self.check_expr(end);
                if start_ty == Some(ValueType::Int) && end_ty == Some(ValueType::Int) {
                    self.scopes.declare(var, SymbolInfo::scalar(ValueType::Int));
                } else {
                    self.report(line, "for loop range bounds must be int");
                    self.scopes.declare(var, SymbolInfo::unresolved());
                }
                self.check_stmt(body);
                self.scopes.pop();
                self.loop_depth -= 1;
            }
            StmtKind::Block(statements) => {
                for stmt in statements {
                    self.check_stmt(stmt);
                }
            }
            StmtKind::Break => {
                if self.loop_depth == 0 {
                    self.report(line, "'break' statement used outside of a loop");
                }
            }
            StmtKind::Continue => {
                if self.loop_depth == 0 {
                    self.report(line, "'continue' statement used outside of a loop");
                }
            }
            StmtKind::Return(expr) => {
                self.check_expr(expr);
            }
            StmtKind::Print(items) => {
                for item in items {
                    self.check_expr(item);
                }
            }
        }
    }

    fn check_assignment(
        &mut self,
        op: AssignOp,
        target: &mut AssignTarget,
        value_meta: NodeMeta,
        line: u32,
    ) {
        match op.base_op() {
            None => match target {
                AssignTarget::Name(name) => {
                    // Plain `=` (re)binds in the currently active scope.
                    self.scopes.declare(
                        name,
                        SymbolInfo {
                            ty: value_meta.ty,
                            shape: value_meta.shape,
                            elem: value_meta.elem,
                        },
                    );
                }
                _ => self.check_element_target(target, line),
            },
            Some(base) => match target {
                AssignTarget::Name(name) => {
                    let existing = match self.scopes.get(name.as_str()).copied() {
                        Some(info) => info,
                        None => {
                            self.report(line, format!("undefined variable `{}`", name));
                            return;
                        }
                    };
                    let result =
                        self.verify_operation(base.symbol(), existing.ty, value_meta.ty, line);
                    if existing.ty == Some(ValueType::Vector) {
                        // No transpose is possible on the implicit left
                        // operand; shapes must agree exactly.
                        if let (Some(lhs), Some(rhs)) = (existing.shape, value_meta.shape) {
                            if lhs != rhs {
                                self.report(line, "vector sizes do not match");
                                return;
                            }
                        }
                    }
                    if let Some(result) = result {
                        self.scopes.assign(
                            name,
                            SymbolInfo {
                                ty: Some(result),
                                shape: existing.shape,
                                elem: existing.elem,
                            },
                        );
                    }
                }
                _ => {
                    self.check_element_target(target, line);
                }
            },
        }
    }

    /// Validates an indexed assignment target: the name must be bound
    /// as a vector/matrix with a known shape and every index must be
    /// in bounds when it is a literal.
    fn check_element_target(&mut self, target: &mut AssignTarget, line: u32) {
        match target {
            AssignTarget::Name(_) => {}
            AssignTarget::VectorElement { name, index } => {
                match self.scopes.get(name.as_str()).copied() {
                    None => {
                        let message = format!("undefined variable `{}`", name);
                        self.report(line, message);
                    }
                    Some(info) => {
                        if info.ty.is_some() && info.ty != Some(ValueType::Vector) {
                            let message = format!("variable `{}` is not a vector", name);
                            self.report(line, message);
                        } else if let Some(shape) = info.shape {
                            self.check_index(index, shape.cols, line, "vector index");
                        } else {
                            self.check_index_type(index, line, "vector index");
                        }
                    }
                }
            }
            AssignTarget::MatrixElement { name, row, col } => {
                match self.scopes.get(name.as_str()).copied() {
                    None => {
                        let message = format!("undefined variable `{}`", name);
                        self.report(line, message);
                    }
                    Some(info) => {
                        if info.ty.is_some() && info.ty != Some(ValueType::Matrix) {
                            let message = format!("variable `{}` is not a matrix", name);
                            self.report(line, message);
                        } else if let Some(shape) = info.shape {
                            self.check_index(row, shape.rows, line, "row index");
                            self.check_index(col, shape.cols, line, "column index");
                        } else {
                            self.check_index_type(row, line, "row index");
                            self.check_index_type(col, line, "column index");
                        }
                    }
                }
            }
        }
    }

    fn check_expr(&mut self, expr: &mut Expr) -> Option<ValueType> {
        let line = expr.line;
        let meta = match &mut expr.kind {
            ExprKind::IntLiteral(_) => NodeMeta::scalar(ValueType::Int),
            ExprKind::FloatLiteral(_) => NodeMeta::scalar(ValueType::Float),
            ExprKind::StringLiteral(_) => NodeMeta::scalar(ValueType::Str),
            ExprKind::Var(name) => match self.scopes.get(name.as_str()).copied() {
                Some(info) => NodeMeta {
                    ty: info.ty,
                    shape: info.shape,
                    elem: info.elem,
                },
                None => {
                    let message = format!("undefined variable `{}`", name);
                    self.report(line, message);
                    NodeMeta::unresolved()
                }
            },
            ExprKind::Binary { op, left, right } => {
                let op = *op;
                self.check_expr(left);
                self.check_expr(right);
                let (left_meta, right_meta) = (left.meta, right.meta);
                self.check_binary(op, left_meta, right_meta, line)
            }
            ExprKind::Condition { op, left, right } => {
                let op = *op;
                self.check_expr(left);
                self.check_expr(right);
                let (left_meta, right_meta) = (left.meta, right.meta);
                let result = self.verify_operation(op.symbol(), left_meta.ty, right_meta.ty, line);
                if result.is_some() && !self.shapes_conform(left_meta, right_meta, line) {
                    NodeMeta::unresolved()
                } else {
                    NodeMeta {
                        ty: result,
                        shape: None,
                        elem: None,
                    }
                }
            }
            ExprKind::UnaryMinus(inner) => {
                self.check_expr(inner);
                inner.meta
            }
            ExprKind::Range { left, right } => {
                let left_ty = self.check_expr(left);
                let right_ty = self.check_expr(right);
                let bad = |ty: Option<ValueType>| ty.is_some() && ty != Some(ValueType::Int);
                if bad(left_ty) || bad(right_ty) {
                    self.report(line, "range bounds must be int");
                }
                NodeMeta::unresolved()
            }
            ExprKind::Transpose(inner) => {
                let inner_ty = self.check_expr(inner);
                match inner_ty {
                    Some(ValueType::Vector) | Some(ValueType::Matrix) => NodeMeta {
                        ty: inner_ty,
                        shape: inner.meta.shape.map(|shape| shape.transposed()),
                        elem: inner.meta.elem,
                    },
                    Some(_) => {
                        self.report(line, "only a matrix or vector can be transposed");
                        NodeMeta::unresolved()
                    }
                    None => NodeMeta::unresolved(),
                }
            }
            ExprKind::Vector { elements } => self.check_vector(elements, line),
            ExprKind::Matrix { rows } => self.check_matrix(rows, line),
            ExprKind::VectorIndex { target, index } => {
                self.check_expr(target);
                let target_meta = target.meta;
                match target_meta.ty {
                    Some(ValueType::Vector) => {
                        if let Some(shape) = target_meta.shape {
                            self.check_index(index, shape.cols, line, "vector index");
                        } else {
                            self.check_index_type(index, line, "vector index");
                        }
                        if matches!(index.kind, ExprKind::Range { .. }) {
                            NodeMeta {
                                ty: Some(ValueType::Vector),
                                shape: None,
                                elem: target_meta.elem,
                            }
                        } else {
                            NodeMeta {
                                ty: target_meta.elem,
                                shape: None,
                                elem: None,
                            }
                        }
                    }
                    Some(_) => {
                        self.report(line, "indexed variable is not a vector");
                        NodeMeta::unresolved()
                    }
                    None => NodeMeta::unresolved(),
                }
            }
            ExprKind::MatrixIndex { target, row, col } => {
                self.check_expr(target);
                let target_meta = target.meta;
                match target_meta.ty {
                    Some(ValueType::Matrix) => {
                        if let Some(shape) = target_meta.shape {
                            self.check_index(row, shape.rows, line, "row index");
                            self.check_index(col, shape.cols, line, "column index");
                        } else {
                            self.check_index_type(row, line, "row index");
                            self.check_index_type(col, line, "column index");
                        }
                        let row_ranged = matches!(row.kind, ExprKind::Range { .. });
                        let col_ranged = matches!(col.kind, ExprKind::Range { .. });
                        match (row_ranged, col_ranged) {
                            (false, false) => NodeMeta {
                                ty: target_meta.elem,
                                shape: None,
                                elem: None,
                            },
                            (true, true) => NodeMeta {
                                ty: Some(ValueType::Matrix),
                                shape: None,
                                elem: target_meta.elem,
                            },
                            _ => NodeMeta {
                                ty: Some(ValueType::Vector),
                                shape: None,
                                elem: target_meta.elem,
                            },
                        }
                    }
                    Some(_) => {
                        self.report(line, "indexed variable is not a matrix");
                        NodeMeta::unresolved()
                    }
                    None => NodeMeta::unresolved(),
                }
            }
            ExprKind::Builtin { func, args } => {
                let func = *func;
                self.check_builtin(func, args, line)
            }
        };
        expr.meta = meta;
        expr.meta.ty
    }

    fn check_binary(
        &mut self,
        op: BinOp,
        left_meta: NodeMeta,
        right_meta: NodeMeta,
        line: u32,
    ) -> NodeMeta {
        let result = match self.verify_operation(op.symbol(), left_meta.ty, right_meta.ty, line) {
            Some(result) => result,
            None => return NodeMeta::unresolved(),
        };
        if !self.shapes_conform(left_meta, right_meta, line) {
            return NodeMeta::unresolved();
        }
        let elem = match (left_meta.elem, right_meta.elem) {
            (Some(lhs), Some(rhs)) => ALLOWED_OPS
                .get(&(op.scalar_base().symbol(), lhs, rhs))
                .copied(),
            _ => None,
        };
        NodeMeta {
            ty: Some(result),
            shape: left_meta.shape.or(right_meta.shape),
            elem,
        }
    }

    /// Shape conformance for binary operations. Transposed operands
    /// already carry their reversed shape in the node metadata, so a
    /// plain comparison covers the transpose flag. Conformance is only
    /// decidable when both shapes are known.
    fn shapes_conform(&mut self, left: NodeMeta, right: NodeMeta, line: u32) -> bool {
        let involves_dims =
            |meta: &NodeMeta| matches!(meta.ty, Some(ValueType::Vector) | Some(ValueType::Matrix));
        if !involves_dims(&left) && !involves_dims(&right) {
            return true;
        }
        if let (Some(lhs), Some(rhs)) = (left.shape, right.shape) {
            if lhs != rhs {
                self.report(line, "vector sizes do not match");
                return false;
            }
        }
        true
    }

    fn check_vector(&mut self, elements: &mut [Expr], line: u32) -> NodeMeta {
        if elements.is_empty() {
            self.report(line, "empty vector");
            return NodeMeta::unresolved();
        }
        for element in elements.iter() {
            if !matches!(
                element.kind,
                ExprKind::IntLiteral(_) | ExprKind::FloatLiteral(_) | ExprKind::Var(_)
            ) {
                self.report(line, "vector elements must be numbers or variables");
                return NodeMeta::unresolved();
            }
        }
        let mut elem_ty: Option<ValueType> = None;
        for element in elements.iter_mut() {
            let ty = self.check_expr(element);
            match (elem_ty, ty) {
                (Some(expected), Some(found)) if expected != found => {
                    self.report(line, "vector elements must be of the same type");
                    return NodeMeta::unresolved();
                }
                (None, Some(found)) => elem_ty = Some(found),
                _ => {}
            }
        }
        NodeMeta {
            ty: Some(ValueType::Vector),
            shape: Some(Shape::vector(elements.len())),
            elem: elem_ty,
        }
    }

    /// Checks a matrix literal. Halts at the first inconsistency; an
    /// inconsistent matrix gets no shape at all.
    fn check_matrix(&mut self, rows: &mut [Expr], line: u32) -> NodeMeta {
        if rows.is_empty() {
            self.report(line, "matrix rows not properly defined");
            return NodeMeta::unresolved();
        }
        for row in rows.iter_mut() {
            if !matches!(row.kind, ExprKind::Vector { .. }) {
                self.report(line, "each row in a matrix must be a vector");
                return NodeMeta::unresolved();
            }
            self.check_expr(row);
        }
        let initial = match rows[0].meta.shape {
            Some(shape) => shape,
            None => {
                self.report(line, "matrix rows not properly defined");
                return NodeMeta::unresolved();
            }
        };
        if rows.iter().any(|row| row.meta.shape != Some(initial)) {
            self.report(line, "inconsistent row sizes in matrix");
            return NodeMeta::unresolved();
        }
        NodeMeta {
            ty: Some(ValueType::Matrix),
            shape: Some(Shape::new(rows.len(), initial.cols)),
            elem: rows[0].meta.elem,
        }
    }

    fn check_builtin(&mut self, func: BuiltinFunc, args: &mut [Expr], line: u32) -> NodeMeta {
        let arity_ok = match func {
            BuiltinFunc::Eye => args.len() == 1,
            BuiltinFunc::Ones | BuiltinFunc::Zeros => (1..=2).contains(&args.len()),
        };
        if !arity_ok {
            let expected = match func {
                BuiltinFunc::Eye => "1 argument",
                _ => "1 or 2 arguments",
            };
            self.report(line, format!("{} expects {}", func, expected));
            return NodeMeta::unresolved();
        }
        for arg in args.iter_mut() {
            let ty = self.check_expr(arg);
            if ty.is_some() && ty != Some(ValueType::Int) {
                self.report(line, format!("{} arguments must be int", func));
                return NodeMeta::unresolved();
            }
            if let ExprKind::IntLiteral(value) = arg.kind {
                if value < 0 {
                    self.report(line, "matrix dimensions must be non-negative");
                    return NodeMeta::unresolved();
                }
            }
        }
        let literal = |arg: &Expr| match arg.kind {
            ExprKind::IntLiteral(value) => Some(value as usize),
            _ => None,
        };
        let shape = match func {
            BuiltinFunc::Eye => literal(&args[0]).map(|n| Shape::new(n, n)),
            BuiltinFunc::Ones | BuiltinFunc::Zeros => literal(&args[0]).and_then(|rows| {
                let cols = if args.len() == 2 {
                    literal(&args[1])?
                } else {
                    rows
                };
                Some(Shape::new(rows, cols))
            }),
        };
        NodeMeta {
            ty: Some(ValueType::Matrix),
            shape,
            elem: Some(ValueType::Int),
        }
    }

    /// Validates one index expression against a known dimension size.
    /// Literal single indices must be in `[0, size)`; literal range
    /// endpoints must satisfy `0 <= left` and `right <= size`
    /// (half-open slice convention).
    fn check_index(&mut self, index: &mut Expr, size: usize, line: u32, axis: &str) {
        self.check_index_type(index, line, axis);
        match &index.kind {
            ExprKind::IntLiteral(value) => {
                if *value < 0 || *value >= size as i64 {
                    self.report(line, format!("{} out of bounds", axis));
                }
            }
            ExprKind::Range { left, right } => {
                if let (ExprKind::IntLiteral(left), ExprKind::IntLiteral(right)) =
                    (&left.kind, &right.kind)
                {
                    if *left < 0 || *right > size as i64 {
                        self.report(line, format!("{} out of bounds", axis));
                    }
                }
            }
            _ => {}
        }
    }

    /// Checks that an index expression resolves to int (or is a range
    /// of ints); used when the target shape is unknown.
    fn check_index_type(&mut self, index: &mut Expr, line: u32, axis: &str) {
        if matches!(index.kind, ExprKind::Range { .. }) {
            // Range bounds are validated by the Range node itself.
            self.check_expr(index);
            return;
        }
        let ty = self.check_expr(index);
        if ty.is_some() && ty != Some(ValueType::Int) {
            self.report(line, format!("{} must be int", axis));
        }
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        TypeChecker::new()
    }
}
