//! Integration tests for the full check-then-execute pipeline.
//!
//! Programs are built directly as ASTs, checked, and run against an
//! in-memory output sink, verifying that the two passes agree on the
//! language's semantics.

use matscript::{
    ast::{
        AssignOp, AssignTarget, BinOp, BuiltinFunc, CmpOp, Expr, ExprKind, Program, Shape, Stmt,
        StmtKind, ValueType,
    },
    check, run_with_output, Value,
};

fn int(value: i64) -> Expr {
    Expr::new(ExprKind::IntLiteral(value), 1)
}

fn var(name: &str) -> Expr {
    Expr::new(ExprKind::Var(name.to_string()), 1)
}

fn string(value: &str) -> Expr {
    Expr::new(ExprKind::StringLiteral(value.to_string()), 1)
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        1,
    )
}

fn condition(op: CmpOp, left: Expr, right: Expr) -> Expr {
    Expr::new(
        ExprKind::Condition {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        1,
    )
}

fn vector(elements: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::Vector { elements }, 1)
}

fn matrix(rows: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::Matrix { rows }, 1)
}

fn builtin(func: BuiltinFunc, args: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::Builtin { func, args }, 1)
}

fn assign(name: &str, value: Expr) -> Stmt {
    Stmt::new(
        StmtKind::Assignment {
            op: AssignOp::Assign,
            target: AssignTarget::Name(name.to_string()),
            value,
        },
        1,
    )
}

fn print(items: Vec<Expr>) -> Stmt {
    Stmt::new(StmtKind::Print(items), 1)
}

/// Checks and runs a program, asserting it is statically clean, and
/// returns what it printed.
fn run_clean(statements: Vec<Stmt>) -> String {
    let mut program = Program::new(statements);
    let mut diag = Vec::new();
    let (result, output) = run_with_output(&mut program, Vec::new(), &mut diag)
        .expect("program should run to completion");
    assert_eq!(result, None);
    assert_eq!(String::from_utf8(diag).unwrap(), "", "unexpected diagnostics");
    String::from_utf8(output).expect("output should be utf-8")
}

#[test]
fn matrix_builtins_print_their_contents() {
    let out = run_clean(vec![
        assign("i", builtin(BuiltinFunc::Eye, vec![int(3)])),
        assign("o", builtin(BuiltinFunc::Ones, vec![int(2), int(3)])),
        assign("z", builtin(BuiltinFunc::Zeros, vec![int(2)])),
        print(vec![var("i")]),
        print(vec![var("o")]),
        print(vec![var("z")]),
    ]);
    assert_eq!(
        out,
        "[[1, 0, 0], [0, 1, 0], [0, 0, 1]]\n\
         [[1, 1, 1], [1, 1, 1]]\n\
         [[0, 0], [0, 0]]\n"
    );
}

#[test]
fn for_loop_prints_each_value_of_its_inclusive_range() {
    let out = run_clean(vec![Stmt::new(
        StmtKind::For {
            var: "i".to_string(),
            start: int(1),
            end: int(3),
            body: Box::new(print(vec![var("i")])),
        },
        1,
    )]);
    assert_eq!(out, "1\n2\n3\n");
}

#[test]
fn break_exits_a_while_loop_early() {
    let out = run_clean(vec![
        assign("n", int(0)),
        Stmt::new(
            StmtKind::While {
                cond: condition(CmpOp::Lt, var("n"), int(1000)),
                body: Box::new(Stmt::new(
                    StmtKind::Block(vec![
                        Stmt::new(
                            StmtKind::Assignment {
                                op: AssignOp::AddAssign,
                                target: AssignTarget::Name("n".to_string()),
                                value: int(1),
                            },
                            3,
                        ),
                        Stmt::new(
                            StmtKind::If {
                                cond: condition(CmpOp::Ge, var("n"), int(5)),
                                body: Box::new(Stmt::new(StmtKind::Break, 5)),
                            },
                            4,
                        ),
                    ]),
                    2,
                )),
            },
            2,
        ),
        print(vec![var("n")]),
    ]);
    assert_eq!(out, "5\n");
}

#[test]
fn elementwise_addition_runs_clean_when_shapes_agree() {
    let out = run_clean(vec![
        assign("a", vector(vec![int(1), int(2), int(3)])),
        assign("b", vector(vec![int(4), int(5), int(6)])),
        print(vec![binary(BinOp::DotAdd, var("a"), var("b"))]),
    ]);
    assert_eq!(out, "[5, 7, 9]\n");
}

#[test]
fn shape_mismatch_is_caught_statically() {
    let mut program = Program::new(vec![
        assign("a", vector(vec![int(1), int(2), int(3)])),
        assign("b", vector(vec![int(4), int(5)])),
        assign("c", binary(BinOp::DotAdd, var("a"), var("b"))),
    ]);
    let diagnostics = check(&mut program);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "vector sizes do not match");
}

#[test]
fn transposed_shapes_conform_statically_and_run() {
    // b is 3x2; its transpose is 2x3 and may be added to a.
    let out = run_clean(vec![
        assign(
            "a",
            matrix(vec![
                vector(vec![int(1), int(2), int(3)]),
                vector(vec![int(4), int(5), int(6)]),
            ]),
        ),
        assign(
            "b",
            matrix(vec![
                vector(vec![int(10), int(40)]),
                vector(vec![int(20), int(50)]),
                vector(vec![int(30), int(60)]),
            ]),
        ),
        print(vec![binary(
            BinOp::DotAdd,
            var("a"),
            Expr::new(ExprKind::Transpose(Box::new(var("b"))), 3),
        )]),
    ]);
    assert_eq!(out, "[[11, 22, 33], [44, 55, 66]]\n");
}

#[test]
fn diagnostics_do_not_block_execution() {
    // The flagged branch is never reached, so the program still runs.
    let mut program = Program::new(vec![
        assign("x", int(1)),
        Stmt::new(
            StmtKind::If {
                cond: condition(CmpOp::Gt, var("x"), int(100)),
                body: Box::new(assign("y", binary(BinOp::Add, int(1), string("boom")))),
            },
            2,
        ),
        print(vec![string("survived")]),
    ]);
    let (result, output) =
        run_with_output(&mut program, Vec::new(), Vec::new()).expect("should run");
    assert_eq!(result, None);
    assert_eq!(String::from_utf8(output).unwrap(), "survived\n");
}

#[test]
fn diagnostics_are_written_to_the_diagnostic_sink() {
    let mut program = Program::new(vec![
        assign("x", binary(BinOp::Add, int(1), string("boom"))),
        print(vec![string("still prints")]),
    ]);
    let mut diag = Vec::new();
    // Borrow the sink so its contents stay inspectable afterwards.
    let result = run_with_output(&mut program, Vec::new(), &mut diag);
    // The flagged statement is reached at runtime this time.
    assert!(result.is_err());
    assert_eq!(
        String::from_utf8(diag).unwrap(),
        "1: invalid operation int + string\n"
    );
}

#[test]
fn checking_annotates_and_is_idempotent() {
    let mut program = Program::new(vec![
        assign("m", builtin(BuiltinFunc::Eye, vec![int(4)])),
        assign("t", Expr::new(ExprKind::Transpose(Box::new(var("m"))), 2)),
    ]);
    assert!(check(&mut program).is_empty());
    let annotated = program.clone();
    assert!(check(&mut program).is_empty());
    assert_eq!(program, annotated);

    match &program.statements[1].kind {
        StmtKind::Assignment { value, .. } => {
            assert_eq!(value.meta.ty, Some(ValueType::Matrix));
            assert_eq!(value.meta.shape, Some(Shape::new(4, 4)));
        }
        other => panic!("unexpected statement: {:?}", other),
    }
}

#[test]
fn top_level_return_yields_the_program_result() {
    let mut program = Program::new(vec![
        assign("x", binary(BinOp::Mul, int(6), int(7))),
        Stmt::new(StmtKind::Return(var("x")), 2),
    ]);
    let (result, _) = run_with_output(&mut program, Vec::new(), Vec::new()).expect("should run");
    assert_eq!(result, Some(Value::Int(42)));
}

#[test]
fn runtime_errors_carry_line_and_kind() {
    let mut program = Program::new(vec![
        assign("v", vector(vec![int(1), int(2)])),
        Stmt::new(
            StmtKind::Print(vec![Expr::new(
                ExprKind::VectorIndex {
                    target: Box::new(var("v")),
                    index: Box::new(Expr::new(ExprKind::IntLiteral(5), 7)),
                },
                7,
            )]),
            7,
        ),
    ]);
    // The out-of-bounds literal index is flagged statically too.
    let diagnostics = check(&mut program);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "vector index out of bounds");

    let error = run_with_output(&mut program, Vec::new(), Vec::new())
        .expect_err("index must fail at runtime");
    assert_eq!(error.kind_name(), "IndexOutOfBounds");
    assert_eq!(error.line, 7);
}

#[test]
fn nested_loops_with_matrix_accumulation() {
    // Builds a 3x3 multiplication table in place.
    let mut statements = vec![assign("m", builtin(BuiltinFunc::Zeros, vec![int(3)]))];
    statements.push(Stmt::new(
        StmtKind::For {
            var: "i".to_string(),
            start: int(0),
            end: int(2),
            body: Box::new(Stmt::new(
                StmtKind::For {
                    var: "j".to_string(),
                    start: int(0),
                    end: int(2),
                    body: Box::new(Stmt::new(
                        StmtKind::Assignment {
                            op: AssignOp::Assign,
                            target: AssignTarget::MatrixElement {
                                name: "m".to_string(),
                                row: var("i"),
                                col: var("j"),
                            },
                            value: binary(
                                BinOp::Mul,
                                binary(BinOp::Add, var("i"), int(1)),
                                binary(BinOp::Add, var("j"), int(1)),
                            ),
                        },
                        4,
                    )),
                },
                3,
            )),
        },
        2,
    ));
    statements.push(print(vec![var("m")]));
    let out = run_clean(statements);
    assert_eq!(out, "[[1, 2, 3], [2, 4, 6], [3, 6, 9]]\n");
}
