//! End-to-end program runs against a scripted console.

use brewin_ast::ast::{BinOp, Expr, FnDecl, Program, Stmt, StructDecl};
use brewin_cli::{run_program, BufferConsole, ErrorKind, RuntimeError};

fn program(structs: Vec<StructDecl>, functions: Vec<FnDecl>) -> Program {
    Program { structs, functions }
}

fn main_fn(body: Vec<Stmt>) -> FnDecl {
    FnDecl::new("main", &[], "void", body)
}

fn print(args: Vec<Expr>) -> Stmt {
    Stmt::call("print", args)
}

fn bin(l: Expr, op: BinOp, r: Expr) -> Expr {
    Expr::binary(l, op, r)
}

fn run_with_input(p: &Program, input: &[&str]) -> (Result<(), RuntimeError>, Vec<String>) {
    let mut console = BufferConsole::with_input(input.to_vec());
    let result = run_program(p, &mut console).map(|_| ());
    (result, console.into_output())
}

fn run_ok(p: &Program) -> Vec<String> {
    let (result, out) = run_with_input(p, &[]);
    if let Err(e) = result {
        panic!("program failed: {} (output so far: {:?})", e, out);
    }
    out
}

fn run_err(p: &Program) -> (RuntimeError, Vec<String>) {
    let (result, out) = run_with_input(p, &[]);
    match result {
        Ok(()) => panic!("expected an error, got output {:?}", out),
        Err(e) => (e, out),
    }
}

#[test]
fn point_field_sum() {
    // struct Point { x: int; y: int; }
    // func main(): void { var p: Point; p = new Point; p.x = 1; p.y = 2; print(p.x + p.y); }
    let p = program(
        vec![StructDecl::new("Point", &[("x", "int"), ("y", "int")])],
        vec![main_fn(vec![
            Stmt::var_def("p", "Point"),
            Stmt::assign("p", Expr::new_struct("Point")),
            Stmt::assign("p.x", Expr::int(1)),
            Stmt::assign("p.y", Expr::int(2)),
            print(vec![bin(Expr::var("p.x"), BinOp::Add, Expr::var("p.y"))]),
        ])],
    );
    assert_eq!(run_ok(&p), vec!["3"]);
}

#[test]
fn call_result_in_expression() {
    let id = FnDecl::new("id", &[("a", "int")], "int", vec![Stmt::ret(Some(Expr::var("a")))]);
    let p = program(
        vec![],
        vec![
            id,
            main_fn(vec![print(vec![bin(
                Expr::call("id", vec![Expr::int(5)]),
                BinOp::Add,
                Expr::int(2),
            )])]),
        ],
    );
    assert_eq!(run_ok(&p), vec!["7"]);
}

#[test]
fn counting_loop() {
    let p = program(
        vec![],
        vec![main_fn(vec![
            Stmt::var_def("i", "int"),
            Stmt::For {
                init: Box::new(Stmt::assign("i", Expr::int(0))),
                cond: bin(Expr::var("i"), BinOp::Lt, Expr::int(3)),
                update: Box::new(Stmt::assign("i", bin(Expr::var("i"), BinOp::Add, Expr::int(1)))),
                body: vec![print(vec![Expr::var("i")])],
            },
        ])],
    );
    assert_eq!(run_ok(&p), vec!["0", "1", "2"]);
}

#[test]
fn mixed_add_aborts_before_any_output() {
    let p = program(
        vec![],
        vec![main_fn(vec![print(vec![bin(
            Expr::int(5),
            BinOp::Add,
            Expr::str_("x"),
        )])])],
    );
    let (err, out) = run_err(&p);
    assert_eq!(err.kind, ErrorKind::Type);
    assert!(out.is_empty());
}

#[test]
fn output_before_error_is_kept() {
    let p = program(
        vec![],
        vec![main_fn(vec![
            print(vec![Expr::str_("before")]),
            print(vec![Expr::var("missing")]),
            print(vec![Expr::str_("after")]),
        ])],
    );
    let (err, out) = run_err(&p);
    assert_eq!(err.kind, ErrorKind::Name);
    assert_eq!(out, vec!["before"]);
}

#[test]
fn field_access_through_nil_is_fault() {
    let p = program(
        vec![StructDecl::new("Node", &[("value", "int"), ("next", "Node")])],
        vec![main_fn(vec![
            Stmt::var_def("n", "Node"),
            Stmt::assign("n", Expr::new_struct("Node")),
            print(vec![Expr::var("n.next.value")]),
        ])],
    );
    assert_eq!(run_err(&p).0.kind, ErrorKind::Fault);

    let unset = program(
        vec![StructDecl::new("Node", &[("value", "int")])],
        vec![main_fn(vec![
            Stmt::var_def("n", "Node"),
            Stmt::assign("n.value", Expr::int(1)),
        ])],
    );
    assert_eq!(run_err(&unset).0.kind, ErrorKind::Fault);
}

#[test]
fn assignment_through_nil_intermediate_is_fault() {
    // a.b.c = 1 where a.b is still nil
    let p = program(
        vec![
            StructDecl::new("C", &[("c", "int")]),
            StructDecl::new("B", &[("b", "C")]),
        ],
        vec![main_fn(vec![
            Stmt::var_def("a", "B"),
            Stmt::assign("a", Expr::new_struct("B")),
            Stmt::assign("a.b.c", Expr::int(1)),
        ])],
    );
    let (err, out) = run_err(&p);
    assert_eq!(err.kind, ErrorKind::Fault);
    assert!(out.is_empty());
}

#[test]
fn for_condition_must_be_bool() {
    let p = program(
        vec![],
        vec![main_fn(vec![
            Stmt::var_def("i", "int"),
            Stmt::For {
                init: Box::new(Stmt::assign("i", Expr::int(0))),
                cond: Expr::str_("forever"),
                update: Box::new(Stmt::assign("i", bin(Expr::var("i"), BinOp::Add, Expr::int(1)))),
                body: vec![print(vec![Expr::var("i")])],
            },
        ])],
    );
    let (err, out) = run_err(&p);
    assert_eq!(err.kind, ErrorKind::Type);
    assert!(out.is_empty());
}

#[test]
fn nested_struct_assignment_and_copies() {
    // Assigning a struct copies it; later writes to the copy leave the
    // original alone.
    let p = program(
        vec![
            StructDecl::new("Inner", &[("v", "int")]),
            StructDecl::new("Outer", &[("inner", "Inner"), ("flag", "bool")]),
        ],
        vec![main_fn(vec![
            Stmt::var_def("o", "Outer"),
            Stmt::var_def("copy", "Outer"),
            Stmt::assign("o", Expr::new_struct("Outer")),
            Stmt::assign("o.inner", Expr::new_struct("Inner")),
            Stmt::assign("o.inner.v", Expr::int(4)),
            Stmt::assign("o.flag", Expr::int(7)),
            Stmt::assign("copy", Expr::var("o")),
            Stmt::assign("copy.inner.v", Expr::int(9)),
            print(vec![
                Expr::var("o.inner.v"),
                Expr::str_(" "),
                Expr::var("copy.inner.v"),
                Expr::str_(" "),
                Expr::var("o.flag"),
            ]),
            print(vec![bin(Expr::var("o"), BinOp::Eq, Expr::var("copy"))]),
        ])],
    );
    assert_eq!(run_ok(&p), vec!["4 9 true", "false"]);
}

#[test]
fn struct_types_are_nominal() {
    let p = program(
        vec![
            StructDecl::new("A", &[("x", "int")]),
            StructDecl::new("B", &[("x", "int")]),
        ],
        vec![main_fn(vec![
            Stmt::var_def("a", "A"),
            Stmt::assign("a", Expr::new_struct("B")),
        ])],
    );
    assert_eq!(run_err(&p).0.kind, ErrorKind::Type);
}

#[test]
fn struct_params_are_copies() {
    // func bump(p: P): void { p.n = p.n + 1; print(p.n); }
    let bump = FnDecl::new(
        "bump",
        &[("p", "P")],
        "void",
        vec![
            Stmt::assign("p.n", bin(Expr::var("p.n"), BinOp::Add, Expr::int(1))),
            print(vec![Expr::var("p.n")]),
        ],
    );
    let p = program(
        vec![StructDecl::new("P", &[("n", "int")])],
        vec![
            bump,
            main_fn(vec![
                Stmt::var_def("p", "P"),
                Stmt::assign("p", Expr::new_struct("P")),
                Stmt::call("bump", vec![Expr::var("p")]),
                print(vec![Expr::var("p.n")]),
            ]),
        ],
    );
    assert_eq!(run_ok(&p), vec!["1", "0"]);
}

#[test]
fn overloads_by_argument_count() {
    let f0 = FnDecl::new("f", &[], "string", vec![Stmt::ret(Some(Expr::str_("zero")))]);
    let f2 = FnDecl::new(
        "f",
        &[("a", "int"), ("b", "int")],
        "int",
        vec![Stmt::ret(Some(bin(Expr::var("a"), BinOp::Mul, Expr::var("b"))))],
    );
    let p = program(
        vec![],
        vec![
            f0,
            f2,
            main_fn(vec![
                print(vec![Expr::call("f", vec![])]),
                print(vec![Expr::call("f", vec![Expr::int(3), Expr::int(4)])]),
            ]),
        ],
    );
    assert_eq!(run_ok(&p), vec!["zero", "12"]);

    let wrong = program(
        vec![],
        vec![
            FnDecl::new("f", &[], "int", vec![]),
            main_fn(vec![Stmt::call("f", vec![Expr::int(1)])]),
        ],
    );
    assert_eq!(run_err(&wrong).0.kind, ErrorKind::Name);
}

#[test]
fn logical_operators_evaluate_both_sides() {
    // side(): bool prints, so both calls show up even though `true || ..`
    // is already decided.
    let side = FnDecl::new(
        "side",
        &[("tag", "string")],
        "bool",
        vec![print(vec![Expr::var("tag")]), Stmt::ret(Some(Expr::bool_(false)))],
    );
    let p = program(
        vec![],
        vec![
            side,
            main_fn(vec![print(vec![bin(
                bin(Expr::bool_(true), BinOp::Or, Expr::call("side", vec![Expr::str_("or")])),
                BinOp::And,
                Expr::call("side", vec![Expr::str_("and")]),
            )])]),
        ],
    );
    assert_eq!(run_ok(&p), vec!["or", "and", "false"]);
}

#[test]
fn int_only_logical_is_type_error() {
    let p = program(
        vec![],
        vec![main_fn(vec![print(vec![bin(Expr::int(1), BinOp::And, Expr::int(0))])])],
    );
    assert_eq!(run_err(&p).0.kind, ErrorKind::Type);
}

#[test]
fn bool_variable_accepts_int() {
    let p = program(
        vec![],
        vec![main_fn(vec![
            Stmt::var_def("b", "bool"),
            Stmt::assign("b", Expr::int(-3)),
            print(vec![Expr::var("b")]),
            Stmt::assign("b", Expr::int(0)),
            print(vec![Expr::var("b")]),
        ])],
    );
    assert_eq!(run_ok(&p), vec!["true", "false"]);
}

#[test]
fn redeclaration_in_same_scope() {
    let p = program(
        vec![],
        vec![main_fn(vec![Stmt::var_def("x", "int"), Stmt::var_def("x", "bool")])],
    );
    assert_eq!(run_err(&p).0.kind, ErrorKind::Name);
}

#[test]
fn recursion_computes_factorial() {
    // func fact(n: int): int { if (n <= 1) { return 1; } return n * fact(n - 1); }
    let fact = FnDecl::new(
        "fact",
        &[("n", "int")],
        "int",
        vec![
            Stmt::If {
                cond: bin(Expr::var("n"), BinOp::Le, Expr::int(1)),
                then_: vec![Stmt::ret(Some(Expr::int(1)))],
                else_: None,
            },
            Stmt::ret(Some(bin(
                Expr::var("n"),
                BinOp::Mul,
                Expr::call("fact", vec![bin(Expr::var("n"), BinOp::Sub, Expr::int(1))]),
            ))),
        ],
    );
    let p = program(
        vec![],
        vec![fact, main_fn(vec![print(vec![Expr::call("fact", vec![Expr::int(10)])])])],
    );
    assert_eq!(run_ok(&p), vec!["3628800"]);
}

#[test]
fn input_builtins() {
    let p = program(
        vec![],
        vec![main_fn(vec![
            Stmt::var_def("n", "int"),
            Stmt::var_def("name", "string"),
            Stmt::assign("n", Expr::call("inputi", vec![])),
            Stmt::assign("name", Expr::call("inputs", vec![Expr::str_("Name?")])),
            print(vec![Expr::var("name"), Expr::str_(":"), bin(Expr::var("n"), BinOp::Mul, Expr::int(2))]),
        ])],
    );
    let (result, out) = run_with_input(&p, &["21", "ada"]);
    result.unwrap();
    assert_eq!(out, vec!["Name?", "ada:42"]);
}

#[test]
fn non_numeric_inputi_is_a_string() {
    let p = program(
        vec![],
        vec![main_fn(vec![
            Stmt::var_def("n", "int"),
            Stmt::assign("n", Expr::call("inputi", vec![])),
        ])],
    );
    let (result, _) = run_with_input(&p, &["abc"]);
    assert_eq!(result.unwrap_err().kind, ErrorKind::Type);
}

#[test]
fn print_renders_nil_and_structs() {
    let p = program(
        vec![StructDecl::new("P", &[("y", "int"), ("x", "bool")])],
        vec![main_fn(vec![
            Stmt::var_def("p", "P"),
            print(vec![Expr::var("p")]),
            Stmt::assign("p", Expr::new_struct("P")),
            print(vec![Expr::var("p")]),
            print(vec![]),
        ])],
    );
    assert_eq!(run_ok(&p), vec!["nil", "P { x: false, y: 0 }", ""]);
}
