//! Whole-program parsing: recovery, type checks and tree shape

use cd18c::compiler::{Compilation, FrontEnd};
use cd18c::parser::ast::NodeKind;

fn compile(source: &str) -> Compilation {
    FrontEnd::default()
        .compile_source(source)
        .expect("in-memory source")
}

fn program(decls: &str, body: &str) -> String {
    format!("CD18 demo\nmain\n  {decls}\nbegin\n{body}\nend CD18 demo\n")
}

#[test]
fn test_clean_program() {
    let run = compile(&program(
        "total : integer, avg : real",
        "  total = 0;\n  input total;\n  avg = total / 2.0;\n  printline \"avg \", avg;",
    ));
    assert!(run.is_success(), "{:?}", run.messages());
    assert_eq!(run.tree.kind, NodeKind::Program);
    assert!(run.tree.find(NodeKind::Main).is_some());
}

#[test]
fn test_missing_semicolon_reported_once() {
    let run = compile(&program("x : integer, y : integer", "  x = 1\n  y = 2;"));
    assert_eq!(
        run.messages(),
        vec!["Syntax Error (6, 3): Missing \";\" after statement."]
    );
    assert_eq!(run.tree.count(NodeKind::Assign), 2);
}

#[test]
fn test_float_into_integer_mismatch() {
    let run = compile(&program("n : integer", "  n = 2.5;"));
    assert_eq!(run.messages(), vec!["Semantic Error (5, 5): Type mismatch."]);
}

#[test]
fn test_integer_promoted_to_real() {
    let run = compile(&program("r : real", "  r = 5;"));
    assert!(run.is_success(), "{:?}", run.messages());

    let assign = run.tree.find(NodeKind::Assign).expect("assignment");
    let value = assign.right().expect("right-hand side");
    assert_eq!(value.kind, NodeKind::FloatLit);
    assert_eq!(value.text(), "5.0");

    let target = assign
        .left()
        .and_then(|l| l.symbol)
        .expect("resolved target");
    assert_eq!(run.symbols.entry(target).value.as_deref(), Some("5.0"));
}

#[test]
fn test_integer_expression_into_real_mismatch() {
    let run = compile(&program("i : integer, r : real", "  input i;\n  r = i;\n  r = i * 2;"));
    assert_eq!(
        run.messages(),
        vec![
            "Semantic Error (6, 5): Type mismatch.",
            "Semantic Error (7, 5): Type mismatch.",
        ]
    );
}

#[test]
fn test_arithmetic_into_boolean_mismatch() {
    let run = compile(&program("i : integer, b : boolean", "  input i;\n  b = i + 1;"));
    assert_eq!(run.messages(), vec!["Semantic Error (6, 5): Type mismatch."]);
}

#[test]
fn test_undeclared_function_call() {
    let run = compile(&program("x : integer", "  go(1);\n  x = 1;"));
    assert_eq!(
        run.messages(),
        vec!["Semantic Error (5, 3): Function not defined."]
    );
    assert_eq!(run.tree.count(NodeKind::Assign), 1);
}

#[test]
fn test_program_must_start_with_cd18() {
    let run = compile("demo main x : integer begin x = 1; end CD18 demo");
    let messages = run.messages();
    assert_eq!(messages[0], "Syntax Error (1, 1): Program must begin with CD18.");
}

#[test]
fn test_trailing_input_reported() {
    let run = compile("CD18 p main x : integer begin x = 1; end CD18 p x");
    assert_eq!(run.messages(), vec!["Syntax Error (1, 49): Expected end of file."]);
}

#[test]
fn test_errors_stay_in_source_order() {
    let run = compile(&program(
        "x : integer",
        "  x = 1 / 0;\n  @\n  x = y;",
    ));
    let lines: Vec<usize> = run.diagnostics.iter().map(|d| d.line()).collect();
    let mut sorted = lines.clone();
    sorted.sort_unstable();
    assert_eq!(lines, sorted);
    assert_eq!(run.diagnostics.len(), 4);
}

#[test]
fn test_name_check_can_be_disabled() {
    use cd18c::config::Config;

    let source = "CD18 a main x : integer begin x = 1; end CD18 b";
    let strict = compile(source);
    assert_eq!(strict.diagnostics.len(), 1);

    let relaxed = FrontEnd::new(Config {
        verify_program_name: false,
        ..Config::default()
    })
    .compile_source(source)
    .expect("in-memory source");
    assert!(relaxed.is_success());
}
