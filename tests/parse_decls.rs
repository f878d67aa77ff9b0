// End-to-end parses through the public library API.

use minic::ast::DeclKind;
use minic::limits::CompilerLimits;
use minic::parser::{Parser, TypeNames, TypedefTable, parse};

#[test]
fn test_whole_translation_unit() {
    let source = "\
typedef unsigned long size_t;

struct header {
    size_t length;
    char tag[8];
};

struct header *first, *last;
union pun;
";
    let limits = CompilerLimits::default();
    let ast = parse(source, &limits).unwrap();

    assert!(ast.errors().is_empty());
    let expected = "\
Program
  Typedef 'size_t'
    UnsignedLong
  RecordDecl
    Struct 'header'
      Member 'length'
        Typename 'size_t'
      Member 'tag'
        Array 8
          Char
  VarDecl
    Var 'first'
      Pointer
        Struct 'header'
    Var 'last'
      Pointer
        Struct 'header'
  RecordDecl
    Union 'pun'
";
    assert_eq!(ast.to_string(), expected);
}

#[test]
fn test_driver_reports_every_error() {
    // Three independently broken constructs surrounded by good ones; the
    // parse must surface all three and keep the good declarations.
    let source = "int a; ) typedef int; struct; long b;";
    let limits = CompilerLimits::default();
    let ast = parse(source, &limits).unwrap();

    let errors = ast.errors();
    assert_eq!(errors.len(), 3);
    assert_eq!(errors[0].message, "found unrecognized token");
    assert!(errors[1].message.starts_with("Expected an identifier"));
    assert!(errors[2].message.starts_with("Expected a tag or '{'"));

    let variables = ast
        .decl_ids()
        .filter(|id| matches!(ast.decl(*id).kind, DeclKind::Variables { .. }))
        .count();
    assert_eq!(variables, 2);
}

#[test]
fn test_rejected_token_is_not_consumed() {
    let source = "^ int x;";
    let limits = CompilerLimits::default();
    let mut parser = Parser::new(source, &limits).unwrap();

    let first = parser.parse_global_decl();
    let second = parser.parse_global_decl();
    let ast = parser.into_ast();

    // Rejection leaves the offending token in the stream: without the
    // driver's resynchronization, a second call reports the same token
    // again instead of silently skipping input.
    match (&ast.decl(first).kind, &ast.decl(second).kind) {
        (DeclKind::Error(a), DeclKind::Error(b)) => assert_eq!(a.span, b.span),
        other => panic!("expected two error nodes, got {:?}", other),
    }
}

#[test]
fn test_seeded_typedef_table() {
    // A collaborator can pre-register type names before the session.
    let mut table = TypedefTable::new();
    table.define("size_t");

    let limits = CompilerLimits::default();
    let mut parser = Parser::with_typedefs("size_t n;", &limits, table).unwrap();
    let id = parser.parse_global_decl();
    let ast = parser.into_ast();

    assert!(matches!(ast.decl(id).kind, DeclKind::Variables { .. }));
}

#[test]
fn test_typedef_table_answers_queries() {
    let source = "typedef int fd_t;";
    let limits = CompilerLimits::default();
    let mut parser = Parser::new(source, &limits).unwrap();
    parser.parse_global_decl();

    assert!(parser.typedefs().is_type_name("fd_t"));
    assert!(!parser.typedefs().is_type_name("widget"));
}

#[test]
fn test_diagnostics_render_with_labels() {
    let source = "int x; @";
    let limits = CompilerLimits::default();
    let ast = parse(source, &limits).unwrap();

    let errors = ast.errors();
    assert_eq!(errors.len(), 1);
    let diagnostic = errors[0].diagnostic();
    assert_eq!(diagnostic.message, "found unrecognized token");
    // Primary label plus the contextual note.
    assert_eq!(diagnostic.labels.len(), 2);
    assert_eq!(diagnostic.labels[0].range, 7..8);
}

#[test]
fn test_empty_input_parses_to_empty_program() {
    let limits = CompilerLimits::default();
    let ast = parse("", &limits).unwrap();
    assert_eq!(ast.decl_count(), 0);
    assert_eq!(ast.to_string(), "Program\n");
}

#[test]
fn test_input_size_limit_is_fatal() {
    let mut limits = CompilerLimits::default();
    limits.max_input_size = 8;
    assert!(parse("int long_name_exceeding_the_limit;", &limits).is_err());
}
