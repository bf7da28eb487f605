use jsonnet_syntax::ast::{BinaryOp, NodeId, NodeKind, ObjectFieldKind, UnaryOp, Visibility};
use jsonnet_syntax::lexer;
use jsonnet_syntax::parser::{Parse, ParseError, ParseErrorKind, Parser};
use jsonnet_syntax::source::Location;
use test_case::test_case;

fn parse(src: &str) -> Parse {
    let tokens = lexer::lex("test.jsonnet", src).unwrap();
    Parser::new(tokens).parse()
}

fn parse_ok(src: &str) -> (Parse, NodeId) {
    let parse = parse(src);
    assert!(parse.error.is_none(), "unexpected error: {:?}", parse.error);
    let root = parse.root.unwrap();
    (parse, root)
}

fn parse_err(src: &str) -> ParseError {
    let parse = parse(src);
    parse.error.expect("expected a parse error")
}

#[test_case("{}" ; "empty object")]
#[test_case("{ foo: 1, bar: self.foo }" ; "plain object")]
#[test_case("{ a:: 1, b::: 2, c+: 3 }" ; "visibilities")]
#[test_case("local f(x, y=1) = x + y; f(2)" ; "function sugar")]
#[test_case("[x * x for x in [1, 2] if x > 1]" ; "array comprehension")]
#[test_case("{ [k]: 1 for k in ks }" ; "object comprehension")]
#[test_case("{ local t = 1, u: t }" ; "object local")]
#[test_case("assert true : 'boom'; null" ; "assert with message")]
#[test_case("if a then b else c" ; "conditional")]
#[test_case("error 'x'" ; "error expression")]
#[test_case("super.x + super['y']" ; "super indexes")]
#[test_case("function(a, b=2) a + b" ; "function literal")]
#[test_case("import 'lib.jsonnet'" ; "import")]
#[test_case("importstr \"data.txt\"" ; "importstr")]
#[test_case("f(x, key=1) tailstrict" ; "named args and tailstrict")]
#[test_case("a { b: 1 }" ; "object apply")]
#[test_case("|||\n  text\n|||" ; "text block")]
#[test_case("-!~+x" ; "unary chain")]
#[test_case("local x = 1; x in { x: true }" ; "in operator")]
fn parses(src: &str) {
    parse_ok(src);
}

#[test]
fn duplicate_field_location_and_message() {
    let err = parse_err("{foo: 1, foo: 2}");
    assert_eq!(err.kind.to_string(), "Duplicate field: foo");
    assert_eq!(err.loc.begin, Location::new(1, 10));
    assert_eq!(err.loc.end, Location::new(1, 13));
}

#[test]
fn parameter_must_be_simple_identifier() {
    let err = parse_err("function(a, 1)");
    assert_eq!(
        err.kind.to_string(),
        "Expected simple identifier but got a complex expression."
    );
    assert_eq!(err.loc.begin, Location::new(1, 13));
    assert_eq!(err.loc.end, Location::new(1, 14));
}

#[test]
fn duplicate_local_var() {
    let err = parse_err("local x = 1, x = 2; x");
    assert_eq!(err.kind.to_string(), "Duplicate local var: x");
}

#[test]
fn duplicate_object_local() {
    let err = parse_err("{ local x = 1, local x = 2, a: x }");
    assert_eq!(err.kind.to_string(), "Duplicate local var: x");
}

#[test]
fn missing_comma_between_fields() {
    let err = parse_err("{ a: 1 b: 2 }");
    assert_eq!(err.kind.to_string(), "Expected a comma before next field.");
}

#[test]
fn missing_comma_between_array_elements() {
    let err = parse_err("[1 2]");
    assert_eq!(
        err.kind.to_string(),
        "Expected a comma before next array element."
    );
}

#[test_case("{ assert true, [k]: 1 for k in ks }", "Object comprehension cannot have asserts." ; "asserts")]
#[test_case("{ [k]: 1, [j]: 2 for k in ks }", "Object comprehension can only have one field." ; "two fields")]
#[test_case("{ [k]:: 1 for k in ks }", "Object comprehensions cannot have hidden fields." ; "hidden")]
#[test_case("{ k: 1 for k in ks }", "Object comprehensions can only have [e] fields." ; "plain field")]
fn object_comprehension_validation(src: &str, message: &str) {
    assert_eq!(parse_err(src).kind.to_string(), message);
}

#[test]
fn comp_clause_error_names_the_end_token() {
    let err = parse_err("[x for x in xs then]");
    assert_eq!(
        err.kind.to_string(),
        "Expected for, if or \"]\" after for clause, got: then"
    );
}

#[test]
fn plus_colon_method_is_rejected() {
    let err = parse_err("{ f(x)+: x }");
    assert_eq!(
        err.kind.to_string(),
        "Cannot use +: syntax sugar in a method: f"
    );
}

#[test]
fn computed_import_is_rejected() {
    let err = parse_err("import 'a' + 'b'");
    assert_eq!(err.kind.to_string(), "Computed imports are not allowed");
}

#[test]
fn super_requires_index() {
    let err = parse_err("super + 1");
    assert_eq!(err.kind.to_string(), "Expected . or [ after super.");
}

#[test]
fn stray_operator_is_not_unary() {
    let err = parse_err("* 3");
    assert_eq!(err.kind.to_string(), "Not a unary operator: *");
}

#[test]
fn equals_is_not_binary() {
    let err = parse_err("a = b");
    assert_eq!(err.kind.to_string(), "Not a binary operator: =");
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let (parse, root) = parse_ok("1 + 2 * 3");
    let NodeKind::Binary { op, right, .. } = &parse.ast[root].kind else {
        panic!("expected a binary root");
    };
    assert_eq!(*op, BinaryOp::Plus);
    let NodeKind::Binary { op: inner, .. } = &parse.ast[*right].kind else {
        panic!("expected a nested binary");
    };
    assert_eq!(*inner, BinaryOp::Mult);
}

#[test]
fn unary_binds_tighter_than_multiplication() {
    let (parse, root) = parse_ok("-a * b");
    let NodeKind::Binary { op, left, .. } = &parse.ast[root].kind else {
        panic!("expected a binary root");
    };
    assert_eq!(*op, BinaryOp::Mult);
    let NodeKind::Unary { op: unary, .. } = &parse.ast[*left].kind else {
        panic!("expected a unary left side");
    };
    assert_eq!(*unary, UnaryOp::Minus);
}

#[test]
fn postfix_chains_nest_left_to_right() {
    let (parse, root) = parse_ok("a.b(c).d");
    let NodeKind::IndexDot { target, .. } = &parse.ast[root].kind else {
        panic!("expected an index at the root");
    };
    assert!(matches!(parse.ast[*target].kind, NodeKind::Apply { .. }));
}

#[test]
fn node_ranges_depend_only_on_input() {
    let (first, root_a) = parse_ok("{ a: [1, 2] }");
    let (second, root_b) = parse_ok("{ a: [1, 2] }");
    assert_eq!(first.ast[root_a].loc, second.ast[root_b].loc);
    assert_eq!(first.ast.len(), second.ast.len());
}

#[test]
fn heading_comment_attaches_to_next_field() {
    let (parse, root) = parse_ok("{\n  // about a\n  a: 1,\n  b: 2,\n}");
    let NodeKind::Object { fields, .. } = &parse.ast[root].kind else {
        panic!("expected an object");
    };
    let NodeKind::ObjectField(a) = &parse.ast[fields[0]].kind else {
        panic!("expected a field");
    };
    assert_eq!(a.heading_comments.len(), 1);
    let NodeKind::Comment { text } = &parse.ast[a.heading_comments[0]].kind else {
        panic!("expected a comment node");
    };
    assert_eq!(text, "// about a");

    let NodeKind::ObjectField(b) = &parse.ast[fields[1]].kind else {
        panic!("expected a field");
    };
    assert!(b.heading_comments.is_empty());
}

#[test]
fn post_comma_comment_takes_priority() {
    let (parse, root) = parse_ok("{\n  a: 1, // about b\n  b: 2,\n}");
    let NodeKind::Object { fields, .. } = &parse.ast[root].kind else {
        panic!("expected an object");
    };
    let NodeKind::ObjectField(b) = &parse.ast[fields[1]].kind else {
        panic!("expected a field");
    };
    assert_eq!(b.heading_comments.len(), 1);
}

#[test]
fn field_hide_markers() {
    let (parse, root) = parse_ok("{ a: 1, b:: 2, c::: 3, d+:: 4 }");
    let NodeKind::Object { fields, .. } = &parse.ast[root].kind else {
        panic!("expected an object");
    };
    let hides: Vec<(Visibility, bool)> = fields
        .iter()
        .map(|f| match &parse.ast[*f].kind {
            NodeKind::ObjectField(field) => (field.hide, field.super_sugar),
            _ => panic!("expected a field"),
        })
        .collect();
    assert_eq!(
        hides,
        vec![
            (Visibility::Inherit, false),
            (Visibility::Hidden, false),
            (Visibility::Visible, false),
            (Visibility::Hidden, true),
        ]
    );
}

#[test]
fn object_local_field_kind() {
    let (parse, root) = parse_ok("{ local t = 1, u: t }");
    let NodeKind::Object { fields, .. } = &parse.ast[root].kind else {
        panic!("expected an object");
    };
    let NodeKind::ObjectField(local) = &parse.ast[fields[0]].kind else {
        panic!("expected a field");
    };
    assert_eq!(local.kind, ObjectFieldKind::Local);
    assert_eq!(parse.ast.field_name(local), Some("t"));
}

#[test]
fn incomplete_index_keeps_a_partial_tree() {
    let parse = parse("local foo = 1; foo.");
    let err = parse.error.clone().expect("expected a parse error");
    assert!(matches!(err.kind, ParseErrorKind::ExpectedToken { .. }));

    // The salvaged tree is the local with the index target as its body, so
    // bindings stay visible to completion.
    let rest = err.rest.expect("expected a partial tree");
    assert!(matches!(parse.ast[rest].kind, NodeKind::Local { .. }));
}

#[test]
fn assert_colon_terminates_condition() {
    let (parse, root) = parse_ok("assert x: 'message'; x");
    let NodeKind::Assert { message, .. } = &parse.ast[root].kind else {
        panic!("expected an assert");
    };
    assert!(message.is_some());
}

#[test]
fn trailing_input_is_rejected() {
    let err = parse_err("1 2");
    assert!(matches!(err.kind, ParseErrorKind::DidNotExpect(_)));
}

#[test]
fn block_string_import_is_rejected() {
    let err = parse_err("import |||\n  a.jsonnet\n|||");
    assert_eq!(
        err.kind.to_string(),
        "Block string literals not allowed in imports"
    );
}

#[test]
fn positional_argument_after_named() {
    let err = parse_err("f(a=1, 2)");
    assert_eq!(
        err.kind.to_string(),
        "Positional argument after a named argument is not allowed"
    );
}

#[test]
fn local_binds_want_comma_or_semicolon() {
    let err = parse_err("local a = 1 local b = 2; a");
    assert!(matches!(
        err.kind,
        ParseErrorKind::ExpectedCommaOrSemicolon(_)
    ));
}

#[test]
fn field_wants_a_colon_marker() {
    let err = parse_err("{ a = 1 }");
    assert!(matches!(err.kind, ParseErrorKind::ExpectedFieldColon(_)));
    assert!(err
        .kind
        .to_string()
        .starts_with("Expected one of :, ::, :::"));
}

#[test]
fn missing_then_reports_expected_token() {
    let err = parse_err("if x 2 else 3");
    assert_eq!(
        err.kind.to_string(),
        "Expected token then but got (NUMBER, \"2\")"
    );
}

#[test]
fn missing_bind_equals_reports_expected_operator() {
    let err = parse_err("local a 1; a");
    assert!(matches!(err.kind, ParseErrorKind::ExpectedOperator { .. }));
}

#[test]
fn unexpected_field_token() {
    let err = parse_err("{ 3: 1 }");
    assert!(matches!(err.kind, ParseErrorKind::Unexpected(_)));
}

#[test]
fn incomplete_subscript_keeps_the_target() {
    let parse = parse("foo[");
    let err = parse.error.clone().expect("expected a parse error");
    let rest = err.rest.expect("expected a partial tree");
    assert!(matches!(parse.ast[rest].kind, NodeKind::Var { .. }));
}

#[test]
fn named_args_are_kept_apart_from_positional() {
    let (parse, root) = parse_ok("f(1, two=2)");
    let NodeKind::Apply {
        args, named_args, ..
    } = &parse.ast[root].kind
    else {
        panic!("expected a call");
    };
    assert_eq!(args.len(), 1);
    assert_eq!(named_args.len(), 1);
    assert_eq!(
        parse.ast.identifier_name(named_args[0].name),
        Some("two")
    );
}

#[test]
fn parenthesized_expression_is_transparent() {
    let (parse, root) = parse_ok("(1 + 2) * 3");
    let NodeKind::Binary { op, left, .. } = &parse.ast[root].kind else {
        panic!("expected a binary root");
    };
    assert_eq!(*op, BinaryOp::Mult);
    assert!(matches!(parse.ast[*left].kind, NodeKind::Binary { .. }));
}

#[test]
fn number_literal_keeps_original_string() {
    let (parse, root) = parse_ok("1.50e1");
    let NodeKind::LiteralNumber {
        value,
        original_string,
    } = &parse.ast[root].kind
    else {
        panic!("expected a number literal");
    };
    assert_eq!(original_string, "1.50e1");
    assert!((value - 15.0).abs() < f64::EPSILON);
}
