use jsonnet_hir::document::{parse_document, ParsedDocument};
use jsonnet_hir::query::{self, CursorTarget};
use jsonnet_syntax::ast::{NodeId, NodeKind};
use jsonnet_syntax::source::Location;
use test_case::test_case;
use url::Url;

fn parse(text: &str) -> ParsedDocument {
    let url = Url::parse("file:///test.jsonnet").unwrap();
    match parse_document(&url, text, None) {
        Ok(doc) => doc,
        Err(failed) => panic!("document failed to parse: {}", failed.message()),
    }
}

fn reachable(doc: &ParsedDocument) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![doc.root];
    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(doc.ast.children(node));
    }
    out
}

#[test]
fn every_node_has_an_environment() {
    let doc = parse("local a = 1;\n{ b: a, c(d):: d + a, [a]: [x for x in [a]] }");
    for node in reachable(&doc) {
        assert!(
            doc.annotations.env(node).is_some(),
            "node without environment: {:?}",
            doc.ast[node]
        );
    }
}

#[test_case(include_str!("../../../testdata/valid/deployment.jsonnet") ; "deployment")]
#[test_case(include_str!("../../../testdata/valid/comprehensions.jsonnet") ; "comprehensions")]
#[test_case(include_str!("../../../testdata/valid/methods.jsonnet") ; "methods")]
#[test_case(include_str!("../../../testdata/valid/mixins.jsonnet") ; "mixins")]
#[test_case(include_str!("../../../testdata/valid/functions.jsonnet") ; "functions")]
#[test_case(include_str!("../../../testdata/valid/super_and_computed.jsonnet") ; "super and computed")]
fn corpus_annotation_invariants(src: &str) {
    let doc = parse(src);
    for node in reachable(&doc) {
        assert!(doc.annotations.env(node).is_some());
        assert!(node == doc.root || doc.annotations.parent(node).is_some());
    }
}

#[test]
fn every_node_but_the_root_has_a_parent() {
    let doc = parse("local a = 1; { b: a }");
    for node in reachable(&doc) {
        if node == doc.root {
            assert!(doc.annotations.parent(node).is_none());
        } else {
            assert!(
                doc.annotations.parent(node).is_some(),
                "node without parent: {:?}",
                doc.ast[node]
            );
        }
    }
}

fn found_at(doc: &ParsedDocument, line: i32, column: i32) -> NodeId {
    match query::find_at(doc, Location::new(line, column)) {
        CursorTarget::Found(node) => node,
        other => panic!("expected a node, got {other:?}"),
    }
}

#[test]
fn local_binds_are_mutually_recursive() {
    let doc = parse("local even = odd, odd = even; even");
    // `odd` inside the first bind body resolves in its environment.
    let node = found_at(&doc, 1, 14);
    let env = doc.annotations.env(node).unwrap();
    let names = doc.annotations.envs.visible_bindings(env);
    assert!(names.contains_key("even"));
    assert!(names.contains_key("odd"));
}

#[test]
fn object_locals_are_visible_across_fields() {
    let doc = parse("{\n  local x = 3,\n  y: x,\n}");
    let x_use = found_at(&doc, 3, 6);
    assert!(matches!(doc.ast[x_use].kind, NodeKind::Identifier { .. }));
    let env = doc.annotations.env(x_use).unwrap();
    let binder = doc.annotations.envs.lookup(env, "x").unwrap();
    assert!(matches!(doc.ast[binder].kind, NodeKind::ObjectField(_)));
}

#[test]
fn function_params_scope_the_body_and_defaults() {
    let doc = parse("function(a, b=a) a + b");
    // `a` in the default of b.
    let default_use = found_at(&doc, 1, 15);
    let env = doc.annotations.env(default_use).unwrap();
    assert!(doc.annotations.envs.lookup(env, "a").is_some());
}

#[test]
fn comprehension_variable_scopes_clauses_to_its_right() {
    let doc = parse("[y for x in [1] for y in [x] if y > 0]");
    // `x` in the second for clause.
    let x_use = found_at(&doc, 1, 27);
    let env = doc.annotations.env(x_use).unwrap();
    assert!(doc.annotations.envs.lookup(env, "x").is_some());

    // `y` in the body.
    let body = found_at(&doc, 1, 2);
    let env = doc.annotations.env(body).unwrap();
    assert!(doc.annotations.envs.lookup(env, "y").is_some());
}

#[test]
fn dollar_points_to_the_outermost_object() {
    let doc = parse("{ a: { b: $ } }");
    let dollar = found_at(&doc, 1, 11);
    assert!(matches!(doc.ast[dollar].kind, NodeKind::Dollar));
    let root_object = doc.annotations.root_object(dollar).unwrap();
    assert_eq!(root_object, doc.root);
}

#[test]
fn cursor_inside_whitespace_keeps_context() {
    let doc = parse("{   a: 1 }");
    match query::find_at(&doc, Location::new(1, 3)) {
        CursorTarget::InsideWhitespace(ctx) => {
            assert_eq!(ctx.preceding.loc.begin, Location::new(1, 1));
            let enclosing = ctx.enclosing.unwrap();
            assert!(matches!(doc.ast[enclosing].kind, NodeKind::Object { .. }));
        }
        other => panic!("expected InsideWhitespace, got {other:?}"),
    }
}

#[test]
fn cursor_past_line_end() {
    let doc = parse("local x = 1;    \nx");
    match query::find_at(&doc, Location::new(1, 18)) {
        CursorTarget::AfterLineEnd(ctx) => {
            // The semicolon is the nearest preceding terminal.
            assert_eq!(ctx.preceding.loc.begin, Location::new(1, 12));
        }
        other => panic!("expected AfterLineEnd, got {other:?}"),
    }
}

#[test]
fn cursor_in_leading_fodder_is_outside() {
    let doc = parse("   1");
    assert!(matches!(
        query::find_at(&doc, Location::new(1, 1)),
        CursorTarget::Outside
    ));
}

#[test]
fn tightest_node_wins() {
    let doc = parse("{ a: [1, 22] }");
    let node = found_at(&doc, 1, 10);
    let NodeKind::LiteralNumber {
        original_string, ..
    } = &doc.ast[node].kind
    else {
        panic!("expected the inner literal, got {:?}", doc.ast[node].kind);
    };
    assert_eq!(original_string, "22");
}
