use jsonnet_hir::{
    CachedDocument, CancellationToken, CompilerService, DocumentManager, DocumentText, Error,
    ImportResolver, NodeRef, ParsedDocument, Resolved, Resolver, Unresolvable,
};
use jsonnet_syntax::ast::NodeKind;
use jsonnet_syntax::source::Location;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

#[derive(Default)]
struct Docs(HashMap<Url, String>);

impl Docs {
    fn insert(&mut self, url: &Url, text: &str) {
        self.0.insert(url.clone(), text.to_string());
    }
}

impl DocumentManager for Docs {
    fn get(&self, url: &Url) -> Result<DocumentText, Error> {
        self.0
            .get(url)
            .map(|text| DocumentText {
                text: text.clone(),
                version: None,
            })
            .ok_or_else(|| Error::UnknownDocument(url.clone()))
    }
}

fn url(name: &str) -> Url {
    Url::parse(&format!("file:///{name}")).unwrap()
}

fn open(service: &mut CompilerService, url: &Url, text: &str) -> Arc<ParsedDocument> {
    match service.cache(url, text, None) {
        CachedDocument::Ok(doc) => doc,
        CachedDocument::Failed(failed) => {
            panic!("document failed to parse: {}", failed.message())
        }
    }
}

fn at(doc: &Arc<ParsedDocument>, line: i32, column: i32) -> NodeRef {
    NodeRef::at_cursor(doc, Location::new(line, column)).expect("no node under cursor")
}

#[test]
fn hover_on_object_local_resolves_to_literal() {
    let mut service = CompilerService::new();
    let docs = Docs::default();
    let imports = ImportResolver::default();

    let a = url("hover.jsonnet");
    let doc = open(&mut service, &a, "{\n  local x = 3,\n  y: x,\n}");

    let mut resolver = Resolver::new(&mut service, &docs, &imports, CancellationToken::new());
    let resolved = resolver.resolve(&at(&doc, 3, 6));

    let Resolved::Value(value) = resolved else {
        panic!("expected a value, got {resolved:?}");
    };
    let NodeKind::LiteralNumber {
        original_string, ..
    } = value.kind()
    else {
        panic!("expected a number literal");
    };
    assert_eq!(original_string, "3");
    assert_eq!(value.doc.ast[value.node].loc.begin, Location::new(2, 13));
    assert_eq!(value.doc.ast[value.node].loc.end, Location::new(2, 14));
}

#[test]
fn mixin_fields_merge_with_right_override() {
    let mut service = CompilerService::new();
    let docs = Docs::default();
    let imports = ImportResolver::default();

    let a = url("mixin.jsonnet");
    let doc = open(
        &mut service,
        &a,
        "local foo = {bar: \"bar\"} + {baz: \"baz\"}; foo.b",
    );

    // Cursor just after the `b`.
    let node = at(&doc, 1, 47);
    let parent = doc.annotations.parent(node.node).unwrap();
    let NodeKind::IndexDot { target, .. } = &doc.ast[parent].kind else {
        panic!("expected an index");
    };

    let mut resolver = Resolver::new(&mut service, &docs, &imports, CancellationToken::new());
    let fields = resolver
        .resolve_fields(&node.with(*target))
        .expect("expected fields");
    let labels: Vec<&str> = fields.keys().map(String::as_str).collect();
    assert_eq!(labels, vec!["bar", "baz"]);
}

#[test]
fn override_keeps_the_right_hand_field() {
    let mut service = CompilerService::new();
    let docs = Docs::default();
    let imports = ImportResolver::default();

    let a = url("override.jsonnet");
    let doc = open(&mut service, &a, "({a: 1} + {a: 2}).a");

    let mut resolver = Resolver::new(&mut service, &docs, &imports, CancellationToken::new());
    let resolved = resolver.resolve(&at(&doc, 1, 19));
    let Resolved::Value(value) = resolved else {
        panic!("expected a value, got {resolved:?}");
    };
    let NodeKind::LiteralNumber {
        original_string, ..
    } = value.kind()
    else {
        panic!("expected a number literal");
    };
    assert_eq!(original_string, "2");
}

#[test]
fn import_is_chased_across_documents() {
    let mut service = CompilerService::new();
    let mut docs = Docs::default();
    let imports = ImportResolver::default();

    let a = url("a.jsonnet");
    let b = url("b.jsonnet");
    docs.insert(&a, "{ foo: 99 }");
    docs.insert(&b, "(import \"a.jsonnet\").foo");

    let doc = open(&mut service, &b, "(import \"a.jsonnet\").foo");
    let node = at(&doc, 1, 22);

    let mut resolver = Resolver::new(&mut service, &docs, &imports, CancellationToken::new());
    let resolved = resolver.resolve(&node);
    let Resolved::Value(value) = resolved else {
        panic!("expected a value, got {resolved:?}");
    };
    assert_eq!(value.doc.url, a);
    let NodeKind::LiteralNumber { value: number, .. } = value.kind() else {
        panic!("expected a number literal");
    };
    assert!((number - 99.0).abs() < f64::EPSILON);

    // `foo` is reached through the import, not the environment.
    let env = doc.annotations.env(node.node).unwrap();
    assert!(!doc
        .annotations
        .envs
        .visible_bindings(env)
        .contains_key("foo"));
}

#[test]
fn imports_strip_enclosing_locals() {
    let mut service = CompilerService::new();
    let mut docs = Docs::default();
    let imports = ImportResolver::default();

    let lib = url("lib.jsonnet");
    let usage = url("use.jsonnet");
    docs.insert(&lib, "local hidden = 1;\n{ value: hidden }");
    docs.insert(&usage, "(import \"lib.jsonnet\").value");

    let doc = open(&mut service, &usage, "(import \"lib.jsonnet\").value");
    let node = at(&doc, 1, 24);

    let mut resolver = Resolver::new(&mut service, &docs, &imports, CancellationToken::new());
    let resolved = resolver.resolve(&node);
    let Resolved::Value(value) = resolved else {
        panic!("expected a value, got {resolved:?}");
    };
    let NodeKind::LiteralNumber {
        original_string, ..
    } = value.kind()
    else {
        panic!("expected the bound literal");
    };
    assert_eq!(original_string, "1");
}

#[test]
fn missing_import_is_reported() {
    let mut service = CompilerService::new();
    let docs = Docs::default();
    let imports = ImportResolver::default();

    let a = url("missing.jsonnet");
    let doc = open(&mut service, &a, "(import \"nowhere.jsonnet\").x");
    let node = at(&doc, 1, 28);

    let mut resolver = Resolver::new(&mut service, &docs, &imports, CancellationToken::new());
    let resolved = resolver.resolve(&node);
    assert!(matches!(resolved, Resolved::Unresolvable(_)));
}

#[test]
fn library_path_is_searched() {
    let mut service = CompilerService::new();
    let mut docs = Docs::default();
    let imports = ImportResolver::new(vec![url("lib/")]);

    let shared = url("lib/shared.jsonnet");
    let user = url("app/main.jsonnet");
    docs.insert(&shared, "{ tag: \"v1\" }");
    docs.insert(&user, "(import \"shared.jsonnet\").tag");

    let doc = open(&mut service, &user, "(import \"shared.jsonnet\").tag");
    let node = at(&doc, 1, 28);

    let mut resolver = Resolver::new(&mut service, &docs, &imports, CancellationToken::new());
    let resolved = resolver.resolve(&node);
    let Resolved::Value(value) = resolved else {
        panic!("expected a value, got {resolved:?}");
    };
    assert_eq!(value.doc.url, shared);
}

#[test]
fn self_reference_cycle_terminates() {
    let mut service = CompilerService::new();
    let docs = Docs::default();
    let imports = ImportResolver::default();

    let a = url("cycle.jsonnet");
    let doc = open(&mut service, &a, "local foo = foo; foo");
    let node = at(&doc, 1, 18);

    let mut resolver = Resolver::new(&mut service, &docs, &imports, CancellationToken::new());
    let resolved = resolver.resolve(&node);
    assert!(matches!(
        resolved,
        Resolved::Unresolvable(Unresolvable::Cycle)
    ));
}

#[test]
fn unbound_variable_is_reported() {
    let mut service = CompilerService::new();
    let docs = Docs::default();
    let imports = ImportResolver::default();

    let a = url("unbound.jsonnet");
    let doc = open(&mut service, &a, "nope");
    let node = at(&doc, 1, 1);

    let mut resolver = Resolver::new(&mut service, &docs, &imports, CancellationToken::new());
    let resolved = resolver.resolve(&node);
    assert!(matches!(
        resolved,
        Resolved::Unresolvable(Unresolvable::UnboundVariable(name)) if name == "nope"
    ));
}

#[test]
fn function_parameter_is_a_free_variable() {
    let mut service = CompilerService::new();
    let docs = Docs::default();
    let imports = ImportResolver::default();

    let a = url("param.jsonnet");
    let doc = open(&mut service, &a, "function(a) a + 1");
    let node = at(&doc, 1, 13);

    let mut resolver = Resolver::new(&mut service, &docs, &imports, CancellationToken::new());
    let resolved = resolver.resolve(&node);
    let Resolved::Param(param) = resolved else {
        panic!("expected a parameter, got {resolved:?}");
    };
    assert!(matches!(param.kind(), NodeKind::FunctionParam { .. }));
}

#[test]
fn sugared_bind_resolves_to_a_function() {
    let mut service = CompilerService::new();
    let docs = Docs::default();
    let imports = ImportResolver::default();

    let a = url("fn.jsonnet");
    let doc = open(&mut service, &a, "local f(x) = x; f");
    let node = at(&doc, 1, 17);

    let mut resolver = Resolver::new(&mut service, &docs, &imports, CancellationToken::new());
    let resolved = resolver.resolve(&node);
    assert!(matches!(resolved, Resolved::Function(_)));
}

#[test]
fn cancelled_resolution_reports_cancellation() {
    let mut service = CompilerService::new();
    let docs = Docs::default();
    let imports = ImportResolver::default();

    let a = url("cancel.jsonnet");
    let doc = open(&mut service, &a, "local x = 1; x");
    let node = at(&doc, 1, 14);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut resolver = Resolver::new(&mut service, &docs, &imports, cancel);
    let resolved = resolver.resolve(&node);
    assert!(matches!(
        resolved,
        Resolved::Unresolvable(Unresolvable::Cancelled)
    ));
}

#[test]
fn cache_is_idempotent_per_version() {
    let mut service = CompilerService::new();
    let a = url("versions.jsonnet");

    let first = service.cache(&a, "1", Some(7));
    let second = service.cache(&a, "ignored", Some(7));
    let (CachedDocument::Ok(first), CachedDocument::Ok(second)) = (first, second) else {
        panic!("expected successful parses");
    };
    assert!(Arc::ptr_eq(&first, &second));

    let third = service.cache(&a, "2", Some(8));
    let CachedDocument::Ok(third) = third else {
        panic!("expected a successful parse");
    };
    assert!(!Arc::ptr_eq(&first, &third));
}

#[test]
fn last_success_survives_failed_edits() {
    let mut service = CompilerService::new();
    let a = url("broken.jsonnet");

    service.cache(&a, "{ a: 1 }", Some(1));
    let failed = service.cache(&a, "{ a: 1", Some(2));
    assert!(matches!(failed, CachedDocument::Failed(_)));

    let last = service.get_last_success(&a).expect("last success kept");
    assert_eq!(last.version, Some(1));

    service.delete(&a);
    assert!(service.get_last_success(&a).is_none());
    assert!(service.get(&a).is_none());
}
