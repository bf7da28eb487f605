use jsonnet_analyzer::{Analyzer, AnalyzerConfig, MemoryDocumentManager};
use jsonnet_hir::CancellationToken;
use lsp_types::{
    CompletionItemKind, DiagnosticSeverity, HoverContents, MarkedString, Position, SymbolKind,
};
use url::Url;

fn url(name: &str) -> Url {
    Url::parse(&format!("file:///{name}")).unwrap()
}

fn analyzer() -> (Analyzer<MemoryDocumentManager>, MemoryDocumentManager) {
    let documents = MemoryDocumentManager::new();
    let analyzer = Analyzer::new(documents.clone(), AnalyzerConfig::default());
    (analyzer, documents)
}

fn open(
    analyzer: &Analyzer<MemoryDocumentManager>,
    documents: &MemoryDocumentManager,
    url: &Url,
    text: &str,
    version: i32,
) {
    documents.insert(url, text, Some(version));
    analyzer.document_opened(url, text, Some(version));
}

#[test]
fn hover_shows_field_signatures() {
    let (analyzer, documents) = analyzer();
    let uri = url("hover.jsonnet");
    open(
        &analyzer,
        &documents,
        &uri,
        "{\n  // the port to listen on\n  port:: 8080,\n}",
        1,
    );

    // Hovering the field name itself.
    let hover = analyzer
        .hover(&uri, Position::new(2, 3), CancellationToken::new())
        .expect("expected hover contents");
    let HoverContents::Array(contents) = hover.contents else {
        panic!("expected array contents");
    };
    let MarkedString::LanguageString(signature) = &contents[0] else {
        panic!("expected a language string first");
    };
    assert_eq!(signature.language, "jsonnet");
    assert_eq!(signature.value, "(field) port::");
    let MarkedString::String(docs) = &contents[1] else {
        panic!("expected documentation second");
    };
    assert_eq!(docs, "the port to listen on");
}

#[test]
fn hover_on_variable_shows_binding_and_value() {
    let (analyzer, documents) = analyzer();
    let uri = url("var.jsonnet");
    open(
        &analyzer,
        &documents,
        &uri,
        "{\n  local x = 3,\n  y: x,\n}",
        1,
    );

    let hover = analyzer
        .hover(&uri, Position::new(2, 5), CancellationToken::new())
        .expect("expected hover contents");
    let HoverContents::Array(contents) = hover.contents else {
        panic!("expected array contents");
    };
    let MarkedString::LanguageString(signature) = &contents[0] else {
        panic!("expected a language string first");
    };
    assert_eq!(signature.value, "(local) x = 3");
}

#[test]
fn completion_lists_mixin_fields() {
    let (analyzer, documents) = analyzer();
    let uri = url("mixin.jsonnet");
    open(
        &analyzer,
        &documents,
        &uri,
        "local foo = {bar: \"bar\"} + {baz: \"baz\"}; foo.b",
        1,
    );

    let items = analyzer.complete(&uri, Position::new(0, 46), CancellationToken::new());
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, vec!["bar", "baz"]);
    assert!(items
        .iter()
        .all(|i| i.kind == Some(CompletionItemKind::FIELD)));
}

#[test]
fn completion_works_on_broken_documents() {
    let (analyzer, documents) = analyzer();
    let uri = url("typing.jsonnet");
    open(
        &analyzer,
        &documents,
        &uri,
        "local foo = {bar: \"bar\"} + {baz: \"baz\"}; foo.",
        1,
    );

    let items = analyzer.complete(&uri, Position::new(0, 46), CancellationToken::new());
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, vec!["bar", "baz"]);
}

#[test]
fn completion_lists_visible_variables() {
    let (analyzer, documents) = analyzer();
    let uri = url("vars.jsonnet");
    open(
        &analyzer,
        &documents,
        &uri,
        "local alpha = 1, beta = 2;\n{ a: alpha }",
        1,
    );

    // Inside the whitespace after `a:`.
    let items = analyzer.complete(&uri, Position::new(1, 4), CancellationToken::new());
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    assert!(labels.contains(&"alpha"), "missing alpha in {labels:?}");
    assert!(labels.contains(&"beta"), "missing beta in {labels:?}");
    assert!(items
        .iter()
        .all(|i| i.kind == Some(CompletionItemKind::VARIABLE)));
}

#[test]
fn completion_is_empty_in_comments_and_strings() {
    let (analyzer, documents) = analyzer();
    let uri = url("quiet.jsonnet");
    open(
        &analyzer,
        &documents,
        &uri,
        "{ a: \"text\" } // trailing note",
        1,
    );

    // Inside the string literal.
    assert!(analyzer
        .complete(&uri, Position::new(0, 8), CancellationToken::new())
        .is_empty());
    // Inside the comment.
    assert!(analyzer
        .complete(&uri, Position::new(0, 20), CancellationToken::new())
        .is_empty());
}

#[test]
fn definition_jumps_across_files() {
    let (analyzer, documents) = analyzer();
    let a = url("a.jsonnet");
    let b = url("b.jsonnet");
    open(&analyzer, &documents, &a, "{ foo: 99 }", 1);
    open(&analyzer, &documents, &b, "(import \"a.jsonnet\").foo", 1);

    let location = analyzer
        .definition(&b, Position::new(0, 22), CancellationToken::new())
        .expect("expected a definition");
    assert_eq!(location.uri, a);
    assert_eq!(location.range.start.line, 0);
}

#[test]
fn syntax_errors_become_error_diagnostics() {
    let (analyzer, documents) = analyzer();
    let uri = url("broken.jsonnet");
    open(&analyzer, &documents, &uri, "{foo: 1, foo: 2}", 1);

    let diagnostics = analyzer.diagnostics(&uri);
    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.severity, Some(DiagnosticSeverity::ERROR));
    assert_eq!(diagnostic.source.as_deref(), Some("Jsonnet"));
    assert_eq!(diagnostic.message, "Duplicate field: foo");
    // 0-based protocol range of the second `foo`.
    assert_eq!(diagnostic.range.start.line, 0);
    assert_eq!(diagnostic.range.start.character, 9);
    assert_eq!(diagnostic.range.end.character, 12);
}

#[test]
fn unresolved_imports_become_warnings() {
    let (analyzer, documents) = analyzer();
    let uri = url("imports.jsonnet");
    open(&analyzer, &documents, &uri, "import \"gone.jsonnet\"", 1);

    let diagnostics = analyzer.diagnostics(&uri);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].severity,
        Some(DiagnosticSeverity::WARNING)
    );
    assert!(diagnostics[0].message.contains("gone.jsonnet"));
}

#[test]
fn document_symbols_outline_nested_objects() {
    let (analyzer, documents) = analyzer();
    let uri = url("outline.jsonnet");
    open(
        &analyzer,
        &documents,
        &uri,
        "{\n  name: \"a\",\n  nested: { inner: 1 },\n  hidden:: 2,\n  method(x):: x,\n}",
        1,
    );

    let symbols = analyzer.document_symbols(&uri);
    let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["name", "nested", "hidden", "method"]);

    let nested = &symbols[1];
    assert_eq!(nested.kind, SymbolKind::FIELD);
    let children = nested.children.as_ref().expect("nested object children");
    assert_eq!(children[0].name, "inner");

    assert_eq!(symbols[3].kind, SymbolKind::METHOD);
}

#[test]
fn references_cover_declaration_and_uses() {
    let (analyzer, documents) = analyzer();
    let uri = url("refs.jsonnet");
    open(&analyzer, &documents, &uri, "local x = 1;\nx + x", 1);

    let refs = analyzer.references(&uri, Position::new(1, 0), true);
    assert_eq!(refs.len(), 3);
    assert!(refs.iter().all(|r| r.uri == uri));
    // Declaration first, then the uses in source order.
    assert_eq!(refs[0].range.start, Position::new(0, 6));
    assert_eq!(refs[1].range.start, Position::new(1, 0));
    assert_eq!(refs[2].range.start, Position::new(1, 4));

    let without_declaration = analyzer.references(&uri, Position::new(1, 0), false);
    assert_eq!(without_declaration.len(), 2);
}

#[test]
fn folding_ranges_cover_multi_line_containers() {
    let (analyzer, documents) = analyzer();
    let uri = url("folding.jsonnet");
    open(
        &analyzer,
        &documents,
        &uri,
        "{\n  items: [\n    1,\n    2,\n  ],\n  flat: { a: 1 },\n}",
        1,
    );

    let ranges = analyzer.folding_ranges(&uri);
    // The outer object and the array fold; the single-line object does not.
    assert_eq!(ranges.len(), 2);
    assert_eq!(ranges[0].start_line, 0);
    assert_eq!(ranges[0].end_line, 6);
    assert_eq!(ranges[1].start_line, 1);
    assert_eq!(ranges[1].end_line, 4);
}

#[test]
fn features_survive_transient_syntax_errors() {
    let (analyzer, documents) = analyzer();
    let uri = url("transient.jsonnet");
    open(&analyzer, &documents, &uri, "{\n  local x = 3,\n  y: x,\n}", 1);
    // A newer, broken edit.
    open(&analyzer, &documents, &uri, "{\n  local x = 3,\n  y: x,\n", 2);

    // Hover still answers from the last successful parse.
    let hover = analyzer.hover(&uri, Position::new(2, 5), CancellationToken::new());
    assert!(hover.is_some());

    // Closing drops all state.
    analyzer.document_closed(&uri);
    assert!(analyzer
        .hover(&uri, Position::new(2, 5), CancellationToken::new())
        .is_none());
}
