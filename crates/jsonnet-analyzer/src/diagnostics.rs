//! Conversion of analysis results into protocol diagnostics.

use crate::mapper;
use crate::Analyzer;
use jsonnet_hir::{
    CachedDocument, DocumentFailure, DocumentManager, FailedParsedDocument, ParsedDocument,
};
use jsonnet_syntax::ast::NodeKind;
use jsonnet_syntax::source::LocationRange;
use lsp_types::{Diagnostic, DiagnosticSeverity};
use url::Url;

impl<D: DocumentManager> Analyzer<D> {
    /// Diagnostics for the latest cached state of a document: the static
    /// error when it does not parse, unresolved-import warnings when it
    /// does.
    #[must_use]
    pub fn diagnostics(&self, url: &Url) -> Vec<Diagnostic> {
        let cached = {
            let service = self.service.lock();
            service.get(url)
        };
        match cached {
            Some(CachedDocument::Ok(doc)) => self.import_diagnostics(&doc),
            Some(CachedDocument::Failed(failed)) => vec![syntax_diagnostic(&failed)],
            None => Vec::new(),
        }
    }

    fn import_diagnostics(&self, doc: &ParsedDocument) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (_, data) in doc.ast.nodes() {
            let file = match &data.kind {
                NodeKind::Import { file } | NodeKind::ImportStr { file } => *file,
                _ => continue,
            };
            let NodeKind::LiteralString { value, .. } = &doc.ast[file].kind else {
                continue;
            };
            let specifier = jsonnet_syntax::util::unescape(value);
            if self
                .imports
                .resolve(&specifier, &doc.url, &self.documents)
                .is_ok()
            {
                continue;
            }
            diagnostics.push(diagnostic(
                &doc.text,
                &data.loc,
                DiagnosticSeverity::WARNING,
                format!("could not resolve import: {specifier}"),
            ));
        }
        diagnostics
    }
}

fn syntax_diagnostic(failed: &FailedParsedDocument) -> Diagnostic {
    let (loc, message) = match &failed.failure {
        DocumentFailure::Lex { error, .. } => (&error.loc, error.kind.to_string()),
        DocumentFailure::Parse { error, .. } => (&error.loc, error.kind.to_string()),
    };
    diagnostic(&failed.text, loc, DiagnosticSeverity::ERROR, message)
}

fn diagnostic(
    text: &str,
    loc: &LocationRange,
    severity: DiagnosticSeverity,
    message: String,
) -> Diagnostic {
    Diagnostic {
        range: mapper::range_to_lsp(text, loc),
        severity: Some(severity),
        code: None,
        code_description: None,
        source: Some("Jsonnet".into()),
        message,
        related_information: None,
        tags: None,
        data: None,
    }
}
