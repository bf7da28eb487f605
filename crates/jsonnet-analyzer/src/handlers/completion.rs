use crate::{mapper, Analyzer};
use jsonnet_hir::{
    annotate, fmt, query, CachedDocument, CancellationToken, CursorTarget, DocumentFailure,
    DocumentManager, NodeRef, ParsedDocument,
};
use jsonnet_syntax::ast::{NodeId, NodeKind};
use jsonnet_syntax::lexer::TokenKind;
use jsonnet_syntax::source::Location;
use lsp_types::{CompletionItem, CompletionItemKind, Documentation, Position};
use std::sync::Arc;
use url::Url;

impl<D: DocumentManager> Analyzer<D> {
    /// Completion items at a position: visible variables, or the fields of
    /// an indexed object. Empty inside strings, numbers and comments.
    #[must_use]
    pub fn complete(
        &self,
        url: &Url,
        position: Position,
        cancel: CancellationToken,
    ) -> Vec<CompletionItem> {
        let cached = {
            let service = self.service.lock();
            service.get(url)
        };
        match cached {
            Some(CachedDocument::Ok(doc)) => {
                let cursor = mapper::position_to_location(&doc.text, position);
                self.complete_in(&doc, cursor, cancel)
            }
            Some(CachedDocument::Failed(failed)) => {
                // A broken document can still complete through the partial
                // tree the parser salvaged.
                let DocumentFailure::Parse { tokens, ast, error } = &failed.failure else {
                    return Vec::new();
                };
                let Some(rest) = error.rest else {
                    return Vec::new();
                };
                let annotations = annotate::annotate(ast, rest);
                let doc = Arc::new(ParsedDocument {
                    url: failed.url.clone(),
                    text: failed.text.clone(),
                    version: failed.version,
                    tokens: tokens.clone(),
                    ast: ast.clone(),
                    root: rest,
                    annotations,
                });
                self.field_completions(&NodeRef::new(doc, rest), cancel)
            }
            None => Vec::new(),
        }
    }

    fn complete_in(
        &self,
        doc: &Arc<ParsedDocument>,
        cursor: Location,
        cancel: CancellationToken,
    ) -> Vec<CompletionItem> {
        if let Some(token) = query::token_at(&doc.tokens, cursor) {
            if matches!(
                token.kind,
                TokenKind::Number
                    | TokenKind::StringDouble
                    | TokenKind::StringSingle
                    | TokenKind::StringBlock
                    | TokenKind::CommentCpp
            ) {
                return Vec::new();
            }
        }
        if in_comment(&doc.text, cursor) {
            return Vec::new();
        }

        match query::find_at(doc, cursor) {
            CursorTarget::Found(node) => {
                if let Some(parent) = doc.annotations.parent(node) {
                    if let NodeKind::IndexDot { target, id } = &doc.ast[parent].kind {
                        if *id == node {
                            let target_ref = NodeRef::new(Arc::clone(doc), *target);
                            return self.field_completions(&target_ref, cancel);
                        }
                    }
                }
                // Standing on the dot itself completes the target's fields.
                if let NodeKind::IndexDot { target, .. } = &doc.ast[node].kind {
                    if query::token_at(&doc.tokens, cursor)
                        .map_or(false, |t| t.kind == TokenKind::Dot)
                    {
                        let target_ref = NodeRef::new(Arc::clone(doc), *target);
                        return self.field_completions(&target_ref, cancel);
                    }
                }
                env_completions(doc, node)
            }
            CursorTarget::AfterLineEnd(ctx) | CursorTarget::InsideWhitespace(ctx) => {
                match ctx.enclosing {
                    Some(node) => env_completions(doc, node),
                    None => Vec::new(),
                }
            }
            CursorTarget::Outside => Vec::new(),
        }
    }

    fn field_completions(
        &self,
        target: &NodeRef,
        cancel: CancellationToken,
    ) -> Vec<CompletionItem> {
        let fields = self.with_resolver(cancel, |resolver| resolver.resolve_fields(target));
        let Some(fields) = fields else {
            return Vec::new();
        };
        fields
            .into_iter()
            .map(|(label, field_ref)| {
                let documentation = field_ref
                    .as_field()
                    .and_then(|field| fmt::heading_docs(&field_ref.doc, field))
                    .map(Documentation::String);
                CompletionItem {
                    label,
                    kind: Some(CompletionItemKind::FIELD),
                    documentation,
                    ..CompletionItem::default()
                }
            })
            .collect()
    }
}

fn env_completions(doc: &Arc<ParsedDocument>, node: NodeId) -> Vec<CompletionItem> {
    let Some(env) = doc.annotations.env(node) else {
        return Vec::new();
    };
    doc.annotations
        .envs
        .visible_bindings(env)
        .into_iter()
        .map(|(label, binder)| {
            let documentation = match &doc.ast[binder].kind {
                NodeKind::ObjectField(field) => {
                    fmt::heading_docs(doc, field).map(Documentation::String)
                }
                _ => None,
            };
            CompletionItem {
                label,
                kind: Some(CompletionItemKind::VARIABLE),
                documentation,
                ..CompletionItem::default()
            }
        })
        .collect()
}

/// Whether the cursor sits in line-comment text. Fodder comments carry no
/// ranges, so this walks the raw line, skipping string literals.
fn in_comment(text: &str, cursor: Location) -> bool {
    let Some(line) = text
        .lines()
        .nth(usize::try_from(cursor.line).unwrap_or(1).saturating_sub(1))
    else {
        return false;
    };
    let before_cursor = usize::try_from(cursor.column).unwrap_or(1).saturating_sub(1);

    let mut in_string: Option<char> = None;
    let mut previous = '\0';
    for (i, c) in line.chars().enumerate() {
        if i >= before_cursor {
            break;
        }
        match in_string {
            Some(quote) => {
                if c == quote && previous != '\\' {
                    in_string = None;
                }
            }
            None => match c {
                '"' | '\'' => in_string = Some(c),
                '#' => return true,
                '/' if previous == '/' => return true,
                _ => {}
            },
        }
        previous = c;
    }
    false
}
