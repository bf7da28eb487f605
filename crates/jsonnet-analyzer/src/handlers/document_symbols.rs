use crate::{mapper, Analyzer};
use jsonnet_hir::{fmt, DocumentManager, ParsedDocument};
use jsonnet_syntax::ast::{NodeId, NodeKind, ObjectFieldKind};
use lsp_types::{DocumentSymbol, SymbolKind};
use url::Url;

impl<D: DocumentManager> Analyzer<D> {
    /// The outline of a document: its top-level object fields, nested
    /// object values as children.
    #[must_use]
    pub fn document_symbols(&self, url: &Url) -> Vec<DocumentSymbol> {
        let Some(doc) = self.snapshot(url) else {
            return Vec::new();
        };
        let mut node = doc.root;
        while let NodeKind::Local { body, .. } = &doc.ast[node].kind {
            node = *body;
        }
        object_symbols(&doc, node)
    }
}

fn object_symbols(doc: &ParsedDocument, node: NodeId) -> Vec<DocumentSymbol> {
    let fields = match &doc.ast[node].kind {
        NodeKind::Object { fields, .. } | NodeKind::ObjectComp { fields, .. } => fields,
        _ => return Vec::new(),
    };
    fields
        .iter()
        .filter_map(|field| field_symbol(doc, *field))
        .collect()
}

#[allow(deprecated)]
fn field_symbol(doc: &ParsedDocument, node: NodeId) -> Option<DocumentSymbol> {
    let NodeKind::ObjectField(field) = &doc.ast[node].kind else {
        return None;
    };
    // Asserts and computed keys have no name to show.
    let name = doc.ast.field_name(field)?.to_string();

    let kind = match field.kind {
        ObjectFieldKind::Local => {
            if field.method_sugar {
                SymbolKind::FUNCTION
            } else {
                SymbolKind::VARIABLE
            }
        }
        _ if field.method_sugar => SymbolKind::METHOD,
        _ => SymbolKind::FIELD,
    };

    let children = field
        .expr2
        .map(|value| object_symbols(doc, value))
        .filter(|children| !children.is_empty());

    let selection = field
        .id
        .or(field.expr1)
        .map_or(&doc.ast[node].loc, |name_node| &doc.ast[name_node].loc);

    Some(DocumentSymbol {
        name,
        detail: fmt::field_signature(doc, field),
        kind,
        tags: None,
        deprecated: None,
        range: mapper::range_to_lsp(&doc.text, &doc.ast[node].loc),
        selection_range: mapper::range_to_lsp(&doc.text, selection),
        children,
    })
}
