use crate::{mapper, Analyzer};
use jsonnet_hir::{resolve, CancellationToken, DocumentManager, NodeRef, ParsedDocument, Resolved};
use jsonnet_syntax::ast::{NodeId, NodeKind};
use lsp_types::Position;
use url::Url;

impl<D: DocumentManager> Analyzer<D> {
    /// Go-to-definition: variables jump to their binder, everything else to
    /// the node resolution lands on.
    #[must_use]
    pub fn definition(
        &self,
        url: &Url,
        position: Position,
        cancel: CancellationToken,
    ) -> Option<lsp_types::Location> {
        let doc = self.snapshot(url)?;
        let cursor = mapper::position_to_location(&doc.text, position);
        let node = NodeRef::at_cursor(&doc, cursor)?;

        if let Some(binder) = resolve::binder_of(&node.doc, node.node) {
            return Some(lsp_location(&node.doc, binder));
        }

        let resolved = self.with_resolver(cancel, |resolver| resolver.resolve(&node));
        match resolved {
            Resolved::Value(target) | Resolved::Param(target) | Resolved::Function(target) => {
                Some(lsp_location(&target.doc, target.node))
            }
            Resolved::Fields(_) | Resolved::Unresolvable(_) => None,
        }
    }

    /// Every use of the binding under the cursor, within its document.
    #[must_use]
    pub fn references(
        &self,
        url: &Url,
        position: Position,
        include_declaration: bool,
    ) -> Vec<lsp_types::Location> {
        let Some(doc) = self.snapshot(url) else {
            return Vec::new();
        };
        let cursor = mapper::position_to_location(&doc.text, position);
        let Some(node) = NodeRef::at_cursor(&doc, cursor) else {
            return Vec::new();
        };
        let Some(binder) = resolve::binder_of(&doc, node.node) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        if include_declaration {
            if let Some(name_node) = resolve::binder_name_node(&doc, binder) {
                out.push(lsp_location(&doc, name_node));
            }
        }
        for (candidate, data) in doc.ast.nodes() {
            if !matches!(data.kind, NodeKind::Var { .. }) {
                continue;
            }
            if resolve::binder_of(&doc, candidate) == Some(binder) {
                out.push(lsp_location(&doc, candidate));
            }
        }

        out.sort_by_key(|location| (location.range.start.line, location.range.start.character));
        out.dedup();
        out
    }
}

fn lsp_location(doc: &ParsedDocument, node: NodeId) -> lsp_types::Location {
    lsp_types::Location {
        uri: doc.url.clone(),
        range: mapper::range_to_lsp(&doc.text, &doc.ast[node].loc),
    }
}
