use crate::{mapper, Analyzer};
use jsonnet_hir::{fmt, resolve, CancellationToken, DocumentManager, NodeRef, Resolved};
use jsonnet_syntax::ast::{NodeId, NodeKind};
use lsp_types::{Hover, HoverContents, LanguageString, MarkedString, Position};
use url::Url;

impl<D: DocumentManager> Analyzer<D> {
    /// Hover contents: a `jsonnet`-tagged signature first, heading-comment
    /// documentation second.
    #[must_use]
    pub fn hover(
        &self,
        url: &Url,
        position: Position,
        cancel: CancellationToken,
    ) -> Option<Hover> {
        let doc = self.snapshot(url)?;
        let cursor = mapper::position_to_location(&doc.text, position);
        let node = NodeRef::at_cursor(&doc, cursor)?;

        let (signature, docs) = self.describe(&node, cancel)?;

        let mut contents = vec![MarkedString::LanguageString(LanguageString {
            language: "jsonnet".to_string(),
            value: signature,
        })];
        if let Some(docs) = docs {
            contents.push(MarkedString::String(docs));
        }

        Some(Hover {
            contents: HoverContents::Array(contents),
            range: Some(mapper::range_to_lsp(
                &node.doc.text,
                &node.doc.ast[node.node].loc,
            )),
        })
    }

    /// Signature and documentation of whatever the node denotes.
    fn describe(
        &self,
        node: &NodeRef,
        cancel: CancellationToken,
    ) -> Option<(String, Option<String>)> {
        let doc = &node.doc;
        let parent = doc.annotations.parent(node.node);

        // A field's own name: the field signature, no resolution needed.
        if let Some(parent) = parent {
            if let NodeKind::ObjectField(field) = &doc.ast[parent].kind {
                if field.id == Some(node.node) || field.expr1 == Some(node.node) {
                    let signature = fmt::field_signature(doc, field)?;
                    return Some((signature, fmt::heading_docs(doc, field)));
                }
            }

            // The id of `target.id`: show the field it selects.
            if let NodeKind::IndexDot { target, id } = &doc.ast[parent].kind {
                if *id == node.node {
                    if let Some(described) =
                        self.describe_selected_field(node, *target, cancel.clone())
                    {
                        return Some(described);
                    }
                }
            }
        }

        // A variable use, or a binding's own name: describe the binder.
        if let Some(binder) = resolve::binder_of(doc, node.node) {
            let name = resolve::binder_name_node(doc, binder)
                .and_then(|name_node| doc.ast.identifier_name(name_node))
                .map(ToString::to_string);
            if let Some(name) = name {
                return Some(self.describe_binder(node, &name, binder, cancel));
            }
        }

        let resolved = self.with_resolver(cancel, |resolver| resolver.resolve(node));
        let signature = fmt::signature_of(&resolved)?;
        let docs = resolved_field_docs(&resolved);
        Some((signature, docs))
    }

    fn describe_selected_field(
        &self,
        node: &NodeRef,
        target: NodeId,
        cancel: CancellationToken,
    ) -> Option<(String, Option<String>)> {
        let name = node.doc.ast.identifier_name(node.node)?.to_string();
        let target_ref = node.with(target);
        let fields =
            self.with_resolver(cancel, |resolver| resolver.resolve_fields(&target_ref))?;
        let field_ref = fields.get(&name)?;
        let field = field_ref.as_field()?;
        let signature = fmt::field_signature(&field_ref.doc, field)?;
        Some((signature, fmt::heading_docs(&field_ref.doc, field)))
    }

    fn describe_binder(
        &self,
        node: &NodeRef,
        name: &str,
        binder: NodeId,
        cancel: CancellationToken,
    ) -> (String, Option<String>) {
        let doc = &node.doc;
        let binder_ref = node.with(binder);
        let docs = binder_ref
            .as_field()
            .and_then(|field| fmt::heading_docs(doc, field));

        let signature = match &doc.ast[binder].kind {
            NodeKind::FunctionParam { .. } => format!("(parameter) {name}"),
            _ if is_function_binder(&binder_ref) => {
                fmt::signature_of(&Resolved::Function(binder_ref.clone()))
                    .unwrap_or_else(|| format!("(function) {name}"))
            }
            _ => {
                // Chase the bound value; literals read well inline.
                let resolved = self.with_resolver(cancel, |resolver| resolver.resolve(node));
                match fmt::signature_of(&resolved) {
                    Some(value) if !value.starts_with('(') => {
                        format!("(local) {name} = {value}")
                    }
                    Some(value) => value,
                    None => format!("(local) {name}"),
                }
            }
        };
        (signature, docs)
    }
}

fn is_function_binder(binder: &NodeRef) -> bool {
    match binder.kind() {
        NodeKind::LocalBind { function_sugar, .. } => *function_sugar,
        NodeKind::ObjectField(field) => field.method_sugar,
        _ => false,
    }
}

fn resolved_field_docs(resolved: &Resolved) -> Option<String> {
    let at = match resolved {
        Resolved::Value(at) | Resolved::Function(at) => at,
        _ => return None,
    };
    let field = at.as_field()?;
    fmt::heading_docs(&at.doc, field)
}
