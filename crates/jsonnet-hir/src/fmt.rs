//! Signature and documentation strings for hover tooltips.

use crate::document::ParsedDocument;
use crate::resolve::{NodeRef, Resolved};
use itertools::Itertools;
use jsonnet_syntax::ast::{NodeId, NodeKind, ObjectField, ObjectFieldKind};
use jsonnet_syntax::source;

/// Format the signature of a resolved entity, e.g. `(field) name:`,
/// `(method) name(a, b)::`, `(parameter) x`.
#[must_use]
pub fn signature_of(resolved: &Resolved) -> Option<String> {
    match resolved {
        Resolved::Value(at) => value_signature(at),
        Resolved::Param(at) => {
            let NodeKind::FunctionParam { id, .. } = at.kind() else {
                return None;
            };
            let name = at.doc.ast.identifier_name(*id)?;
            Some(format!("(parameter) {name}"))
        }
        Resolved::Function(at) => function_signature(at),
        Resolved::Fields(_) | Resolved::Unresolvable(_) => None,
    }
}

/// Format the signature of an object field, e.g. `(field) port:` or
/// `(method) target(env)::`.
#[must_use]
pub fn field_signature(doc: &ParsedDocument, field: &ObjectField) -> Option<String> {
    let name = doc.ast.field_name(field)?;
    let marker = if field.super_sugar {
        format!("+{}", field.hide.marker())
    } else {
        field.hide.marker().to_string()
    };
    match field.kind {
        ObjectFieldKind::Local => {
            if field.method_sugar {
                Some(format!("(function) {name}({})", params(doc, &field.ids)))
            } else {
                Some(format!("(local) {name}"))
            }
        }
        _ if field.method_sugar => {
            Some(format!("(method) {name}({}){marker}", params(doc, &field.ids)))
        }
        _ => Some(format!("(field) {name}{marker}")),
    }
}

fn function_signature(at: &NodeRef) -> Option<String> {
    match at.kind() {
        NodeKind::Function { params: ids, .. } => {
            Some(format!("(function) function({})", params(&at.doc, ids)))
        }
        NodeKind::LocalBind {
            variable, params: ids, ..
        } => {
            let name = at.doc.ast.identifier_name(*variable)?;
            Some(format!("(function) {name}({})", params(&at.doc, ids)))
        }
        NodeKind::ObjectField(field) => field_signature(&at.doc, field),
        _ => None,
    }
}

fn value_signature(at: &NodeRef) -> Option<String> {
    match at.kind() {
        NodeKind::ObjectField(field) => field_signature(&at.doc, field),
        NodeKind::Import { file } => {
            let name = import_path(&at.doc, *file)?;
            Some(format!("(import) \"{name}\""))
        }
        NodeKind::ImportStr { file } => {
            let name = import_path(&at.doc, *file)?;
            Some(format!("(importstr) \"{name}\""))
        }
        NodeKind::LiteralNumber {
            original_string, ..
        } => Some(original_string.clone()),
        NodeKind::LiteralString { value, .. } => Some(format!("\"{value}\"")),
        NodeKind::LiteralBoolean { value } => Some(value.to_string()),
        NodeKind::LiteralNull => Some("null".to_string()),
        NodeKind::Object { .. } | NodeKind::ObjectComp { .. } => Some("object".to_string()),
        NodeKind::Array { .. } | NodeKind::ArrayComp { .. } => Some("array".to_string()),
        _ => None,
    }
}

fn import_path(doc: &ParsedDocument, file: NodeId) -> Option<String> {
    match &doc.ast[file].kind {
        NodeKind::LiteralString { value, .. } => Some(value.clone()),
        _ => None,
    }
}

fn params(doc: &ParsedDocument, ids: &[NodeId]) -> String {
    ids.iter()
        .filter_map(|param| match &doc.ast[*param].kind {
            NodeKind::FunctionParam { id, default_value } => {
                let name = doc.ast.identifier_name(*id)?;
                match default_value.map(|d| default_snippet(doc, d)) {
                    Some(default) => Some(format!("{name}={default}")),
                    None => Some(name.to_string()),
                }
            }
            _ => None,
        })
        .join(", ")
}

/// A parameter default as it reads in the source; multi-line defaults
/// collapse to an ellipsis.
fn default_snippet(doc: &ParsedDocument, default: NodeId) -> String {
    let loc = &doc.ast[default].loc;
    if loc.begin.line != loc.end.line {
        return "...".to_string();
    }
    source::slice_range(&doc.text, loc)
        .map_or_else(|| "...".to_string(), ToString::to_string)
}

/// Heading comments of a field as documentation: `//` markers stripped,
/// lines joined with newlines.
#[must_use]
pub fn heading_docs(doc: &ParsedDocument, field: &ObjectField) -> Option<String> {
    if field.heading_comments.is_empty() {
        return None;
    }
    let docs = field
        .heading_comments
        .iter()
        .filter_map(|comment| match &doc.ast[*comment].kind {
            NodeKind::Comment { text } => {
                Some(text.trim_start_matches('/').trim_start().to_string())
            }
            _ => None,
        })
        .join("\n");
    if docs.is_empty() {
        None
    } else {
        Some(docs)
    }
}
