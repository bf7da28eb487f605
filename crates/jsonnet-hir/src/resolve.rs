//! Static resolution: chase a use site to the node that defines its value,
//! across scopes, object mixins and imported files.
//!
//! Resolution never throws; every dead end is a [`Resolved::Unresolvable`]
//! variant. Termination is guaranteed by a visited set: revisiting a node
//! within one chase means a cycle (`local foo = foo`) and stops it.

use crate::document::ParsedDocument;
use crate::query;
use crate::service::{
    CachedDocument, CancellationToken, CompilerService, DocumentManager, ImportResolver,
};
use crate::{HashSet, IndexMap};
use jsonnet_syntax::ast::{BinaryOp, NodeId, NodeKind, ObjectField, ObjectFieldKind, StringKind};
use jsonnet_syntax::source::Location;
use jsonnet_syntax::util;
use std::sync::Arc;
use url::Url;

/// A node in a specific document snapshot.
#[derive(Debug, Clone)]
pub struct NodeRef {
    pub doc: Arc<ParsedDocument>,
    pub node: NodeId,
}

impl NodeRef {
    #[must_use]
    pub fn new(doc: Arc<ParsedDocument>, node: NodeId) -> Self {
        Self { doc, node }
    }

    /// The node under the cursor of a document, if any.
    #[must_use]
    pub fn at_cursor(doc: &Arc<ParsedDocument>, cursor: Location) -> Option<Self> {
        match query::find_at(doc, cursor) {
            query::CursorTarget::Found(node) => Some(Self::new(Arc::clone(doc), node)),
            _ => None,
        }
    }

    #[must_use]
    pub fn with(&self, node: NodeId) -> Self {
        Self {
            doc: Arc::clone(&self.doc),
            node,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.doc.ast[self.node].kind
    }

    #[must_use]
    pub fn same_as(&self, other: &NodeRef) -> bool {
        self.node == other.node && Arc::ptr_eq(&self.doc, &other.doc)
    }

    /// The object field data, when the node is a field.
    #[must_use]
    pub fn as_field(&self) -> Option<&ObjectField> {
        match self.kind() {
            NodeKind::ObjectField(field) => Some(field),
            _ => None,
        }
    }
}

/// The outcome of a static chase.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// The node that defines the value, as far as analysis can tell.
    Value(NodeRef),
    /// A free variable: a function parameter, with its optional default.
    Param(NodeRef),
    /// A function definition (a `function` literal, a sugared bind or a
    /// method field).
    Function(NodeRef),
    /// An indexed object shape: completable fields by name.
    Fields(IndexMap<String, NodeRef>),
    /// Nothing further can be said statically.
    Unresolvable(Unresolvable),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolvable {
    UnboundVariable(String),
    UnknownField(String),
    ImportNotFound(String),
    /// The import target exists but does not currently parse.
    ImportFailed(Url),
    Cycle,
    Cancelled,
    /// The node has no statically known definition (call results,
    /// conditionals, comprehension variables, ...).
    Opaque,
}

/// Chases variables, indexes, imports and mixins. One resolver serves one
/// query; the compiler service it borrows caches parses across queries.
pub struct Resolver<'a> {
    service: &'a mut CompilerService,
    documents: &'a dyn DocumentManager,
    imports: &'a ImportResolver,
    cancel: CancellationToken,
    visited: HashSet<(Url, NodeId)>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        service: &'a mut CompilerService,
        documents: &'a dyn DocumentManager,
        imports: &'a ImportResolver,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            service,
            documents,
            imports,
            cancel,
            visited: HashSet::default(),
        }
    }

    /// Chase `at` to the node that defines its value.
    pub fn resolve(&mut self, at: &NodeRef) -> Resolved {
        self.visited.clear();
        self.resolve_node(at)
    }

    /// Enumerate the completable fields of a node that denotes an object:
    /// an object literal, or a `+` mixin chain followed through
    /// indirections. `None` when the node does not denote an object.
    pub fn resolve_fields(&mut self, at: &NodeRef) -> Option<IndexMap<String, NodeRef>> {
        self.visited.clear();
        self.fields_of(at)
    }

    fn resolve_node(&mut self, at: &NodeRef) -> Resolved {
        if self.cancel.is_cancelled() {
            return Resolved::Unresolvable(Unresolvable::Cancelled);
        }
        if !self.visited.insert((at.doc.url.clone(), at.node)) {
            tracing::trace!(url = %at.doc.url, "resolution cycle");
            return Resolved::Unresolvable(Unresolvable::Cycle);
        }

        match at.kind() {
            // An identifier means whatever its parent makes of it.
            NodeKind::Identifier { .. } => match at.doc.annotations.parent(at.node) {
                Some(parent) => self.resolve_node(&at.with(parent)),
                None => Resolved::Unresolvable(Unresolvable::Opaque),
            },
            NodeKind::Var { id } => {
                let Some(name) = at.doc.ast.identifier_name(*id) else {
                    return Resolved::Unresolvable(Unresolvable::Opaque);
                };
                let binder = at
                    .doc
                    .annotations
                    .env(at.node)
                    .and_then(|env| at.doc.annotations.envs.lookup(env, name));
                match binder {
                    Some(binder) => self.resolve_binder(&at.with(binder)),
                    None => {
                        Resolved::Unresolvable(Unresolvable::UnboundVariable(name.to_string()))
                    }
                }
            }
            NodeKind::Import { file } => self.resolve_import(at, *file),
            NodeKind::Dollar => match at.doc.annotations.root_object(at.node) {
                Some(object) => Resolved::Value(at.with(object)),
                None => Resolved::Unresolvable(Unresolvable::Opaque),
            },
            NodeKind::SelfExpr => match self.enclosing_object(at) {
                Some(object) => Resolved::Value(at.with(object)),
                None => Resolved::Unresolvable(Unresolvable::Opaque),
            },
            NodeKind::IndexDot { target, id } => {
                let Some(name) = at.doc.ast.identifier_name(*id) else {
                    return Resolved::Unresolvable(Unresolvable::Opaque);
                };
                let name = name.to_string();
                self.resolve_index(at, *target, &name)
            }
            NodeKind::IndexSubscript { target, index } => {
                // Only literal string subscripts can be chased.
                let name = match &at.doc.ast[*index].kind {
                    NodeKind::LiteralString {
                        value,
                        kind: StringKind::Block,
                        ..
                    } => value.clone(),
                    NodeKind::LiteralString { value, .. } => util::unescape(value),
                    _ => return Resolved::Unresolvable(Unresolvable::Opaque),
                };
                self.resolve_index(at, *target, &name)
            }
            // Wrappers are peeled.
            NodeKind::Local { body, .. } => self.resolve_node(&at.with(*body)),
            NodeKind::Assert { rest, .. } => self.resolve_node(&at.with(*rest)),
            NodeKind::Function { .. } => Resolved::Function(at.clone()),
            NodeKind::FunctionParam { .. } => Resolved::Param(at.clone()),
            NodeKind::LocalBind { .. } => self.resolve_binder(at),
            NodeKind::ObjectField(field) => match field.expr2 {
                Some(value) => self.resolve_node(&at.with(value)),
                None => Resolved::Unresolvable(Unresolvable::Opaque),
            },
            // Values in their own right.
            NodeKind::Object { .. }
            | NodeKind::ObjectComp { .. }
            | NodeKind::DesugaredObject { .. }
            | NodeKind::Binary { .. }
            | NodeKind::ApplyBrace { .. }
            | NodeKind::Array { .. }
            | NodeKind::ArrayComp { .. }
            | NodeKind::LiteralBoolean { .. }
            | NodeKind::LiteralNull
            | NodeKind::LiteralNumber { .. }
            | NodeKind::LiteralString { .. }
            | NodeKind::ImportStr { .. }
            | NodeKind::Unary { .. }
            | NodeKind::Builtin { .. } => Resolved::Value(at.clone()),
            // No statically known value.
            NodeKind::Apply { .. }
            | NodeKind::SuperIndex { .. }
            | NodeKind::Conditional { .. }
            | NodeKind::Error { .. }
            | NodeKind::CompSpec { .. }
            | NodeKind::Comment { .. } => Resolved::Unresolvable(Unresolvable::Opaque),
        }
    }

    fn fields_of(&mut self, at: &NodeRef) -> Option<IndexMap<String, NodeRef>> {
        match at.kind() {
            NodeKind::Object { fields, .. } => {
                let mut out = IndexMap::default();
                for field in fields {
                    if let NodeKind::ObjectField(data) = &at.doc.ast[*field].kind {
                        if matches!(data.kind, ObjectFieldKind::Id | ObjectFieldKind::Str) {
                            if let Some(name) = at.doc.ast.field_name(data) {
                                out.insert(name.to_string(), at.with(*field));
                            }
                        }
                    }
                }
                Some(out)
            }
            NodeKind::Binary {
                left,
                op: BinaryOp::Plus,
                right,
            } => self.merge_fields(at, *left, *right),
            NodeKind::ApplyBrace { left, right } => self.merge_fields(at, *left, *right),
            NodeKind::Local { body, .. } => self.fields_of(&at.with(*body)),
            _ => match self.resolve_node(at) {
                Resolved::Value(target) if !target.same_as(at) => self.fields_of(&target),
                _ => None,
            },
        }
    }

    /// Mixin merge: right-hand fields override left-hand ones.
    fn merge_fields(
        &mut self,
        at: &NodeRef,
        left: NodeId,
        right: NodeId,
    ) -> Option<IndexMap<String, NodeRef>> {
        let left_fields = self.fields_of(&at.with(left));
        let right_fields = self.fields_of(&at.with(right));
        if left_fields.is_none() && right_fields.is_none() {
            return None;
        }
        let mut merged = left_fields.unwrap_or_default();
        merged.extend(right_fields.unwrap_or_default());
        Some(merged)
    }

    fn resolve_binder(&mut self, binder: &NodeRef) -> Resolved {
        match binder.kind() {
            NodeKind::FunctionParam { .. } => Resolved::Param(binder.clone()),
            NodeKind::LocalBind {
                body,
                function_sugar,
                ..
            } => {
                if *function_sugar {
                    return Resolved::Function(binder.clone());
                }
                self.resolve_node(&binder.with(*body))
            }
            NodeKind::ObjectField(field) if field.kind == ObjectFieldKind::Local => {
                if field.method_sugar {
                    return Resolved::Function(binder.clone());
                }
                match field.expr2 {
                    Some(body) => self.resolve_node(&binder.with(body)),
                    None => Resolved::Unresolvable(Unresolvable::Opaque),
                }
            }
            // Comprehension variables range over runtime values.
            NodeKind::CompSpec { .. } => Resolved::Unresolvable(Unresolvable::Opaque),
            _ => Resolved::Unresolvable(Unresolvable::Opaque),
        }
    }

    fn resolve_index(&mut self, at: &NodeRef, target: NodeId, name: &str) -> Resolved {
        let target_ref = at.with(target);
        let Some(fields) = self.fields_of(&target_ref) else {
            return Resolved::Unresolvable(Unresolvable::Opaque);
        };
        let Some(field_ref) = fields.get(name) else {
            return Resolved::Unresolvable(Unresolvable::UnknownField(name.to_string()));
        };
        let field_ref = field_ref.clone();

        let Some(field) = field_ref.as_field() else {
            return Resolved::Value(field_ref.clone());
        };
        if field.method_sugar {
            return Resolved::Function(field_ref.clone());
        }
        match field.expr2 {
            // The field's value continues the chain.
            Some(value) => self.resolve_node(&field_ref.with(value)),
            None => Resolved::Value(field_ref.clone()),
        }
    }

    fn resolve_import(&mut self, at: &NodeRef, file: NodeId) -> Resolved {
        if self.cancel.is_cancelled() {
            return Resolved::Unresolvable(Unresolvable::Cancelled);
        }
        let specifier = match &at.doc.ast[file].kind {
            NodeKind::LiteralString { value, .. } => util::unescape(value),
            _ => return Resolved::Unresolvable(Unresolvable::Opaque),
        };

        let (url, text) = match self.imports.resolve(&specifier, &at.doc.url, self.documents) {
            Ok(found) => found,
            Err(error) => {
                tracing::debug!(%error, importer = %at.doc.url, "unresolvable import");
                return Resolved::Unresolvable(Unresolvable::ImportNotFound(specifier));
            }
        };

        match self.service.cache(&url, &text.text, text.version) {
            CachedDocument::Ok(doc) => {
                // Strip the enclosing local chain so the import denotes the
                // underlying value.
                let mut node = doc.root;
                while let NodeKind::Local { body, .. } = &doc.ast[node].kind {
                    node = *body;
                }
                Resolved::Value(NodeRef::new(doc, node))
            }
            CachedDocument::Failed(failed) => {
                tracing::debug!(url = %failed.url, "imported document does not parse");
                Resolved::Unresolvable(Unresolvable::ImportFailed(url))
            }
        }
    }

    /// The nearest enclosing object literal, for `self`.
    fn enclosing_object(&self, at: &NodeRef) -> Option<NodeId> {
        let mut current = at.doc.annotations.parent(at.node);
        while let Some(node) = current {
            if matches!(
                at.doc.ast[node].kind,
                NodeKind::Object { .. } | NodeKind::ObjectComp { .. }
            ) {
                return Some(node);
            }
            current = at.doc.annotations.parent(node);
        }
        None
    }
}

/// The binding a node belongs to: the environment binder of a variable use,
/// or the binding the node itself names (a bind's variable, a parameter, an
/// object local, a comprehension variable). Purely environment-based, no
/// cross-document chasing.
#[must_use]
pub fn binder_of(doc: &ParsedDocument, node: NodeId) -> Option<NodeId> {
    let ast = &doc.ast;

    if let Some(parent) = doc.annotations.parent(node) {
        match &ast[parent].kind {
            NodeKind::LocalBind { variable, .. } if *variable == node => return Some(parent),
            NodeKind::FunctionParam { id, .. } if *id == node => return Some(parent),
            NodeKind::ObjectField(field)
                if field.kind == ObjectFieldKind::Local && field.id == Some(node) =>
            {
                return Some(parent)
            }
            NodeKind::CompSpec { var: Some(var), .. } if *var == node => return Some(parent),
            _ => {}
        }
    }

    let var = match &ast[node].kind {
        NodeKind::Var { .. } => node,
        NodeKind::Identifier { .. } => {
            let parent = doc.annotations.parent(node)?;
            match &ast[parent].kind {
                NodeKind::Var { .. } => parent,
                _ => return None,
            }
        }
        _ => return None,
    };
    let NodeKind::Var { id } = &ast[var].kind else {
        return None;
    };
    let name = ast.identifier_name(*id)?;
    let env = doc.annotations.env(var)?;
    doc.annotations.envs.lookup(env, name)
}

/// The identifier node that names a binder.
#[must_use]
pub fn binder_name_node(doc: &ParsedDocument, binder: NodeId) -> Option<NodeId> {
    match &doc.ast[binder].kind {
        NodeKind::LocalBind { variable, .. } => Some(*variable),
        NodeKind::FunctionParam { id, .. } => Some(*id),
        NodeKind::ObjectField(field) => field.id,
        NodeKind::CompSpec { var, .. } => *var,
        _ => None,
    }
}

