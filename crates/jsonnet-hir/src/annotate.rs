//! The post-parse annotation pass.
//!
//! A single depth-first traversal threads three facts onto every node:
//! its parent, its lexical environment, and the object that `$` refers to.
//! After the pass every node has an environment and every node but the root
//! has a parent.

use crate::env::{Env, EnvData, Envs};
use jsonnet_syntax::ast::{Ast, CompSpecKind, NodeId, NodeKind, ObjectFieldKind};
use slotmap::SecondaryMap;

/// Parent links, environments and `$` targets for one document.
#[derive(Debug, Default, Clone)]
pub struct Annotations {
    pub envs: Envs,
    parent: SecondaryMap<NodeId, NodeId>,
    env: SecondaryMap<NodeId, Env>,
    root_object: SecondaryMap<NodeId, NodeId>,
}

impl Annotations {
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parent.get(node).copied()
    }

    #[must_use]
    pub fn env(&self, node: NodeId) -> Option<Env> {
        self.env.get(node).copied()
    }

    /// The outermost object literal enclosing the node.
    #[must_use]
    pub fn root_object(&self, node: NodeId) -> Option<NodeId> {
        self.root_object.get(node).copied()
    }
}

/// Annotate the tree under `root`.
#[must_use]
pub fn annotate(ast: &Ast, root: NodeId) -> Annotations {
    let mut annotator = Annotator {
        ast,
        anns: Annotations::default(),
    };
    let root_env = annotator.anns.envs.add(EnvData::default());
    annotator.visit(root, None, root_env, None);
    annotator.anns
}

struct Annotator<'a> {
    ast: &'a Ast,
    anns: Annotations,
}

impl Annotator<'_> {
    fn visit(&mut self, node: NodeId, parent: Option<NodeId>, env: Env, root_object: Option<NodeId>) {
        if let Some(parent) = parent {
            self.anns.parent.insert(node, parent);
        }
        self.anns.env.insert(node, env);
        if let Some(root_object) = root_object {
            self.anns.root_object.insert(node, root_object);
        }

        let ast = self.ast;
        match &ast[node].kind {
            NodeKind::Local { binds, body } => {
                // Binds are mutually recursive: all of them are visible in
                // every bind body and in the body.
                let mut frame = EnvData {
                    parent: Some(env),
                    ..EnvData::default()
                };
                for bind in binds {
                    if let NodeKind::LocalBind { variable, .. } = &ast[*bind].kind {
                        if let Some(name) = ast.identifier_name(*variable) {
                            frame.bindings.insert(name.to_string(), *bind);
                        }
                    }
                }
                let child = self.anns.envs.add(frame);
                for bind in binds {
                    self.visit(*bind, Some(node), child, root_object);
                }
                self.visit(*body, Some(node), child, root_object);
            }
            NodeKind::LocalBind {
                variable,
                body,
                function_sugar,
                params,
                ..
            } => {
                self.visit(*variable, Some(node), env, root_object);
                let body_env = if *function_sugar {
                    self.param_env(env, params)
                } else {
                    env
                };
                for param in params {
                    self.visit(*param, Some(node), body_env, root_object);
                }
                self.visit(*body, Some(node), body_env, root_object);
            }
            NodeKind::Function { params, body, .. } => {
                let body_env = self.param_env(env, params);
                for param in params {
                    self.visit(*param, Some(node), body_env, root_object);
                }
                self.visit(*body, Some(node), body_env, root_object);
            }
            NodeKind::Object { fields, .. } => {
                let child = self.object_env(env, fields);
                let inner_root = Some(root_object.unwrap_or(node));
                for field in fields {
                    self.visit(*field, Some(node), child, inner_root);
                }
            }
            NodeKind::ObjectComp { fields, specs, .. } => {
                let child = self.object_env(env, fields);
                let inner_root = Some(root_object.unwrap_or(node));
                let final_env = self.visit_comp_specs(node, child, inner_root, specs);
                for field in fields {
                    self.visit(*field, Some(node), final_env, inner_root);
                }
            }
            NodeKind::ArrayComp { body, specs, .. } => {
                let final_env = self.visit_comp_specs(node, env, root_object, specs);
                self.visit(*body, Some(node), final_env, root_object);
            }
            NodeKind::ObjectField(field) => {
                for comment in &field.heading_comments {
                    self.visit(*comment, Some(node), env, root_object);
                }
                if let Some(expr1) = field.expr1 {
                    self.visit(expr1, Some(node), env, root_object);
                }
                if let Some(id) = field.id {
                    self.visit(id, Some(node), env, root_object);
                }
                let value_env = if field.method_sugar {
                    self.param_env(env, &field.ids)
                } else {
                    env
                };
                for param in &field.ids {
                    self.visit(*param, Some(node), value_env, root_object);
                }
                if let Some(expr2) = field.expr2 {
                    self.visit(expr2, Some(node), value_env, root_object);
                }
                if let Some(expr3) = field.expr3 {
                    self.visit(expr3, Some(node), env, root_object);
                }
            }
            _ => {
                for child in ast.children(node) {
                    self.visit(child, Some(node), env, root_object);
                }
            }
        }
    }

    /// A frame holding function parameters. Defaults are annotated with the
    /// same frame: a default may refer to earlier parameters.
    fn param_env(&mut self, parent: Env, params: &[NodeId]) -> Env {
        let mut frame = EnvData {
            parent: Some(parent),
            ..EnvData::default()
        };
        for param in params {
            if let NodeKind::FunctionParam { id, .. } = &self.ast[*param].kind {
                if let Some(name) = self.ast.identifier_name(*id) {
                    frame.bindings.insert(name.to_string(), *param);
                }
            }
        }
        self.anns.envs.add(frame)
    }

    /// A frame holding an object's `local` fields, visible to every field's
    /// sub-expressions.
    fn object_env(&mut self, parent: Env, fields: &[NodeId]) -> Env {
        let mut frame = EnvData {
            parent: Some(parent),
            ..EnvData::default()
        };
        for field in fields {
            if let NodeKind::ObjectField(data) = &self.ast[*field].kind {
                if data.kind == ObjectFieldKind::Local {
                    if let Some(name) = self.ast.field_name(data) {
                        frame.bindings.insert(name.to_string(), *field);
                    }
                }
            }
        }
        self.anns.envs.add(frame)
    }

    /// Comprehension clauses scope left to right: each `for` variable is
    /// visible in the clauses after it and in the comprehension body.
    fn visit_comp_specs(
        &mut self,
        parent: NodeId,
        mut env: Env,
        root_object: Option<NodeId>,
        specs: &[NodeId],
    ) -> Env {
        for spec in specs {
            self.visit(*spec, Some(parent), env, root_object);
            if let NodeKind::CompSpec {
                kind: CompSpecKind::For,
                var: Some(var),
                ..
            } = &self.ast[*spec].kind
            {
                if let Some(name) = self.ast.identifier_name(*var) {
                    let mut frame = EnvData {
                        parent: Some(env),
                        ..EnvData::default()
                    };
                    frame.bindings.insert(name.to_string(), *spec);
                    env = self.anns.envs.add(frame);
                }
            }
        }
        env
    }
}
