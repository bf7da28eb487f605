//! Lexical environments.
//!
//! An environment is a chain of frames, each holding the bindings introduced
//! at one program point. Frames are immutable once created; a child frame
//! shadows its parent. A binding maps a name to the node that introduced it:
//! a `LocalBind`, a `FunctionParam`, an object-`local` field, or a
//! comprehension `for` clause.

use crate::IndexMap;
use jsonnet_syntax::ast::NodeId;
use slotmap::SlotMap;
use std::ops;

slotmap::new_key_type! { pub struct Env; }

#[derive(Debug, Default, Clone)]
pub struct EnvData {
    pub parent: Option<Env>,
    pub bindings: IndexMap<String, NodeId>,
}

/// The environment arena of one document.
#[derive(Debug, Default, Clone)]
pub struct Envs {
    frames: SlotMap<Env, EnvData>,
}

impl Envs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, data: EnvData) -> Env {
        self.frames.insert(data)
    }

    #[must_use]
    pub fn get(&self, env: Env) -> Option<&EnvData> {
        self.frames.get(env)
    }

    /// Look a name up through the frame chain, innermost first.
    #[must_use]
    pub fn lookup(&self, env: Env, name: &str) -> Option<NodeId> {
        let mut current = Some(env);
        while let Some(env) = current {
            let frame = &self[env];
            if let Some(binder) = frame.bindings.get(name) {
                return Some(*binder);
            }
            current = frame.parent;
        }
        None
    }

    /// Every visible binding, shadowed names resolved to their innermost
    /// binder. Insertion order runs from the innermost frame outwards.
    #[must_use]
    pub fn visible_bindings(&self, env: Env) -> IndexMap<String, NodeId> {
        let mut out = IndexMap::default();
        let mut current = Some(env);
        while let Some(env) = current {
            let frame = &self[env];
            for (name, binder) in &frame.bindings {
                out.entry(name.clone()).or_insert(*binder);
            }
            current = frame.parent;
        }
        out
    }
}

impl ops::Index<Env> for Envs {
    type Output = EnvData;

    fn index(&self, index: Env) -> &Self::Output {
        self.frames.get(index).unwrap()
    }
}
