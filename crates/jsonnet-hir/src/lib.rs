#![warn(clippy::pedantic)]
#![allow(
    clippy::single_match,
    clippy::wildcard_imports,
    clippy::too_many_lines,
    clippy::enum_glob_use,
    clippy::cast_possible_truncation,
    clippy::cast_lossless,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::single_match_else
)]

pub mod annotate;
pub mod document;
pub mod env;
pub mod error;
pub mod fmt;
pub mod query;
pub mod resolve;
pub mod service;

pub type IndexMap<K, V> = indexmap::IndexMap<K, V, ahash::RandomState>;
pub type HashMap<K, V> = ahash::AHashMap<K, V>;
pub type HashSet<V> = ahash::AHashSet<V>;

pub use document::{DocumentFailure, FailedParsedDocument, ParsedDocument};
pub use env::{Env, EnvData, Envs};
pub use error::Error;
pub use query::CursorTarget;
pub use resolve::{NodeRef, Resolved, Resolver, Unresolvable};
pub use service::{
    CachedDocument, CancellationToken, CompilerService, DocumentManager, DocumentText,
    ImportResolver,
};
