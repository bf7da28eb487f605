#![warn(clippy::pedantic)]
#![allow(
    clippy::single_match,
    clippy::wildcard_imports,
    clippy::too_many_lines,
    clippy::enum_glob_use,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::single_match_else
)]

//! The editor-facing analyzer façade.
//!
//! Wires the compiler service, the document manager and the resolver into
//! the operations an editor integration needs: document lifecycle, hover,
//! completion, go-to-definition and diagnostics. Protocol plumbing
//! (request routing, document synchronization) stays outside; this crate
//! speaks `lsp_types` values and nothing else of the protocol.

pub mod config;
pub mod diagnostics;
pub mod documents;
mod handlers;
pub mod mapper;

use jsonnet_hir::{
    CachedDocument, CancellationToken, CompilerService, DocumentManager, ImportResolver,
    ParsedDocument, Resolver,
};
use parking_lot::Mutex;
use std::sync::Arc;
use url::Url;

pub use config::AnalyzerConfig;
pub use documents::{FsDocumentManager, MemoryDocumentManager};

/// One analyzer per workspace; owns the parse cache and the import search
/// configuration, and borrows every document text through the manager.
pub struct Analyzer<D: DocumentManager> {
    service: Mutex<CompilerService>,
    documents: D,
    imports: ImportResolver,
}

impl<D: DocumentManager> Analyzer<D> {
    #[must_use]
    pub fn new(documents: D, config: AnalyzerConfig) -> Self {
        Self {
            service: Mutex::new(CompilerService::new()),
            documents,
            imports: ImportResolver::new(config.jpaths),
        }
    }

    /// Forwarded from the editor's open notification.
    pub fn document_opened(&self, url: &Url, text: &str, version: Option<i32>) {
        self.service.lock().cache(url, text, version);
    }

    /// Forwarded from the editor's save notification.
    pub fn document_saved(&self, url: &Url, text: &str, version: Option<i32>) {
        self.service.lock().cache(url, text, version);
    }

    /// Forwarded from the editor's close notification.
    pub fn document_closed(&self, url: &Url) {
        self.service.lock().delete(url);
    }

    /// The document manager this analyzer reads through.
    pub fn documents(&self) -> &D {
        &self.documents
    }

    /// The current parse if it succeeded, otherwise the last one that did.
    fn snapshot(&self, url: &Url) -> Option<Arc<ParsedDocument>> {
        let service = self.service.lock();
        match service.get(url) {
            Some(CachedDocument::Ok(doc)) => Some(doc),
            _ => service.get_last_success(url),
        }
    }

    /// Run `f` with a resolver over the locked service.
    fn with_resolver<T>(
        &self,
        cancel: CancellationToken,
        f: impl FnOnce(&mut Resolver<'_>) -> T,
    ) -> T {
        let mut service = self.service.lock();
        let mut resolver = Resolver::new(&mut service, &self.documents, &self.imports, cancel);
        f(&mut resolver)
    }
}
