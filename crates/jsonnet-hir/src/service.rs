//! The compiler service: a process-wide, version-aware parse cache.
//!
//! Documents enter either from the editor (with a version) or from the
//! file system (versionless, always re-parsed). Entries are immutable
//! snapshots behind `Arc`: a replacement swaps the entry, it never mutates
//! one in place, so readers keep a consistent document for the whole query.

use crate::document::{parse_document, FailedParsedDocument, ParsedDocument};
use crate::error::Error;
use crate::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use url::Url;

/// Text and version of a document as delivered by the editor or disk.
#[derive(Debug, Clone)]
pub struct DocumentText {
    pub text: String,
    pub version: Option<i32>,
}

/// The document store contract consumed for import resolution.
///
/// `version` is a monotonically increasing integer per URI when the editor
/// owns the document, and absent for filesystem-backed documents.
pub trait DocumentManager {
    fn get(&self, url: &Url) -> Result<DocumentText, Error>;
}

/// One cache entry: the latest parse attempt of a URI.
#[derive(Debug, Clone)]
pub enum CachedDocument {
    Ok(Arc<ParsedDocument>),
    Failed(Arc<FailedParsedDocument>),
}

impl CachedDocument {
    #[must_use]
    pub fn ok(&self) -> Option<&Arc<ParsedDocument>> {
        match self {
            CachedDocument::Ok(doc) => Some(doc),
            CachedDocument::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn version(&self) -> Option<i32> {
        match self {
            CachedDocument::Ok(doc) => doc.version,
            CachedDocument::Failed(doc) => doc.version,
        }
    }
}

#[derive(Debug, Default)]
struct DocumentState {
    current: Option<CachedDocument>,
    last_success: Option<Arc<ParsedDocument>>,
}

/// Parse cache keyed by file URI.
#[derive(Debug, Default)]
pub struct CompilerService {
    documents: HashMap<Url, DocumentState>,
}

static_assertions::assert_impl_all!(CompilerService: Send, Sync);

impl CompilerService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and store a document, or return the existing entry when the
    /// version matches. A `None` version always re-parses.
    #[tracing::instrument(skip(self, text))]
    pub fn cache(&mut self, url: &Url, text: &str, version: Option<i32>) -> CachedDocument {
        if version.is_some() {
            if let Some(current) = self
                .documents
                .get(url)
                .and_then(|state| state.current.as_ref())
            {
                if current.version() == version {
                    tracing::trace!(%url, ?version, "parse cache hit");
                    return current.clone();
                }
            }
        }

        let cached = match parse_document(url, text, version) {
            Ok(doc) => CachedDocument::Ok(Arc::new(doc)),
            Err(failed) => CachedDocument::Failed(Arc::new(*failed)),
        };

        let state = self.documents.entry(url.clone()).or_default();
        state.current = Some(cached.clone());
        if let CachedDocument::Ok(doc) = &cached {
            state.last_success = Some(Arc::clone(doc));
        }
        cached
    }

    /// The latest parse attempt, successful or not.
    #[must_use]
    pub fn get(&self, url: &Url) -> Option<CachedDocument> {
        self.documents
            .get(url)
            .and_then(|state| state.current.clone())
    }

    /// The last successful parse, surviving more recent failed attempts, so
    /// editor features keep working through transient syntax errors.
    #[must_use]
    pub fn get_last_success(&self, url: &Url) -> Option<Arc<ParsedDocument>> {
        self.documents
            .get(url)
            .and_then(|state| state.last_success.clone())
    }

    /// Drop all state for a URI.
    pub fn delete(&mut self, url: &Url) {
        self.documents.remove(url);
    }
}

/// Resolves import specifiers to absolute URIs: absolute as-is, then
/// relative to the importing file's directory, then through the ordered
/// library path list. A candidate counts only if the document manager can
/// deliver it.
#[derive(Debug, Clone, Default)]
pub struct ImportResolver {
    lib_paths: Vec<Url>,
}

impl ImportResolver {
    #[must_use]
    pub fn new(lib_paths: Vec<Url>) -> Self {
        Self { lib_paths }
    }

    pub fn resolve(
        &self,
        specifier: &str,
        importer: &Url,
        documents: &dyn DocumentManager,
    ) -> Result<(Url, DocumentText), Error> {
        let mut candidates = Vec::new();
        if let Ok(absolute) = Url::parse(specifier) {
            candidates.push(absolute);
        }
        if let Ok(relative) = importer.join(specifier) {
            candidates.push(relative);
        }
        for lib in &self.lib_paths {
            if let Ok(candidate) = lib.join(specifier) {
                candidates.push(candidate);
            }
        }

        for candidate in candidates {
            match documents.get(&candidate) {
                Ok(text) => return Ok((candidate, text)),
                Err(error) => {
                    tracing::trace!(%candidate, %error, "import candidate rejected");
                }
            }
        }

        Err(Error::ImportNotFound {
            specifier: specifier.to_string(),
        })
    }
}

/// Cooperative cancellation, checked between imports during resolution.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
