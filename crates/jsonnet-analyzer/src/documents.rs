//! Document managers: where document text comes from.

use jsonnet_hir::{DocumentManager, DocumentText, Error};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// In-memory documents: the editor overlay, and the whole store in tests.
///
/// Clones share the same underlying map, so the handle given to the
/// analyzer observes later inserts.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentManager {
    files: Arc<RwLock<HashMap<Url, DocumentText>>>,
}

impl MemoryDocumentManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: &Url, text: impl Into<String>, version: Option<i32>) {
        self.files.write().insert(
            url.clone(),
            DocumentText {
                text: text.into(),
                version,
            },
        );
    }

    pub fn remove(&self, url: &Url) {
        self.files.write().remove(url);
    }
}

impl DocumentManager for MemoryDocumentManager {
    fn get(&self, url: &Url) -> Result<DocumentText, Error> {
        self.files
            .read()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::UnknownDocument(url.clone()))
    }
}

/// Versionless documents read from disk on demand; the compiler service
/// re-parses them on every cache call, which is the contract for
/// filesystem-backed sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDocumentManager;

impl FsDocumentManager {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DocumentManager for FsDocumentManager {
    fn get(&self, url: &Url) -> Result<DocumentText, Error> {
        let path = url
            .to_file_path()
            .map_err(|()| Error::UnknownDocument(url.clone()))?;
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(DocumentText {
                text,
                version: None,
            }),
            Err(error) => {
                tracing::trace!(%url, %error, "failed to read document");
                Err(Error::UnknownDocument(url.clone()))
            }
        }
    }
}
