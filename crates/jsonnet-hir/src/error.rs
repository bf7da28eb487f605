use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("document not found: {0}")]
    UnknownDocument(Url),

    #[error("could not resolve import: {specifier}")]
    ImportNotFound { specifier: String },

    #[error("operation was cancelled")]
    Cancelled,
}
