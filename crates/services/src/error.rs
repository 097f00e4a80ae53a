//! Shared error types for the services crate.

use std::time::Duration;

use thiserror::Error;

use spoken_core::model::{CategoryIdError, ContentDecodeError};
use storage::sqlite::SqliteInitError;

/// Errors emitted by a `ContentSource` while reading a resource.
///
/// Definitive absence is not an error; sources report it as `Ok(None)`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("content request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("cannot resolve content path {0}")]
    InvalidPath(String),
    #[error("injected failure for {0}")]
    Injected(String),
}

/// Errors emitted by `ContentLoader::try_fetch_page`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error("fetching {path} failed: {source}")]
    Source {
        path: String,
        #[source]
        source: SourceError,
    },
    #[error("fetching {path} timed out after {after:?}")]
    Timeout { path: String, after: Duration },
    #[error("decoding {path} failed: {source}")]
    Decode {
        path: String,
        #[source]
        source: ContentDecodeError,
    },
}

impl ContentError {
    /// Transient failures may succeed when retried later; they are never cached.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, ContentError::Source { .. } | ContentError::Timeout { .. })
    }
}

/// Errors emitted while resolving where content is served from.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceConfigError {
    #[error("content location cannot be empty")]
    Empty,
    #[error("invalid content url {raw}: {source}")]
    InvalidUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },
}

/// Errors emitted by `CategoryReader`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReaderError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error(transparent)]
    CategoryId(#[from] CategoryIdError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
