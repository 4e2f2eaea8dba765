//! Pull error taxonomy.
//!
//! Every failure aborts the whole copy; nothing is retried internally.
//! Policy violations are kept distinct from I/O failures so callers can
//! treat "not this kind of artifact" differently from "network down".

use std::path::PathBuf;

/// Errors that can occur during a pull.
#[derive(Debug, thiserror::Error)]
pub enum PullError {
    /// Reference could not be resolved to a root descriptor.
    #[error("cannot resolve '{reference}': {detail}")]
    Resolution { reference: String, detail: String },

    /// Required media type never appeared in the traversed tree.
    #[error("required media type '{media_type}' not present in the pull tree")]
    PolicyViolation { media_type: String },

    /// Remote failure during successor or blob retrieval.
    #[error("fetch failed for {digest}: {detail}")]
    Fetch { digest: String, detail: String },

    /// Referenced content is absent from the store.
    #[error("blob not found: {digest}")]
    BlobNotFound { digest: String },

    /// Filesystem failure writing to the destination.
    #[error("write failed at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Title annotation resolves outside the output root.
    #[error("path '{path}' escapes the output directory")]
    PathEscape { path: PathBuf },

    /// Destination already exists and overwrite is disallowed.
    #[error("refusing to overwrite existing file {path}")]
    OverwriteConflict { path: PathBuf },

    /// Local cache read or write failure.
    #[error("cache error at {path}: {detail}")]
    Cache { path: PathBuf, detail: String },

    /// The pull was cancelled before completing.
    #[error("pull cancelled")]
    Cancelled,

    /// Core data-model error (bad digest, malformed manifest, ...).
    #[error(transparent)]
    Core(#[from] carton_core::CoreError),

    /// I/O error outside the destination write path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pull operations.
pub type Result<T> = std::result::Result<T, PullError>;
