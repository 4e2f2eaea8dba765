//! Core data-model error types.

/// Errors that can occur while parsing or validating core data types.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed content digest string.
    #[error("invalid digest '{value}': {detail}")]
    InvalidDigest { value: String, detail: String },

    /// Malformed registry reference string.
    #[error("invalid reference '{value}': {detail}")]
    InvalidReference { value: String, detail: String },

    /// Manifest bytes could not be decoded.
    #[error("invalid manifest ({media_type}): {detail}")]
    InvalidManifest { media_type: String, detail: String },

    /// JSON decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
