//! Error types for the content store
//!
//! Provides a unified error type for all operations.
//!
//! `NotFound`, `NotADirectory`, `NotALeaf`, `MissingMediaType`,
//! `AlreadyExists`, `InvalidPath` and `PayloadMismatch` are caller-actionable.
//! Everything else is a hard failure of the current operation.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for content store operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("The given path is not a directory: {0}")]
    NotADirectory(String),

    #[error("The given path is not a file: {0}")]
    NotALeaf(String),

    #[error("Path already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    // -------------------------------------------------------------------------
    // Content Errors
    // -------------------------------------------------------------------------
    #[error("The media type attribute is missing: {0}")]
    MissingMediaType(String),

    #[error("Payload of {path} does not match its media type {media_type}")]
    PayloadMismatch { path: String, media_type: String },

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The payload step of a write succeeded, but persisting the sidecar failed.
    /// The item now carries new content with stale metadata.
    #[error("Content of {path} was written but its metadata was not: {source}")]
    MetadataWrite {
        path: String,
        #[source]
        source: Box<StoreError>,
    },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Stable message code, suitable for mapping onto a response layer
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "storage.file.not_found",
            StoreError::NotADirectory(_) => "storage.file.not_directory",
            StoreError::NotALeaf(_) => "storage.file.not_leaf",
            StoreError::AlreadyExists(_) => "storage.file.already_exists",
            StoreError::InvalidPath(_) => "storage.path.invalid",
            StoreError::MissingMediaType(_) => "storage.file.missing_content_type",
            StoreError::PayloadMismatch { .. } => "storage.content.payload_mismatch",
            StoreError::Io(_) => "storage.io",
            StoreError::Serialization(_) => "storage.serialization",
            StoreError::MetadataWrite { .. } => "storage.metadata.partial_write",
            StoreError::Config(_) => "storage.config",
        }
    }

    /// Whether the caller can act on this error (bad path, missing type, ...)
    /// as opposed to an underlying storage failure
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound(_)
                | StoreError::NotADirectory(_)
                | StoreError::NotALeaf(_)
                | StoreError::AlreadyExists(_)
                | StoreError::InvalidPath(_)
                | StoreError::MissingMediaType(_)
                | StoreError::PayloadMismatch { .. }
        )
    }

    /// Whether the item was left with updated content but stale metadata
    pub fn is_partial_write(&self) -> bool {
        matches!(self, StoreError::MetadataWrite { .. })
    }
}
