//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the field trial indexing service, providing
//! structured error types and conversion utilities for all system components.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from configuration, the document store, the
//!   search index client, and filesystem operations
//! - **Output**: Structured error types with context for logs and reports
//! - **Error Categories**: Configuration, Repository, Indexing, Artifacts,
//!   Storage, Generic
//!
//! ## Propagation Policy
//! Errors that occur while processing a single item of a batch (one record
//! collection, one cache file, one study package) are *not* propagated with
//! `?`; the batch components swallow them into counters and report strings so
//! that every remaining item is still attempted. Only setup failures cross a
//! component boundary as an `Err`.

use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, IndexingError>;

/// Error types for the field trial indexing service
#[derive(Debug, Error)]
pub enum IndexingError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation failed for field '{field}': {reason}")]
    ValidationFailed { field: String, reason: String },

    /// Document store errors for one record collection
    #[error("Repository error for collection '{collection}': {details}")]
    Repository { collection: String, details: String },

    /// Search index submission errors
    #[error("Index submission failed for '{index}': {details}")]
    IndexSubmission { index: String, details: String },

    /// Derived-artifact write errors
    #[error("Failed to write package for study '{study}': {details}")]
    ArtifactWrite { study: String, details: String },

    /// Serialization/deserialization errors
    #[error("Serialization failed: {message}")]
    SerializationFailed { message: String },

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl IndexingError {
    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            IndexingError::Config { .. } => "configuration",
            IndexingError::Repository { .. } => "repository",
            IndexingError::IndexSubmission { .. } => "indexing",
            IndexingError::ArtifactWrite { .. } => "artifacts",
            IndexingError::SerializationFailed { .. } => "storage",
            IndexingError::ValidationFailed { .. } | IndexingError::Internal { .. } => "generic",
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for IndexingError {
    fn from(err: std::io::Error) -> Self {
        IndexingError::Internal {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<serde_json::Error> for IndexingError {
    fn from(err: serde_json::Error) -> Self {
        IndexingError::SerializationFailed {
            message: format!("JSON serialization error: {}", err),
        }
    }
}

impl From<toml::de::Error> for IndexingError {
    fn from(err: toml::de::Error) -> Self {
        IndexingError::Config {
            message: format!("TOML parse error: {}", err),
        }
    }
}

impl From<toml::ser::Error> for IndexingError {
    fn from(err: toml::ser::Error) -> Self {
        IndexingError::Config {
            message: format!("TOML serialization error: {}", err),
        }
    }
}
