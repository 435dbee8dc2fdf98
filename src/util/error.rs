//! Error types for package export.

use std::path::PathBuf;
use thiserror::Error;

use crate::export::ValidationError;
use crate::scene::ObjectId;

/// Main error type for package export operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Handle no longer resolves to a live scene object
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// Object exists but is not a transform-like node
    #[error("Object '{0}' is not a transform")]
    NotATransform(String),

    /// No object with this display name in the scene
    #[error("No object named '{0}' in the scene")]
    NameNotFound(String),

    /// Package id not present in the registry
    #[error("Package not found: {0}")]
    PackageNotFound(u64),

    /// Selection did not have the shape an operation needs
    #[error("Invalid selection: expected {expected} object(s), got {actual}")]
    InvalidSelection { expected: usize, actual: usize },

    /// Relative scale against a root with a zero scale component
    #[error("Root '{0}' has a zero scale component")]
    ZeroRootScale(String),

    /// Validation found problems that stop the export
    #[error("Export blocked: {}", join_issues(.0))]
    Blocked(Vec<ValidationError>),

    /// User declined to continue past validation warnings
    #[error("Export cancelled")]
    Cancelled,

    /// Host scene or host exporter reported a failure
    #[error("Host error: {0}")]
    Host(String),

    /// Scene description file could not be written
    #[error("Failed to write scene description {path}: {source}")]
    DescriptionWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a host error.
    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }

    /// True for errors that mean a snapshot's backing object went away.
    pub fn is_stale_reference(&self) -> bool {
        matches!(self, Self::ObjectNotFound(_) | Self::NotATransform(_))
    }
}

fn join_issues(issues: &[ValidationError]) -> String {
    issues.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("; ")
}

/// Result type alias for package export operations.
pub type Result<T> = std::result::Result<T, Error>;
