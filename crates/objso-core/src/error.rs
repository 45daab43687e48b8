//! Error types for objso

use thiserror::Error;

/// Result type alias using objso's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in objso operations
#[derive(Error, Debug)]
pub enum Error {
    /// Mesh snapshot references data it does not contain
    #[error("Invalid mesh '{name}': {reason}")]
    InvalidMesh { name: String, reason: String },

    /// Curve snapshot is malformed
    #[error("Invalid curve '{name}': {reason}")]
    InvalidCurve { name: String, reason: String },

    /// Export failed
    #[error("Export failed: {0}")]
    Export(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Scene document could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_mesh(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidMesh {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_curve(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidCurve {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
