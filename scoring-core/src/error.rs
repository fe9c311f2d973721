//! Error types for the scoring core.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to bring the frozen artifacts into memory.
///
/// Fatal to inference capability, never to the process: the service keeps
/// running in an unavailable state until a reload succeeds.
#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("artifact not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt artifact {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("artifact schema mismatch: {0}")]
    SchemaMismatch(String),
}

impl ArtifactLoadError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ArtifactLoadError::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by scoring calls.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScoringError {
    /// A raw value could not be coerced to the type the schema implies.
    #[error("malformed record: field '{field}': {reason}")]
    MalformedRecord { field: String, reason: String },

    /// Scoring attempted while the artifacts are not loaded.
    #[error("model unavailable: {reason}")]
    ModelUnavailable { reason: String },

    /// Feature vector was built against a different schema.
    #[error("feature layout mismatch: expected {expected:08x}, got {actual:08x}")]
    LayoutMismatch { expected: u32, actual: u32 },
}

impl ScoringError {
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ScoringError::MalformedRecord {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, ScoringError::MalformedRecord { .. })
    }
}

pub type Result<T> = std::result::Result<T, ScoringError>;
