//! Error types for the fallible edges of the triage engine.
//!
//! The rule engine itself cannot fail. Errors only come from loading or
//! running an inference artifact and from writing reports.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading or running the inference artifact.
#[cfg(feature = "ml")]
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to fetch model: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Failed to read model: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid model format: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Invalid model location: {0}")]
    InvalidLocation(String),

    #[error("Invalid model architecture: {0}")]
    Architecture(String),

    #[error("Shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Model labels {found:?} do not match the expected class order")]
    LabelMismatch { found: Vec<String> },
}

#[cfg(feature = "ml")]
impl ModelError {
    pub fn architecture<S: Into<String>>(msg: S) -> Self {
        ModelError::Architecture(msg.into())
    }

    pub fn inference<S: Into<String>>(msg: S) -> Self {
        ModelError::Inference(msg.into())
    }
}

#[cfg(feature = "ml")]
pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
