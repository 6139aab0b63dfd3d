use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for capture_rl operations
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Main error type for the training engine
#[derive(Debug, Error)]
pub enum CaptureError {
    /// A vector or record does not have the length the configuration implies.
    /// Always fatal: it means encoder, network and environment disagree.
    #[error("shape error in {context}: expected {expected}, got {actual}")]
    Shape {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// The replay buffer holds fewer transitions than a batch needs.
    #[error("insufficient samples: requested {requested}, buffer holds {available}")]
    InsufficientSamples {
        requested: usize,
        available: usize,
    },

    /// The environment has not been started or cannot be reached
    #[error("environment adapter unavailable: {0}")]
    AdapterUnavailable(String),

    /// A checkpoint file is missing fields or cannot be decoded
    #[error("corrupt checkpoint {}: {reason}", .path.display())]
    CorruptCheckpoint {
        path: PathBuf,
        reason: String,
    },

    /// Invalid parameter value
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// Invalid action
    #[error("invalid action {action}: must be less than {max_actions}")]
    InvalidAction {
        action: usize,
        max_actions: usize,
    },

    /// Numerical failure during an update
    #[error("training error: {0}")]
    Training(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),
}

// Helper functions for common error patterns
impl CaptureError {
    pub fn shape<S: Into<String>>(context: S, expected: usize, actual: usize) -> Self {
        CaptureError::Shape {
            context: context.into(),
            expected,
            actual,
        }
    }

    pub fn invalid_parameter<S: Into<String>, R: Into<String>>(name: S, reason: R) -> Self {
        CaptureError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn corrupt_checkpoint<R: Into<String>>(path: &Path, reason: R) -> Self {
        CaptureError::CorruptCheckpoint {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Whether the caller may skip the operation and carry on.
    /// Only buffer warm-up qualifies.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CaptureError::InsufficientSamples { .. })
    }
}
