//! Error types for the triage core.

use std::path::PathBuf;
use thiserror::Error;

/// Why a trained model could not be made available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// Artifact file does not exist
    Missing,
    /// Artifact exists but cannot be read or parsed
    Corrupt,
    /// Model and vocabulary come from different training runs
    Unpaired,
}

impl std::fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Corrupt => write!(f, "corrupt"),
            Self::Unpaired => write!(f, "unpaired"),
        }
    }
}

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Model unavailable ({reason}) at {}: {detail}", path.display())]
    ModelUnavailable {
        path: PathBuf,
        reason: UnavailableReason,
        detail: String,
    },

    #[error("Feature vector has {actual} components, model expects {expected}")]
    InputMismatch { expected: usize, actual: usize },

    #[error("Invalid training input: {0}")]
    InvalidTraining(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl TriageError {
    pub fn code(&self) -> i32 {
        match self {
            TriageError::ModelUnavailable { .. } => -32010,
            TriageError::InputMismatch { .. } => -32011,
            TriageError::InvalidTraining(_) => -32012,
            TriageError::Config(_) => -32013,
            TriageError::Io(_) => -32006,
            TriageError::Json(_) => -32700,
            TriageError::Toml(_) => -32701,
        }
    }

    /// Shorthand for a `ModelUnavailable` error
    pub fn unavailable(
        path: impl Into<PathBuf>,
        reason: UnavailableReason,
        detail: impl Into<String>,
    ) -> Self {
        TriageError::ModelUnavailable {
            path: path.into(),
            reason,
            detail: detail.into(),
        }
    }

    /// Reason for unavailability, if this is a `ModelUnavailable` error
    pub fn unavailable_reason(&self) -> Option<UnavailableReason> {
        match self {
            TriageError::ModelUnavailable { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TriageError>;
