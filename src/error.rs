//! Error types for the zone inspector
//!
//! Distinguishes input validation failures, resources that vanished between
//! listing and dereferencing, and transient collaborator failures so callers
//! can decide between retrying and aborting.

use thiserror::Error;

/// Unified error type for the inspector
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Input Errors
    // =========================================================================
    #[error("Invalid label selector {selector:?}: {reason}")]
    SelectorInvalid { selector: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Cluster Errors
    // =========================================================================
    #[error("Resource not found: {kind}/{name}")]
    ResourceNotFound { kind: String, name: String },

    #[error("Cluster API unavailable during {operation}: {reason}")]
    CollaboratorUnavailable { operation: String, reason: String },

    #[error("Kubernetes client error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Report cancelled")]
    Cancelled,

    // =========================================================================
    // Output Errors
    // =========================================================================
    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Action to take when a collaborator call fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Retry the call with exponential backoff
    RetryWithBackoff,
    /// Give up on the call
    Fail,
}

impl Error {
    /// Build a `ResourceNotFound` error
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Error::ResourceNotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Build a `CollaboratorUnavailable` error
    pub fn unavailable(operation: impl Into<String>, reason: impl ToString) -> Self {
        Error::CollaboratorUnavailable {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Determine what action to take for this error
    pub fn action(&self) -> ErrorAction {
        match self {
            Error::CollaboratorUnavailable { .. } | Error::Kube(_) => {
                ErrorAction::RetryWithBackoff
            }

            // Selector and config problems never fix themselves, a missing
            // resource is a listing race and a cancelled run is over.
            Error::SelectorInvalid { .. }
            | Error::Configuration(_)
            | Error::ResourceNotFound { .. }
            | Error::Cancelled
            | Error::Json(_)
            | Error::Io(_) => ErrorAction::Fail,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self.action(), ErrorAction::RetryWithBackoff)
    }

    /// Check if this error is transient
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::CollaboratorUnavailable { .. } | Error::Kube(_)
        )
    }
}

/// Result type alias for the inspector
pub type Result<T> = std::result::Result<T, Error>;
