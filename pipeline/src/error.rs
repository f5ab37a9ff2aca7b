//! Error types for the spotter pipeline
//!
//! One enum per layer, following the taxonomy the pipeline is built around:
//! - `DomainError`: store/state-machine errors (invariant violations abort
//!   the operation without mutating state)
//! - `AnalysisError`: classifier gateway errors, transient vs permanent
//! - `PublishError`: publishing platform errors, transient vs permanent
//! - `FeedbackError`: feedback sink errors (loud, never blocking)
//! - `ConfigError`: invalid configuration at startup (fatal)

use thiserror::Error;

use crate::domain::entities::ItemState;

/// Domain layer errors - store access and state-machine invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: ItemState, to: ItemState },

    #[error("Stale state: expected {expected}, found {actual}")]
    StaleState {
        expected: ItemState,
        actual: ItemState,
    },

    #[error("Item is not pending review: {0}")]
    ItemNotPending(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Classifier gateway errors
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Analysis request timed out")]
    Timeout,

    #[error("Analysis service unavailable: {0}")]
    Unavailable(String),

    #[error("Payload rejected by classifier: {0}")]
    Rejected(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl AnalysisError {
    /// Transient errors are retried with backoff; permanent ones are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, AnalysisError::Timeout | AnalysisError::Unavailable(_))
    }
}

/// Publishing platform errors
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Publish request timed out")]
    Timeout,

    #[error("Transient publish failure: {0}")]
    Transient(String),

    #[error("Permanent publish failure: {0}")]
    Permanent(String),
}

impl PublishError {
    pub fn is_transient(&self) -> bool {
        matches!(self, PublishError::Timeout | PublishError::Transient(_))
    }
}

/// Feedback sink errors
#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Recording failed: {0}")]
    RecordingFailed(String),
}

/// Configuration errors - fatal at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },

    #[error("Invalid thresholds: auto_reject_at ({reject}) must not exceed auto_approve_at ({approve})")]
    InvertedThresholds { reject: f64, approve: f64 },
}
