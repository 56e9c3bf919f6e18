//! Custom error types for Verdant.
//!
//! Errors fall into three operational kinds: validation (rejected up front,
//! nothing mutated, never retried), transient persistence failures (retried
//! once with backoff), and conflicts (the pipeline is re-run against fresh
//! state, bounded by the configured attempt budget).

use thiserror::Error;
use uuid::Uuid;

/// Main error type for Verdant operations.
#[derive(Error, Debug)]
pub enum VerdantError {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    /// Task does not exist
    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: Uuid },

    /// Task belongs to a different user
    #[error("Task {task_id} does not belong to user {user}")]
    TaskNotOwned { task_id: Uuid, user: String },

    /// Task was already completed (re-entrancy guard)
    #[error("Task already completed: {task_id}")]
    AlreadyCompleted { task_id: Uuid },

    /// Invalid value supplied by a caller
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    // =========================================================================
    // Persistence Errors
    // =========================================================================
    /// Transient storage failure (network, unavailability)
    #[error("Storage error during {operation}: {message}")]
    Storage { operation: String, message: String },

    /// Storage call exceeded the configured timeout
    #[error("Storage operation timed out: {operation}")]
    Timeout { operation: String },

    /// Concurrent-update conflict detected by a versioned store
    #[error("Conflict detected during {operation}, gave up after {attempts} attempts")]
    Conflict { operation: String, attempts: u32 },

    /// Persisted state failed to decode
    #[error("Corrupt stored state: {message}")]
    Corrupt { message: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VerdantError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a transient storage error.
    pub fn storage(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a conflict error.
    pub fn conflict(operation: impl Into<String>, attempts: u32) -> Self {
        Self::Conflict {
            operation: operation.into(),
            attempts,
        }
    }

    /// Create a corrupt-state error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }

    /// Create an invalid-input error.
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Caller mistakes: rejected immediately, nothing mutated, never retried.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::TaskNotFound { .. }
                | Self::TaskNotOwned { .. }
                | Self::AlreadyCompleted { .. }
                | Self::InvalidInput { .. }
        )
    }

    /// Failures worth one retry with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::Timeout { .. } | Self::Io(_)
        )
    }

    /// Concurrent-update conflicts: re-run the pipeline against fresh state.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Type alias for Verdant results.
pub type Result<T> = std::result::Result<T, VerdantError>;
