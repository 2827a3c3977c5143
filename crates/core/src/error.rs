//! Domain error model.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, illegal transitions). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// An arithmetic precondition of a value transition was violated.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A value would be constructed in an illegal state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A lifecycle transition is not allowed from the current status.
    #[error("invalid transition for {entity_id}: current {current}, expected {expected}")]
    InvalidTransition {
        entity_id: String,
        current: String,
        expected: String,
    },

    /// A time-bounded entity was used after its deadline.
    #[error("{entity_id} expired at {expired_at}")]
    Expired {
        entity_id: String,
        expired_at: DateTime<Utc>,
    },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn invalid_transition(
        entity_id: impl Into<String>,
        current: impl core::fmt::Display,
        expected: impl core::fmt::Display,
    ) -> Self {
        Self::InvalidTransition {
            entity_id: entity_id.into(),
            current: current.to_string(),
            expected: expected.to_string(),
        }
    }

    pub fn expired(entity_id: impl Into<String>, expired_at: DateTime<Utc>) -> Self {
        Self::Expired {
            entity_id: entity_id.into(),
            expired_at,
        }
    }
}
