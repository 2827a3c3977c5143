//! Caller-visible failure taxonomy of the orchestration services.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};
use thiserror::Error;

use stockhold_core::{DomainError, ReservationId, Sku, StoreId};
use stockhold_inventory::ReservationStatus;

use crate::store::RepositoryError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Product {sku} not found in store {store_id}")]
    ProductNotFound { store_id: StoreId, sku: Sku },

    #[error("Reservation not found: {0}")]
    ReservationNotFound(ReservationId),

    /// Admission or input validation failed; `errors` lists every violated rule.
    #[error("{message}")]
    Validation { message: String, errors: Vec<String> },

    #[error(
        "Invalid state for reservation {reservation_id}. Current: {current}, Expected: {expected}"
    )]
    InvalidReservationState {
        reservation_id: ReservationId,
        current: ReservationStatus,
        expected: ReservationStatus,
    },

    #[error(
        "Reservation {reservation_id} expired at {}",
        .expired_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )]
    ReservationExpired {
        reservation_id: ReservationId,
        expired_at: DateTime<Utc>,
        ttl_minutes: i64,
    },

    /// Stock arithmetic precondition violated.
    #[error("{0}")]
    InvalidOperation(String),

    /// Stock value would become illegal.
    #[error("{0}")]
    InvalidState(String),

    /// Unanticipated failure. The cause is kept for logs, never shown.
    #[error("An unexpected error occurred")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// Serialisable `{code, message, details}` triple handed to transports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub code: &'static str,
    pub message: String,
    pub details: Map<String, JsonValue>,
}

impl ServiceError {
    pub fn validation(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self::Validation {
            message: message.into(),
            errors,
        }
    }

    pub fn internal(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Internal(Box::new(source))
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::ProductNotFound { .. } => "PRODUCT_NOT_FOUND",
            Self::ReservationNotFound(_) => "RESERVATION_NOT_FOUND",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::InvalidReservationState { .. } => "INVALID_RESERVATION_STATE",
            Self::ReservationExpired { .. } => "RESERVATION_EXPIRED",
            Self::InvalidOperation(_) => "INVALID_STOCK_OPERATION",
            Self::InvalidState(_) => "INVALID_STOCK_STATE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn details(&self) -> Map<String, JsonValue> {
        let value = match self {
            Self::ProductNotFound { store_id, sku } => json!({
                "storeId": store_id,
                "sku": sku,
            }),
            Self::ReservationNotFound(id) => json!({ "reservationId": id }),
            Self::Validation { errors, .. } => json!({ "errors": errors }),
            Self::InvalidReservationState {
                reservation_id,
                current,
                expected,
            } => json!({
                "reservationId": reservation_id,
                "currentStatus": current,
                "expectedStatus": expected,
            }),
            Self::ReservationExpired {
                reservation_id,
                expired_at,
                ttl_minutes,
            } => json!({
                "reservationId": reservation_id,
                "expiredAt": expired_at,
                "ttlMinutes": ttl_minutes,
            }),
            Self::InvalidOperation(_) | Self::InvalidState(_) | Self::Internal(_) => json!({}),
        };
        match value {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code(),
            message: self.to_string(),
            details: self.details(),
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(value: RepositoryError) -> Self {
        Self::internal(value)
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Validation {
                message: msg.clone(),
                errors: vec![msg],
            },
            DomainError::InvalidOperation(msg) => Self::InvalidOperation(msg),
            DomainError::InvalidState(msg) => Self::InvalidState(msg),
            DomainError::InvalidTransition {
                ref entity_id,
                ref current,
                ref expected,
            } => match (
                ReservationId::parse(entity_id.as_str()),
                current.parse::<ReservationStatus>(),
                expected.parse::<ReservationStatus>(),
            ) {
                (Ok(reservation_id), Ok(current), Ok(expected)) => Self::InvalidReservationState {
                    reservation_id,
                    current,
                    expected,
                },
                _ => Self::InvalidState(value.to_string()),
            },
            DomainError::Expired { .. } => Self::InvalidState(value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_report_lists_every_error() {
        let err = ServiceError::validation(
            "Reservation validation failed",
            vec!["Quantity cannot exceed 100 per reservation".into(), "Insufficient stock. Requested: 200, Available: 100".into()],
        );
        let report = err.report();
        assert_eq!(report.code, "VALIDATION_ERROR");
        assert_eq!(report.message, "Reservation validation failed");
        assert_eq!(report.details["errors"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn internal_error_is_opaque() {
        let err = ServiceError::from(RepositoryError::Unavailable("db down at 10.0.0.7".into()));
        let report = err.report();
        assert_eq!(report.code, "INTERNAL_ERROR");
        assert_eq!(report.message, "An unexpected error occurred");
        assert!(report.details.is_empty());
        assert!(!format!("{err}").contains("10.0.0.7"));
    }

    #[test]
    fn transition_errors_map_to_reservation_state() {
        let domain = DomainError::invalid_transition("RES-1", "COMMITTED", "RESERVED");
        match ServiceError::from(domain) {
            ServiceError::InvalidReservationState { current, expected, .. } => {
                assert_eq!(current, ReservationStatus::Committed);
                assert_eq!(expected, ReservationStatus::Reserved);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn expired_report_carries_ttl() {
        let expired_at = DateTime::parse_from_rfc3339("2026-01-01T10:15:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let err = ServiceError::ReservationExpired {
            reservation_id: ReservationId::parse("RES-1").unwrap(),
            expired_at,
            ttl_minutes: 15,
        };
        assert_eq!(err.to_string(), "Reservation RES-1 expired at 2026-01-01T10:15:00Z");
        assert_eq!(err.details()["ttlMinutes"], 15);
        assert_eq!(err.code(), "RESERVATION_EXPIRED");
    }
}
