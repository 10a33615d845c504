//! Domain error types for the timebank service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

use crate::models::BookingStatus;

/// Domain error taxonomy for booking and ledger operations
#[derive(Error, Debug)]
pub enum TimebankError {
    /// Caller identity missing or malformed
    #[error("Unauthorized")]
    Unauthorized,

    /// Malformed or rejected input
    #[error("{0}")]
    Validation(String),

    /// Actor is not permitted to perform the requested operation
    #[error("{0}")]
    Forbidden(String),

    /// Requested status change is not an edge in the booking state graph
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// Wallet balance does not cover the requested amount
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    /// Referenced entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// An internal invariant was violated; indicates a bug, not bad input
    #[error("integrity error: {0}")]
    Integrity(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Infrastructure error from the shared database layer
    #[error(transparent)]
    Infrastructure(#[from] common::error::DatabaseError),
}

impl IntoResponse for TimebankError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            TimebankError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            TimebankError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            TimebankError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            TimebankError::InvalidTransition { .. } => (StatusCode::CONFLICT, self.to_string()),
            TimebankError::InsufficientFunds { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
            TimebankError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            TimebankError::Integrity(msg) => {
                tracing::error!("integrity violation: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
            TimebankError::Database(e) => {
                tracing::error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database error".to_string(),
                )
            }
            TimebankError::Infrastructure(e) => {
                tracing::error!("infrastructure error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for timebank results
pub type TimebankResult<T> = Result<T, TimebankError>;
