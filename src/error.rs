//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::LedgerError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4002,
///     "message": "pool has no liquidity",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see [`GatewayError`] code ranges).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                |
/// |-----------|-----------------|----------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request            |
/// | 2000–2999 | Not Found       | 404 Not Found              |
/// | 3000–3999 | Server          | 500 Internal Server Error  |
/// | 4000–4999 | Ledger State    | 422 Unprocessable Entity   |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown asset identity in a request.
    #[error("unknown asset: {0}")]
    UnknownAsset(String),

    /// Error propagated from the pool ledger or custody.
    #[error("{0}")]
    Ledger(#[from] LedgerError),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::UnknownAsset(_) => 1002,
            Self::Ledger(err) => match err {
                LedgerError::InvalidAmount(_) => 1003,
                LedgerError::InsufficientShares { .. } => 4001,
                LedgerError::PoolEmpty => 4002,
                LedgerError::ArithmeticOverflow(_) => 4003,
                LedgerError::SlippageExceeded { .. } => 4004,
                LedgerError::InsufficientEscrow { .. } => 4005,
                LedgerError::CorruptSnapshot(_) => 3002,
            },
            Self::PersistenceError(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::UnknownAsset(_)
            | Self::Ledger(LedgerError::InvalidAmount(_)) => StatusCode::BAD_REQUEST,
            Self::Ledger(LedgerError::CorruptSnapshot(_))
            | Self::PersistenceError(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Ledger(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, code = self.error_code(), "request rejected");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Amount;

    #[test]
    fn ledger_errors_map_to_codes() {
        let err = GatewayError::from(LedgerError::PoolEmpty);
        assert_eq!(err.error_code(), 4002);
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = GatewayError::from(LedgerError::InvalidAmount("zero"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = GatewayError::from(LedgerError::InsufficientShares {
            requested: Amount::new(2),
            held: Amount::new(1),
        });
        assert_eq!(err.error_code(), 4001);
    }

    #[test]
    fn server_errors_are_500() {
        let err = GatewayError::PersistenceError("down".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let err = GatewayError::from(LedgerError::CorruptSnapshot("bad".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn response_carries_status() {
        let response = GatewayError::UnknownAsset("ETH".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
