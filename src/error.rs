//! DEX error types with HTTP status code mapping.
//!
//! [`DexError`] is the central error type. Engine preconditions, settlement
//! failures and server faults all surface through it; each variant maps to
//! a stable numeric code and an HTTP status, so a client can tell the
//! failure kinds apart and decide whether to resubmit.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::ledger::TransferError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "message": "insufficient shares: requested 32, available 31",
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
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Engine and server error enum with HTTP status code mapping.
///
/// A failed operation never leaves partial effects: the pool state, the
/// asset balances and the event stream are exactly as before the call.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                 |
/// |-----------|-------------------|-----------------------------|
/// | 1000–1999 | Validation        | 400 Bad Request             |
/// | 2000–2999 | Pool lifecycle    | 409 Conflict                |
/// | 3000–3999 | Server            | 500 Internal Server Error   |
/// | 4000–4999 | Trade/settlement  | 422 Unprocessable Entity    |
#[derive(Debug, thiserror::Error)]
pub enum DexError {
    /// Request validation failed (malformed address or amount).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A required amount was zero, or the operation would move zero units.
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// Startup configuration rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// `initialize` called on a pool that has already been initialized.
    #[error("pool already initialized")]
    AlreadyInitialized,

    /// Trading or liquidity operation on a pool with no liquidity.
    #[error("pool not initialized")]
    PoolNotInitialized,

    /// An engine operation was entered while another one was in flight on
    /// the same call path.
    #[error("reentrant call rejected")]
    ReentrantCall,

    /// Caller tried to redeem more shares than they own.
    #[error("insufficient shares: requested {requested}, available {available}")]
    InsufficientShares {
        /// Shares the caller asked to redeem.
        requested: u128,
        /// Shares the caller owns.
        available: u128,
    },

    /// The swap output would empty the output reserve.
    #[error("insufficient output reserve")]
    InsufficientOutputReserve,

    /// An asset movement between the caller and the pool failed.
    #[error("transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    /// A result does not fit in 128 bits.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    /// Division by a zero reserve or share supply.
    #[error("division by zero")]
    DivisionByZero,

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DexError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::ZeroAmount => 1002,
            Self::InvalidConfiguration(_) => 1003,
            Self::AlreadyInitialized => 2001,
            Self::PoolNotInitialized => 2002,
            Self::ReentrantCall => 2003,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::InsufficientShares { .. } => 4001,
            Self::InsufficientOutputReserve => 4002,
            Self::TransferFailed(_) => 4003,
            Self::ArithmeticOverflow => 4004,
            Self::DivisionByZero => 4005,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::ZeroAmount | Self::InvalidConfiguration(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::AlreadyInitialized | Self::PoolNotInitialized | Self::ReentrantCall => {
                StatusCode::CONFLICT
            }
            Self::InsufficientShares { .. }
            | Self::InsufficientOutputReserve
            | Self::TransferFailed(_)
            | Self::ArithmeticOverflow
            | Self::DivisionByZero => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Extra context rendered in the `details` field, if any.
    fn details(&self) -> Option<String> {
        match self {
            Self::TransferFailed(inner) => Some(inner.kind().to_string()),
            _ => None,
        }
    }
}

impl IntoResponse for DexError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_statuses_by_range() {
        assert_eq!(DexError::ZeroAmount.error_code(), 1002);
        assert_eq!(DexError::ZeroAmount.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(DexError::AlreadyInitialized.status_code(), StatusCode::CONFLICT);
        assert_eq!(DexError::PoolNotInitialized.error_code(), 2002);
        assert_eq!(
            DexError::InsufficientOutputReserve.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            DexError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn transfer_failure_carries_kind_in_details() {
        let err = DexError::from(TransferError::InsufficientAllowance {
            needed: 10,
            allowed: 3,
        });
        assert_eq!(err.error_code(), 4003);
        assert_eq!(err.details().as_deref(), Some("insufficient_allowance"));
    }

    #[test]
    fn insufficient_shares_message_names_both_amounts() {
        let err = DexError::InsufficientShares {
            requested: 32,
            available: 31,
        };
        assert_eq!(
            err.to_string(),
            "insufficient shares: requested 32, available 31"
        );
    }
}
