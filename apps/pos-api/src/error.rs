//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Handler: Result<T, ApiError>                                           │
//! │       │                                                                 │
//! │       ├── CoreError (rule violated)  ──► 400 / 404, keyed by field       │
//! │       ├── DbError   (storage)        ──► 500, details only in the log   │
//! │       └── missing X-Cashier-Id       ──► 401                            │
//! │                                                                         │
//! │  Body:                                                                  │
//! │  {                                                                      │
//! │    "code": "INSUFFICIENT_STOCK",                                        │
//! │    "message": "Insufficient stock for Bread. Available 3, required 5.", │
//! │    "errors": { "inventory": ["Insufficient stock for Bread. ..."] }     │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use zimpos_core::CoreError;
use zimpos_db::{CheckoutError, DbError};

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The cashier has no open session (400)
    NoActiveSession,

    /// Input validation failed (400)
    ValidationError,

    /// Not enough stock for a line (400)
    InsufficientStock,

    /// Product belongs to another store (400)
    StoreMismatch,

    /// Resource not found (404)
    NotFound,

    /// Missing cashier identity (401)
    Unauthorized,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

/// Error returned from handlers.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
    /// Messages keyed by the request field they concern.
    pub errors: BTreeMap<String, Vec<String>>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: ErrorCode,
    message: &'a str,
    errors: &'a BTreeMap<String, Vec<String>>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
            errors: BTreeMap::new(),
        }
    }

    /// Attaches the message to `field` in the `errors` map.
    pub fn on_field(mut self, field: impl Into<String>) -> Self {
        self.errors
            .entry(field.into())
            .or_default()
            .push(self.message.clone());
        self
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, ErrorCode::ValidationError, message).on_field(field)
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            StatusCode::NOT_FOUND,
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
        .on_field("error")
    }

    pub fn unauthorized() -> Self {
        ApiError::new(
            StatusCode::UNAUTHORIZED,
            ErrorCode::Unauthorized,
            "Authentication credentials were not provided",
        )
        .on_field("error")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Internal, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code,
            message: &self.message,
            errors: &self.errors,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        let bad_request = |code: ErrorCode, field: &str| {
            ApiError::new(StatusCode::BAD_REQUEST, code, message.clone()).on_field(field)
        };

        match &err {
            CoreError::NoActiveSession => bad_request(ErrorCode::NoActiveSession, "error"),
            CoreError::EmptyItemSet
            | CoreError::InvalidItemSpec { .. }
            | CoreError::TooManyItems { .. }
            | CoreError::AmountOverflow => bad_request(ErrorCode::ValidationError, "items"),
            CoreError::InsufficientStock { .. } => {
                bad_request(ErrorCode::InsufficientStock, "inventory")
            }
            CoreError::StoreMismatch { .. } => bad_request(ErrorCode::StoreMismatch, "product"),
            CoreError::ProductNotFound(_) => bad_request(ErrorCode::ValidationError, "product"),
            CoreError::ServiceNotFound(_) => bad_request(ErrorCode::ValidationError, "service"),
            CoreError::StoreNotFound(_) => bad_request(ErrorCode::ValidationError, "store"),
            CoreError::InvalidPaymentMethod(_) => {
                bad_request(ErrorCode::ValidationError, "payment_method")
            }
            CoreError::DiscountExceedsTotal { .. } => {
                bad_request(ErrorCode::ValidationError, "discount_amount")
            }
            CoreError::Validation(e) => bad_request(ErrorCode::ValidationError, e.field()),
            CoreError::SessionNotFound(id) => ApiError::not_found("Session", id),
            CoreError::SaleNotFound(id) => ApiError::not_found("Sale", id),
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::validation(&field, format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => {
                error!("Foreign key violation: {}", message);
                ApiError::validation("error", "Invalid reference")
            }
            DbError::CheckViolation { message } => {
                error!("Check constraint violated: {}", message);
                ApiError::validation("error", "Value out of range")
            }
            DbError::PoolExhausted => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::DatabaseError,
                "Database busy, try again",
            ),
            other => {
                // Log the actual error but return a generic message
                error!(error = %other, "Database operation failed");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DatabaseError,
                    "Database operation failed",
                )
            }
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Core(e) => e.into(),
            CheckoutError::Db(e) => e.into(),
        }
    }
}

/// Malformed or mistyped JSON bodies.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationError,
            rejection.body_text(),
        )
        .on_field("body")
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
