//! # Cashier Identity
//!
//! Authentication happens upstream. The gateway in front of this service
//! forwards the authenticated cashier in the `X-Cashier-Id` header; requests
//! without it are rejected before reaching a handler.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::warn;

use crate::error::ApiError;

pub const CASHIER_HEADER: &str = "x-cashier-id";

/// The authenticated cashier making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashierId(pub String);

impl CashierId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CashierId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let cashier = parts
            .headers
            .get(CASHIER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        match cashier {
            Some(id) => Ok(CashierId(id.to_string())),
            None => {
                warn!(uri = %parts.uri, "Request without cashier identity");
                Err(ApiError::unauthorized())
            }
        }
    }
}
