//! # Error Types
//!
//! Domain-specific error types for zimpos-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  zimpos-core errors (this file)                                        │
//! │  ├── CoreError        - Sale rule violations                           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  zimpos-db errors (separate crate)                                     │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── CheckoutError    - CoreError | DbError from the sale pipeline     │
//! │                                                                         │
//! │  pos-api errors (in app)                                               │
//! │  └── ApiError         - What the client sees (field-keyed JSON)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → ApiError          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant of [`CoreError`] is a client error: none of them leave any
//! state behind, because they are raised before or inside the rolled-back
//! sale transaction.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised while starting sessions or making sales.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The cashier has no open session to record the sale against.
    #[error("No active session found")]
    NoActiveSession,

    /// A sale must carry at least one line.
    #[error("At least one item is required")]
    EmptyItemSet,

    /// A line names both a product and a service, or neither.
    #[error("Item {line}: {reason}")]
    InvalidItemSpec { line: usize, reason: String },

    /// Too many lines in one sale.
    #[error("A sale cannot have more than {max} items")]
    TooManyItems { max: usize },

    /// Selling more than is on the shelf.
    ///
    /// ## User Workflow
    /// ```text
    /// make-sale (Bread × 5)
    ///      │
    ///      ▼
    /// conditional decrement: stock=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Bread", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// 400 { "inventory": ["Insufficient stock for Bread. Available 3, required 5."] }
    /// ```
    #[error("Insufficient stock for {product}. Available {available}, required {requested}.")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Product is pinned to a different store than the session's.
    #[error("Product {product} does not belong to the selected store.")]
    StoreMismatch { product: String },

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Store not found: {0}")]
    StoreNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    #[error("Invalid payment method: {0}")]
    InvalidPaymentMethod(String),

    /// The discount would take the sale total below zero.
    #[error("Discount {discount} exceeds subtotal plus tax ({gross})")]
    DiscountExceedsTotal { discount: String, gross: String },

    /// Line or sale arithmetic left the i64 cent range.
    #[error("Amount out of range")]
    AmountOverflow,

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Every variant names the offending field so the HTTP layer can key the
/// error body by it.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., bad phone number, bad currency code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// The field this error is about.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::Negative { field }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Bread".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Bread. Available 3, required 5."
        );

        let err = CoreError::StoreMismatch {
            product: "Milk".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Product Milk does not belong to the selected store."
        );

        assert_eq!(CoreError::NoActiveSession.to_string(), "No active session found");
        assert_eq!(CoreError::EmptyItemSet.to_string(), "At least one item is required");
    }

    #[test]
    fn test_validation_error_field() {
        let err = ValidationError::TooLong {
            field: "customer_name".to_string(),
            max: 100,
        };
        assert_eq!(err.field(), "customer_name");
        assert_eq!(err.to_string(), "customer_name must be at most 100 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "store".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "store is required");
    }
}
