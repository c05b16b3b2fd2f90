//! # zimpos-core: Pure Business Logic for ZimPOS
//!
//! This crate holds the rules of a POS sale as pure functions with zero I/O
//! dependencies. Storage and HTTP live in `zimpos-db` and `pos-api`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ZimPOS Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    pos-api (axum)                               │   │
//! │  │   start-session ──► make-sale ──► end-session                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    zimpos-db (checkout pipeline)                │   │
//! │  │   items → stock → totals → session → settlement → fiscal log   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls                                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ zimpos-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────────┐ ┌──────┐ │   │
//! │  │   │  types  │ │  money  │ │   sale   │ │ settlement │ │fiscal│ │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └────────────┘ └──────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Session, Sale, ItemRef, LedgerAccount, etc.)
//! - [`money`] - Money type with integer arithmetic and decimal-string wire format
//! - [`sale`] - Request validation, line and sale totals, sale numbers
//! - [`settlement`] - Payment method to ledger routing
//! - [`fiscal`] - Fiscal payload, gateway trait, outcome
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation
//!
//! ## Example Usage
//!
//! ```rust
//! use zimpos_core::money::Money;
//! use zimpos_core::types::{LedgerKind, PaymentMethod};
//!
//! let total = Money::parse("32.00").unwrap();
//! assert_eq!(total.cents(), 3200);
//!
//! assert_eq!(PaymentMethod::MobileMoney.ledger_kind(), LedgerKind::MobileMoney);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fiscal;
pub mod money;
pub mod sale;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Currency used for fiscal payloads when a business has not set one.
pub const DEFAULT_CURRENCY: &str = "ZWL";

/// Standard VAT rate in basis points (15%).
pub const DEFAULT_VAT_RATE_BPS: u32 = 1500;

/// Maximum lines in a single sale.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity on a single line.
///
/// ## Business Reason
/// Catches keying mistakes (10000 instead of 10) at the till.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

pub const MAX_CUSTOMER_NAME_LEN: usize = 100;
pub const MAX_CUSTOMER_PHONE_LEN: usize = 20;
