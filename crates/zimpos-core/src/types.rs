//! # Domain Types
//!
//! Core domain types used throughout ZimPOS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Business ──► Store ──┬──► SaleSession ──► Sale ──► SaleItem           │
//! │                       │                      │         │                │
//! │                       │                      │         └─ ItemRef       │
//! │                       │                      │            Product(id)   │
//! │                       │                      │            Service(id)   │
//! │                       │                      └──► FiscalizationLog      │
//! │                       │                                                 │
//! │                       ├──► Product ──► InventoryMovement               │
//! │                       ├──► Service                                      │
//! │                       └──► LedgerAccount ──► AccountTransaction        │
//! │                            (CashTill | MobileMoney | Bank)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Money Columns
//! Persisted amounts are `*_cents: i64`; accessors return [`Money`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Business & Store
// =============================================================================

/// A tenant business. Fiscal configuration hangs off this.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Business {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A physical store location belonging to a business.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Store {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub vat_number: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Catalog
// =============================================================================

/// A stock-keeping product.
///
/// `quantity_in_stock` never goes below zero: it is only decremented by the
/// conditional update in the inventory repository.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub business_id: String,
    /// Store this product is stocked at (optional for multi-store catalogs).
    pub store_id: Option<String>,
    pub sku: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub cost_price_cents: i64,
    pub quantity_in_stock: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Whether this product may be sold from the given store.
    ///
    /// Products without a store are sellable everywhere in the business.
    pub fn sellable_at(&self, store_id: &str) -> bool {
        match &self.store_id {
            Some(own) => own == store_id,
            None => true,
        }
    }
}

/// A non-stocked service line (labour, repairs, consulting).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Service {
    pub id: String,
    pub business_id: String,
    pub store_id: Option<String>,
    pub service_code: String,
    pub name: String,
    pub price_cents: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Service {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Item Reference
// =============================================================================

/// What a sale line sells: exactly one product or exactly one service.
///
/// ## Why an enum?
/// The wire shape is `{ "product": id? , "service": id? }`. Both-or-neither is
/// rejected once at the edge by [`ItemRef::from_parts`]; past that point the
/// invalid state cannot be expressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ItemRef {
    Product(String),
    Service(String),
}

impl ItemRef {
    /// Builds an item reference from the optional wire fields.
    ///
    /// `line` is the zero-based position in the request, used in the error.
    pub fn from_parts(
        line: usize,
        product: Option<String>,
        service: Option<String>,
    ) -> CoreResult<ItemRef> {
        let product = product.filter(|p| !p.trim().is_empty());
        let service = service.filter(|s| !s.trim().is_empty());

        match (product, service) {
            (Some(p), None) => Ok(ItemRef::Product(p)),
            (None, Some(s)) => Ok(ItemRef::Service(s)),
            (None, None) => Err(CoreError::InvalidItemSpec {
                line,
                reason: "either product or service must be specified".to_string(),
            }),
            (Some(_), Some(_)) => Err(CoreError::InvalidItemSpec {
                line,
                reason: "cannot specify both product and service".to_string(),
            }),
        }
    }

    pub fn product_id(&self) -> Option<&str> {
        match self {
            ItemRef::Product(id) => Some(id),
            ItemRef::Service(_) => None,
        }
    }

    pub fn service_id(&self) -> Option<&str> {
        match self {
            ItemRef::Service(id) => Some(id),
            ItemRef::Product(_) => None,
        }
    }
}

// =============================================================================
// Sale Session
// =============================================================================

/// A cashier's open shift against one store.
///
/// At most one active session exists per (cashier, store) pair.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleSession {
    pub id: String,
    pub cashier_id: String,
    pub store_id: String,
    #[ts(as = "String")]
    pub start_time: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub end_time: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub opening_balance_cents: i64,
    pub closing_balance_cents: i64,
    pub total_sales_cents: i64,
    pub total_transactions: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleSession {
    pub fn opening_balance(&self) -> Money {
        Money::from_cents(self.opening_balance_cents)
    }

    pub fn closing_balance(&self) -> Money {
        Money::from_cents(self.closing_balance_cents)
    }

    pub fn total_sales(&self) -> Money {
        Money::from_cents(self.total_sales_cents)
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a committed sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    Completed,
    Refunded,
    Cancelled,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Completed
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    MobileMoney,
    Mixed,
}

impl PaymentMethod {
    /// Every accepted wire value.
    pub const ALL: [&'static str; 4] = ["CASH", "CARD", "MOBILE_MONEY", "MIXED"];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Card => "CARD",
            PaymentMethod::MobileMoney => "MOBILE_MONEY",
            PaymentMethod::Mixed => "MIXED",
        }
    }

    /// The ledger kind that receives this payment.
    ///
    /// ```text
    /// CASH          → CashTill
    /// MOBILE_MONEY  → MobileMoney
    /// anything else → Bank
    /// ```
    pub fn ledger_kind(&self) -> LedgerKind {
        match self {
            PaymentMethod::Cash => LedgerKind::CashTill,
            PaymentMethod::MobileMoney => LedgerKind::MobileMoney,
            PaymentMethod::Card | PaymentMethod::Mixed => LedgerKind::Bank,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    /// Case-insensitive; `mobile-money` and `mobile money` are accepted too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "CASH" => Ok(PaymentMethod::Cash),
            "CARD" => Ok(PaymentMethod::Card),
            "MOBILE_MONEY" => Ok(PaymentMethod::MobileMoney),
            "MIXED" => Ok(PaymentMethod::Mixed),
            _ => Err(CoreError::InvalidPaymentMethod(s.to_string())),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One committed POS transaction.
///
/// `total_amount = subtotal + tax_amount − discount_amount`, where `subtotal`
/// is recomputed from the persisted items and never taken from the client.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub session_id: String,
    pub sale_number: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub subtotal_cents: i64,
    pub tax_amount_cents: i64,
    pub discount_amount_cents: i64,
    pub total_amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    pub fn tax_amount(&self) -> Money {
        Money::from_cents(self.tax_amount_cents)
    }

    pub fn discount_amount(&self) -> Money {
        Money::from_cents(self.discount_amount_cents)
    }

    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line of a sale. Only ever created together with its parent sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub item: ItemRef,
    /// Name at time of sale (denormalized).
    pub item_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// Always `quantity × unit_price`.
    pub total_price_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

// =============================================================================
// Inventory Movement
// =============================================================================

/// Why stock moved.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Purchase,
    Sale,
    Adjustment,
    Transfer,
}

/// Audit record of a stock change.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryMovement {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub total_cost_cents: i64,
    pub movement_type: MovementType,
    pub reference: String,
    pub notes: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Ledger
// =============================================================================

/// The three concrete account kinds a sale can settle into.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerKind {
    CashTill,
    MobileMoney,
    Bank,
}

impl LedgerKind {
    /// Whether credits to this kind are backed by a transaction row.
    ///
    /// Cash has no sub-ledger: the till balance is the record.
    pub const fn keeps_sub_ledger(&self) -> bool {
        !matches!(self, LedgerKind::CashTill)
    }
}

impl fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LedgerKind::CashTill => "cash till",
            LedgerKind::MobileMoney => "mobile money account",
            LedgerKind::Bank => "bank account",
        };
        f.write_str(s)
    }
}

/// A store-scoped financial account with a running balance.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LedgerAccount {
    pub id: String,
    pub store_id: String,
    pub kind: LedgerKind,
    pub account_name: String,
    pub currency_code: Option<String>,
    pub opening_balance_cents: i64,
    pub current_balance_cents: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl LedgerAccount {
    pub fn current_balance(&self) -> Money {
        Money::from_cents(self.current_balance_cents)
    }
}

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Transfer,
    Payment,
    Receipt,
}

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

/// Sub-ledger row for mobile money and bank accounts.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AccountTransaction {
    pub id: String,
    pub account_id: String,
    pub transaction_type: TransactionType,
    pub amount_cents: i64,
    pub reference: String,
    pub description: String,
    #[ts(as = "String")]
    pub transaction_date: NaiveDate,
    #[ts(as = "String")]
    pub value_date: NaiveDate,
    pub status: TransactionStatus,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Fiscalization
// =============================================================================

/// Tax-authority (ZIMRA) registration for a business.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct FiscalConfig {
    pub business_id: String,
    pub vat_registration_number: String,
    pub is_vat_registered: bool,
    pub vat_rate_bps: u32,
    pub currency_code: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// One submission attempt for one sale; written whatever the outcome.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct FiscalizationLog {
    pub id: String,
    pub sale_id: String,
    pub fiscal_receipt_number: Option<String>,
    pub success: bool,
    pub request_payload: String,
    pub response_payload: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
