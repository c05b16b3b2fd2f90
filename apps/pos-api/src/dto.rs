//! # Wire Types
//!
//! Request and response bodies for the `/pos` routes. Money always travels
//! as a decimal string (`"32.00"`); requests also accept JSON numbers.
//!
//! ## Make-sale request
//! ```json
//! {
//!   "payment_method": "CASH",
//!   "customer_name": "Tendai",
//!   "tax_amount": "2.00",
//!   "items": [
//!     { "product": "<id>", "quantity": 2, "unit_price": "5.00" },
//!     { "service": "<id>", "quantity": 1, "unit_price": "20.00" }
//!   ]
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use zimpos_core::money::decimal;
use zimpos_core::sale::{SaleLine, SaleRequest};
use zimpos_core::{
    CoreError, CoreResult, FiscalizationLog, ItemRef, LedgerKind, Money, PaymentMethod, Sale, SaleItem,
    SaleSession, SaleStatus,
};
use zimpos_db::{CompletedSale, SettlementOutcome};

// =============================================================================
// Sessions
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct StartSessionRequest {
    pub store: String,
    #[serde(default, with = "decimal::option")]
    pub opening_balance: Option<Money>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndSessionRequest {
    /// Close the session at this store; defaults to the most recent one.
    #[serde(default)]
    pub store: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: String,
    pub cashier_id: String,
    pub store_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_active: bool,
    #[serde(with = "decimal")]
    pub opening_balance: Money,
    #[serde(with = "decimal")]
    pub closing_balance: Money,
    #[serde(with = "decimal")]
    pub total_sales: Money,
    pub total_transactions: i64,
}

impl From<SaleSession> for SessionResponse {
    fn from(session: SaleSession) -> Self {
        SessionResponse {
            opening_balance: session.opening_balance(),
            closing_balance: session.closing_balance(),
            total_sales: session.total_sales(),
            id: session.id,
            cashier_id: session.cashier_id,
            store_id: session.store_id,
            start_time: session.start_time,
            end_time: session.end_time,
            is_active: session.is_active,
            total_transactions: session.total_transactions,
        }
    }
}

// =============================================================================
// Sales
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SaleItemRequest {
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    pub quantity: i64,
    #[serde(with = "decimal")]
    pub unit_price: Money,
    #[serde(default)]
    pub item_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MakeSaleRequest {
    pub payment_method: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default, with = "decimal::option")]
    pub tax_amount: Option<Money>,
    #[serde(default, with = "decimal::option")]
    pub discount_amount: Option<Money>,
    #[serde(default)]
    pub items: Vec<SaleItemRequest>,
}

impl MakeSaleRequest {
    /// Resolves the payment method and the product-or-service of every line.
    /// An empty item list is reported ahead of any other field.
    pub fn into_domain(self) -> CoreResult<SaleRequest> {
        if self.items.is_empty() {
            return Err(CoreError::EmptyItemSet);
        }

        let payment_method: PaymentMethod = self.payment_method.parse()?;

        let lines = self
            .items
            .into_iter()
            .enumerate()
            .map(|(line, item)| {
                Ok(SaleLine {
                    item: ItemRef::from_parts(line, item.product, item.service)?,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    item_name: item.item_name,
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(SaleRequest {
            payment_method,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            tax_amount: self.tax_amount.unwrap_or_default(),
            discount_amount: self.discount_amount.unwrap_or_default(),
            lines,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItemResponse {
    pub id: String,
    pub product: Option<String>,
    pub service: Option<String>,
    pub item_name: String,
    pub quantity: i64,
    #[serde(with = "decimal")]
    pub unit_price: Money,
    #[serde(with = "decimal")]
    pub total_price: Money,
}

impl From<SaleItem> for SaleItemResponse {
    fn from(item: SaleItem) -> Self {
        SaleItemResponse {
            product: item.item.product_id().map(str::to_string),
            service: item.item.service_id().map(str::to_string),
            unit_price: item.unit_price(),
            total_price: item.total_price(),
            id: item.id,
            item_name: item.item_name,
            quantity: item.quantity,
        }
    }
}

/// Where the money was posted; present on make-sale responses only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementResponse {
    Posted {
        account_id: String,
        ledger: LedgerKind,
        #[serde(with = "decimal")]
        amount: Money,
    },
    NoAccount {
        ledger: LedgerKind,
    },
    NothingToPost,
}

impl From<SettlementOutcome> for SettlementResponse {
    fn from(outcome: SettlementOutcome) -> Self {
        match outcome {
            SettlementOutcome::Posted {
                account_id,
                kind,
                amount,
                ..
            } => SettlementResponse::Posted {
                account_id,
                ledger: kind,
                amount,
            },
            SettlementOutcome::NoAccount { kind } => SettlementResponse::NoAccount { ledger: kind },
            SettlementOutcome::NothingToPost => SettlementResponse::NothingToPost,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleResponse {
    pub id: String,
    pub sale_number: String,
    pub session_id: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    #[serde(with = "decimal")]
    pub subtotal: Money,
    #[serde(with = "decimal")]
    pub tax_amount: Money,
    #[serde(with = "decimal")]
    pub discount_amount: Money,
    #[serde(with = "decimal")]
    pub total_amount: Money,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
    pub items: Vec<SaleItemResponse>,
    pub fiscal_receipt_number: Option<String>,
    pub fiscalization_success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement: Option<SettlementResponse>,
}

impl SaleResponse {
    /// Builds the body for a stored sale. `latest_log` is its most recent
    /// fiscalization attempt, if any.
    pub fn from_parts(
        sale: Sale,
        items: Vec<SaleItem>,
        latest_log: Option<&FiscalizationLog>,
        currency: &str,
    ) -> Self {
        SaleResponse {
            subtotal: sale.subtotal(),
            tax_amount: sale.tax_amount(),
            discount_amount: sale.discount_amount(),
            total_amount: sale.total_amount(),
            id: sale.id,
            sale_number: sale.sale_number,
            session_id: sale.session_id,
            customer_name: sale.customer_name,
            customer_phone: sale.customer_phone,
            currency: currency.to_string(),
            payment_method: sale.payment_method,
            status: sale.status,
            created_at: sale.created_at,
            items: items.into_iter().map(SaleItemResponse::from).collect(),
            fiscal_receipt_number: latest_log.and_then(|log| log.fiscal_receipt_number.clone()),
            fiscalization_success: latest_log.is_some_and(|log| log.success),
            settlement: None,
        }
    }

    pub fn from_completed(completed: CompletedSale, currency: &str) -> Self {
        let CompletedSale {
            sale,
            items,
            settlement,
            fiscalization,
        } = completed;

        let mut response = SaleResponse::from_parts(sale, items, Some(&fiscalization), currency);
        response.settlement = Some(settlement.into());
        response
    }
}

/// Summary row for session listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleSummary {
    pub id: String,
    pub sale_number: String,
    #[serde(with = "decimal")]
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Sale> for SaleSummary {
    fn from(sale: Sale) -> Self {
        SaleSummary {
            total_amount: sale.total_amount(),
            id: sale.id,
            sale_number: sale.sale_number,
            payment_method: sale.payment_method,
            status: sale.status,
            created_at: sale.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> MakeSaleRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_into_domain() {
        let request = parse(serde_json::json!({
            "payment_method": "mobile-money",
            "tax_amount": "2.00",
            "items": [
                { "product": "p1", "quantity": 2, "unit_price": "5.00" },
                { "service": "s1", "quantity": 1, "unit_price": 20 }
            ]
        }))
        .into_domain()
        .unwrap();

        assert_eq!(request.payment_method, PaymentMethod::MobileMoney);
        assert_eq!(request.tax_amount, Money::from_cents(200));
        assert_eq!(request.discount_amount, Money::zero());
        assert_eq!(request.lines[0].item, ItemRef::Product("p1".into()));
        assert_eq!(request.lines[1].item, ItemRef::Service("s1".into()));
        assert_eq!(request.lines[1].unit_price, Money::from_cents(2000));
    }

    #[test]
    fn test_both_or_neither_rejected() {
        let both = parse(serde_json::json!({
            "payment_method": "CASH",
            "items": [{ "product": "p", "service": "s", "quantity": 1, "unit_price": "1.00" }]
        }));
        assert!(matches!(
            both.into_domain(),
            Err(CoreError::InvalidItemSpec { line: 0, .. })
        ));

        let neither = parse(serde_json::json!({
            "payment_method": "CASH",
            "items": [
                { "product": "p", "quantity": 1, "unit_price": "1.00" },
                { "quantity": 1, "unit_price": "1.00" }
            ]
        }));
        assert!(matches!(
            neither.into_domain(),
            Err(CoreError::InvalidItemSpec { line: 1, .. })
        ));
    }

    #[test]
    fn test_empty_items_reported_first() {
        let request = parse(serde_json::json!({ "payment_method": "GOLD", "items": [] }));
        assert!(matches!(request.into_domain(), Err(CoreError::EmptyItemSet)));

        let request = parse(serde_json::json!({ "payment_method": "CASH" }));
        assert!(matches!(request.into_domain(), Err(CoreError::EmptyItemSet)));
    }

    #[test]
    fn test_bad_payment_method() {
        let request = parse(serde_json::json!({
            "payment_method": "GOLD",
            "items": [{ "service": "s1", "quantity": 1, "unit_price": "1.00" }]
        }));
        assert!(matches!(
            request.into_domain(),
            Err(CoreError::InvalidPaymentMethod(_))
        ));
    }
}
