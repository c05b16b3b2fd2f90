//! # Fiscalization
//!
//! Builds the tax-authority (ZIMRA) receipt request for a sale, hands it to a
//! [`FiscalGateway`], and turns whatever comes back into a [`FiscalOutcome`]
//! that is always loggable.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  FiscalConfig? ──── None ────► FiscalOutcome::missing_config()         │
//! │       │                          success=false, payload "{}"           │
//! │       │ Some                                                            │
//! │       ▼                                                                 │
//! │  FiscalRequest::build(sale, items, config)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  gateway.submit(&request)                                              │
//! │       ├── Ok(receipt)  ──► success=true,  receipt number               │
//! │       └── Err(e)       ──► success=false, {"error": e}                 │
//! │                                                                         │
//! │  No path returns an error: the sale stands whatever happens here.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::money::{decimal, Money};
use crate::types::{FiscalConfig, Sale, SaleItem};

/// Response body recorded when a business has no fiscal configuration.
pub const MISSING_CONFIG_RESPONSE: &str = r#"{"error":"Missing ZIMRA configuration"}"#;

// =============================================================================
// Request
// =============================================================================

/// One receipt line as the tax authority sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FiscalLine {
    pub item_name: String,
    pub quantity: i64,
    #[serde(with = "decimal")]
    #[ts(as = "String")]
    pub unit_price: Money,
    #[serde(with = "decimal")]
    #[ts(as = "String")]
    pub total_price: Money,
}

/// The submission payload for one sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FiscalRequest {
    pub business_id: String,
    pub sale_id: String,
    pub sale_number: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    #[serde(with = "decimal")]
    #[ts(as = "String")]
    pub total_amount: Money,
    pub currency: String,
    pub items: Vec<FiscalLine>,
    pub vat_registered: bool,
    pub vat_registration_number: String,
}

impl FiscalRequest {
    /// Assembles the payload from the committed sale and its lines.
    pub fn build(
        config: &FiscalConfig,
        sale: &Sale,
        items: &[SaleItem],
        timestamp: DateTime<Utc>,
    ) -> Self {
        let items = items
            .iter()
            .map(|item| FiscalLine {
                item_name: item.item_name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price(),
                total_price: item.total_price(),
            })
            .collect();

        FiscalRequest {
            business_id: config.business_id.clone(),
            sale_id: sale.id.clone(),
            sale_number: sale.sale_number.clone(),
            timestamp,
            total_amount: sale.total_amount(),
            currency: config.currency_code.clone(),
            items,
            vat_registered: config.is_vat_registered,
            vat_registration_number: config.vat_registration_number.clone(),
        }
    }

    pub fn to_json(&self) -> String {
        // Plain data with string keys; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

// =============================================================================
// Gateway
// =============================================================================

/// What the tax authority handed back on success.
#[derive(Debug, Clone, PartialEq)]
pub struct FiscalReceipt {
    pub fiscal_receipt_number: String,
    pub response: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum FiscalError {
    /// The authority answered and refused the receipt.
    #[error("rejected by tax authority: {0}")]
    Rejected(String),

    /// The authority could not be reached or submission is switched off.
    #[error("tax authority unavailable: {0}")]
    Unavailable(String),
}

/// Submits receipt requests to the tax authority.
///
/// Called from inside the sale transaction, so implementations must not
/// block for long; a real network client should enforce its own timeout.
pub trait FiscalGateway: Send + Sync {
    fn submit(&self, request: &FiscalRequest) -> Result<FiscalReceipt, FiscalError>;
}

/// Issues receipt numbers locally without contacting anyone.
///
/// Receipt numbers look like `ZIMRA-S20261016-1A2B3C4D-1792152000`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedFiscalGateway;

impl FiscalGateway for SimulatedFiscalGateway {
    fn submit(&self, request: &FiscalRequest) -> Result<FiscalReceipt, FiscalError> {
        let number = format!(
            "ZIMRA-{}-{}",
            request.sale_number,
            request.timestamp.timestamp()
        );

        Ok(FiscalReceipt {
            response: serde_json::json!({
                "status": "ok",
                "fiscal_receipt_number": number,
            }),
            fiscal_receipt_number: number,
        })
    }
}

/// Refuses every submission. Sales still succeed and log `success=false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledFiscalGateway;

impl FiscalGateway for DisabledFiscalGateway {
    fn submit(&self, _request: &FiscalRequest) -> Result<FiscalReceipt, FiscalError> {
        Err(FiscalError::Unavailable(
            "fiscal submission is disabled".to_string(),
        ))
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// Everything the fiscalization log row needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiscalOutcome {
    pub success: bool,
    pub fiscal_receipt_number: Option<String>,
    pub request_payload: String,
    pub response_payload: String,
}

impl FiscalOutcome {
    pub fn missing_config() -> Self {
        FiscalOutcome {
            success: false,
            fiscal_receipt_number: None,
            request_payload: "{}".to_string(),
            response_payload: MISSING_CONFIG_RESPONSE.to_string(),
        }
    }
}

/// Runs one submission attempt and records the result. Never fails.
pub fn fiscalize(gateway: &dyn FiscalGateway, request: Option<&FiscalRequest>) -> FiscalOutcome {
    let Some(request) = request else {
        return FiscalOutcome::missing_config();
    };

    let request_payload = request.to_json();
    match gateway.submit(request) {
        Ok(receipt) => FiscalOutcome {
            success: true,
            fiscal_receipt_number: Some(receipt.fiscal_receipt_number),
            request_payload,
            response_payload: receipt.response.to_string(),
        },
        Err(e) => FiscalOutcome {
            success: false,
            fiscal_receipt_number: None,
            request_payload,
            response_payload: serde_json::json!({ "error": e.to_string() }).to_string(),
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemRef, PaymentMethod, SaleStatus};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap()
    }

    fn config() -> FiscalConfig {
        FiscalConfig {
            business_id: "biz-1".into(),
            vat_registration_number: "VAT-100200".into(),
            is_vat_registered: true,
            vat_rate_bps: 1500,
            currency_code: "ZWL".into(),
            created_at: at(),
            updated_at: at(),
        }
    }

    fn sale() -> Sale {
        Sale {
            id: "sale-1".into(),
            session_id: "sess-1".into(),
            sale_number: "S20261016-00AA11BB".into(),
            customer_name: None,
            customer_phone: None,
            subtotal_cents: 3000,
            tax_amount_cents: 200,
            discount_amount_cents: 0,
            total_amount_cents: 3200,
            payment_method: PaymentMethod::Cash,
            status: SaleStatus::Completed,
            created_at: at(),
        }
    }

    fn items() -> Vec<SaleItem> {
        vec![
            SaleItem {
                id: "i1".into(),
                sale_id: "sale-1".into(),
                item: ItemRef::Product("p".into()),
                item_name: "Bread".into(),
                quantity: 2,
                unit_price_cents: 500,
                total_price_cents: 1000,
            },
            SaleItem {
                id: "i2".into(),
                sale_id: "sale-1".into(),
                item: ItemRef::Service("s".into()),
                item_name: "Phone repair".into(),
                quantity: 1,
                unit_price_cents: 2000,
                total_price_cents: 2000,
            },
        ]
    }

    struct FailingGateway;

    impl FiscalGateway for FailingGateway {
        fn submit(&self, _request: &FiscalRequest) -> Result<FiscalReceipt, FiscalError> {
            Err(FiscalError::Rejected("bad VAT number".into()))
        }
    }

    #[test]
    fn test_payload_fields() {
        let request = FiscalRequest::build(&config(), &sale(), &items(), at());
        let json: serde_json::Value = serde_json::from_str(&request.to_json()).unwrap();

        assert_eq!(json["business_id"], "biz-1");
        assert_eq!(json["sale_id"], "sale-1");
        assert_eq!(json["sale_number"], "S20261016-00AA11BB");
        assert_eq!(json["total_amount"], "32.00");
        assert_eq!(json["currency"], "ZWL");
        assert_eq!(json["vat_registered"], true);
        assert_eq!(json["vat_registration_number"], "VAT-100200");
        assert_eq!(json["items"][0]["item_name"], "Bread");
        assert_eq!(json["items"][0]["unit_price"], "5.00");
        assert_eq!(json["items"][1]["total_price"], "20.00");
        assert!(json["timestamp"].as_str().unwrap().starts_with("2026-10-16T08:00:00"));
    }

    #[test]
    fn test_simulated_gateway_success() {
        let request = FiscalRequest::build(&config(), &sale(), &items(), at());
        let outcome = fiscalize(&SimulatedFiscalGateway, Some(&request));

        let expected = format!("ZIMRA-S20261016-00AA11BB-{}", at().timestamp());
        assert!(outcome.success);
        assert_eq!(outcome.fiscal_receipt_number.as_deref(), Some(expected.as_str()));

        let response: serde_json::Value = serde_json::from_str(&outcome.response_payload).unwrap();
        assert_eq!(response["status"], "ok");
        assert_eq!(response["fiscal_receipt_number"], expected);
    }

    #[test]
    fn test_missing_config() {
        let outcome = fiscalize(&SimulatedFiscalGateway, None);

        assert!(!outcome.success);
        assert!(outcome.fiscal_receipt_number.is_none());
        assert_eq!(outcome.request_payload, "{}");
        assert_eq!(outcome.response_payload, MISSING_CONFIG_RESPONSE);
    }

    #[test]
    fn test_gateway_error_keeps_request_payload() {
        let request = FiscalRequest::build(&config(), &sale(), &items(), at());
        let outcome = fiscalize(&FailingGateway, Some(&request));

        assert!(!outcome.success);
        assert!(outcome.fiscal_receipt_number.is_none());
        assert_eq!(outcome.request_payload, request.to_json());

        let response: serde_json::Value = serde_json::from_str(&outcome.response_payload).unwrap();
        assert!(response["error"].as_str().unwrap().contains("bad VAT number"));
    }

    #[test]
    fn test_disabled_gateway_fails_softly() {
        let request = FiscalRequest::build(&config(), &sale(), &items(), at());
        let outcome = fiscalize(&DisabledFiscalGateway, Some(&request));
        assert!(!outcome.success);
    }
}
