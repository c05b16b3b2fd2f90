//! # Sale Math
//!
//! The pure half of the sale pipeline: request validation, line totals, sale
//! totals and sale numbers. The database half (stock, sessions, ledgers) lives
//! in `zimpos-db::checkout` and calls into this module.
//!
//! ## Totals
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line.total_price = quantity × unit_price          (exact, i64 cents)  │
//! │                                                                         │
//! │  subtotal         = Σ line.total_price             (persisted lines)   │
//! │  total_amount     = subtotal + tax_amount − discount_amount            │
//! │                                                                         │
//! │  subtotal is never taken from the client; tax and discount are.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use zimpos_core::money::Money;
//! use zimpos_core::sale::{line_total, SaleTotals};
//!
//! let bread = line_total(Money::from_cents(500), 2).unwrap();
//! let repair = line_total(Money::from_cents(2000), 1).unwrap();
//!
//! let totals = SaleTotals::compute([bread, repair], Money::from_cents(200), Money::zero()).unwrap();
//! assert_eq!(totals.subtotal.to_string(), "30.00");
//! assert_eq!(totals.total_amount.to_string(), "32.00");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{ItemRef, PaymentMethod};
use crate::validation::{
    validate_customer_name, validate_customer_phone, validate_non_negative, validate_quantity,
};
use crate::MAX_SALE_ITEMS;

// =============================================================================
// Request
// =============================================================================

/// One requested line, after the wire shape has been turned into an [`ItemRef`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub item: ItemRef,
    pub quantity: i64,
    pub unit_price: Money,
    /// Overrides the catalog name on the receipt when set.
    pub item_name: Option<String>,
}

/// A validated-shape make-sale request for the cashier's active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub tax_amount: Money,
    pub discount_amount: Money,
    pub lines: Vec<SaleLine>,
}

impl SaleRequest {
    /// Checks everything that can be checked without touching storage.
    ///
    /// Runs before the sale transaction opens, so a failure here never
    /// leaves a partial write.
    pub fn validate(&self) -> CoreResult<()> {
        if self.lines.is_empty() {
            return Err(CoreError::EmptyItemSet);
        }

        if self.lines.len() > MAX_SALE_ITEMS {
            return Err(CoreError::TooManyItems {
                max: MAX_SALE_ITEMS,
            });
        }

        validate_customer_name(self.customer_name.as_deref())?;
        validate_customer_phone(self.customer_phone.as_deref())?;
        validate_non_negative("tax_amount", self.tax_amount)?;
        validate_non_negative("discount_amount", self.discount_amount)?;

        let mut line_totals = Vec::with_capacity(self.lines.len());
        for (line, item) in self.lines.iter().enumerate() {
            validate_quantity(item.quantity).map_err(|e| CoreError::InvalidItemSpec {
                line,
                reason: e.to_string(),
            })?;
            validate_non_negative("unit_price", item.unit_price).map_err(|e| {
                CoreError::InvalidItemSpec {
                    line,
                    reason: e.to_string(),
                }
            })?;
            line_totals.push(line_total(item.unit_price, item.quantity)?);
        }

        // Catches overflow and an oversized discount up front
        SaleTotals::compute(line_totals, self.tax_amount, self.discount_amount)?;

        Ok(())
    }
}

// =============================================================================
// Totals
// =============================================================================

/// `quantity × unit_price`, refusing to wrap.
pub fn line_total(unit_price: Money, quantity: i64) -> CoreResult<Money> {
    unit_price
        .checked_multiply_quantity(quantity)
        .ok_or(CoreError::AmountOverflow)
}

/// Sale-level amounts, derived from the persisted line totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub tax_amount: Money,
    pub discount_amount: Money,
    pub total_amount: Money,
}

impl SaleTotals {
    pub fn compute<I>(line_totals: I, tax_amount: Money, discount_amount: Money) -> CoreResult<Self>
    where
        I: IntoIterator<Item = Money>,
    {
        let subtotal = line_totals
            .into_iter()
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line))
            .ok_or(CoreError::AmountOverflow)?;

        let gross = subtotal
            .checked_add(tax_amount)
            .ok_or(CoreError::AmountOverflow)?;

        if discount_amount > gross {
            return Err(CoreError::DiscountExceedsTotal {
                discount: discount_amount.to_string(),
                gross: gross.to_string(),
            });
        }

        Ok(SaleTotals {
            subtotal,
            tax_amount,
            discount_amount,
            total_amount: gross - discount_amount,
        })
    }
}

// =============================================================================
// Sale Number
// =============================================================================

/// Builds a sale number: `S<yyyymmdd>-<8 uppercase hex>`.
///
/// The hex part is the first 8 digits of `entropy`; the caller passes a fresh
/// v4 UUID. The database's UNIQUE constraint is the final guard.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use uuid::Uuid;
/// use zimpos_core::sale::generate_sale_number;
///
/// let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap();
/// let id = Uuid::parse_str("1a2b3c4d-0000-4000-8000-000000000000").unwrap();
/// assert_eq!(generate_sale_number(at, id), "S20260314-1A2B3C4D");
/// ```
pub fn generate_sale_number(at: DateTime<Utc>, entropy: Uuid) -> String {
    let hex = entropy.simple().to_string();
    format!(
        "S{}-{}",
        at.format("%Y%m%d"),
        hex[..8].to_ascii_uppercase()
    )
}

/// Reference text shared by the inventory movement and the account transaction.
pub fn sale_reference(sale_number: &str) -> String {
    format!("POS Sale {}", sale_number)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn line(item: ItemRef, quantity: i64, cents: i64) -> SaleLine {
        SaleLine {
            item,
            quantity,
            unit_price: Money::from_cents(cents),
            item_name: None,
        }
    }

    fn request(lines: Vec<SaleLine>) -> SaleRequest {
        SaleRequest {
            payment_method: PaymentMethod::Cash,
            customer_name: None,
            customer_phone: None,
            tax_amount: Money::from_cents(200),
            discount_amount: Money::zero(),
            lines,
        }
    }

    #[test]
    fn test_validate_accepts_mixed_sale() {
        let req = request(vec![
            line(ItemRef::Product("p".into()), 2, 500),
            line(ItemRef::Service("s".into()), 1, 2000),
        ]);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(matches!(
            request(vec![]).validate(),
            Err(CoreError::EmptyItemSet)
        ));
    }

    #[test]
    fn test_validate_rejects_bad_lines() {
        let req = request(vec![
            line(ItemRef::Product("p".into()), 1, 500),
            line(ItemRef::Product("p".into()), 0, 500),
        ]);
        assert!(matches!(
            req.validate(),
            Err(CoreError::InvalidItemSpec { line: 1, .. })
        ));

        let req = request(vec![line(ItemRef::Service("s".into()), 1, -1)]);
        assert!(matches!(
            req.validate(),
            Err(CoreError::InvalidItemSpec { line: 0, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_too_many_lines() {
        let lines = (0..=MAX_SALE_ITEMS)
            .map(|_| line(ItemRef::Service("s".into()), 1, 100))
            .collect();
        assert!(matches!(
            request(lines).validate(),
            Err(CoreError::TooManyItems { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_negative_tax() {
        let mut req = request(vec![line(ItemRef::Service("s".into()), 1, 100)]);
        req.tax_amount = Money::from_cents(-1);
        assert!(matches!(req.validate(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_totals_scenario() {
        let lines = [
            line_total(Money::from_cents(500), 2).unwrap(),
            line_total(Money::from_cents(2000), 1).unwrap(),
        ];
        let totals = SaleTotals::compute(lines, Money::from_cents(200), Money::zero()).unwrap();

        assert_eq!(totals.subtotal, Money::from_cents(3000));
        assert_eq!(totals.total_amount, Money::from_cents(3200));
    }

    #[test]
    fn test_totals_apply_discount() {
        let totals = SaleTotals::compute(
            [Money::from_cents(1000)],
            Money::from_cents(150),
            Money::from_cents(50),
        )
        .unwrap();
        assert_eq!(totals.total_amount, Money::from_cents(1100));
    }

    #[test]
    fn test_totals_reject_oversized_discount() {
        let result = SaleTotals::compute(
            [Money::from_cents(1000)],
            Money::zero(),
            Money::from_cents(1001),
        );
        assert!(matches!(result, Err(CoreError::DiscountExceedsTotal { .. })));
    }

    #[test]
    fn test_subtotal_is_exact_over_many_lines() {
        // 0.10 × 3 repeated 1000 times: 300.00 exactly
        let lines = (0..1000).map(|_| line_total(Money::from_cents(10), 3).unwrap());
        let totals = SaleTotals::compute(lines, Money::zero(), Money::zero()).unwrap();
        assert_eq!(totals.subtotal.to_string(), "300.00");
    }

    #[test]
    fn test_line_total_overflow() {
        assert!(matches!(
            line_total(Money::from_cents(i64::MAX), 2),
            Err(CoreError::AmountOverflow)
        ));
    }

    #[test]
    fn test_sale_number_shape() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let number = generate_sale_number(at, Uuid::new_v4());

        assert!(number.starts_with("S20261016-"));
        assert_eq!(number.len(), 18);
        assert!(number[10..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_sale_reference() {
        assert_eq!(sale_reference("S20261016-ABCDEF01"), "POS Sale S20261016-ABCDEF01");
    }
}
