//! # Settlement Routing
//!
//! Decides where a sale's money goes. The database layer carries out the
//! resulting [`SettlementPlan`]; nothing here touches storage.
//!
//! ```text
//! ┌──────────────┐   payment_method   ┌──────────────────┐
//! │ Sale (total) │ ─────────────────► │ LedgerKind       │
//! └──────────────┘                    │  CASH → CashTill │
//!        │                            │  MOBILE_MONEY →  │
//!        │ total ≤ 0 → no plan        │    MobileMoney   │
//!        ▼                            │  else → Bank     │
//!   (nothing posted)                  └──────────────────┘
//! ```

use chrono::NaiveDate;

use crate::money::Money;
use crate::sale::sale_reference;
use crate::types::{LedgerKind, PaymentMethod, TransactionStatus, TransactionType};

/// What to post and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPlan {
    pub kind: LedgerKind,
    pub amount: Money,
    /// Sub-ledger row to write before crediting; `None` for cash.
    pub transaction: Option<TransactionDraft>,
}

/// The fields of an `AccountTransaction` that do not depend on the account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub reference: String,
    pub description: String,
    pub transaction_date: NaiveDate,
    pub value_date: NaiveDate,
    pub created_by: String,
}

/// Routes a completed sale's total to a ledger kind.
///
/// Returns `None` when there is nothing to post (zero or negative total).
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use zimpos_core::money::Money;
/// use zimpos_core::settlement::plan_settlement;
/// use zimpos_core::types::{LedgerKind, PaymentMethod};
///
/// let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
/// let plan = plan_settlement(PaymentMethod::Cash, Money::from_cents(3200), "S1", "cashier-1", today)
///     .unwrap();
/// assert_eq!(plan.kind, LedgerKind::CashTill);
/// assert!(plan.transaction.is_none());
/// ```
pub fn plan_settlement(
    method: PaymentMethod,
    amount: Money,
    sale_number: &str,
    cashier_id: &str,
    today: NaiveDate,
) -> Option<SettlementPlan> {
    if !amount.is_positive() {
        return None;
    }

    let kind = method.ledger_kind();
    let transaction = kind.keeps_sub_ledger().then(|| TransactionDraft {
        transaction_type: TransactionType::Receipt,
        status: TransactionStatus::Completed,
        reference: sale_number.to_string(),
        description: sale_reference(sale_number),
        transaction_date: today,
        value_date: today,
        created_by: cashier_id.to_string(),
    });

    Some(SettlementPlan {
        kind,
        amount,
        transaction,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_cash_goes_to_till_without_transaction() {
        let plan =
            plan_settlement(PaymentMethod::Cash, Money::from_cents(100), "S1", "c1", today()).unwrap();
        assert_eq!(plan.kind, LedgerKind::CashTill);
        assert_eq!(plan.amount, Money::from_cents(100));
        assert!(plan.transaction.is_none());
    }

    #[test]
    fn test_mobile_money_records_receipt() {
        let plan = plan_settlement(
            PaymentMethod::MobileMoney,
            Money::from_cents(4550),
            "S20261016-AAAA0000",
            "c1",
            today(),
        )
        .unwrap();

        assert_eq!(plan.kind, LedgerKind::MobileMoney);
        let tx = plan.transaction.unwrap();
        assert_eq!(tx.transaction_type, TransactionType::Receipt);
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.reference, "S20261016-AAAA0000");
        assert_eq!(tx.description, "POS Sale S20261016-AAAA0000");
        assert_eq!(tx.created_by, "c1");
        assert_eq!(tx.transaction_date, today());
    }

    #[test]
    fn test_card_and_mixed_fall_back_to_bank() {
        for method in [PaymentMethod::Card, PaymentMethod::Mixed] {
            let plan = plan_settlement(method, Money::from_cents(1), "S1", "c1", today()).unwrap();
            assert_eq!(plan.kind, LedgerKind::Bank);
            assert!(plan.transaction.is_some());
        }
    }

    #[test]
    fn test_non_positive_amount_is_noop() {
        assert!(plan_settlement(PaymentMethod::Cash, Money::zero(), "S1", "c1", today()).is_none());
        assert!(
            plan_settlement(PaymentMethod::Card, Money::from_cents(-5), "S1", "c1", today()).is_none()
        );
    }
}
