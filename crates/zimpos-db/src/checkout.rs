//! # Checkout Pipeline
//!
//! Turns a [`SaleRequest`] into a committed sale. Every step is an explicit
//! call inside one database transaction; nothing happens in hooks.
//!
//! ## Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          make_sale(cashier, request)                    │
//! │                                                                         │
//! │  (before the transaction)                                               │
//! │   1. cashier's active session ──── none ──► NoActiveSession             │
//! │   2. request.validate()       ──── bad  ──► EmptyItemSet / InvalidItem  │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   3. INSERT sale header (zero totals, takes the write lock)             │
//! │   4. per line:                                                          │
//! │        product ─► store check ─► INSERT item ─► stock -= qty (atomic)   │
//! │                   └─► SALE movement in a savepoint (failure: warn only) │
//! │        service ─► INSERT item                                           │
//! │   5. totals from persisted line totals ─► UPDATE sale                   │
//! │   6. session: total_sales += total, transactions += 1                   │
//! │   7. settlement: credit till / mobile money / bank (missing: warn only) │
//! │   8. fiscalization: submit, always write one log row                    │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error in 3-7 drops the transaction: no item, no stock change.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use sqlx::{Connection, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use zimpos_core::fiscal::{fiscalize, FiscalGateway, FiscalRequest};
use zimpos_core::sale::{generate_sale_number, line_total, sale_reference, SaleRequest, SaleTotals};
use zimpos_core::settlement::{plan_settlement, SettlementPlan};
use zimpos_core::{
    CoreError, FiscalizationLog, InventoryMovement, ItemRef, LedgerKind, Money, MovementType,
    Sale, SaleItem, SaleSession, SaleStatus,
};

use crate::error::{CheckoutResult, DbResult};
use crate::repository::product::{deduct_stock, fetch_active_product, StockDeduction};
use crate::repository::{
    fiscal, inventory, ledger, sale as sales, service as services, session as sessions,
    store as stores,
};

const SALE_MOVEMENT_NOTES: &str = "Automatic inventory deduction from POS sale";

// =============================================================================
// Results
// =============================================================================

/// Where the sale's money went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// The account was credited.
    Posted {
        account_id: String,
        kind: LedgerKind,
        amount: Money,
        /// Sub-ledger row, absent for cash tills.
        transaction_id: Option<String>,
    },
    /// The store has no active account of this kind; nothing was credited.
    NoAccount { kind: LedgerKind },
    /// Zero total.
    NothingToPost,
}

/// A committed sale with everything the response needs.
#[derive(Debug, Clone)]
pub struct CompletedSale {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub settlement: SettlementOutcome,
    pub fiscalization: FiscalizationLog,
}

impl CompletedSale {
    pub fn fiscal_receipt_number(&self) -> Option<&str> {
        self.fiscalization.fiscal_receipt_number.as_deref()
    }

    pub fn fiscalization_success(&self) -> bool {
        self.fiscalization.success
    }
}

// =============================================================================
// Service
// =============================================================================

/// The make-sale pipeline. Obtain one from [`crate::Database::checkout`].
#[derive(Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
    gateway: Arc<dyn FiscalGateway>,
}

impl std::fmt::Debug for CheckoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutService").finish_non_exhaustive()
    }
}

impl CheckoutService {
    pub fn new(pool: SqlitePool, gateway: Arc<dyn FiscalGateway>) -> Self {
        CheckoutService { pool, gateway }
    }

    /// Records a sale against the cashier's most recently started session.
    ///
    /// ## Errors
    /// * `CoreError::NoActiveSession` - the cashier has no open session
    /// * `CoreError::EmptyItemSet` / `InvalidItemSpec` / `TooManyItems` - bad request
    /// * `CoreError::ProductNotFound` / `ServiceNotFound` - unknown or inactive item
    /// * `CoreError::StoreMismatch` - product belongs to another store
    /// * `CoreError::InsufficientStock` - not enough on hand
    ///
    /// A missing ledger account or a failed fiscal submission is not an
    /// error; both show up in the returned [`CompletedSale`].
    pub async fn make_sale(
        &self,
        cashier_id: &str,
        request: SaleRequest,
    ) -> CheckoutResult<CompletedSale> {
        let mut conn = self.pool.acquire().await?;

        let session = sessions::fetch_active_for_cashier(&mut conn, cashier_id)
            .await?
            .ok_or(CoreError::NoActiveSession)?;

        request.validate()?;

        let store = stores::fetch_store(&mut conn, &session.store_id)
            .await?
            .ok_or_else(|| CoreError::StoreNotFound(session.store_id.clone()))?;

        let now = Utc::now();
        let sale_number = generate_sale_number(now, Uuid::new_v4());

        debug!(
            sale_number = %sale_number,
            session_id = %session.id,
            lines = request.lines.len(),
            "Starting sale"
        );

        let mut tx = conn.begin().await?;

        // Header first: the first statement of the transaction must be a write
        let mut sale = Sale {
            id: Uuid::new_v4().to_string(),
            session_id: session.id.clone(),
            sale_number: sale_number.clone(),
            customer_name: trimmed(request.customer_name.as_deref()),
            customer_phone: trimmed(request.customer_phone.as_deref()),
            subtotal_cents: 0,
            tax_amount_cents: 0,
            discount_amount_cents: 0,
            total_amount_cents: 0,
            payment_method: request.payment_method,
            status: SaleStatus::Completed,
            created_at: now,
        };
        sales::insert_sale(&mut tx, &sale).await?;

        let mut items = Vec::with_capacity(request.lines.len());
        for (line_no, line) in request.lines.iter().enumerate() {
            let total = line_total(line.unit_price, line.quantity)?;
            let mut item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                item: line.item.clone(),
                item_name: String::new(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price.cents(),
                total_price_cents: total.cents(),
            };

            match &line.item {
                ItemRef::Product(product_id) => {
                    let product = fetch_active_product(&mut tx, product_id)
                        .await?
                        .ok_or_else(|| CoreError::ProductNotFound(product_id.clone()))?;

                    if !product.sellable_at(&session.store_id) {
                        return Err(CoreError::StoreMismatch {
                            product: product.name,
                        }
                        .into());
                    }

                    item.item_name = display_name(line.item_name.as_deref(), &product.name);
                    sales::insert_item(&mut tx, &item, line_no).await?;

                    if let StockDeduction::Insufficient { available } =
                        deduct_stock(&mut tx, &product.id, line.quantity).await?
                    {
                        return Err(CoreError::InsufficientStock {
                            product: product.name,
                            available,
                            requested: line.quantity,
                        }
                        .into());
                    }

                    let movement = InventoryMovement {
                        id: Uuid::new_v4().to_string(),
                        product_id: product.id.clone(),
                        quantity: line.quantity,
                        unit_cost_cents: item.unit_price_cents,
                        total_cost_cents: item.total_price_cents,
                        movement_type: MovementType::Sale,
                        reference: sale_reference(&sale_number),
                        notes: SALE_MOVEMENT_NOTES.to_string(),
                        created_at: now,
                    };
                    if let Err(e) = record_movement(&mut tx, &movement).await {
                        warn!(
                            sale_number = %sale_number,
                            product_id = %product.id,
                            error = %e,
                            "Failed to record inventory movement"
                        );
                    }
                }
                ItemRef::Service(service_id) => {
                    let service = services::fetch_active_service(&mut tx, service_id)
                        .await?
                        .ok_or_else(|| CoreError::ServiceNotFound(service_id.clone()))?;

                    item.item_name = display_name(line.item_name.as_deref(), &service.name);
                    sales::insert_item(&mut tx, &item, line_no).await?;
                }
            }

            items.push(item);
        }

        let totals = SaleTotals::compute(
            items.iter().map(SaleItem::total_price),
            request.tax_amount,
            request.discount_amount,
        )?;
        sales::update_totals(&mut tx, &sale.id, &totals).await?;
        sale.subtotal_cents = totals.subtotal.cents();
        sale.tax_amount_cents = totals.tax_amount.cents();
        sale.discount_amount_cents = totals.discount_amount.cents();
        sale.total_amount_cents = totals.total_amount.cents();

        sessions::accumulate_sale(&mut tx, &session.id, totals.total_amount).await?;

        let settlement = settle(&mut tx, &session, &sale, cashier_id).await?;

        let config = fiscal::fetch_config(&mut tx, &store.business_id).await?;
        let fiscal_request = config
            .as_ref()
            .map(|config| FiscalRequest::build(config, &sale, &items, Utc::now()));
        let outcome = fiscalize(self.gateway.as_ref(), fiscal_request.as_ref());
        if !outcome.success {
            warn!(
                sale_number = %sale_number,
                business_id = %store.business_id,
                response = %outcome.response_payload,
                "Fiscalization failed"
            );
        }
        let fiscalization = fiscal::insert_log(&mut tx, &sale.id, &outcome).await?;

        tx.commit().await?;

        info!(
            sale_number = %sale.sale_number,
            session_id = %session.id,
            total = %sale.total_amount(),
            payment_method = %sale.payment_method,
            fiscalized = fiscalization.success,
            "Sale completed"
        );

        Ok(CompletedSale {
            sale,
            items,
            settlement,
            fiscalization,
        })
    }
}

// =============================================================================
// Steps
// =============================================================================

/// Inserts a movement inside a savepoint so a failure leaves the sale intact.
async fn record_movement(conn: &mut SqliteConnection, movement: &InventoryMovement) -> DbResult<()> {
    let mut savepoint = conn.begin().await?;
    inventory::insert_movement(&mut savepoint, movement).await?;
    savepoint.commit().await?;
    Ok(())
}

/// Credits the store's account for the sale's payment method.
async fn settle(
    conn: &mut SqliteConnection,
    session: &SaleSession,
    sale: &Sale,
    cashier_id: &str,
) -> DbResult<SettlementOutcome> {
    let Some(SettlementPlan {
        kind,
        amount,
        transaction,
    }) = plan_settlement(
        sale.payment_method,
        sale.total_amount(),
        &sale.sale_number,
        cashier_id,
        sale.created_at.date_naive(),
    )
    else {
        return Ok(SettlementOutcome::NothingToPost);
    };

    let Some(account) = ledger::find_active_account(conn, &session.store_id, kind).await? else {
        warn!(
            sale_number = %sale.sale_number,
            store_id = %session.store_id,
            kind = %kind,
            "No active {} for store; sale not posted to a ledger",
            kind
        );
        return Ok(SettlementOutcome::NoAccount { kind });
    };

    let transaction_id = match &transaction {
        Some(draft) => Some(ledger::insert_transaction(conn, &account.id, amount, draft).await?.id),
        None => None,
    };

    ledger::credit(conn, &account.id, amount).await?;

    debug!(
        sale_number = %sale.sale_number,
        account_id = %account.id,
        amount = %amount,
        "Sale posted to {}",
        kind
    );

    Ok(SettlementOutcome::Posted {
        account_id: account.id,
        kind,
        amount,
        transaction_id,
    })
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn display_name(requested: Option<&str>, catalog: &str) -> String {
    trimmed(requested).unwrap_or_else(|| catalog.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CheckoutError;
    use crate::repository::fiscal::FiscalSettings;
    use crate::repository::ledger::NewLedgerAccount;
    use crate::repository::product::NewProduct;
    use crate::repository::service::NewService;
    use crate::{Database, DbConfig};
    use zimpos_core::fiscal::{DisabledFiscalGateway, SimulatedFiscalGateway};
    use zimpos_core::sale::SaleLine;
    use zimpos_core::{PaymentMethod, Product, Service, Store, TransactionType};

    const CASHIER: &str = "cashier-1";

    struct Fixture {
        db: Database,
        store: Store,
        product: Product,
        service: Service,
    }

    async fn fixture_with(db: Database) -> Fixture {
        let business = db.stores().create_business("Harare Hardware").await.unwrap();
        let store = db
            .stores()
            .create_store(&business.id, "Avondale", None)
            .await
            .unwrap();

        let product = db
            .products()
            .insert(NewProduct {
                business_id: business.id.clone(),
                store_id: Some(store.id.clone()),
                sku: "HAM-01".into(),
                name: "Claw Hammer".into(),
                unit_price: Money::from_cents(500),
                cost_price: Money::from_cents(300),
                quantity_in_stock: 10,
            })
            .await
            .unwrap();

        let service = db
            .services()
            .insert(NewService {
                business_id: business.id.clone(),
                store_id: Some(store.id.clone()),
                service_code: "KEY-CUT".into(),
                name: "Key Cutting".into(),
                price: Money::from_cents(2000),
            })
            .await
            .unwrap();

        db.sessions()
            .start(CASHIER, &store.id, Money::from_cents(1000))
            .await
            .unwrap();

        Fixture {
            db,
            store,
            product,
            service,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(Database::new(DbConfig::in_memory()).await.unwrap()).await
    }

    async fn add_account(f: &Fixture, kind: LedgerKind, opening: i64) -> String {
        f.db.ledger()
            .create_account(NewLedgerAccount {
                store_id: f.store.id.clone(),
                kind,
                account_name: format!("{kind}"),
                currency_code: None,
                opening_balance: Money::from_cents(opening),
            })
            .await
            .unwrap()
            .id
    }

    async fn configure_fiscal(f: &Fixture) {
        f.db.fiscal()
            .upsert_config(
                &f.store.business_id,
                FiscalSettings {
                    vat_registration_number: "VAT-100200".into(),
                    is_vat_registered: true,
                    vat_rate_bps: 1500,
                    currency_code: "ZWL".into(),
                },
            )
            .await
            .unwrap();
    }

    fn product_line(id: &str, quantity: i64, cents: i64) -> SaleLine {
        SaleLine {
            item: ItemRef::Product(id.to_string()),
            quantity,
            unit_price: Money::from_cents(cents),
            item_name: None,
        }
    }

    fn service_line(id: &str, quantity: i64, cents: i64) -> SaleLine {
        SaleLine {
            item: ItemRef::Service(id.to_string()),
            quantity,
            unit_price: Money::from_cents(cents),
            item_name: None,
        }
    }

    fn request(method: PaymentMethod, tax: i64, lines: Vec<SaleLine>) -> SaleRequest {
        SaleRequest {
            payment_method: method,
            customer_name: None,
            customer_phone: None,
            tax_amount: Money::from_cents(tax),
            discount_amount: Money::zero(),
            lines,
        }
    }

    fn checkout(db: &Database) -> CheckoutService {
        db.checkout(Arc::new(SimulatedFiscalGateway))
    }

    #[tokio::test]
    async fn test_end_to_end_cash_sale() {
        let f = fixture().await;
        let till = add_account(&f, LedgerKind::CashTill, 10_000).await;
        configure_fiscal(&f).await;

        let completed = checkout(&f.db)
            .make_sale(
                CASHIER,
                request(
                    PaymentMethod::Cash,
                    200,
                    vec![
                        product_line(&f.product.id, 2, 500),
                        service_line(&f.service.id, 1, 2000),
                    ],
                ),
            )
            .await
            .unwrap();

        assert_eq!(completed.sale.subtotal(), Money::from_cents(3000));
        assert_eq!(completed.sale.total_amount(), Money::from_cents(3200));
        assert_eq!(completed.items.len(), 2);
        assert_eq!(completed.items[0].item_name, "Claw Hammer");
        assert_eq!(completed.items[1].item_name, "Key Cutting");

        assert_eq!(f.db.products().stock_level(&f.product.id).await.unwrap(), 8);

        let reference = sale_reference(&completed.sale.sale_number);
        let movements = f.db.inventory().list_by_reference(&reference).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].product_id, f.product.id);
        assert_eq!(movements[0].movement_type, MovementType::Sale);
        assert_eq!(movements[0].quantity, 2);

        assert_eq!(f.db.ledger().balance(&till).await.unwrap(), Money::from_cents(13_200));
        assert!(f.db.ledger().list_transactions(&till).await.unwrap().is_empty());
        assert!(matches!(
            completed.settlement,
            SettlementOutcome::Posted { transaction_id: None, .. }
        ));

        let logs = f.db.fiscal().logs_for_sale(&completed.sale.id).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].success);
        assert!(completed.fiscalization_success());
        assert!(completed
            .fiscal_receipt_number()
            .unwrap()
            .starts_with(&format!("ZIMRA-{}-", completed.sale.sale_number)));

        // Persisted state matches what was returned
        let stored = f.db.sales().get_by_id(&completed.sale.id).await.unwrap().unwrap();
        assert_eq!(stored.sale_number, completed.sale.sale_number);
        assert_eq!(stored.total_amount_cents, 3200);
        assert_eq!(stored.subtotal_cents, 3000);
        let stored_items = f.db.sales().get_items(&completed.sale.id).await.unwrap();
        assert_eq!(stored_items.len(), 2);
        assert_eq!(stored_items[0].item, ItemRef::Product(f.product.id.clone()));
        assert_eq!(stored_items[1].item, ItemRef::Service(f.service.id.clone()));

        let session = f.db.sessions().get_active_for_cashier(CASHIER).await.unwrap().unwrap();
        assert_eq!(session.total_sales(), Money::from_cents(3200));
        assert_eq!(session.total_transactions, 1);
        assert_eq!(session.closing_balance(), Money::from_cents(4200));
    }

    #[tokio::test]
    async fn test_subtotal_is_sum_of_line_totals() {
        let f = fixture().await;

        let completed = checkout(&f.db)
            .make_sale(
                CASHIER,
                request(
                    PaymentMethod::Card,
                    0,
                    vec![
                        product_line(&f.product.id, 3, 333),
                        service_line(&f.service.id, 7, 101),
                        product_line(&f.product.id, 1, 1),
                    ],
                ),
            )
            .await
            .unwrap();

        let sum: Money = completed.items.iter().map(SaleItem::total_price).sum();
        assert_eq!(completed.sale.subtotal(), sum);
        assert_eq!(sum, Money::from_cents(999 + 707 + 1));
        assert_eq!(f.db.products().stock_level(&f.product.id).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back() {
        let f = fixture().await;
        let till = add_account(&f, LedgerKind::CashTill, 0).await;

        let err = checkout(&f.db)
            .make_sale(
                CASHIER,
                request(
                    PaymentMethod::Cash,
                    0,
                    vec![
                        service_line(&f.service.id, 1, 2000),
                        product_line(&f.product.id, 11, 500),
                    ],
                ),
            )
            .await
            .unwrap_err();

        match err {
            CheckoutError::Core(CoreError::InsufficientStock {
                product,
                available,
                requested,
            }) => {
                assert_eq!(product, "Claw Hammer");
                assert_eq!(available, 10);
                assert_eq!(requested, 11);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(f.db.sales().count().await.unwrap(), 0);
        assert_eq!(f.db.products().stock_level(&f.product.id).await.unwrap(), 10);
        assert!(f.db.inventory().list_for_product(&f.product.id).await.unwrap().is_empty());
        assert_eq!(f.db.ledger().balance(&till).await.unwrap(), Money::zero());

        let session = f.db.sessions().get_active_for_cashier(CASHIER).await.unwrap().unwrap();
        assert_eq!(session.total_transactions, 0);
    }

    #[tokio::test]
    async fn test_session_closed_mid_sale_rolls_back() {
        let f = fixture().await;
        let till = add_account(&f, LedgerKind::CashTill, 0).await;

        // Closes the session between the lookup and the totals update
        sqlx::query(
            r#"
            CREATE TRIGGER close_session_on_sale AFTER INSERT ON sales
            BEGIN
                UPDATE sale_sessions SET is_active = 0 WHERE id = NEW.session_id;
            END
            "#,
        )
        .execute(f.db.pool())
        .await
        .unwrap();

        let err = checkout(&f.db)
            .make_sale(
                CASHIER,
                request(PaymentMethod::Cash, 0, vec![product_line(&f.product.id, 2, 500)]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Core(CoreError::NoActiveSession)));
        assert_eq!(f.db.sales().count().await.unwrap(), 0);
        assert_eq!(f.db.products().stock_level(&f.product.id).await.unwrap(), 10);
        assert_eq!(f.db.ledger().balance(&till).await.unwrap(), Money::zero());

        let session = f.db.sessions().get_active_for_cashier(CASHIER).await.unwrap().unwrap();
        assert_eq!(session.total_sales_cents, 0);
        assert_eq!(session.total_transactions, 0);
    }

    #[tokio::test]
    async fn test_movement_failure_keeps_sale() {
        let f = fixture().await;
        let till = add_account(&f, LedgerKind::CashTill, 0).await;

        sqlx::query(
            r#"
            CREATE TRIGGER reject_movements BEFORE INSERT ON inventory_movements
            BEGIN
                SELECT RAISE(ABORT, 'movement log unavailable');
            END
            "#,
        )
        .execute(f.db.pool())
        .await
        .unwrap();

        let completed = checkout(&f.db)
            .make_sale(
                CASHIER,
                request(PaymentMethod::Cash, 0, vec![product_line(&f.product.id, 2, 500)]),
            )
            .await
            .unwrap();

        assert_eq!(completed.sale.total_amount(), Money::from_cents(1000));
        assert_eq!(f.db.sales().count().await.unwrap(), 1);
        assert_eq!(f.db.products().stock_level(&f.product.id).await.unwrap(), 8);
        assert!(f.db.inventory().list_for_product(&f.product.id).await.unwrap().is_empty());
        assert_eq!(f.db.ledger().balance(&till).await.unwrap(), Money::from_cents(1000));
        assert_eq!(f.db.sales().get_items(&completed.sale.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_same_product_on_two_lines_counts_cumulatively() {
        let f = fixture().await;

        let err = checkout(&f.db)
            .make_sale(
                CASHIER,
                request(
                    PaymentMethod::Cash,
                    0,
                    vec![
                        product_line(&f.product.id, 6, 500),
                        product_line(&f.product.id, 6, 500),
                    ],
                ),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::InsufficientStock { available: 4, .. })
        ));
        assert_eq!(f.db.products().stock_level(&f.product.id).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_no_active_session() {
        let f = fixture().await;
        f.db.sessions().end(CASHIER, None).await.unwrap();

        let err = checkout(&f.db)
            .make_sale(
                CASHIER,
                request(PaymentMethod::Cash, 0, vec![product_line(&f.product.id, 1, 500)]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Core(CoreError::NoActiveSession)));
        assert_eq!(f.db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_sale_writes_nothing() {
        let f = fixture().await;

        let err = checkout(&f.db)
            .make_sale(CASHIER, request(PaymentMethod::Cash, 0, vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Core(CoreError::EmptyItemSet)));
        assert_eq!(f.db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_items_rejected() {
        let f = fixture().await;
        let service = checkout(&f.db);

        let err = service
            .make_sale(
                CASHIER,
                request(PaymentMethod::Cash, 0, vec![product_line("missing", 1, 100)]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Core(CoreError::ProductNotFound(_))));

        let err = service
            .make_sale(
                CASHIER,
                request(PaymentMethod::Cash, 0, vec![service_line("missing", 1, 100)]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Core(CoreError::ServiceNotFound(_))));

        assert_eq!(f.db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_store_mismatch() {
        let f = fixture().await;
        let other = f
            .db
            .stores()
            .create_store(&f.store.business_id, "Borrowdale", None)
            .await
            .unwrap();
        let foreign = f
            .db
            .products()
            .insert(NewProduct {
                business_id: f.store.business_id.clone(),
                store_id: Some(other.id.clone()),
                sku: "SAW-01".into(),
                name: "Hand Saw".into(),
                unit_price: Money::from_cents(1500),
                cost_price: Money::from_cents(900),
                quantity_in_stock: 5,
            })
            .await
            .unwrap();

        let err = checkout(&f.db)
            .make_sale(
                CASHIER,
                request(PaymentMethod::Cash, 0, vec![product_line(&foreign.id, 1, 1500)]),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::StoreMismatch { ref product }) if product == "Hand Saw"
        ));
        assert_eq!(f.db.products().stock_level(&foreign.id).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_session_totals_over_many_sales() {
        let f = fixture().await;
        let service = checkout(&f.db);
        let amounts = [2000, 4000, 1999, 1];

        for cents in amounts {
            service
                .make_sale(
                    CASHIER,
                    request(PaymentMethod::Cash, 0, vec![service_line(&f.service.id, 1, cents)]),
                )
                .await
                .unwrap();
        }

        let session = f.db.sessions().get_active_for_cashier(CASHIER).await.unwrap().unwrap();
        assert_eq!(session.total_sales_cents, amounts.iter().sum::<i64>());
        assert_eq!(session.total_transactions, amounts.len() as i64);
        assert_eq!(
            session.closing_balance_cents,
            1000 + amounts.iter().sum::<i64>()
        );
        assert_eq!(
            f.db.sales().list_for_session(&session.id).await.unwrap().len(),
            amounts.len()
        );
    }

    #[tokio::test]
    async fn test_no_till_still_succeeds() {
        let f = fixture().await;
        let bank = add_account(&f, LedgerKind::Bank, 5000).await;

        let completed = checkout(&f.db)
            .make_sale(
                CASHIER,
                request(PaymentMethod::Cash, 0, vec![product_line(&f.product.id, 1, 500)]),
            )
            .await
            .unwrap();

        assert_eq!(
            completed.settlement,
            SettlementOutcome::NoAccount {
                kind: LedgerKind::CashTill
            }
        );
        assert_eq!(f.db.ledger().balance(&bank).await.unwrap(), Money::from_cents(5000));
    }

    #[tokio::test]
    async fn test_mobile_money_and_bank_write_receipts() {
        let f = fixture().await;
        let mobile = add_account(&f, LedgerKind::MobileMoney, 0).await;
        let bank = add_account(&f, LedgerKind::Bank, 0).await;
        let service = checkout(&f.db);

        let ecocash = service
            .make_sale(
                CASHIER,
                request(
                    PaymentMethod::MobileMoney,
                    0,
                    vec![service_line(&f.service.id, 1, 4550)],
                ),
            )
            .await
            .unwrap();

        for method in [PaymentMethod::Card, PaymentMethod::Mixed] {
            service
                .make_sale(
                    CASHIER,
                    request(method, 0, vec![service_line(&f.service.id, 1, 1000)]),
                )
                .await
                .unwrap();
        }

        assert_eq!(f.db.ledger().balance(&mobile).await.unwrap(), Money::from_cents(4550));
        let receipts = f.db.ledger().list_transactions(&mobile).await.unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].transaction_type, TransactionType::Receipt);
        assert_eq!(receipts[0].reference, ecocash.sale.sale_number);
        assert_eq!(receipts[0].created_by, CASHIER);

        assert_eq!(f.db.ledger().balance(&bank).await.unwrap(), Money::from_cents(2000));
        assert_eq!(f.db.ledger().list_transactions(&bank).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_zero_total_posts_nothing() {
        let f = fixture().await;
        let till = add_account(&f, LedgerKind::CashTill, 700).await;

        let completed = checkout(&f.db)
            .make_sale(
                CASHIER,
                request(PaymentMethod::Cash, 0, vec![service_line(&f.service.id, 1, 0)]),
            )
            .await
            .unwrap();

        assert_eq!(completed.settlement, SettlementOutcome::NothingToPost);
        assert_eq!(f.db.ledger().balance(&till).await.unwrap(), Money::from_cents(700));
    }

    #[tokio::test]
    async fn test_missing_fiscal_config_is_soft() {
        let f = fixture().await;

        let completed = checkout(&f.db)
            .make_sale(
                CASHIER,
                request(PaymentMethod::Cash, 0, vec![product_line(&f.product.id, 1, 500)]),
            )
            .await
            .unwrap();

        assert!(!completed.fiscalization_success());
        assert!(completed.fiscal_receipt_number().is_none());
        assert_eq!(completed.fiscalization.request_payload, "{}");
        assert!(completed
            .fiscalization
            .response_payload
            .contains("Missing ZIMRA configuration"));

        let logs = f.db.fiscal().logs_for_sale(&completed.sale.id).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert!(f.db.sales().get_by_id(&completed.sale.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_gateway_failure_is_logged() {
        let f = fixture().await;
        configure_fiscal(&f).await;

        let completed = f
            .db
            .checkout(Arc::new(DisabledFiscalGateway))
            .make_sale(
                CASHIER,
                request(PaymentMethod::Cash, 0, vec![product_line(&f.product.id, 1, 500)]),
            )
            .await
            .unwrap();

        assert!(!completed.fiscalization_success());
        assert!(completed
            .fiscalization
            .request_payload
            .contains(&completed.sale.sale_number));
        assert!(completed.fiscalization.response_payload.contains("disabled"));
    }

    #[tokio::test]
    async fn test_item_name_override_and_customer_fields() {
        let f = fixture().await;
        let mut req = request(PaymentMethod::Cash, 0, vec![product_line(&f.product.id, 1, 450)]);
        req.lines[0].item_name = Some("Hammer (promo)".into());
        req.customer_name = Some("  Tendai Moyo ".into());
        req.customer_phone = Some("   ".into());

        let completed = checkout(&f.db).make_sale(CASHIER, req).await.unwrap();

        assert_eq!(completed.items[0].item_name, "Hammer (promo)");
        assert_eq!(completed.sale.customer_name.as_deref(), Some("Tendai Moyo"));
        assert!(completed.sale.customer_phone.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_sales_never_oversell() {
        let path = std::env::temp_dir().join(format!("zimpos-oversell-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(path.clone()).max_connections(4))
            .await
            .unwrap();
        let f = fixture_with(db).await;

        // 6 sales of 3 units against 10 in stock: at most 3 can succeed
        let mut handles = Vec::new();
        for _ in 0..6 {
            let service = checkout(&f.db);
            let product_id = f.product.id.clone();
            handles.push(tokio::spawn(async move {
                service
                    .make_sale(
                        CASHIER,
                        request(PaymentMethod::Cash, 0, vec![product_line(&product_id, 3, 500)]),
                    )
                    .await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(CheckoutError::Core(CoreError::InsufficientStock { .. })) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(succeeded, 3);
        assert_eq!(f.db.products().stock_level(&f.product.id).await.unwrap(), 1);
        assert_eq!(f.db.sales().count().await.unwrap(), 3);

        f.db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
