//! # Sale Repository
//!
//! Reads for sales and their lines, plus the inserts the checkout pipeline
//! runs inside its transaction. There is deliberately no public way to add
//! a line to an existing sale.

use sqlx::{FromRow, SqliteConnection, SqlitePool};

use zimpos_core::sale::SaleTotals;
use zimpos_core::{ItemRef, Sale, SaleItem};

use crate::error::{DbError, DbResult};

const SALE_COLUMNS: &str = r#"
    id, session_id, sale_number, customer_name, customer_phone,
    subtotal_cents, tax_amount_cents, discount_amount_cents, total_amount_cents,
    payment_method, status, created_at
"#;

/// `sale_items` as stored: two nullable reference columns.
#[derive(Debug, FromRow)]
struct SaleItemRow {
    id: String,
    sale_id: String,
    product_id: Option<String>,
    service_id: Option<String>,
    item_name: String,
    quantity: i64,
    unit_price_cents: i64,
    total_price_cents: i64,
}

impl TryFrom<SaleItemRow> for SaleItem {
    type Error = DbError;

    fn try_from(row: SaleItemRow) -> Result<Self, Self::Error> {
        let item = match (row.product_id, row.service_id) {
            (Some(product), None) => ItemRef::Product(product),
            (None, Some(service)) => ItemRef::Service(service),
            _ => {
                return Err(DbError::Internal(format!(
                    "sale item {} must reference exactly one product or service",
                    row.id
                )))
            }
        };

        Ok(SaleItem {
            id: row.id,
            sale_id: row.sale_id,
            item,
            item_name: row.item_name,
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
            total_price_cents: row.total_price_cents,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    pub async fn get_by_number(&self, sale_number: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE sale_number = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(sale_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Lines of a sale in the order they were rung up.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let rows = sqlx::query_as::<_, SaleItemRow>(
            r#"
            SELECT id, sale_id, product_id, service_id, item_name,
                   quantity, unit_price_cents, total_price_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SaleItem::try_from).collect()
    }

    /// Sales of one session, oldest first.
    pub async fn list_for_session(&self, session_id: &str) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE session_id = ?1 ORDER BY created_at, rowid"
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Number of sales ever recorded (diagnostics and tests).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction-scoped operations
// =============================================================================

/// Inserts the sale header. Amounts are written later by [`update_totals`].
pub(crate) async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, session_id, sale_number, customer_name, customer_phone,
            subtotal_cents, tax_amount_cents, discount_amount_cents, total_amount_cents,
            payment_method, status, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.session_id)
    .bind(&sale.sale_number)
    .bind(&sale.customer_name)
    .bind(&sale.customer_phone)
    .bind(sale.subtotal_cents)
    .bind(sale.tax_amount_cents)
    .bind(sale.discount_amount_cents)
    .bind(sale.total_amount_cents)
    .bind(sale.payment_method)
    .bind(sale.status)
    .bind(sale.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn insert_item(
    conn: &mut SqliteConnection,
    item: &SaleItem,
    line_no: usize,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, service_id, item_name,
            quantity, unit_price_cents, total_price_cents, line_no
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(item.item.product_id())
    .bind(item.item.service_id())
    .bind(&item.item_name)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.total_price_cents)
    .bind(line_no as i64)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn update_totals(
    conn: &mut SqliteConnection,
    sale_id: &str,
    totals: &SaleTotals,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE sales
        SET subtotal_cents = ?2,
            tax_amount_cents = ?3,
            discount_amount_cents = ?4,
            total_amount_cents = ?5
        WHERE id = ?1
        "#,
    )
    .bind(sale_id)
    .bind(totals.subtotal.cents())
    .bind(totals.tax_amount.cents())
    .bind(totals.discount_amount.cents())
    .bind(totals.total_amount.cents())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Sale", sale_id));
    }

    Ok(())
}
