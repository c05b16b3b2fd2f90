//! # Product Repository
//!
//! Database operations for stock-keeping products.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  ❌ WRONG: read, check, write back                                  │
//! │     SELECT quantity_in_stock ...        (two sales both read 3)     │
//! │     UPDATE ... SET quantity_in_stock = 1 (both write, 4 sold)       │
//! │                                                                     │
//! │  ✅ CORRECT: one conditional delta                                  │
//! │     UPDATE products                                                 │
//! │     SET quantity_in_stock = quantity_in_stock - :qty                │
//! │     WHERE id = :id AND quantity_in_stock >= :qty                    │
//! │                                                                     │
//! │  rows_affected = 1 → deducted                                       │
//! │  rows_affected = 0 → not enough stock (nothing changed)             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use zimpos_core::validation::{
    validate_name, validate_non_negative, validate_restock_quantity, validate_sku,
};
use zimpos_core::{InventoryMovement, Money, MovementType, Product};

use crate::error::{CheckoutResult, DbError, DbResult};
use crate::repository::inventory::insert_movement;

const PRODUCT_COLUMNS: &str = r#"
    id, business_id, store_id, sku, name,
    unit_price_cents, cost_price_cents, quantity_in_stock,
    is_active, created_at, updated_at
"#;

/// Fields needed to create a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub business_id: String,
    pub store_id: Option<String>,
    pub sku: String,
    pub name: String,
    pub unit_price: Money,
    pub cost_price: Money,
    pub quantity_in_stock: i64,
}

/// Result of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDeduction {
    Deducted,
    /// Nothing changed; `available` is the stock seen after the failed update.
    Insufficient { available: i64 },
}

#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists for the business
    pub async fn insert(&self, new: NewProduct) -> CheckoutResult<Product> {
        validate_sku(&new.sku)?;
        validate_name("name", &new.name, 200)?;
        validate_non_negative("unit_price", new.unit_price)?;
        validate_non_negative("cost_price", new.cost_price)?;
        if new.quantity_in_stock < 0 {
            return Err(zimpos_core::ValidationError::Negative {
                field: "quantity_in_stock".to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            business_id: new.business_id,
            store_id: new.store_id,
            sku: new.sku.trim().to_string(),
            name: new.name.trim().to_string(),
            unit_price_cents: new.unit_price.cents(),
            cost_price_cents: new.cost_price.cents(),
            quantity_in_stock: new.quantity_in_stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, business_id, store_id, sku, name,
                unit_price_cents, cost_price_cents, quantity_in_stock,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.business_id)
        .bind(&product.store_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.unit_price_cents)
        .bind(product.cost_price_cents)
        .bind(product.quantity_in_stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Current stock level.
    pub async fn stock_level(&self, id: &str) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        current_stock(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Adds stock and records a PURCHASE movement, in one transaction.
    ///
    /// ## Returns
    /// The new stock level.
    pub async fn restock(
        &self,
        id: &str,
        quantity: i64,
        unit_cost: Money,
        reference: &str,
    ) -> CheckoutResult<i64> {
        validate_restock_quantity(quantity)?;
        validate_non_negative("unit_cost", unit_cost)?;

        debug!(id = %id, quantity = quantity, "Restocking product");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity_in_stock = quantity_in_stock + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id).into());
        }

        let total_cost = unit_cost
            .checked_multiply_quantity(quantity)
            .ok_or(zimpos_core::CoreError::AmountOverflow)?;

        let movement = InventoryMovement {
            id: Uuid::new_v4().to_string(),
            product_id: id.to_string(),
            quantity,
            unit_cost_cents: unit_cost.cents(),
            total_cost_cents: total_cost.cents(),
            movement_type: MovementType::Purchase,
            reference: reference.to_string(),
            notes: "Stock received".to_string(),
            created_at: Utc::now(),
        };
        insert_movement(&mut tx, &movement).await?;

        let level = current_stock(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        tx.commit().await?;
        Ok(level)
    }

    /// Soft-deletes or restores a product. Inactive products cannot be sold.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}

// =============================================================================
// Transaction-scoped operations
// =============================================================================

/// Loads an active product. Inactive products are reported as absent.
pub(crate) async fn fetch_active_product(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND is_active = 1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

pub(crate) async fn current_stock(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<i64>> {
    let stock: Option<i64> =
        sqlx::query_scalar("SELECT quantity_in_stock FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(stock)
}

/// Decrements stock by `quantity` only if that much is on hand.
///
/// The check and the write are one statement, so two sales racing for the
/// last units cannot both succeed.
pub(crate) async fn deduct_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
) -> DbResult<StockDeduction> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET quantity_in_stock = quantity_in_stock - ?2,
            updated_at = ?3
        WHERE id = ?1 AND quantity_in_stock >= ?2
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(StockDeduction::Deducted);
    }

    let available = current_stock(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))?;

    Ok(StockDeduction::Insufficient { available })
}
