//! # Inventory Repository
//!
//! Stock movement history. Stock levels themselves live on `products`; see
//! [`crate::repository::product`] for the counter updates.

use sqlx::{SqliteConnection, SqlitePool};

use zimpos_core::InventoryMovement;

use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Movements for one product, oldest first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(
            r#"
            SELECT id, product_id, quantity, unit_cost_cents, total_cost_cents,
                   movement_type, reference, notes, created_at
            FROM inventory_movements
            WHERE product_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Movements carrying a given reference (e.g. `POS Sale S20261016-...`).
    pub async fn list_by_reference(&self, reference: &str) -> DbResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(
            r#"
            SELECT id, product_id, quantity, unit_cost_cents, total_cost_cents,
                   movement_type, reference, notes, created_at
            FROM inventory_movements
            WHERE reference = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(reference)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

pub(crate) async fn insert_movement(
    conn: &mut SqliteConnection,
    movement: &InventoryMovement,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO inventory_movements (
            id, product_id, quantity, unit_cost_cents, total_cost_cents,
            movement_type, reference, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(movement.quantity)
    .bind(movement.unit_cost_cents)
    .bind(movement.total_cost_cents)
    .bind(movement.movement_type)
    .bind(&movement.reference)
    .bind(&movement.notes)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
