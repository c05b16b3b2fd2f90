//! # Store Repository
//!
//! Businesses and the stores that belong to them.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use zimpos_core::validation::validate_name;
use zimpos_core::{Business, Store};

use crate::error::{CheckoutResult, DbResult};

#[derive(Debug, Clone)]
pub struct StoreRepository {
    pool: SqlitePool,
}

impl StoreRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StoreRepository { pool }
    }

    /// Creates a business (tenant).
    pub async fn create_business(&self, name: &str) -> CheckoutResult<Business> {
        validate_name("name", name, 200)?;

        let business = Business {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };

        debug!(id = %business.id, name = %business.name, "Creating business");

        sqlx::query("INSERT INTO businesses (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&business.id)
            .bind(&business.name)
            .bind(business.created_at)
            .execute(&self.pool)
            .await?;

        Ok(business)
    }

    pub async fn get_business(&self, id: &str) -> DbResult<Option<Business>> {
        let business = sqlx::query_as::<_, Business>(
            "SELECT id, name, created_at FROM businesses WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(business)
    }

    /// Creates a store under a business.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - business does not exist
    pub async fn create_store(
        &self,
        business_id: &str,
        name: &str,
        vat_number: Option<&str>,
    ) -> CheckoutResult<Store> {
        validate_name("name", name, 200)?;

        let store = Store {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.to_string(),
            name: name.trim().to_string(),
            vat_number: vat_number.map(str::to_string),
            created_at: Utc::now(),
        };

        debug!(id = %store.id, business_id = %business_id, "Creating store");

        sqlx::query(
            r#"
            INSERT INTO stores (id, business_id, name, vat_number, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&store.id)
        .bind(&store.business_id)
        .bind(&store.name)
        .bind(&store.vat_number)
        .bind(store.created_at)
        .execute(&self.pool)
        .await?;

        Ok(store)
    }

    pub async fn get_store(&self, id: &str) -> DbResult<Option<Store>> {
        let mut conn = self.pool.acquire().await?;
        fetch_store(&mut conn, id).await
    }
}

/// Loads a store on an existing connection or transaction.
pub(crate) async fn fetch_store(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Store>> {
    let store = sqlx::query_as::<_, Store>(
        "SELECT id, business_id, name, vat_number, created_at FROM stores WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(store)
}

#[cfg(test)]
mod tests {
    use crate::error::{CheckoutError, DbError};
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_business_and_store_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.stores();

        let business = repo.create_business("Moyo Hardware").await.unwrap();
        let store = repo
            .create_store(&business.id, "Harare CBD", Some("VAT-1"))
            .await
            .unwrap();

        let loaded = repo.get_store(&store.id).await.unwrap().unwrap();
        assert_eq!(loaded.business_id, business.id);
        assert_eq!(loaded.vat_number.as_deref(), Some("VAT-1"));

        assert!(repo.get_business(&business.id).await.unwrap().is_some());
        assert!(repo.get_store("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_requires_existing_business() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db
            .stores()
            .create_store("no-such-business", "Orphan", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Db(DbError::ForeignKeyViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(matches!(
            db.stores().create_business("  ").await,
            Err(CheckoutError::Core(_))
        ));
    }
}
