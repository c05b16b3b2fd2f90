//! # Service Repository
//!
//! Non-stocked catalog lines. Selling a service never touches inventory.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use zimpos_core::validation::{validate_name, validate_non_negative, validate_sku};
use zimpos_core::{Money, Service};

use crate::error::{CheckoutResult, DbResult};

const SERVICE_COLUMNS: &str =
    "id, business_id, store_id, service_code, name, price_cents, is_active, created_at";

/// Fields needed to create a service.
#[derive(Debug, Clone)]
pub struct NewService {
    pub business_id: String,
    pub store_id: Option<String>,
    pub service_code: String,
    pub name: String,
    pub price: Money,
}

#[derive(Debug, Clone)]
pub struct ServiceRepository {
    pool: SqlitePool,
}

impl ServiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ServiceRepository { pool }
    }

    pub async fn insert(&self, new: NewService) -> CheckoutResult<Service> {
        // Service codes follow the SKU alphabet
        validate_sku(&new.service_code)?;
        validate_name("name", &new.name, 200)?;
        validate_non_negative("price", new.price)?;

        let service = Service {
            id: Uuid::new_v4().to_string(),
            business_id: new.business_id,
            store_id: new.store_id,
            service_code: new.service_code.trim().to_string(),
            name: new.name.trim().to_string(),
            price_cents: new.price.cents(),
            is_active: true,
            created_at: Utc::now(),
        };

        debug!(code = %service.service_code, "Inserting service");

        sqlx::query(
            r#"
            INSERT INTO services (
                id, business_id, store_id, service_code, name, price_cents, is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&service.id)
        .bind(&service.business_id)
        .bind(&service.store_id)
        .bind(&service.service_code)
        .bind(&service.name)
        .bind(service.price_cents)
        .bind(service.is_active)
        .bind(service.created_at)
        .execute(&self.pool)
        .await?;

        Ok(service)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Service>> {
        let sql = format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1");
        let service = sqlx::query_as::<_, Service>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(service)
    }
}

/// Loads an active service; inactive ones are reported as absent.
pub(crate) async fn fetch_active_service(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Service>> {
    let sql = format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1 AND is_active = 1");
    let service = sqlx::query_as::<_, Service>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let business = db.stores().create_business("Fix-It").await.unwrap();

        let service = db
            .services()
            .insert(NewService {
                business_id: business.id,
                store_id: None,
                service_code: "REPAIR-01".into(),
                name: "Screen repair".into(),
                price: Money::from_cents(2000),
            })
            .await
            .unwrap();

        let loaded = db.services().get_by_id(&service.id).await.unwrap().unwrap();
        assert_eq!(loaded.price(), Money::from_cents(2000));

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(fetch_active_service(&mut conn, &service.id).await.unwrap().is_some());
        assert!(fetch_active_service(&mut conn, "nope").await.unwrap().is_none());
    }
}
