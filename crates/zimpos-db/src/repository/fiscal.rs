//! # Fiscal Repository
//!
//! Per-business ZIMRA configuration and the submission log.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use zimpos_core::fiscal::FiscalOutcome;
use zimpos_core::validation::{validate_currency_code, validate_name, validate_tax_rate_bps};
use zimpos_core::{FiscalConfig, FiscalizationLog};

use crate::error::{CheckoutResult, DbResult};

/// Fields for creating or replacing a business's fiscal configuration.
#[derive(Debug, Clone)]
pub struct FiscalSettings {
    pub vat_registration_number: String,
    pub is_vat_registered: bool,
    pub vat_rate_bps: u32,
    pub currency_code: String,
}

#[derive(Debug, Clone)]
pub struct FiscalRepository {
    pool: SqlitePool,
}

impl FiscalRepository {
    pub fn new(pool: SqlitePool) -> Self {
        FiscalRepository { pool }
    }

    /// Creates or replaces the configuration for `business_id`.
    pub async fn upsert_config(
        &self,
        business_id: &str,
        settings: FiscalSettings,
    ) -> CheckoutResult<FiscalConfig> {
        validate_name("vat_registration_number", &settings.vat_registration_number, 50)?;
        validate_tax_rate_bps(settings.vat_rate_bps)?;
        validate_currency_code(&settings.currency_code)?;

        debug!(business_id = %business_id, "Upserting fiscal configuration");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO fiscal_configs (
                business_id, vat_registration_number, is_vat_registered,
                vat_rate_bps, currency_code, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT (business_id) DO UPDATE SET
                vat_registration_number = excluded.vat_registration_number,
                is_vat_registered = excluded.is_vat_registered,
                vat_rate_bps = excluded.vat_rate_bps,
                currency_code = excluded.currency_code,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(business_id)
        .bind(settings.vat_registration_number.trim())
        .bind(settings.is_vat_registered)
        .bind(settings.vat_rate_bps)
        .bind(&settings.currency_code)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let mut conn = self.pool.acquire().await?;
        let config = fetch_config(&mut conn, business_id)
            .await?
            .ok_or_else(|| crate::DbError::not_found("FiscalConfig", business_id))?;

        Ok(config)
    }

    pub async fn get_config(&self, business_id: &str) -> DbResult<Option<FiscalConfig>> {
        let mut conn = self.pool.acquire().await?;
        fetch_config(&mut conn, business_id).await
    }

    /// Submission attempts for one sale, oldest first.
    pub async fn logs_for_sale(&self, sale_id: &str) -> DbResult<Vec<FiscalizationLog>> {
        let logs = sqlx::query_as::<_, FiscalizationLog>(
            r#"
            SELECT id, sale_id, fiscal_receipt_number, success,
                   request_payload, response_payload, created_at
            FROM fiscalization_logs
            WHERE sale_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}

// =============================================================================
// Transaction-scoped operations
// =============================================================================

pub(crate) async fn fetch_config(
    conn: &mut SqliteConnection,
    business_id: &str,
) -> DbResult<Option<FiscalConfig>> {
    let config = sqlx::query_as::<_, FiscalConfig>(
        r#"
        SELECT business_id, vat_registration_number, is_vat_registered,
               vat_rate_bps, currency_code, created_at, updated_at
        FROM fiscal_configs
        WHERE business_id = ?1
        "#,
    )
    .bind(business_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(config)
}

pub(crate) async fn insert_log(
    conn: &mut SqliteConnection,
    sale_id: &str,
    outcome: &FiscalOutcome,
) -> DbResult<FiscalizationLog> {
    let log = FiscalizationLog {
        id: Uuid::new_v4().to_string(),
        sale_id: sale_id.to_string(),
        fiscal_receipt_number: outcome.fiscal_receipt_number.clone(),
        success: outcome.success,
        request_payload: outcome.request_payload.clone(),
        response_payload: outcome.response_payload.clone(),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO fiscalization_logs (
            id, sale_id, fiscal_receipt_number, success,
            request_payload, response_payload, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&log.id)
    .bind(&log.sale_id)
    .bind(&log.fiscal_receipt_number)
    .bind(log.success)
    .bind(&log.request_payload)
    .bind(&log.response_payload)
    .bind(log.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn settings(number: &str) -> FiscalSettings {
        FiscalSettings {
            vat_registration_number: number.to_string(),
            is_vat_registered: true,
            vat_rate_bps: 1500,
            currency_code: "ZWL".to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let business = db.stores().create_business("Biz").await.unwrap();
        let repo = db.fiscal();

        assert!(repo.get_config(&business.id).await.unwrap().is_none());

        let first = repo.upsert_config(&business.id, settings("VAT-1")).await.unwrap();
        assert_eq!(first.vat_registration_number, "VAT-1");
        assert_eq!(first.vat_rate_bps, 1500);

        let second = repo.upsert_config(&business.id, settings("VAT-2")).await.unwrap();
        assert_eq!(second.vat_registration_number, "VAT-2");
        assert_eq!(second.created_at, first.created_at);
    }

    #[tokio::test]
    async fn test_invalid_rate_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let business = db.stores().create_business("Biz").await.unwrap();

        let mut bad = settings("VAT-1");
        bad.vat_rate_bps = 20_000;
        assert!(db.fiscal().upsert_config(&business.id, bad).await.is_err());
    }
}
