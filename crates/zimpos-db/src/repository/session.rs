//! # Session Repository
//!
//! Cashier shifts against a store.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  start(cashier, store) ──► active? ── yes ──► return it (created=false) │
//! │                              │                                          │
//! │                              no                                         │
//! │                              ▼                                          │
//! │                        INSERT (is_active=1) ──► created=true            │
//! │                                                                         │
//! │  every sale:  total_sales += total, total_transactions += 1,           │
//! │               closing_balance = opening + total_sales   (one UPDATE)   │
//! │                                                                         │
//! │  end(cashier) ──► is_active=0, end_time=now,                           │
//! │                   closing_balance = opening + total_sales              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A partial unique index on `(cashier_id, store_id) WHERE is_active = 1`
//! backs the one-open-session rule when two starts race.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use zimpos_core::validation::validate_non_negative;
use zimpos_core::{CoreError, Money, SaleSession};

use crate::error::{CheckoutError, CheckoutResult, DbError, DbResult};
use crate::repository::store::fetch_store;

const SESSION_COLUMNS: &str = r#"
    id, cashier_id, store_id, start_time, end_time, is_active,
    opening_balance_cents, closing_balance_cents, total_sales_cents,
    total_transactions, created_at
"#;

/// Result of [`SessionRepository::start`].
#[derive(Debug, Clone)]
pub struct SessionStart {
    pub session: SaleSession,
    /// `false` when an already-open session was returned.
    pub created: bool,
}

#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Returns the cashier's open session at `store_id`, or opens one.
    ///
    /// ## Errors
    /// * `CoreError::StoreNotFound` - unknown store
    pub async fn start(
        &self,
        cashier_id: &str,
        store_id: &str,
        opening_balance: Money,
    ) -> CheckoutResult<SessionStart> {
        validate_non_negative("opening_balance", opening_balance)?;

        let mut conn = self.pool.acquire().await?;

        if fetch_store(&mut conn, store_id).await?.is_none() {
            return Err(CoreError::StoreNotFound(store_id.to_string()).into());
        }

        if let Some(session) = fetch_active_at_store(&mut conn, cashier_id, store_id).await? {
            debug!(session_id = %session.id, "Returning existing active session");
            return Ok(SessionStart {
                session,
                created: false,
            });
        }

        let now = Utc::now();
        let session = SaleSession {
            id: Uuid::new_v4().to_string(),
            cashier_id: cashier_id.to_string(),
            store_id: store_id.to_string(),
            start_time: now,
            end_time: None,
            is_active: true,
            opening_balance_cents: opening_balance.cents(),
            closing_balance_cents: opening_balance.cents(),
            total_sales_cents: 0,
            total_transactions: 0,
            created_at: now,
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO sale_sessions (
                id, cashier_id, store_id, start_time, end_time, is_active,
                opening_balance_cents, closing_balance_cents, total_sales_cents,
                total_transactions, created_at
            ) VALUES (?1, ?2, ?3, ?4, NULL, 1, ?5, ?6, 0, 0, ?7)
            "#,
        )
        .bind(&session.id)
        .bind(&session.cashier_id)
        .bind(&session.store_id)
        .bind(session.start_time)
        .bind(session.opening_balance_cents)
        .bind(session.closing_balance_cents)
        .bind(session.created_at)
        .execute(&mut *conn)
        .await;

        match inserted {
            Ok(_) => {
                info!(
                    session_id = %session.id,
                    cashier_id = %cashier_id,
                    store_id = %store_id,
                    opening_balance = %opening_balance,
                    "Session started"
                );
                Ok(SessionStart {
                    session,
                    created: true,
                })
            }
            Err(e) => match DbError::from(e) {
                // Lost a race with a concurrent start: hand back the winner
                DbError::UniqueViolation { .. } => {
                    let session = fetch_active_at_store(&mut conn, cashier_id, store_id)
                        .await?
                        .ok_or_else(|| DbError::not_found("SaleSession", cashier_id))?;
                    Ok(SessionStart {
                        session,
                        created: false,
                    })
                }
                other => Err(CheckoutError::Db(other)),
            },
        }
    }

    /// Closes the cashier's active session.
    ///
    /// With `store_id` the session at that store is closed; without it the
    /// most recently started one is.
    ///
    /// ## Errors
    /// * `CoreError::NoActiveSession` - nothing open to close
    pub async fn end(&self, cashier_id: &str, store_id: Option<&str>) -> CheckoutResult<SaleSession> {
        let mut conn = self.pool.acquire().await?;

        let active = match store_id {
            Some(store_id) => fetch_active_at_store(&mut conn, cashier_id, store_id).await?,
            None => fetch_active_for_cashier(&mut conn, cashier_id).await?,
        };
        let session = active.ok_or(CoreError::NoActiveSession)?;

        let result = sqlx::query(
            r#"
            UPDATE sale_sessions
            SET is_active = 0,
                end_time = ?2,
                closing_balance_cents = opening_balance_cents + total_sales_cents
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(&session.id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        // Closed by a concurrent request between the lookup and the update
        if result.rows_affected() == 0 {
            return Err(CoreError::NoActiveSession.into());
        }

        let closed = fetch_session(&mut conn, &session.id)
            .await?
            .ok_or_else(|| DbError::not_found("SaleSession", &session.id))?;

        info!(
            session_id = %closed.id,
            total_sales = %closed.total_sales(),
            transactions = closed.total_transactions,
            closing_balance = %closed.closing_balance(),
            "Session ended"
        );

        Ok(closed)
    }

    pub async fn get_active_for_cashier(&self, cashier_id: &str) -> DbResult<Option<SaleSession>> {
        let mut conn = self.pool.acquire().await?;
        fetch_active_for_cashier(&mut conn, cashier_id).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleSession>> {
        let mut conn = self.pool.acquire().await?;
        fetch_session(&mut conn, id).await
    }
}

// =============================================================================
// Transaction-scoped operations
// =============================================================================

pub(crate) async fn fetch_session(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<SaleSession>> {
    let sql = format!("SELECT {SESSION_COLUMNS} FROM sale_sessions WHERE id = ?1");
    let session = sqlx::query_as::<_, SaleSession>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(session)
}

/// The cashier's most recently started open session, at any store.
pub(crate) async fn fetch_active_for_cashier(
    conn: &mut SqliteConnection,
    cashier_id: &str,
) -> DbResult<Option<SaleSession>> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM sale_sessions \
         WHERE cashier_id = ?1 AND is_active = 1 \
         ORDER BY start_time DESC, rowid DESC LIMIT 1"
    );
    let session = sqlx::query_as::<_, SaleSession>(&sql)
        .bind(cashier_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(session)
}

async fn fetch_active_at_store(
    conn: &mut SqliteConnection,
    cashier_id: &str,
    store_id: &str,
) -> DbResult<Option<SaleSession>> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM sale_sessions \
         WHERE cashier_id = ?1 AND store_id = ?2 AND is_active = 1"
    );
    let session = sqlx::query_as::<_, SaleSession>(&sql)
        .bind(cashier_id)
        .bind(store_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(session)
}

/// Adds one sale to the session's running totals in a single statement.
/// Fails with `NoActiveSession` once the session has been closed.
///
/// SQLite evaluates every right-hand side against the pre-update row, so
/// `closing_balance` is computed from the old total plus this sale.
pub(crate) async fn accumulate_sale(
    conn: &mut SqliteConnection,
    session_id: &str,
    amount: Money,
) -> CheckoutResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE sale_sessions
        SET total_sales_cents = total_sales_cents + ?2,
            total_transactions = total_transactions + 1,
            closing_balance_cents = opening_balance_cents + total_sales_cents + ?2
        WHERE id = ?1 AND is_active = 1
        "#,
    )
    .bind(session_id)
    .bind(amount.cents())
    .execute(&mut *conn)
    .await?;

    // Closed by end-session after the sale looked it up
    if result.rows_affected() == 0 {
        return Err(CoreError::NoActiveSession.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let business = db.stores().create_business("Biz").await.unwrap();
        let store = db
            .stores()
            .create_store(&business.id, "Main", None)
            .await
            .unwrap();
        (db, store.id)
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let (db, store_id) = setup().await;
        let repo = db.sessions();

        let first = repo.start("cashier-1", &store_id, Money::from_cents(5000)).await.unwrap();
        assert!(first.created);
        assert_eq!(first.session.opening_balance(), Money::from_cents(5000));

        let second = repo.start("cashier-1", &store_id, Money::zero()).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.session.id, first.session.id);
    }

    #[tokio::test]
    async fn test_start_unknown_store() {
        let (db, _) = setup().await;
        let err = db.sessions().start("c", "nowhere", Money::zero()).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::StoreNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_accumulate_and_end() {
        let (db, store_id) = setup().await;
        let repo = db.sessions();
        let start = repo.start("cashier-1", &store_id, Money::from_cents(1000)).await.unwrap();

        {
            let mut conn = db.pool().acquire().await.unwrap();
            for cents in [3200, 150, 0] {
                accumulate_sale(&mut conn, &start.session.id, Money::from_cents(cents))
                    .await
                    .unwrap();
            }
        }

        let open = repo.get_by_id(&start.session.id).await.unwrap().unwrap();
        assert_eq!(open.total_sales_cents, 3350);
        assert_eq!(open.total_transactions, 3);
        assert_eq!(open.closing_balance_cents, 4350);

        let closed = repo.end("cashier-1", None).await.unwrap();
        assert!(!closed.is_active);
        assert!(closed.end_time.is_some());
        assert_eq!(closed.closing_balance_cents, 4350);

        assert!(repo.get_active_for_cashier("cashier-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_closed_session_rejects_sales() {
        let (db, store_id) = setup().await;
        let repo = db.sessions();
        let start = repo.start("cashier-1", &store_id, Money::from_cents(1000)).await.unwrap();
        repo.end("cashier-1", None).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let err = accumulate_sale(&mut conn, &start.session.id, Money::from_cents(500))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Core(CoreError::NoActiveSession)));
        drop(conn);

        let closed = repo.get_by_id(&start.session.id).await.unwrap().unwrap();
        assert!(!closed.is_active);
        assert_eq!(closed.total_sales_cents, 0);
        assert_eq!(closed.total_transactions, 0);
        assert_eq!(closed.closing_balance_cents, 1000);
    }

    #[tokio::test]
    async fn test_end_without_session() {
        let (db, _) = setup().await;
        let err = db.sessions().end("ghost", None).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Core(CoreError::NoActiveSession)));
    }

    #[tokio::test]
    async fn test_new_session_after_end() {
        let (db, store_id) = setup().await;
        let repo = db.sessions();

        let first = repo.start("c", &store_id, Money::zero()).await.unwrap();
        repo.end("c", Some(&store_id)).await.unwrap();

        let second = repo.start("c", &store_id, Money::zero()).await.unwrap();
        assert!(second.created);
        assert_ne!(second.session.id, first.session.id);
    }
}
