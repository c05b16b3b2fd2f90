//! # Ledger Repository
//!
//! Cash tills, mobile money accounts and bank accounts, plus the sub-ledger
//! of transactions behind the latter two.
//!
//! Balances move only through [`credit`], a single `balance = balance + ?`
//! statement. For mobile money and bank accounts a transaction row is always
//! written first, in the same database transaction.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use zimpos_core::settlement::TransactionDraft;
use zimpos_core::validation::{validate_currency_code, validate_name};
use zimpos_core::{AccountTransaction, LedgerAccount, LedgerKind, Money};

use crate::error::{CheckoutResult, DbError, DbResult};

const ACCOUNT_COLUMNS: &str = r#"
    id, store_id, kind, account_name, currency_code,
    opening_balance_cents, current_balance_cents, is_active,
    created_at, updated_at
"#;

/// Fields needed to open a ledger account.
#[derive(Debug, Clone)]
pub struct NewLedgerAccount {
    pub store_id: String,
    pub kind: LedgerKind,
    pub account_name: String,
    pub currency_code: Option<String>,
    pub opening_balance: Money,
}

#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Opens an account. The current balance starts at the opening balance.
    pub async fn create_account(&self, new: NewLedgerAccount) -> CheckoutResult<LedgerAccount> {
        validate_name("account_name", &new.account_name, 100)?;
        if let Some(code) = &new.currency_code {
            validate_currency_code(code)?;
        }

        let now = Utc::now();
        let account = LedgerAccount {
            id: Uuid::new_v4().to_string(),
            store_id: new.store_id,
            kind: new.kind,
            account_name: new.account_name.trim().to_string(),
            currency_code: new.currency_code,
            opening_balance_cents: new.opening_balance.cents(),
            current_balance_cents: new.opening_balance.cents(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %account.id, kind = %account.kind, "Creating ledger account");

        sqlx::query(
            r#"
            INSERT INTO ledger_accounts (
                id, store_id, kind, account_name, currency_code,
                opening_balance_cents, current_balance_cents, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&account.id)
        .bind(&account.store_id)
        .bind(account.kind)
        .bind(&account.account_name)
        .bind(&account.currency_code)
        .bind(account.opening_balance_cents)
        .bind(account.current_balance_cents)
        .bind(account.is_active)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<LedgerAccount>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM ledger_accounts WHERE id = ?1");
        let account = sqlx::query_as::<_, LedgerAccount>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Current balance of one account.
    pub async fn balance(&self, id: &str) -> DbResult<Money> {
        self.get_by_id(id)
            .await?
            .map(|account| account.current_balance())
            .ok_or_else(|| DbError::not_found("LedgerAccount", id))
    }

    pub async fn list_for_store(&self, store_id: &str) -> DbResult<Vec<LedgerAccount>> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM ledger_accounts WHERE store_id = ?1 ORDER BY kind, created_at"
        );
        let accounts = sqlx::query_as::<_, LedgerAccount>(&sql)
            .bind(store_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(accounts)
    }

    /// Deactivates or reactivates an account. Inactive accounts receive no sales.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE ledger_accounts SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(active)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("LedgerAccount", id));
        }

        Ok(())
    }

    /// Sub-ledger rows for an account, oldest first.
    pub async fn list_transactions(&self, account_id: &str) -> DbResult<Vec<AccountTransaction>> {
        let transactions = sqlx::query_as::<_, AccountTransaction>(
            r#"
            SELECT id, account_id, transaction_type, amount_cents, reference, description,
                   transaction_date, value_date, status, created_by, created_at
            FROM account_transactions
            WHERE account_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }
}

// =============================================================================
// Transaction-scoped operations
// =============================================================================

/// The store's active account of the given kind.
///
/// When a store has several, the oldest one receives sales.
pub(crate) async fn find_active_account(
    conn: &mut SqliteConnection,
    store_id: &str,
    kind: LedgerKind,
) -> DbResult<Option<LedgerAccount>> {
    let sql = format!(
        "SELECT {ACCOUNT_COLUMNS} FROM ledger_accounts \
         WHERE store_id = ?1 AND kind = ?2 AND is_active = 1 \
         ORDER BY created_at, rowid LIMIT 1"
    );
    let account = sqlx::query_as::<_, LedgerAccount>(&sql)
        .bind(store_id)
        .bind(kind)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(account)
}

pub(crate) async fn insert_transaction(
    conn: &mut SqliteConnection,
    account_id: &str,
    amount: Money,
    draft: &TransactionDraft,
) -> DbResult<AccountTransaction> {
    let transaction = AccountTransaction {
        id: Uuid::new_v4().to_string(),
        account_id: account_id.to_string(),
        transaction_type: draft.transaction_type,
        amount_cents: amount.cents(),
        reference: draft.reference.clone(),
        description: draft.description.clone(),
        transaction_date: draft.transaction_date,
        value_date: draft.value_date,
        status: draft.status,
        created_by: draft.created_by.clone(),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO account_transactions (
            id, account_id, transaction_type, amount_cents, reference, description,
            transaction_date, value_date, status, created_by, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&transaction.id)
    .bind(&transaction.account_id)
    .bind(transaction.transaction_type)
    .bind(transaction.amount_cents)
    .bind(&transaction.reference)
    .bind(&transaction.description)
    .bind(transaction.transaction_date)
    .bind(transaction.value_date)
    .bind(transaction.status)
    .bind(&transaction.created_by)
    .bind(transaction.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(transaction)
}

/// Adds `amount` to an account's balance in place.
pub(crate) async fn credit(conn: &mut SqliteConnection, account_id: &str, amount: Money) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE ledger_accounts
        SET current_balance_cents = current_balance_cents + ?2,
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(account_id)
    .bind(amount.cents())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("LedgerAccount", account_id));
    }

    Ok(())
}
