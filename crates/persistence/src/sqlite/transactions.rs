//! Ledger read operations
//!
//! Ledger rows are only ever written inside the compound balance mutations
//! (`users`, `qr_codes`), so this module is read-only.

use cubes_core::{Error, Result, Transaction, TransactionKind};
use sqlx::SqlitePool;

/// Database row for ledger entry
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    user_id: String,
    amount: i64,
    kind: String,
    description: String,
    created_at: Option<String>,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Transaction {
            id: row.id,
            user_id: row.user_id,
            amount: row.amount,
            kind: TransactionKind::from_str_lossy(&row.kind),
            description: row.description,
            created_at: row.created_at,
        }
    }
}

/// Get a user's ledger entries, newest first
pub async fn get_transactions(
    pool: &SqlitePool,
    user_id: &str,
    limit: u32,
    offset: u32,
) -> Result<Vec<Transaction>> {
    let rows: Vec<TransactionRow> = sqlx::query_as(
        r#"
        SELECT id, user_id, amount, kind, description, created_at
        FROM transactions
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    Ok(rows.into_iter().map(Transaction::from).collect())
}

/// Get ledger entry count for a user
pub async fn count_transactions(pool: &SqlitePool, user_id: &str) -> Result<u32> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    Ok(row.0 as u32)
}

/// Sum of a user's ledger amounts. Should equal the user's current balance.
pub async fn sum_transactions(pool: &SqlitePool, user_id: &str) -> Result<i64> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    Ok(row.0)
}
