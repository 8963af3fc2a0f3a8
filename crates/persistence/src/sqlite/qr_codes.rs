//! QR code persistence operations

use cubes_core::{Error, QrCode, QrStatus, Result};
use sqlx::SqlitePool;

/// Database row for QR code
#[derive(Debug, sqlx::FromRow)]
struct QrCodeRow {
    id: i64,
    code: String,
    value: i64,
    status: String,
    generated_by: String,
    used_by: Option<String>,
    created_at: Option<String>,
}

impl From<QrCodeRow> for QrCode {
    fn from(row: QrCodeRow) -> Self {
        QrCode {
            id: row.id,
            code: row.code,
            value: row.value,
            status: QrStatus::from_str_lossy(&row.status),
            generated_by: row.generated_by,
            used_by: row.used_by,
            created_at: row.created_at,
        }
    }
}

/// Insert a new active code. Fails on a code-string collision (UNIQUE index).
pub async fn create_code(
    pool: &SqlitePool,
    code: &str,
    value: i64,
    generated_by: &str,
) -> Result<QrCode> {
    let row: QrCodeRow = sqlx::query_as(
        r#"
        INSERT INTO qr_codes (code, value, generated_by)
        VALUES (?, ?, ?)
        RETURNING id, code, value, status, generated_by, used_by, created_at
        "#,
    )
    .bind(code)
    .bind(value)
    .bind(generated_by)
    .fetch_one(pool)
    .await
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    Ok(QrCode::from(row))
}

/// Look up a code by its (already normalized) code string
pub async fn get_by_code(pool: &SqlitePool, code: &str) -> Result<Option<QrCode>> {
    let row: Option<QrCodeRow> = sqlx::query_as(
        r#"
        SELECT id, code, value, status, generated_by, used_by, created_at
        FROM qr_codes
        WHERE code = ?
        "#,
    )
    .bind(code)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    Ok(row.map(QrCode::from))
}

/// List all codes, newest first (admin view)
pub async fn list_codes(pool: &SqlitePool) -> Result<Vec<QrCode>> {
    let rows: Vec<QrCodeRow> = sqlx::query_as(
        r#"
        SELECT id, code, value, status, generated_by, used_by, created_at
        FROM qr_codes
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    Ok(rows.into_iter().map(QrCode::from).collect())
}

/// Redeem a code for a user: flip it to used, credit the value, and append
/// the ledger entry, all in one transaction.
///
/// The status flip is conditional on the code still being `active` at write
/// time, so of two concurrent redemption attempts exactly one can succeed.
/// Returns false, with no mutation, when the code was already used. A
/// missing user row aborts the whole transaction (the flip is rolled back,
/// the code stays redeemable).
pub async fn mark_code_used(
    pool: &SqlitePool,
    code_id: i64,
    user_id: &str,
    value: i64,
    description: &str,
) -> Result<bool> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    let flipped = sqlx::query(
        r#"
        UPDATE qr_codes
        SET status = 'used', used_by = ?
        WHERE id = ? AND status = 'active'
        "#,
    )
    .bind(user_id)
    .bind(code_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    if flipped.rows_affected() == 0 {
        return Ok(false);
    }

    let credited = sqlx::query("UPDATE users SET balance = balance + ? WHERE id = ?")
        .bind(value)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    if credited.rows_affected() == 0 {
        // Dropping the transaction rolls the status flip back
        return Err(Error::UserNotFound(user_id.to_string()));
    }

    sqlx::query(
        r#"
        INSERT INTO transactions (user_id, amount, kind, description)
        VALUES (?, ?, 'qr_scan', ?)
        "#,
    )
    .bind(user_id)
    .bind(value)
    .bind(description)
    .execute(&mut *tx)
    .await
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    tx.commit()
        .await
        .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    Ok(true)
}
