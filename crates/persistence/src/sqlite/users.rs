//! User CRUD and balance mutations

use chrono::{DateTime, Utc};
use cubes_core::{Error, Result, Role, User};
use sqlx::SqlitePool;

/// Database row for user
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    role: String,
    balance: i64,
    last_login: Option<DateTime<Utc>>,
    login_streak: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            role: Role::from_str_or_member(&row.role),
            balance: row.balance,
            last_login: row.last_login,
            login_streak: row.login_streak,
        }
    }
}

/// Get a specific user by id
pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as(
        r#"
        SELECT id, name, role, balance, last_login, login_streak
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    Ok(row.map(User::from))
}

/// Get a user, creating the record with zero balance and streak if this is
/// the first time the id is seen
pub async fn get_or_create_user(pool: &SqlitePool, id: &str, name: &str) -> Result<User> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name)
        VALUES (?, ?)
        ON CONFLICT(id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(name)
    .execute(pool)
    .await
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    get_user(pool, id)
        .await?
        .ok_or_else(|| Error::UserNotFound(id.to_string()))
}

/// List all users, newest first (admin view)
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows: Vec<UserRow> = sqlx::query_as(
        r#"
        SELECT id, name, role, balance, last_login, login_streak
        FROM users
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    Ok(rows.into_iter().map(User::from).collect())
}

/// Set a user's role
pub async fn set_role(pool: &SqlitePool, id: &str, role: Role) -> Result<()> {
    let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    if result.rows_affected() == 0 {
        return Err(Error::UserNotFound(id.to_string()));
    }

    Ok(())
}

/// Apply a daily bonus grant: credit the reward, advance the login state,
/// and append the ledger entry, all in one transaction.
///
/// The update is conditional on `last_login` still holding the value the
/// caller evaluated (`IS NULL` form for a first-ever claim), so of two
/// concurrent evaluations only one can apply. Returns false, with no
/// mutation, when the condition no longer holds.
pub async fn apply_daily_bonus(
    pool: &SqlitePool,
    user_id: &str,
    expected_last_login: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    new_streak: i64,
    reward: i64,
    description: &str,
) -> Result<bool> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    let updated = match expected_last_login {
        Some(prev) => {
            sqlx::query(
                r#"
                UPDATE users
                SET balance = balance + ?, last_login = ?, login_streak = ?
                WHERE id = ? AND last_login = ?
                "#,
            )
            .bind(reward)
            .bind(now)
            .bind(new_streak)
            .bind(user_id)
            .bind(prev)
            .execute(&mut *tx)
            .await
        }
        None => {
            sqlx::query(
                r#"
                UPDATE users
                SET balance = balance + ?, last_login = ?, login_streak = ?
                WHERE id = ? AND last_login IS NULL
                "#,
            )
            .bind(reward)
            .bind(now)
            .bind(new_streak)
            .bind(user_id)
            .execute(&mut *tx)
            .await
        }
    }
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    if updated.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query(
        r#"
        INSERT INTO transactions (user_id, amount, kind, description)
        VALUES (?, ?, 'daily_bonus', ?)
        "#,
    )
    .bind(user_id)
    .bind(reward)
    .bind(description)
    .execute(&mut *tx)
    .await
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    tx.commit()
        .await
        .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    Ok(true)
}

/// Debit a purchase: subtract the price and append the negative ledger
/// entry in one transaction.
///
/// The debit is conditional on `balance >= price` at write time; returns
/// false, with no mutation, when the balance is no longer sufficient.
pub async fn debit_for_purchase(
    pool: &SqlitePool,
    user_id: &str,
    price: i64,
    description: &str,
) -> Result<bool> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    let debited = sqlx::query(
        r#"
        UPDATE users
        SET balance = balance - ?
        WHERE id = ? AND balance >= ?
        "#,
    )
    .bind(price)
    .bind(user_id)
    .bind(price)
    .execute(&mut *tx)
    .await
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    if debited.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query(
        r#"
        INSERT INTO transactions (user_id, amount, kind, description)
        VALUES (?, ?, 'purchase', ?)
        "#,
    )
    .bind(user_id)
    .bind(-price)
    .bind(description)
    .execute(&mut *tx)
    .await
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    tx.commit()
        .await
        .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    Ok(true)
}

/// Unconditionally adjust a user's balance by a signed amount and append
/// the ledger entry (operator action)
pub async fn add_balance(
    pool: &SqlitePool,
    user_id: &str,
    amount: i64,
    description: &str,
) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    let updated = sqlx::query("UPDATE users SET balance = balance + ? WHERE id = ?")
        .bind(amount)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    if updated.rows_affected() == 0 {
        return Err(Error::UserNotFound(user_id.to_string()));
    }

    sqlx::query(
        r#"
        INSERT INTO transactions (user_id, amount, kind, description)
        VALUES (?, ?, 'admin_add', ?)
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .bind(description)
    .execute(&mut *tx)
    .await
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    tx.commit()
        .await
        .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    Ok(())
}
