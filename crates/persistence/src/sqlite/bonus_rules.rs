//! Daily bonus rule table access

use cubes_core::{BonusRule, Error, Result};
use sqlx::SqlitePool;

/// Get the reward table ordered by streak day
pub async fn get_bonus_rules(pool: &SqlitePool) -> Result<Vec<BonusRule>> {
    let rows: Vec<(i64, i64)> =
        sqlx::query_as("SELECT day, reward FROM bonus_rules ORDER BY day")
            .fetch_all(pool)
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    Ok(rows
        .into_iter()
        .map(|(day, reward)| BonusRule { day, reward })
        .collect())
}
