//! Daily bonus engine - login streak evaluation and reward grants

use chrono::{DateTime, Utc};
use cubes_core::{BonusRule, Result};
use cubes_persistence::sqlite as store;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Result of a granted daily bonus, for UI display
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusGrant {
    pub reward: i64,
    pub new_streak: i64,
}

/// Outcome of evaluating a user's login streak against the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakDecision {
    /// Bonus already granted today
    AlreadyClaimed,
    /// Bonus due at the given streak day
    Due { new_streak: i64 },
}

/// Decide whether a bonus is due, comparing calendar days in UTC.
///
/// Consecutive means "previous calendar day": a gap of exactly one day
/// continues the streak, anything else (including a never-logged-in user
/// or a last login in the future) restarts it at day 1. Elapsed hours play
/// no part.
pub fn evaluate_streak(
    last_login: Option<DateTime<Utc>>,
    streak: i64,
    now: DateTime<Utc>,
) -> StreakDecision {
    let Some(last) = last_login else {
        return StreakDecision::Due { new_streak: 1 };
    };

    let today = now.date_naive();
    let last_day = last.date_naive();

    if last_day == today {
        return StreakDecision::AlreadyClaimed;
    }

    let gap = (today - last_day).num_days();
    if gap == 1 {
        StreakDecision::Due {
            new_streak: streak + 1,
        }
    } else {
        StreakDecision::Due { new_streak: 1 }
    }
}

/// Reward for a streak day. Days past the table's last entry keep earning
/// that entry's reward; an empty table yields nothing.
pub fn reward_for_day(rules: &[BonusRule], day: i64) -> i64 {
    rules
        .iter()
        .find(|r| r.day == day)
        .or_else(|| rules.last())
        .map(|r| r.reward)
        .unwrap_or(0)
}

/// Evaluate and, if due, grant the daily login bonus for a user.
///
/// Returns `None` when nothing was granted: unknown user, bonus already
/// claimed today, or a concurrent evaluation won the conditional update.
/// On `Some`, the balance credit, login state, and ledger entry have all
/// been committed; callers re-read the user to display the new state.
pub async fn claim_daily_bonus(pool: &SqlitePool, user_id: &str) -> Result<Option<BonusGrant>> {
    let Some(user) = store::get_user(pool, user_id).await? else {
        return Ok(None);
    };

    let now = Utc::now();
    let new_streak = match evaluate_streak(user.last_login, user.login_streak, now) {
        StreakDecision::AlreadyClaimed => return Ok(None),
        StreakDecision::Due { new_streak } => new_streak,
    };

    let rules = store::get_bonus_rules(pool).await?;
    let reward = reward_for_day(&rules, new_streak);
    let description = format!("Daily bonus (day {})", new_streak);

    let applied = store::apply_daily_bonus(
        pool,
        user_id,
        user.last_login,
        now,
        new_streak,
        reward,
        &description,
    )
    .await?;

    if !applied {
        warn!("daily bonus for {} lost the update race, skipping", user_id);
        return Ok(None);
    }

    info!(
        "granted daily bonus to {}: +{} cubes (day {})",
        user_id, reward, new_streak
    );

    Ok(Some(BonusGrant { reward, new_streak }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use cubes_core::TransactionKind;
    use cubes_persistence::Database;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn same_calendar_day_is_already_claimed() {
        let decision = evaluate_streak(Some(at(2024, 3, 10, 1)), 4, at(2024, 3, 10, 23));
        assert_eq!(decision, StreakDecision::AlreadyClaimed);
    }

    #[test]
    fn previous_calendar_day_continues_streak() {
        let decision = evaluate_streak(Some(at(2024, 3, 9, 23)), 4, at(2024, 3, 10, 0));
        assert_eq!(decision, StreakDecision::Due { new_streak: 5 });
    }

    #[test]
    fn gap_of_two_days_resets_streak() {
        let decision = evaluate_streak(Some(at(2024, 3, 8, 12)), 9, at(2024, 3, 10, 12));
        assert_eq!(decision, StreakDecision::Due { new_streak: 1 });
    }

    #[test]
    fn first_ever_claim_starts_at_day_one() {
        let decision = evaluate_streak(None, 0, at(2024, 3, 10, 12));
        assert_eq!(decision, StreakDecision::Due { new_streak: 1 });
    }

    #[test]
    fn last_login_in_the_future_resets_streak() {
        let decision = evaluate_streak(Some(at(2024, 3, 12, 0)), 3, at(2024, 3, 10, 12));
        assert_eq!(decision, StreakDecision::Due { new_streak: 1 });
    }

    #[test]
    fn reward_lookup_saturates_past_the_table() {
        let rules = [
            BonusRule { day: 1, reward: 1 },
            BonusRule { day: 2, reward: 2 },
            BonusRule { day: 3, reward: 2 },
            BonusRule { day: 4, reward: 3 },
            BonusRule { day: 5, reward: 3 },
        ];
        assert_eq!(reward_for_day(&rules, 1), 1);
        assert_eq!(reward_for_day(&rules, 4), 3);
        assert_eq!(reward_for_day(&rules, 5), 3);
        assert_eq!(reward_for_day(&rules, 6), 3);
        assert_eq!(reward_for_day(&rules, 100), 3);
        assert_eq!(reward_for_day(&[], 1), 0);
    }

    async fn seed_user(
        pool: &SqlitePool,
        id: &str,
        last_login: Option<DateTime<Utc>>,
        streak: i64,
    ) {
        store::get_or_create_user(pool, id, "Alexey").await.unwrap();
        sqlx::query("UPDATE users SET last_login = ?, login_streak = ? WHERE id = ?")
            .bind(last_login)
            .bind(streak)
            .bind(id)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn second_claim_on_the_same_day_is_a_noop() {
        let db = Database::connect_in_memory().await.unwrap();
        seed_user(db.pool(), "user_1", None, 0).await;

        let first = claim_daily_bonus(db.pool(), "user_1").await.unwrap();
        let grant = first.expect("first claim grants");
        assert_eq!(grant.new_streak, 1);
        assert_eq!(grant.reward, 1);

        let second = claim_daily_bonus(db.pool(), "user_1").await.unwrap();
        assert!(second.is_none());

        let user = store::get_user(db.pool(), "user_1").await.unwrap().unwrap();
        assert_eq!(user.balance, 1);
        assert_eq!(user.login_streak, 1);
    }

    #[tokio::test]
    async fn broken_streak_resets_to_day_one() {
        let db = Database::connect_in_memory().await.unwrap();
        seed_user(db.pool(), "user_1", Some(Utc::now() - Duration::days(2)), 3).await;

        let grant = claim_daily_bonus(db.pool(), "user_1")
            .await
            .unwrap()
            .expect("bonus due");
        assert_eq!(grant.new_streak, 1);
        assert_eq!(grant.reward, 1);
    }

    #[tokio::test]
    async fn consecutive_day_advances_streak() {
        let db = Database::connect_in_memory().await.unwrap();
        seed_user(db.pool(), "user_1", Some(Utc::now() - Duration::days(1)), 4).await;

        let grant = claim_daily_bonus(db.pool(), "user_1")
            .await
            .unwrap()
            .expect("bonus due");
        assert_eq!(grant.new_streak, 5);
        assert_eq!(grant.reward, 3);
    }

    #[tokio::test]
    async fn streak_beyond_the_table_earns_the_last_reward() {
        let db = Database::connect_in_memory().await.unwrap();
        seed_user(db.pool(), "user_1", Some(Utc::now() - Duration::days(1)), 7).await;

        let grant = claim_daily_bonus(db.pool(), "user_1")
            .await
            .unwrap()
            .expect("bonus due");
        assert_eq!(grant.new_streak, 8);
        assert_eq!(grant.reward, 3);
    }

    #[tokio::test]
    async fn grant_appends_a_ledger_entry() {
        let db = Database::connect_in_memory().await.unwrap();
        seed_user(db.pool(), "user_1", Some(Utc::now() - Duration::days(1)), 1).await;

        let grant = claim_daily_bonus(db.pool(), "user_1")
            .await
            .unwrap()
            .expect("bonus due");

        let entries = store::get_transactions(db.pool(), "user_1", 10, 0)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, TransactionKind::DailyBonus);
        assert_eq!(entries[0].amount, grant.reward);
    }

    #[tokio::test]
    async fn concurrent_claims_grant_at_most_once() {
        let db = Database::connect_in_memory().await.unwrap();
        seed_user(db.pool(), "user_1", Some(Utc::now() - Duration::days(1)), 2).await;

        let (a, b) = tokio::join!(
            claim_daily_bonus(db.pool(), "user_1"),
            claim_daily_bonus(db.pool(), "user_1"),
        );
        let grants = [a.unwrap(), b.unwrap()];
        assert_eq!(grants.iter().filter(|g| g.is_some()).count(), 1);

        let user = store::get_user(db.pool(), "user_1").await.unwrap().unwrap();
        assert_eq!(user.balance, 2);
        assert_eq!(user.login_streak, 3);
        assert_eq!(
            store::count_transactions(db.pool(), "user_1").await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn unknown_user_is_a_noop() {
        let db = Database::connect_in_memory().await.unwrap();
        let grant = claim_daily_bonus(db.pool(), "nobody").await.unwrap();
        assert!(grant.is_none());
    }
}
