//! QR redemption engine - code activation and batch generation

use cubes_core::{QrCode, QrStatus, Result};
use cubes_persistence::sqlite as store;
use rand::Rng;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Length of a generated code string
pub const CODE_LENGTH: usize = 12;

// 0/O and 1/I are excluded: the code string is printed next to the QR
// symbol and may be typed in by hand.
const CODE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Outcome of a redemption attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// Code accepted; `amount` cubes were credited to the user
    Credited { amount: i64 },
    /// No code matches the submitted string
    InvalidCode,
    /// Code exists but was already spent
    AlreadyUsed,
}

impl RedeemOutcome {
    pub fn success(&self) -> bool {
        matches!(self, RedeemOutcome::Credited { .. })
    }

    pub fn amount(&self) -> i64 {
        match self {
            RedeemOutcome::Credited { amount } => *amount,
            _ => 0,
        }
    }

    /// Short user-facing message
    pub fn message(&self) -> &'static str {
        match self {
            RedeemOutcome::Credited { .. } => "Success!",
            RedeemOutcome::InvalidCode => "invalid code",
            RedeemOutcome::AlreadyUsed => "code already used",
        }
    }
}

/// Normalize a scanned code string before lookup. Part of the redemption
/// contract, not UI sugar: stored codes are uppercase.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Redeem a code for a user.
///
/// The `active -> used` transition happens exactly once per code: it is
/// applied as a conditional update, and only after it is confirmed does the
/// user get credited (together with the `qr_scan` ledger entry, in the same
/// store transaction). A concurrent attempt that loses the race observes
/// `AlreadyUsed` and credits nothing.
pub async fn redeem(pool: &SqlitePool, user_id: &str, raw_code: &str) -> Result<RedeemOutcome> {
    let code = normalize_code(raw_code);

    let Some(qr) = store::get_by_code(pool, &code).await? else {
        return Ok(RedeemOutcome::InvalidCode);
    };

    if qr.status == QrStatus::Used {
        return Ok(RedeemOutcome::AlreadyUsed);
    }

    let applied = store::mark_code_used(pool, qr.id, user_id, qr.value, "QR code scan").await?;
    if !applied {
        warn!("code {} was redeemed concurrently, rejecting", code);
        return Ok(RedeemOutcome::AlreadyUsed);
    }

    info!("user {} redeemed code {}: +{} cubes", user_id, code, qr.value);
    Ok(RedeemOutcome::Credited { amount: qr.value })
}

/// Generate a batch of `count` active codes, each worth `value` cubes.
///
/// Every code string is drawn independently from a 32^12 space, so a
/// collision with an existing code is negligible; the UNIQUE index on the
/// code column backs the invariant regardless.
pub async fn generate_batch(
    pool: &SqlitePool,
    admin_id: &str,
    value: i64,
    count: u32,
) -> Result<Vec<QrCode>> {
    let mut codes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let code = random_code();
        let qr = store::create_code(pool, &code, value, admin_id).await?;
        codes.push(qr);
    }

    info!(
        "admin {} generated {} codes worth {} cubes each",
        admin_id,
        codes.len(),
        value
    );
    Ok(codes)
}

fn random_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CODE_CHARSET.len());
            CODE_CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubes_core::{Error, TransactionKind};
    use cubes_persistence::Database;
    use std::collections::HashSet;

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_code("  abc12345 "), "ABC12345");
        assert_eq!(normalize_code("XYZ"), "XYZ");
    }

    #[test]
    fn random_codes_use_the_charset() {
        let code = random_code();
        assert_eq!(code.len(), CODE_LENGTH);
        assert!(code.bytes().all(|b| CODE_CHARSET.contains(&b)));
    }

    async fn seed(pool: &SqlitePool) {
        store::get_or_create_user(pool, "user_1", "Alexey")
            .await
            .unwrap();
        store::create_code(pool, "ABC12345", 10, "admin_1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn redeeming_a_fresh_code_credits_its_value() {
        let db = Database::connect_in_memory().await.unwrap();
        seed(db.pool()).await;

        let outcome = redeem(db.pool(), "user_1", "ABC12345").await.unwrap();
        assert_eq!(outcome, RedeemOutcome::Credited { amount: 10 });
        assert!(outcome.success());
        assert_eq!(outcome.amount(), 10);

        let user = store::get_user(db.pool(), "user_1").await.unwrap().unwrap();
        assert_eq!(user.balance, 10);

        let qr = store::get_by_code(db.pool(), "ABC12345")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(qr.status, QrStatus::Used);
        assert_eq!(qr.used_by.as_deref(), Some("user_1"));

        let entries = store::get_transactions(db.pool(), "user_1", 10, 0)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, TransactionKind::QrScan);
        assert_eq!(entries[0].amount, 10);
    }

    #[tokio::test]
    async fn redeeming_twice_fails_without_a_second_credit() {
        let db = Database::connect_in_memory().await.unwrap();
        seed(db.pool()).await;

        redeem(db.pool(), "user_1", "ABC12345").await.unwrap();
        let second = redeem(db.pool(), "user_1", "ABC12345").await.unwrap();
        assert_eq!(second, RedeemOutcome::AlreadyUsed);
        assert_eq!(second.amount(), 0);
        assert_eq!(second.message(), "code already used");

        let user = store::get_user(db.pool(), "user_1").await.unwrap().unwrap();
        assert_eq!(user.balance, 10);
        assert_eq!(
            store::count_transactions(db.pool(), "user_1").await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn unknown_code_is_rejected() {
        let db = Database::connect_in_memory().await.unwrap();
        seed(db.pool()).await;

        let outcome = redeem(db.pool(), "user_1", "NOPE99").await.unwrap();
        assert_eq!(outcome, RedeemOutcome::InvalidCode);
        assert_eq!(outcome.message(), "invalid code");

        let user = store::get_user(db.pool(), "user_1").await.unwrap().unwrap();
        assert_eq!(user.balance, 0);
    }

    #[tokio::test]
    async fn submitted_codes_are_normalized_before_lookup() {
        let db = Database::connect_in_memory().await.unwrap();
        seed(db.pool()).await;

        let outcome = redeem(db.pool(), "user_1", "  abc12345").await.unwrap();
        assert_eq!(outcome, RedeemOutcome::Credited { amount: 10 });
    }

    #[tokio::test]
    async fn concurrent_redemptions_credit_exactly_once() {
        let db = Database::connect_in_memory().await.unwrap();
        seed(db.pool()).await;

        let (a, b) = tokio::join!(
            redeem(db.pool(), "user_1", "ABC12345"),
            redeem(db.pool(), "user_1", "ABC12345"),
        );
        let outcomes = [a.unwrap(), b.unwrap()];
        assert_eq!(outcomes.iter().filter(|o| o.success()).count(), 1);

        let user = store::get_user(db.pool(), "user_1").await.unwrap().unwrap();
        assert_eq!(user.balance, 10);
    }

    #[tokio::test]
    async fn missing_user_leaves_the_code_redeemable() {
        let db = Database::connect_in_memory().await.unwrap();
        store::create_code(db.pool(), "ABC12345", 10, "admin_1")
            .await
            .unwrap();

        let err = redeem(db.pool(), "nobody", "ABC12345").await.unwrap_err();
        assert!(matches!(err, Error::UserNotFound(_)));

        let qr = store::get_by_code(db.pool(), "ABC12345")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(qr.status, QrStatus::Active);
        assert!(qr.used_by.is_none());
    }

    #[tokio::test]
    async fn batch_generation_yields_unique_active_codes() {
        let db = Database::connect_in_memory().await.unwrap();

        let batch = generate_batch(db.pool(), "admin_1", 5, 20).await.unwrap();
        assert_eq!(batch.len(), 20);

        let codes: HashSet<&str> = batch.iter().map(|qr| qr.code.as_str()).collect();
        assert_eq!(codes.len(), 20);

        for qr in &batch {
            assert_eq!(qr.value, 5);
            assert_eq!(qr.status, QrStatus::Active);
            assert_eq!(qr.generated_by, "admin_1");
            assert!(qr.used_by.is_none());
        }

        assert_eq!(store::list_codes(db.pool()).await.unwrap().len(), 20);
    }
}
