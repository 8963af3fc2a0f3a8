//! Purchase engine - spending cubes on shop products

use cubes_core::Result;
use cubes_persistence::sqlite as store;
use sqlx::SqlitePool;
use tracing::info;

/// Outcome of a purchase attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Product bought; `price` cubes were debited
    Completed { price: i64 },
    /// The user's balance does not cover the price
    InsufficientBalance,
    /// Unknown user or product
    NotFound,
}

impl PurchaseOutcome {
    pub fn success(&self) -> bool {
        matches!(self, PurchaseOutcome::Completed { .. })
    }
}

/// Buy a product for a user.
///
/// The debit only applies while `balance >= price` still holds at write
/// time, and it commits together with the negative ledger entry: a caller
/// observing the debited balance also observes the matching `purchase` row.
/// Purchases are not idempotent; two calls are two debits.
pub async fn purchase_product(
    pool: &SqlitePool,
    user_id: &str,
    product_id: i64,
) -> Result<PurchaseOutcome> {
    let Some(product) = store::get_product(pool, product_id).await? else {
        return Ok(PurchaseOutcome::NotFound);
    };

    if store::get_user(pool, user_id).await?.is_none() {
        return Ok(PurchaseOutcome::NotFound);
    }

    let description = format!("Purchase: {}", product.name);
    let applied = store::debit_for_purchase(pool, user_id, product.price, &description).await?;
    if !applied {
        return Ok(PurchaseOutcome::InsufficientBalance);
    }

    info!(
        "user {} bought {} for {} cubes",
        user_id, product.name, product.price
    );
    Ok(PurchaseOutcome::Completed {
        price: product.price,
    })
}
