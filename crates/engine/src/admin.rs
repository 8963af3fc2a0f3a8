//! Admin operations - balance adjustment, promotion, catalog and news

use cubes_core::{Error, NewsItem, Product, Result, Role, User};
use cubes_persistence::sqlite as store;
use sqlx::SqlitePool;
use tracing::info;

/// Unconditionally adjust a user's balance by a signed amount.
///
/// No cap and no authorization check here; callers gate access. The
/// adjustment and its `admin_add` ledger entry commit together.
pub async fn add_balance(pool: &SqlitePool, user_id: &str, amount: i64) -> Result<()> {
    store::add_balance(pool, user_id, amount, "Credited by administrator").await?;
    info!("admin adjusted balance of {} by {}", user_id, amount);
    Ok(())
}

/// Grant the admin role to a user by raw platform id.
///
/// A user who has never opened the app gets a placeholder record, so the
/// role is already in place on their first visit.
pub async fn promote_to_admin(pool: &SqlitePool, user_id: &str) -> Result<User> {
    let placeholder: String = user_id.chars().take(4).collect();
    store::get_or_create_user(pool, user_id, &format!("User {}", placeholder)).await?;
    store::set_role(pool, user_id, Role::Admin).await?;

    info!("promoted {} to admin", user_id);
    store::get_user(pool, user_id)
        .await?
        .ok_or_else(|| Error::UserNotFound(user_id.to_string()))
}

/// Add a product to the shop catalog
pub async fn add_product(
    pool: &SqlitePool,
    name: &str,
    price: i64,
    image: &str,
    description: &str,
) -> Result<Product> {
    let product = store::create_product(pool, name, price, image, description).await?;
    info!("added product {} ({} cubes)", product.name, product.price);
    Ok(product)
}

/// Remove a product from the shop catalog
pub async fn remove_product(pool: &SqlitePool, product_id: i64) -> Result<()> {
    store::delete_product(pool, product_id).await?;
    info!("removed product {}", product_id);
    Ok(())
}

/// Publish a news item
pub async fn publish_news(
    pool: &SqlitePool,
    title: &str,
    body: &str,
    image: Option<&str>,
) -> Result<NewsItem> {
    let item = store::create_news(pool, title, body, image).await?;
    info!("published news item {}", item.id);
    Ok(item)
}
