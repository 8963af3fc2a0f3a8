//! Product catalog persistence operations

use cubes_core::{Error, Product, Result};
use sqlx::SqlitePool;

/// Database row for product
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: i64,
    image: String,
    description: String,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            price: row.price,
            image: row.image,
            description: row.description,
        }
    }
}

/// Create a new product
pub async fn create_product(
    pool: &SqlitePool,
    name: &str,
    price: i64,
    image: &str,
    description: &str,
) -> Result<Product> {
    let row: ProductRow = sqlx::query_as(
        r#"
        INSERT INTO products (name, price, image, description)
        VALUES (?, ?, ?, ?)
        RETURNING id, name, price, image, description
        "#,
    )
    .bind(name)
    .bind(price)
    .bind(image)
    .bind(description)
    .fetch_one(pool)
    .await
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    Ok(Product::from(row))
}

/// Get a specific product by id
pub async fn get_product(pool: &SqlitePool, id: i64) -> Result<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(
        r#"
        SELECT id, name, price, image, description
        FROM products
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    Ok(row.map(Product::from))
}

/// List all products in catalog order
pub async fn list_products(pool: &SqlitePool) -> Result<Vec<Product>> {
    let rows: Vec<ProductRow> = sqlx::query_as(
        r#"
        SELECT id, name, price, image, description
        FROM products
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    Ok(rows.into_iter().map(Product::from).collect())
}

/// Delete a product
pub async fn delete_product(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    Ok(())
}
