//! News feed persistence operations

use cubes_core::{Error, NewsItem, Result};
use sqlx::SqlitePool;

/// Database row for news item
#[derive(Debug, sqlx::FromRow)]
struct NewsRow {
    id: i64,
    title: String,
    body: String,
    image: Option<String>,
    created_at: Option<String>,
}

impl From<NewsRow> for NewsItem {
    fn from(row: NewsRow) -> Self {
        NewsItem {
            id: row.id,
            title: row.title,
            body: row.body,
            image: row.image,
            created_at: row.created_at,
        }
    }
}

/// Create a new news item
pub async fn create_news(
    pool: &SqlitePool,
    title: &str,
    body: &str,
    image: Option<&str>,
) -> Result<NewsItem> {
    let row: NewsRow = sqlx::query_as(
        r#"
        INSERT INTO news (title, body, image)
        VALUES (?, ?, ?)
        RETURNING id, title, body, image, created_at
        "#,
    )
    .bind(title)
    .bind(body)
    .bind(image)
    .fetch_one(pool)
    .await
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    Ok(NewsItem::from(row))
}

/// List all news items, newest first
pub async fn list_news(pool: &SqlitePool) -> Result<Vec<NewsItem>> {
    let rows: Vec<NewsRow> = sqlx::query_as(
        r#"
        SELECT id, title, body, image, created_at
        FROM news
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

    Ok(rows.into_iter().map(NewsItem::from).collect())
}
