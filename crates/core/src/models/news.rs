//! News feed models

use serde::{Deserialize, Serialize};

/// Admin-authored news entry, append-only from the user's perspective
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    pub created_at: Option<String>,
}
