//! Shop product models

use serde::{Deserialize, Serialize};

/// A shop item purchasable with cubes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Price in cubes
    pub price: i64,
    /// Image reference (URL or asset key)
    pub image: String,
    pub description: String,
}
