//! QR code models

use serde::{Deserialize, Serialize};

/// Redemption state of a QR code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrStatus {
    Active,
    Used,
}

impl QrStatus {
    /// Text form used in the record store
    pub fn as_str(&self) -> &'static str {
        match self {
            QrStatus::Active => "active",
            QrStatus::Used => "used",
        }
    }

    pub fn from_str_lossy(s: &str) -> QrStatus {
        match s {
            "active" => QrStatus::Active,
            _ => QrStatus::Used,
        }
    }
}

/// A scannable code worth a fixed number of cubes.
///
/// Transitions `active -> used` exactly once, irreversibly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCode {
    pub id: i64,
    /// Unique code string (normalized uppercase)
    pub code: String,
    /// Cubes granted on redemption
    pub value: i64,
    pub status: QrStatus,
    /// Id of the admin who generated the code
    pub generated_by: String,
    /// Id of the redeeming user, absent until used
    pub used_by: Option<String>,
    pub created_at: Option<String>,
}
