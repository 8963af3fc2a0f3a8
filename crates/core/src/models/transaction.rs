//! Ledger transaction models

use serde::{Deserialize, Serialize};

/// What kind of event produced a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    QrScan,
    DailyBonus,
    Purchase,
    AdminAdd,
}

impl TransactionKind {
    /// Text form used in the record store
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::QrScan => "qr_scan",
            TransactionKind::DailyBonus => "daily_bonus",
            TransactionKind::Purchase => "purchase",
            TransactionKind::AdminAdd => "admin_add",
        }
    }

    pub fn from_str_lossy(s: &str) -> TransactionKind {
        match s {
            "qr_scan" => TransactionKind::QrScan,
            "daily_bonus" => TransactionKind::DailyBonus,
            "purchase" => TransactionKind::Purchase,
            _ => TransactionKind::AdminAdd,
        }
    }
}

/// Append-only ledger entry, one per balance-affecting event.
///
/// Invariant: the sum of a user's transaction amounts equals that user's
/// current balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    /// Signed cube amount (negative for purchases)
    pub amount: i64,
    pub kind: TransactionKind,
    pub description: String,
    pub created_at: Option<String>,
}
