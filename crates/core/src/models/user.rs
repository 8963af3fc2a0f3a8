//! User-related models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a loyalty program participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    /// Text form used in the record store
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }

    /// Parse the stored text form. Unknown values read as `Member` so a
    /// malformed row can never grant elevated access.
    pub fn from_str_or_member(s: &str) -> Role {
        match s {
            "admin" => Role::Admin,
            _ => Role::Member,
        }
    }
}

/// A participant in the loyalty program.
///
/// Created lazily on first access with zero balance and streak; never
/// deleted. `last_login` is `None` until the first daily bonus claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    /// Current cube balance
    pub balance: i64,
    pub last_login: Option<DateTime<Utc>>,
    pub login_streak: i64,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
