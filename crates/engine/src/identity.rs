//! Identity resolution for the embedded mini-app container
//!
//! The acting user is never read from ambient state: callers pass the host
//! context (when the container supplied one) and receive a resolved user.

use cubes_core::{Result, Role, User};
use cubes_persistence::sqlite as store;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::warn;

const LOCAL_ID_KEY: &str = "local_user_id";
const FALLBACK_NAME: &str = "Guest";

/// Identity payload forwarded by the hosting platform, when present
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostContext {
    pub external_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl HostContext {
    /// Parse the raw JSON payload the container forwards
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Identity resolver configuration
#[derive(Debug, Clone, Default)]
pub struct IdentityConfig {
    /// Ids granted the admin role on sight. This is the only path to an
    /// elevated role besides a stored role record; no identifier is special
    /// to the engine itself.
    pub admin_allow_list: Vec<String>,
}

impl IdentityConfig {
    fn is_allow_listed(&self, id: &str) -> bool {
        self.admin_allow_list.iter().any(|a| a == id)
    }
}

/// The resolved acting user
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: User,
    /// False when the store was unreachable and `user` is a transient
    /// zero-balance stand-in that was never written anywhere
    pub persisted: bool,
}

/// Resolve the acting user.
///
/// Prefers the host-supplied identity; without one, a locally persisted
/// pseudo-identifier is used (generated once, kept in settings). Store
/// failures never propagate: the caller gets a transient user with zero
/// balance so the app stays usable, and that fallback only carries the
/// admin role when the id is on the configured allow-list.
pub async fn resolve(
    pool: &SqlitePool,
    ctx: Option<&HostContext>,
    config: &IdentityConfig,
) -> Identity {
    let (id, name) = match ctx {
        Some(c) => (
            c.external_id.clone(),
            c.display_name
                .clone()
                .unwrap_or_else(|| FALLBACK_NAME.to_string()),
        ),
        None => match local_identifier(pool).await {
            Ok(id) => (id, FALLBACK_NAME.to_string()),
            Err(e) => {
                warn!("could not load local identifier: {}", e);
                (ephemeral_identifier(), FALLBACK_NAME.to_string())
            }
        },
    };

    match store::get_or_create_user(pool, &id, &name).await {
        Ok(user) => {
            let user = if config.is_allow_listed(&id) && !user.is_admin() {
                match store::set_role(pool, &id, Role::Admin).await {
                    Ok(()) => User {
                        role: Role::Admin,
                        ..user
                    },
                    Err(e) => {
                        warn!("allow-list promotion of {} failed: {}", id, e);
                        user
                    }
                }
            } else {
                user
            };
            Identity {
                user,
                persisted: true,
            }
        }
        Err(e) => {
            warn!("store unavailable during identity resolution: {}", e);
            let role = if config.is_allow_listed(&id) {
                Role::Admin
            } else {
                Role::Member
            };
            Identity {
                user: User {
                    id,
                    name,
                    role,
                    balance: 0,
                    last_login: None,
                    login_streak: 0,
                },
                persisted: false,
            }
        }
    }
}

/// Load the locally persisted pseudo-identifier, generating it on first use
async fn local_identifier(pool: &SqlitePool) -> Result<String> {
    if let Some(id) = store::get_setting(pool, LOCAL_ID_KEY).await? {
        return Ok(id);
    }

    let id = ephemeral_identifier();
    store::set_setting(pool, LOCAL_ID_KEY, &id).await?;
    Ok(id)
}

fn ephemeral_identifier() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    format!("local_{}", suffix)
}
