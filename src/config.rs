use chrono::Duration;
use std::net::SocketAddr;
use tracing::warn;

/// Runtime configuration read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// PostgreSQL when set, in-memory store otherwise
    pub database_url: Option<String>,
    pub token_lifetime: Duration,
    pub bootstrap_admin: Option<AdminCredentials>,
}

#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TOKEN_EXPIRATION_HOURS: i64 = 24;
/// Ten years
pub const MAX_TOKEN_EXPIRATION_HOURS: i64 = 24 * 365 * 10;

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; malformed values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("COURIER_BIND_ADDR")
            .and_then(|raw| {
                raw.parse::<SocketAddr>()
                    .map_err(|e| warn!(value = %raw, error = %e, "Ignoring invalid COURIER_BIND_ADDR"))
                    .ok()
            })
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)));

        let hours = lookup("TOKEN_EXPIRATION_HOURS")
            .and_then(|raw| {
                raw.parse::<i64>()
                    .ok()
                    .filter(|hours| (1..=MAX_TOKEN_EXPIRATION_HOURS).contains(hours))
                    .or_else(|| {
                        warn!(value = %raw, "Ignoring invalid TOKEN_EXPIRATION_HOURS");
                        None
                    })
            })
            .unwrap_or(DEFAULT_TOKEN_EXPIRATION_HOURS);

        let bootstrap_admin = match (
            lookup("COURIER_ADMIN_USERNAME"),
            lookup("COURIER_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) if !username.is_empty() => {
                Some(AdminCredentials { username, password })
            }
            _ => None,
        };

        Self {
            bind_addr,
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            token_lifetime: Duration::hours(hours),
            bootstrap_admin,
        }
    }
}
