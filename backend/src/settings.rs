//! Server configuration loaded via OrthoConfig.
//!
//! Values come from CLI arguments, `PODIUM_*` environment variables and an
//! optional config file. [`PodiumSettings::validate`] turns the raw values
//! into a [`RuntimeConfig`] so the rest of the server never sees a missing
//! secret or an out-of-range constant.

use std::net::SocketAddr;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::domain::GameRules;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_TOKEN_TTL_HOURS: u32 = 168;
const DEFAULT_MAX_HEARTS: u32 = 5;
const DEFAULT_PROMOTION_PERCENT: u8 = 20;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
/// Shortest accepted JWT signing secret, in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Raw configuration values.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PODIUM")]
pub struct PodiumSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// HS256 signing secret for bearer tokens.
    pub jwt_secret: Option<String>,
    /// Bearer token lifetime in hours.
    pub token_ttl_hours: Option<u32>,
    /// Heart cap and daily refill target.
    pub max_hearts: Option<u32>,
    /// Browser origin allowed by CORS and the WebSocket origin check.
    pub frontend_origin: Option<String>,
    /// Shared secret expected in `X-Webhook-Secret` on CI callbacks.
    pub ci_webhook_secret: Option<String>,
    /// Share of each league promoted and demoted weekly.
    pub league_promotion_percent: Option<u8>,
    /// Run the maintenance scheduler inside the server process.
    #[ortho_config(default = true)]
    pub scheduler_enabled: bool,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
}

/// Reasons the configuration cannot start a server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("invalid bind address: {0}")]
    InvalidBindAddr(String),
    #[error("jwt_secret must be at least {MIN_JWT_SECRET_LEN} bytes")]
    JwtSecretTooShort,
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },
}

/// Validated configuration handed to the server.
#[derive(Clone)]
pub struct RuntimeConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Zeroizing<String>,
    pub jwt_secret: Zeroizing<String>,
    pub token_ttl: TimeDelta,
    pub frontend_origin: String,
    pub ci_webhook_secret: Zeroizing<String>,
    pub league_promotion_percent: u8,
    pub scheduler_enabled: bool,
    pub db_max_connections: u32,
    pub rules: GameRules,
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("bind_addr", &self.bind_addr)
            .field("token_ttl", &self.token_ttl)
            .field("frontend_origin", &self.frontend_origin)
            .field("league_promotion_percent", &self.league_promotion_percent)
            .field("scheduler_enabled", &self.scheduler_enabled)
            .field("db_max_connections", &self.db_max_connections)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, SettingsError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(SettingsError::Missing(name))
}

fn in_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<u32, SettingsError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(SettingsError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}

impl PodiumSettings {
    /// Validate the raw values and apply defaults.
    pub fn validate(self) -> Result<RuntimeConfig, SettingsError> {
        let bind_raw = self
            .bind_addr
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
        let bind_addr = bind_raw
            .parse()
            .map_err(|_| SettingsError::InvalidBindAddr(bind_raw.clone()))?;

        let database_url = required(self.database_url, "database_url")?;
        let jwt_secret = required(self.jwt_secret, "jwt_secret")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(SettingsError::JwtSecretTooShort);
        }
        let ci_webhook_secret = required(self.ci_webhook_secret, "ci_webhook_secret")?;

        let ttl_hours = in_range(
            "token_ttl_hours",
            self.token_ttl_hours.unwrap_or(DEFAULT_TOKEN_TTL_HOURS),
            1,
            24 * 365,
        )?;
        let max_hearts = in_range(
            "max_hearts",
            self.max_hearts.unwrap_or(DEFAULT_MAX_HEARTS),
            1,
            100,
        )?;
        let percent = self
            .league_promotion_percent
            .unwrap_or(DEFAULT_PROMOTION_PERCENT);
        in_range("league_promotion_percent", u32::from(percent), 0, 50)?;
        let db_max_connections = in_range(
            "db_max_connections",
            self.db_max_connections
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
            1,
            1_000,
        )?;

        Ok(RuntimeConfig {
            bind_addr,
            database_url: Zeroizing::new(database_url),
            jwt_secret: Zeroizing::new(jwt_secret),
            token_ttl: TimeDelta::hours(i64::from(ttl_hours)),
            frontend_origin: self
                .frontend_origin
                .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGIN.to_owned()),
            ci_webhook_secret: Zeroizing::new(ci_webhook_secret),
            league_promotion_percent: percent,
            scheduler_enabled: self.scheduler_enabled,
            db_max_connections,
            rules: GameRules::with_max_hearts(max_hearts),
        })
    }
}
