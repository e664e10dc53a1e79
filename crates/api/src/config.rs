use std::str::FromStr;

use axum::http::HeaderValue;

use crate::auth::cookies::CookieConfig;
use crate::auth::jwt::{KeyError, TokenConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be a valid {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("{name} must be between 0 and {max} minutes, got {value}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        max: i64,
    },

    #[error("access token TTL ({access} min) must be shorter than refresh token TTL ({refresh} min)")]
    TtlOrder { access: i64, refresh: i64 },
}

/// Server configuration, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    pub database_url: String,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<HeaderValue>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub cookies: CookieConfig,
    /// Token lifetimes and key material.
    pub tokens: TokenConfig,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, applying defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `DATABASE_URL`         | required                   |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `COOKIE_DOMAIN`        | unset                      |
    /// | `COOKIE_SECURE`        | `false`                    |
    ///
    /// Token settings are documented on [`TokenConfig::from_lookup`].
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = env_parse(lookup, "PORT", 3000u16, "u16")?;
        let database_url = require(lookup, "DATABASE_URL")?;

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| ConfigError::Invalid {
                    name: "CORS_ORIGINS",
                    expected: "origin list",
                    value: origin.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let request_timeout_secs = env_parse(lookup, "REQUEST_TIMEOUT_SECS", 30u64, "u64")?;

        let cookies = CookieConfig {
            domain: lookup("COOKIE_DOMAIN").filter(|d| !d.trim().is_empty()),
            secure: env_parse(lookup, "COOKIE_SECURE", false, "bool")?,
        };

        let tokens = TokenConfig::from_lookup(lookup)?;

        Ok(Self {
            host,
            port,
            database_url,
            cors_origins,
            request_timeout_secs,
            cookies,
            tokens,
        })
    }
}

/// Fetch a required, non-empty variable.
pub(crate) fn require<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn env_parse<F, T>(
    lookup: &F,
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value: raw,
        }),
    }
}

pub(crate) fn env_i64<F>(lookup: &F, name: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    env_parse(lookup, name, default, "i64")
}
