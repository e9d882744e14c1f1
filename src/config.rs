// src/config.rs

use std::{env, net::SocketAddr};

use thiserror::Error;
use url::Url;

/// Questions served per session when the client does not ask for a size.
pub const DEFAULT_QUESTIONS_PER_SESSION: i64 = 10;

/// Hard cap applied by the question fetch and session creation.
pub const MAX_QUESTIONS_PER_SESSION: i64 = 20;

/// Number of sessions shown on the results page.
pub const RESULTS_HISTORY_LIMIT: i64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Bearer token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    /// Public origin used to build magic-link URLs.
    pub app_base_url: Url,
    /// Magic-link lifetime in seconds.
    pub magic_link_ttl: i64,
    pub question_fetch_timeout_ms: u64,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let jwt_expiration = parsed("JWT_EXPIRATION", 86_400)?;
        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let app_base_url = optional("APP_BASE_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_string());
        let app_base_url = Url::parse(&app_base_url).map_err(|e| ConfigError::Invalid {
            name: "APP_BASE_URL",
            reason: e.to_string(),
        })?;

        let magic_link_ttl = parsed("MAGIC_LINK_TTL", 900)?;
        let question_fetch_timeout_ms = parsed("QUESTION_FETCH_TIMEOUT_MS", 5_000)?;
        let bind_addr = parsed("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?;

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            app_base_url,
            magic_link_ttl,
            question_fetch_timeout_ms,
            bind_addr,
        })
    }
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn parsed<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional(name) {
        Some(raw) => parse_value(name, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}
