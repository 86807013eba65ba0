use std::env::{self, VarError};
use std::time::Duration;

use serde::Deserialize;

use crate::error::DbConnectionError;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Basic configuration for creating a SQLx connection pool.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConnectionConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: Option<u64>,
}

impl Default for DbConnectionConfig {
    #[inline]
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            idle_timeout_secs: Some(DEFAULT_IDLE_TIMEOUT_SECS),
        }
    }
}

impl DbConnectionConfig {
    /// Creates a new configuration with the provided URL and sane defaults.
    #[inline]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from environment variables using the supplied prefix.
    ///
    /// Expected variables:
    /// - `{PREFIX}_DATABASE_URL` (required)
    /// - `{PREFIX}_DB_MAX_CONNECTIONS` (optional)
    /// - `{PREFIX}_DB_MIN_CONNECTIONS` (optional)
    /// - `{PREFIX}_DB_CONNECT_TIMEOUT_SECS` (optional)
    /// - `{PREFIX}_DB_IDLE_TIMEOUT_SECS` (optional)
    pub fn from_env(prefix: &str) -> Result<Self, DbConnectionError> {
        let url_var = format!("{prefix}_DATABASE_URL");
        let url = match env::var(&url_var) {
            Ok(v) if !v.trim().is_empty() => v,
            Ok(_) => return Err(DbConnectionError::EmptyDatabaseUrl),
            Err(VarError::NotPresent) => return Err(DbConnectionError::MissingEnvVar(url_var)),
            Err(VarError::NotUnicode(_)) => {
                return Err(DbConnectionError::InvalidUnicode(url_var))
            }
        };

        let mut config = Self::new(url);
        if let Some(v) = read_u64(&format!("{prefix}_DB_MAX_CONNECTIONS"))? {
            config.max_connections = v as u32;
        }
        if let Some(v) = read_u64(&format!("{prefix}_DB_MIN_CONNECTIONS"))? {
            config.min_connections = v as u32;
        }
        if let Some(v) = read_u64(&format!("{prefix}_DB_CONNECT_TIMEOUT_SECS"))? {
            config.connect_timeout_secs = v;
        }
        if let Some(v) = read_u64(&format!("{prefix}_DB_IDLE_TIMEOUT_SECS"))? {
            config.idle_timeout_secs = Some(v);
        }
        Ok(config)
    }

    #[inline]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[inline]
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }
}

fn read_u64(var: &str) -> Result<Option<u64>, DbConnectionError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|source| DbConnectionError::InvalidNumber {
                var: var.to_owned(),
                source,
            }),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(DbConnectionError::InvalidUnicode(var.to_owned())),
    }
}
