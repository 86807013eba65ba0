//! Configuration for the MealHub worker process.
//!
//! Configuration comes from an optional JSON or TOML file plus `MEALHUB_*`
//! environment overrides; every field has a default so the worker runs with
//! no file at all.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:mealhub.db";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_JOB_TIMEOUT_MINUTES: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported config format '{0}' (expected .json or .toml)")]
    UnsupportedFormat(String),
    #[error("failed to parse config file: {0}")]
    Parse(String),
    #[error("invalid value '{value}' for {var}")]
    InvalidEnv { var: String, value: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// File shape: every section and field optional.
#[derive(Debug, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub database: Option<DatabaseSection>,
    #[serde(default)]
    pub worker: Option<WorkerSection>,
    #[serde(default)]
    pub logging: Option<LoggingSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DatabaseSection {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub max_connections: Option<u32>,
    #[serde(default)]
    pub min_connections: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkerSection {
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
    #[serde(default)]
    pub job_timeout_minutes: Option<u64>,
    #[serde(default)]
    pub orphan_recovery: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub json: Option<bool>,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub worker: WorkerSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub poll_interval_secs: u64,
    pub job_timeout_minutes: u64,
    pub orphan_recovery: bool,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_owned(),
                max_connections: None,
                min_connections: None,
            },
            worker: WorkerSettings {
                poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
                job_timeout_minutes: DEFAULT_JOB_TIMEOUT_MINUTES,
                orphan_recovery: true,
            },
            logging: LoggingConfig {
                level: DEFAULT_LOG_LEVEL.to_owned(),
                json: false,
            },
        }
    }
}

impl WorkerSettings {
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[inline]
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_minutes * 60)
    }
}

impl AppConfig {
    /// Load configuration: file (if given) first, then `MEALHUB_*` env
    /// overrides, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        let raw: RawConfigFile = match extension.as_str() {
            "json" => {
                serde_json::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
            "toml" => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_owned())),
        };

        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawConfigFile) -> Self {
        let mut config = Self::default();
        if let Some(database) = raw.database {
            if let Some(url) = database.url {
                config.database.url = url;
            }
            config.database.max_connections = database.max_connections;
            config.database.min_connections = database.min_connections;
        }
        if let Some(worker) = raw.worker {
            if let Some(v) = worker.poll_interval_secs {
                config.worker.poll_interval_secs = v;
            }
            if let Some(v) = worker.job_timeout_minutes {
                config.worker.job_timeout_minutes = v;
            }
            if let Some(v) = worker.orphan_recovery {
                config.worker.orphan_recovery = v;
            }
        }
        if let Some(logging) = raw.logging {
            if let Some(v) = logging.level {
                config.logging.level = v;
            }
            if let Some(v) = logging.json {
                config.logging.json = v;
            }
        }
        config
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = env::var("MEALHUB_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(v) = env_u64("MEALHUB_WORKER_POLL_INTERVAL_SECS")? {
            self.worker.poll_interval_secs = v;
        }
        if let Some(v) = env_u64("MEALHUB_WORKER_JOB_TIMEOUT_MINUTES")? {
            self.worker.job_timeout_minutes = v;
        }
        if let Some(v) = env_bool("MEALHUB_WORKER_ORPHAN_RECOVERY")? {
            self.worker.orphan_recovery = v;
        }
        if let Ok(level) = env::var("MEALHUB_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(v) = env_bool("MEALHUB_LOG_JSON")? {
            self.logging.json = v;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url is empty".into()));
        }
        if self.worker.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "worker.poll_interval_secs must be at least 1".into(),
            ));
        }
        if self.worker.job_timeout_minutes == 0 {
            return Err(ConfigError::Invalid(
                "worker.job_timeout_minutes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn env_u64(var: &str) -> Result<Option<u64>, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                var: var.to_owned(),
                value: raw,
            }),
        Err(_) => Ok(None),
    }
}

fn env_bool(var: &str) -> Result<Option<bool>, ConfigError> {
    match env::var(var) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidEnv {
                var: var.to_owned(),
                value: raw,
            }),
        },
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.database.url, DEFAULT_DATABASE_URL);
        assert_eq!(config.worker.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.worker.job_timeout(), Duration::from_secs(30 * 60));
        assert!(config.worker.orphan_recovery);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mealhub.toml");
        let mut file = std::fs::File::create(&path).expect("create");
        write!(
            file,
            "[database]\nurl = \"postgres://db/mealhub\"\n\n\
             [worker]\npoll_interval_secs = 2\norphan_recovery = false\n\n\
             [logging]\nlevel = \"debug\"\n"
        )
        .expect("write");

        let config = AppConfig::from_file(&path).expect("load");
        assert_eq!(config.database.url, "postgres://db/mealhub");
        assert_eq!(config.worker.poll_interval_secs, 2);
        assert!(!config.worker.orphan_recovery);
        // Unset fields keep their defaults.
        assert_eq!(config.worker.job_timeout_minutes, DEFAULT_JOB_TIMEOUT_MINUTES);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn json_file_is_supported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mealhub.json");
        std::fs::write(
            &path,
            r#"{"worker": {"job_timeout_minutes": 10}, "logging": {"json": true}}"#,
        )
        .expect("write");

        let config = AppConfig::from_file(&path).expect("load");
        assert_eq!(config.worker.job_timeout_minutes, 10);
        assert!(config.logging.json);
        assert_eq!(config.database.url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mealhub.yaml");
        std::fs::write(&path, "database:\n  url: x\n").expect("write");
        let err = AppConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn zero_poll_interval_fails_validation() {
        let mut config = AppConfig::default();
        config.worker.poll_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
