//! Runtime configuration loaded from environment variables.
//!
//! | Variable              | Default                          |
//! |-----------------------|----------------------------------|
//! | `PORTFOLIO_DB_PATH`   | `portfolio.sqlite3`              |
//! | `PORTFOLIO_LOG_LEVEL` | `debug` (debug) / `info` (release) |
//! | `PORTFOLIO_LOG_DIR`   | `<temp dir>/portfolio-logs`      |

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "PORTFOLIO_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "PORTFOLIO_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "PORTFOLIO_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "portfolio.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "portfolio-logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key} value `{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioConfig {
    pub db_path: PathBuf,
    /// Normalized level name.
    pub log_level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
}

impl PortfolioConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults for
    /// missing or blank keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(DB_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE_NAME));

        let log_level = match read(LOG_LEVEL_VAR) {
            Some(value) => normalize_level(&value)
                .map_err(|err| ConfigError::InvalidValue {
                    key: LOG_LEVEL_VAR,
                    value: value.clone(),
                    reason: err.to_string(),
                })?
                .to_string(),
            None => default_log_level().to_string(),
        };

        let log_dir = match read(LOG_DIR_VAR) {
            Some(value) => {
                let path = PathBuf::from(&value);
                if !path.is_absolute() {
                    return Err(ConfigError::InvalidValue {
                        key: LOG_DIR_VAR,
                        value,
                        reason: "must be an absolute path".to_string(),
                    });
                }
                path
            }
            None => std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME),
        };

        Ok(Self {
            db_path,
            log_level,
            log_dir,
        })
    }
}
