//! Core runtime configuration.
//!
//! Values come from defaults overridden by `MOLSTORE_*` environment
//! variables. Unset or empty variables keep the default.

use crate::logging::default_log_level;
use crate::model::structure::{PageRequest, DEFAULT_PAGE_SIZE};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "MOLSTORE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "MOLSTORE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "MOLSTORE_LOG_DIR";
pub const ENV_PAGE_SIZE: &str = "MOLSTORE_PAGE_SIZE";

const DEFAULT_DB_PATH: &str = "molstore.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                key,
                value,
                message,
            } => write!(f, "invalid value `{value}` for {key}: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Settings shared by the core and its front ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging is disabled when unset.
    pub log_dir: Option<PathBuf>,
    pub page_size: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: default_log_level().to_string(),
            log_dir: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CoreConfig {
    /// Builds configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            let dir = PathBuf::from(dir);
            if !dir.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    key: ENV_LOG_DIR,
                    value: dir.display().to_string(),
                    message: "must be an absolute path".to_string(),
                });
            }
            config.log_dir = Some(dir);
        }
        if let Some(size) = read(ENV_PAGE_SIZE) {
            config.page_size = match size.parse::<u32>() {
                Ok(parsed) if parsed > 0 => parsed,
                Ok(_) => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_PAGE_SIZE,
                        value: size,
                        message: "must be greater than zero".to_string(),
                    });
                }
                Err(err) => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_PAGE_SIZE,
                        value: size,
                        message: err.to_string(),
                    });
                }
            };
        }

        Ok(config)
    }

    /// Page request for `page` using the configured page size.
    pub fn page(&self, page: u32) -> PageRequest {
        PageRequest::new(page, self.page_size)
    }
}
