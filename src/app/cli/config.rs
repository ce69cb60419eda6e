//! TOML configuration file parsing and loading
//!
//! The file is optional. When `--config-file` is not given the default
//! location under the user's config directory is tried; a missing default is
//! not an error, a missing explicit file is.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::extract::api::{DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT};
use crate::watcher::api::{DEFAULT_POLL_INTERVAL, DEFAULT_SWEEP_CONCURRENCY};

use super::args::Args;

/// Literal database value selecting the in-memory repository
pub const MEMORY_DATABASE: &str = ":memory:";

const APP_DIR_TITLE: &str = "Pagewatch";
const APP_DIR: &str = "pagewatch";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("The specified configuration file does not exist: {}", .path.display())]
    Missing { path: PathBuf },

    #[error("Error reading configuration file {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing configuration file {}: {}", .path.display(), .message)]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration value for '{field}': {message}")]
    Invalid { field: &'static str, message: String },
}

impl crate::core::error_handling::ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        !matches!(self, ConfigError::Read { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::Missing { .. } => Some("Configuration file not found"),
            ConfigError::Parse { message, .. } => Some(message),
            ConfigError::Invalid { message, .. } => Some(message),
            ConfigError::Read { .. } => None,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Where change messages go
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotifyBackend {
    #[default]
    Log,
    Telegram,
}

/// Log line layout
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Ext,
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    pub request_timeout_ms: u64,
    pub max_items_per_owner: usize,
    pub poll_interval_secs: u64,
    pub sweep_concurrency: usize,
    pub user_agent: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
            max_items_per_owner: 5,
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            sweep_concurrency: DEFAULT_SWEEP_CONCURRENCY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// SQLite file path, or `:memory:`
    pub database: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    pub backend: NotifyBackend,
    pub telegram_token: Option<String>,
    pub retry_attempts: usize,
    pub retry_delay_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            backend: NotifyBackend::Log,
            telegram_token: None,
            retry_attempts: 3,
            retry_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
    pub file: Option<PathBuf>,
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub watch: WatchConfig,
    pub storage: StorageConfig,
    pub notify: NotifyConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse and validate configuration text
    pub fn from_toml(text: &str, path: &Path) -> ConfigResult<Self> {
        let config: Config = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the explicit file, else the default file if present, else defaults
    pub async fn load(config_file: Option<&Path>) -> ConfigResult<Self> {
        let path = match config_file {
            Some(path) if !path.exists() => {
                return Err(ConfigError::Missing {
                    path: path.to_path_buf(),
                })
            }
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Config::default()),
            },
        };

        log::debug!("Loading configuration from {}", path.display());
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
        Self::from_toml(&text, &path)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let positive = [
            ("watch.request_timeout_ms", self.watch.request_timeout_ms as usize),
            ("watch.max_items_per_owner", self.watch.max_items_per_owner),
            ("watch.poll_interval_secs", self.watch.poll_interval_secs as usize),
            ("watch.sweep_concurrency", self.watch.sweep_concurrency),
            ("notify.retry_attempts", self.notify.retry_attempts),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("{} must be greater than 0", field),
                });
            }
        }

        if self.watch.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "watch.user_agent",
                message: "watch.user_agent must not be empty".to_string(),
            });
        }

        if self.notify.backend == NotifyBackend::Telegram && self.telegram_token().is_none() {
            return Err(ConfigError::Invalid {
                field: "notify.telegram_token",
                message: "notify.telegram_token is required for the telegram backend".to_string(),
            });
        }

        if let Some(level) = &self.logging.level {
            if !matches!(
                level.as_str(),
                "trace" | "debug" | "info" | "warn" | "error" | "off"
            ) {
                return Err(ConfigError::Invalid {
                    field: "logging.level",
                    message: format!("'{}' is not a valid log level", level),
                });
            }
        }

        Ok(())
    }

    /// Overlay command-line flags, which take precedence over the file
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(database) = &args.database {
            self.storage.database = Some(database.clone());
        }
        if let Some(level) = &args.log_level {
            self.logging.level = Some(level.clone());
        }
        if let Some(format) = args.log_format {
            self.logging.format = Some(format);
        }
        if let Some(file) = &args.log_file {
            // "none" and "-" switch file logging off
            if file.as_os_str().eq_ignore_ascii_case("none") || file.as_os_str() == "-" {
                self.logging.file = None;
            } else {
                self.logging.file = Some(file.clone());
            }
        }
    }

    pub fn telegram_token(&self) -> Option<&str> {
        self.notify
            .telegram_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.watch.request_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.watch.poll_interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.notify.retry_delay_ms)
    }

    /// The configured database, falling back to the per-user data directory
    ///
    /// `None` selects the in-memory repository.
    pub fn database_path(&self) -> Option<PathBuf> {
        match self.storage.database.as_deref() {
            Some(MEMORY_DATABASE) => None,
            Some(path) => Some(PathBuf::from(path)),
            None => Some(default_database_path()),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_TITLE).join("pagewatch.toml"))
}

pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("pagewatch.db")
}
