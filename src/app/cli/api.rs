//! Public API exports for the CLI module

pub use crate::app::cli::args::{join_label, Args, Command};
pub use crate::app::cli::config::{
    default_config_path, default_database_path, Config, ConfigError, ConfigResult, LogFormat,
    LoggingConfig, NotifyBackend, NotifyConfig, StorageConfig, WatchConfig, MEMORY_DATABASE,
};
pub use crate::app::cli::display::{
    creation_failure_message, format_created, format_list, format_removed, format_status,
    format_sweep,
};
