//! Command-line arguments
//!
//! Global flags override the matching configuration file values; the
//! subcommand selects what the process does.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::validation::validate_item_id;

use super::config::LogFormat;

#[derive(Parser, Debug, Clone)]
#[command(name = "pagewatch")]
#[command(about = "Watch web pages and get notified when XPath-selected content changes")]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Force coloured output
    #[arg(short = 'g', long = "color", action = ArgAction::SetTrue, conflicts_with = "no_color", global = true)]
    pub color: bool,

    /// Disable coloured output
    #[arg(long = "no-color", action = ArgAction::SetTrue, global = true)]
    pub no_color: bool,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"], global = true)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = parse_log_format, global = true)]
    pub log_format: Option<LogFormat>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Database file, or ':memory:' for a throwaway store
    #[arg(short = 'd', long = "database", value_name = "PATH", global = true)]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start tracking the content an XPath selector picks out of a page
    Add {
        /// Owner the item belongs to
        #[arg(long = "owner", value_name = "ID")]
        owner: String,
        /// Page to watch
        url: String,
        /// XPath selector
        selector: String,
        /// Optional label; remaining words are joined with spaces
        #[arg(num_args = 0..)]
        label: Vec<String>,
    },
    /// List an owner's tracked items
    List {
        #[arg(long = "owner", value_name = "ID")]
        owner: String,
    },
    /// Show last check times and current content of an owner's items
    Status {
        #[arg(long = "owner", value_name = "ID")]
        owner: String,
    },
    /// Stop tracking an item
    Remove {
        #[arg(long = "owner", value_name = "ID")]
        owner: String,
        /// Item id as shown by `list`
        #[arg(value_name = "ITEM_ID", value_parser = validate_item_id)]
        id: i64,
    },
    /// Check every active item once
    Sweep,
    /// Check every active item periodically until interrupted
    Run,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Add { .. } => "add",
            Command::List { .. } => "list",
            Command::Status { .. } => "status",
            Command::Remove { .. } => "remove",
            Command::Sweep => "sweep",
            Command::Run => "run",
        }
    }
}

impl Args {
    /// Colour decision: explicit flags win, otherwise only on a terminal
    pub fn use_color(&self) -> bool {
        use std::io::IsTerminal;

        if self.no_color {
            false
        } else {
            self.color || std::io::stdout().is_terminal()
        }
    }
}

/// Label words joined back into one optional label
pub fn join_label(words: &[String]) -> Option<String> {
    let label = words.join(" ");
    let label = label.trim();
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    LogFormat::from_str(value)
        .map_err(|_| format!("'{}' is not a log format (text, ext, json)", value))
}
