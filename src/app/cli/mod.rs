//! CLI module containing argument parsing, configuration and output

pub mod api;
pub(crate) mod args;
pub(crate) mod config;
pub(crate) mod display;
