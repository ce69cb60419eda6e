//! Application module: command line, configuration and wiring

pub mod cli;
pub mod startup;
