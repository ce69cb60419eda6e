//! Tracked Item Store
//!
//! The [`Repository`](api::Repository) trait is the only way the engine
//! touches persistent state. Two implementations ship with the crate: an
//! in-memory map for tests and ephemeral runs, and a SQLite database.

pub(crate) mod error;
pub(crate) mod memory;
pub(crate) mod sqlite;
pub(crate) mod traits;
pub(crate) mod types;

pub mod api;

#[cfg(test)]
mod tests;
