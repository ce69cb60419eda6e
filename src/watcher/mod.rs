//! Watcher Component
//!
//! Ties extraction, change detection, persistence and notification together:
//!
//! - **Registration**: validates a new watch, test-extracts it and stores the
//!   baseline in one write
//! - **Sweeps**: processes every active item with bounded concurrency and
//!   per-item failure isolation
//! - **Service loop**: runs sweeps on a fixed cadence until shutdown

pub(crate) mod error;
pub(crate) mod registration;
pub(crate) mod scheduler;
pub(crate) mod service;

pub mod api;

#[cfg(test)]
mod tests;
