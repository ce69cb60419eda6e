//! Watcher API
//!
//! Public surface of the polling engine.

// Service and configuration
pub use crate::watcher::service::{
    WatchService, WatchSettings, DEFAULT_POLL_INTERVAL, DEFAULT_SWEEP_CONCURRENCY,
};

// Item creation
pub use crate::watcher::registration::CreateRequest;

// Sweep results
pub use crate::watcher::scheduler::{ItemOutcome, SweepReport};

// Error handling
pub use crate::watcher::error::{WatchError, WatchResult};
