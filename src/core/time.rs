//! Time provider abstraction for testable timestamps
//!
//! The engine never calls `Utc::now()` directly; it asks a `TimeProvider`
//! so sweeps can be replayed with controlled clocks.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

/// Source of wall-clock timestamps
pub trait TimeProvider: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production time provider using the system clock
#[derive(Default, Clone)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for deterministic tests
#[derive(Clone)]
pub struct ManualTimeProvider {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualTimeProvider {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut current = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *current += by;
    }
}

impl TimeProvider for ManualTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        match self.current.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_system_time_provider_moves_forward() {
        let provider = SystemTimeProvider;

        let first = provider.now();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = provider.now();

        assert!(second > first);
    }

    #[test]
    fn test_manual_time_provider_advance() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let provider = ManualTimeProvider::new(start);

        assert_eq!(provider.now(), start);
        provider.advance(Duration::minutes(5));
        assert_eq!(provider.now(), start + Duration::minutes(5));
    }

    #[test]
    fn test_manual_time_provider_clones_share_state() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let provider = ManualTimeProvider::new(start);
        let shared = provider.clone();

        shared.advance(Duration::hours(2));

        assert_eq!(provider.now(), start + Duration::hours(2));
    }
}
