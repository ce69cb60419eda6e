//! Traits for the notification system

use crate::notifications::error::NotificationResult;
use crate::notifications::event::ChangeNotification;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Delivers change messages to an owner
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short transport name used in logs
    fn name(&self) -> &str;

    async fn notify(&self, owner_id: &str, change: &ChangeNotification) -> NotificationResult<()>;
}

/// Delivery counters kept by the dispatcher
pub struct DeliveryStatistics {
    delivered: AtomicUsize,
    failed: AtomicUsize,
    attempts: AtomicUsize,
    last_failure: RwLock<Option<DateTime<Utc>>>,
}

impl Default for DeliveryStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliveryStatistics {
    pub fn new() -> Self {
        Self {
            delivered: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            attempts: AtomicUsize::new(0),
            last_failure: RwLock::new(None),
        }
    }

    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    /// Total transport calls, retries included
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn last_failure(&self) -> Option<DateTime<Utc>> {
        match self.last_failure.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub(crate) fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self, at: DateTime<Utc>) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        let mut last = match self.last_failure.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *last = Some(at);
    }
}
