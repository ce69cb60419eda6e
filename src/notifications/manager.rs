//! NotificationDispatcher implementation

use std::sync::Arc;

use crate::core::retry::{retry_async, RetryPolicy};
use crate::core::time::{SystemTimeProvider, TimeProvider};
use crate::notifications::event::ChangeNotification;
use crate::notifications::traits::{DeliveryStatistics, Notifier};

/// Delivers change notifications with retries
///
/// Failures that survive every attempt are logged and counted, never
/// returned; a sweep must not fail because a subscriber is unreachable.
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    policy: RetryPolicy,
    statistics: DeliveryStatistics,
    clock: Arc<dyn TimeProvider>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, policy: RetryPolicy) -> Self {
        Self {
            notifier,
            policy,
            statistics: DeliveryStatistics::new(),
            clock: Arc::new(SystemTimeProvider),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn TimeProvider>) -> Self {
        self.clock = clock;
        self
    }

    pub fn statistics(&self) -> &DeliveryStatistics {
        &self.statistics
    }

    pub fn notifier_name(&self) -> &str {
        self.notifier.name()
    }

    /// Deliver one change; returns whether it got through
    pub async fn dispatch(&self, owner_id: &str, change: &ChangeNotification) -> bool {
        let operation = format!("notify item {} via {}", change.item_id, self.notifier.name());
        let result = retry_async(&operation, self.policy.clone(), || {
            self.statistics.record_attempt();
            self.notifier.notify(owner_id, change)
        })
        .await;

        match result {
            Ok(()) => {
                self.statistics.record_delivered();
                log::debug!(
                    "Delivered change for item {} to owner {}",
                    change.item_id,
                    owner_id
                );
                true
            }
            Err(e) => {
                self.statistics.record_failed(self.clock.now());
                log::warn!(
                    "Giving up on change notification for item {} to owner {} after {} attempt(s): {}",
                    change.item_id,
                    owner_id,
                    self.policy.max_attempts,
                    e
                );
                false
            }
        }
    }
}
