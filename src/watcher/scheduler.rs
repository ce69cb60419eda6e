//! Sweeps over every active item
//!
//! Each item is processed in isolation: extraction failures, repository
//! errors and panics are confined to the item, which then only has its
//! checked-at timestamp advanced.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;

use futures::{stream, FutureExt, StreamExt};

use crate::detect::{detect, fingerprint, Detection, StateUpdate};
use crate::extract::api::ExtractError;
use crate::notifications::api::ChangeNotification;
use crate::store::api::{ItemId, TrackedItem};
use crate::watcher::error::WatchResult;
use crate::watcher::service::WatchService;

/// What happened to one item during a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// First content stored for an item that had none
    Baseline,
    Unchanged,
    Changed,
    /// Selector matched nothing, or could not be evaluated
    NoMatch,
    FetchFailed,
    TimedOut,
    /// Repository failure or panic while processing
    Failed,
}

/// Totals for one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub processed: usize,
    pub baseline: usize,
    pub unchanged: usize,
    pub changed: usize,
    pub no_match: usize,
    pub fetch_failures: usize,
    pub timeouts: usize,
    pub failed: usize,
}

impl SweepReport {
    pub fn record(&mut self, outcome: ItemOutcome) {
        self.processed += 1;
        let counter = match outcome {
            ItemOutcome::Baseline => &mut self.baseline,
            ItemOutcome::Unchanged => &mut self.unchanged,
            ItemOutcome::Changed => &mut self.changed,
            ItemOutcome::NoMatch => &mut self.no_match,
            ItemOutcome::FetchFailed => &mut self.fetch_failures,
            ItemOutcome::TimedOut => &mut self.timeouts,
            ItemOutcome::Failed => &mut self.failed,
        };
        *counter += 1;
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed: {} changed, {} unchanged, {} baseline, {} no match, {} fetch failures, {} timeouts, {} failed",
            self.processed,
            self.changed,
            self.unchanged,
            self.baseline,
            self.no_match,
            self.fetch_failures,
            self.timeouts,
            self.failed
        )
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl WatchService {
    /// Process every item active at the start of the sweep
    ///
    /// Only a failure to load the item list is returned as an error.
    pub async fn run_sweep(&self) -> WatchResult<SweepReport> {
        let items = self.repository().list_all_active().await?;
        log::debug!("Sweep started with {} active item(s)", items.len());

        let outcomes: Vec<ItemOutcome> = stream::iter(items)
            .map(|item| self.process_isolated(item))
            .buffer_unordered(self.settings().sweep_concurrency.max(1))
            .collect()
            .await;

        let mut report = SweepReport::default();
        for outcome in outcomes {
            report.record(outcome);
        }
        log::info!("Sweep finished: {}", report);
        Ok(report)
    }

    async fn process_isolated(&self, item: TrackedItem) -> ItemOutcome {
        let id = item.id;
        match AssertUnwindSafe(self.process_item(&item)).catch_unwind().await {
            Ok(Ok(outcome)) => {
                log::debug!("[item {}] {:?}", id, outcome);
                outcome
            }
            Ok(Err(e)) => {
                log::error!("[item {}] processing failed: {}", id, e);
                self.touch_after_failure(id).await;
                ItemOutcome::Failed
            }
            Err(payload) => {
                log::error!("[item {}] processing panicked: {}", id, panic_message(&*payload));
                self.touch_after_failure(id).await;
                ItemOutcome::Failed
            }
        }
    }

    async fn touch_after_failure(&self, id: ItemId) {
        if let Err(e) = self
            .repository()
            .touch_checked_at(id, self.clock().now())
            .await
        {
            log::warn!("[item {}] could not advance checked-at: {}", id, e);
        }
    }

    async fn process_item(&self, item: &TrackedItem) -> WatchResult<ItemOutcome> {
        let repository = self.repository();

        let content = match self.extractor().extract(&item.url, &item.selector).await {
            Ok(content) => content,
            Err(e) => {
                let outcome = fold_extract_error(item.id, &e);
                repository
                    .touch_checked_at(item.id, self.clock().now())
                    .await?;
                return Ok(outcome);
            }
        };

        let fingerprint = fingerprint(&content);
        let detection = detect(
            item.last_fingerprint.as_deref(),
            item.last_content.as_deref(),
            &content,
            &fingerprint,
        );
        let now = self.clock().now();

        match detection.state_update() {
            StateUpdate::TouchCheckedAt => repository.touch_checked_at(item.id, now).await?,
            StateUpdate::Replace => repository.update(item.id, &content, &fingerprint, now).await?,
        }

        Ok(match detection {
            Detection::FirstObservation => ItemOutcome::Baseline,
            Detection::Unchanged => ItemOutcome::Unchanged,
            Detection::Changed { previous, current } => {
                log::info!("[item {}] content changed at {}", item.id, item.url);
                let change = ChangeNotification::for_item(item, previous, current, now);
                self.dispatcher().dispatch(&item.owner_id, &change).await;
                ItemOutcome::Changed
            }
        })
    }
}

/// Collapse an extraction failure into a sweep outcome, logging its cause
fn fold_extract_error(id: ItemId, error: &ExtractError) -> ItemOutcome {
    let tag = error.cause_tag();
    match error {
        ExtractError::Timeout { .. } => {
            log::warn!("[item {}] [{}] {}", id, tag, error);
            ItemOutcome::TimedOut
        }
        ExtractError::NoMatch { .. } | ExtractError::InvalidSelector { .. } => {
            log::debug!("[item {}] [{}] {}", id, tag, error);
            ItemOutcome::NoMatch
        }
        _ => {
            log::warn!("[item {}] [{}] {}", id, tag, error);
            ItemOutcome::FetchFailed
        }
    }
}
