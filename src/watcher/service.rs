//! WatchService: the engine's entry point
//!
//! Holds the collaborators (repository, extractor, notification dispatcher
//! and clock) and exposes item management, single sweeps and the periodic
//! loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use crate::core::time::{SystemTimeProvider, TimeProvider};
use crate::extract::api::Extractor;
use crate::notifications::api::NotificationDispatcher;
use crate::store::api::{ItemId, Repository, TrackedItem};
use crate::watcher::error::WatchResult;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);
pub const DEFAULT_SWEEP_CONCURRENCY: usize = 4;

#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub poll_interval: Duration,
    /// Items processed at once during a sweep; 1 means sequential
    pub sweep_concurrency: usize,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            sweep_concurrency: DEFAULT_SWEEP_CONCURRENCY,
        }
    }
}

pub struct WatchService {
    repository: Arc<dyn Repository>,
    extractor: Arc<dyn Extractor>,
    dispatcher: Arc<NotificationDispatcher>,
    clock: Arc<dyn TimeProvider>,
    settings: WatchSettings,
}

impl WatchService {
    pub fn new(
        repository: Arc<dyn Repository>,
        extractor: Arc<dyn Extractor>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            repository,
            extractor,
            dispatcher,
            clock: Arc::new(SystemTimeProvider),
            settings: WatchSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: WatchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn TimeProvider>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &WatchSettings {
        &self.settings
    }

    pub(crate) fn repository(&self) -> &dyn Repository {
        self.repository.as_ref()
    }

    pub(crate) fn extractor(&self) -> &dyn Extractor {
        self.extractor.as_ref()
    }

    pub(crate) fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    pub(crate) fn clock(&self) -> &dyn TimeProvider {
        self.clock.as_ref()
    }

    /// Active items of `owner_id`, oldest first
    pub async fn list_items(&self, owner_id: &str) -> WatchResult<Vec<TrackedItem>> {
        Ok(self.repository.list_active(owner_id).await?)
    }

    /// Stop watching an item; false when the owner has no such active item
    pub async fn remove_item(&self, owner_id: &str, id: ItemId) -> WatchResult<bool> {
        let removed = self.repository.soft_delete(owner_id, id).await?;
        if removed {
            log::info!("Owner {} stopped tracking item {}", owner_id, id);
        }
        Ok(removed)
    }

    /// Sweep every `poll_interval` until a shutdown message arrives
    ///
    /// The first sweep starts immediately. A sweep in progress when shutdown
    /// is requested is dropped; each item write is a single repository call,
    /// so no item is left half updated.
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        log::info!(
            "Watching active items every {:?} (concurrency {})",
            self.settings.poll_interval,
            self.settings.sweep_concurrency
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        result = self.run_sweep() => {
                            if let Err(e) = result {
                                log::error!("Sweep aborted: {}", e);
                            }
                        }
                        _ = shutdown_rx.recv() => {
                            log::info!("Shutdown requested during sweep");
                            break;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    log::info!("Shutdown requested");
                    break;
                }
            }
        }
    }
}
