//! Fakes shared by the watcher tests

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::core::retry::RetryPolicy;
use crate::core::time::ManualTimeProvider;
use crate::extract::api::{ExtractError, ExtractResult, Extractor};
use crate::notifications::api::{
    ChangeNotification, NotificationDispatcher, NotificationError, NotificationResult, Notifier,
};
use crate::store::api::{ItemId, MemoryRepository, NewItem, Repository, StoreError, StoreResult, TrackedItem};
use crate::watcher::api::{WatchService, WatchSettings};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

/// Scripted response for one URL
#[derive(Debug, Clone)]
pub enum Page {
    Content(&'static str),
    NoMatch,
    Timeout,
    HttpError(u16),
    Panic,
}

#[derive(Default)]
pub struct ScriptedExtractor {
    pages: Mutex<HashMap<String, Page>>,
    calls: AtomicUsize,
}

impl ScriptedExtractor {
    pub fn set(&self, url: &str, page: Page) {
        lock(&self.pages).insert(url.to_string(), page);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(&self, url: &str, selector: &str) -> ExtractResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let page = lock(&self.pages).get(url).cloned();
        match page {
            Some(Page::Content(text)) => Ok(text.to_string()),
            Some(Page::NoMatch) => Err(ExtractError::NoMatch {
                selector: selector.to_string(),
            }),
            Some(Page::Timeout) => Err(ExtractError::Timeout {
                url: url.to_string(),
                timeout_ms: 5000,
            }),
            Some(Page::HttpError(status)) => Err(ExtractError::Fetch {
                url: url.to_string(),
                status: Some(status),
                message: "scripted".to_string(),
            }),
            Some(Page::Panic) => panic!("extractor exploded on {}", url),
            None => Err(ExtractError::Fetch {
                url: url.to_string(),
                status: None,
                message: "no such host".to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, ChangeNotification)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(String, ChangeNotification)> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn notify(&self, owner_id: &str, change: &ChangeNotification) -> NotificationResult<()> {
        if self.fail {
            return Err(NotificationError::Transport {
                transport: "recording".to_string(),
                message: "subscriber unreachable".to_string(),
            });
        }
        lock(&self.sent).push((owner_id.to_string(), change.clone()));
        Ok(())
    }
}

/// Memory repository whose `update` fails for one item
pub struct FlakyRepository {
    inner: MemoryRepository,
    fail_updates_for: Mutex<Option<ItemId>>,
}

impl FlakyRepository {
    pub fn new(cap: usize) -> Self {
        Self {
            inner: MemoryRepository::new(cap),
            fail_updates_for: Mutex::new(None),
        }
    }

    pub fn fail_updates_for(&self, id: ItemId) {
        *lock(&self.fail_updates_for) = Some(id);
    }
}

#[async_trait]
impl Repository for FlakyRepository {
    async fn create_item(&self, item: NewItem) -> StoreResult<ItemId> {
        self.inner.create_item(item).await
    }

    async fn list_active(&self, owner_id: &str) -> StoreResult<Vec<TrackedItem>> {
        self.inner.list_active(owner_id).await
    }

    async fn list_all_active(&self) -> StoreResult<Vec<TrackedItem>> {
        self.inner.list_all_active().await
    }

    async fn soft_delete(&self, owner_id: &str, id: ItemId) -> StoreResult<bool> {
        self.inner.soft_delete(owner_id, id).await
    }

    async fn update(
        &self,
        id: ItemId,
        content: &str,
        fingerprint: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        if *lock(&self.fail_updates_for) == Some(id) {
            return Err(StoreError::Backend {
                message: "disk full".to_string(),
            });
        }
        self.inner.update(id, content, fingerprint, at).await
    }

    async fn touch_checked_at(&self, id: ItemId, at: DateTime<Utc>) -> StoreResult<()> {
        self.inner.touch_checked_at(id, at).await
    }

    async fn get(&self, id: ItemId) -> StoreResult<Option<TrackedItem>> {
        self.inner.get(id).await
    }

    async fn count_active(&self, owner_id: &str) -> StoreResult<usize> {
        self.inner.count_active(owner_id).await
    }

    fn max_active_per_owner(&self) -> usize {
        self.inner.max_active_per_owner()
    }
}

/// Repository holding rows exactly as inserted, including rows that were
/// never given a baseline
#[derive(Default)]
pub struct RowRepository {
    rows: Mutex<BTreeMap<ItemId, TrackedItem>>,
}

impl RowRepository {
    pub fn insert(&self, row: TrackedItem) {
        lock(&self.rows).insert(row.id, row);
    }

    fn with_row<F>(&self, id: ItemId, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut TrackedItem),
    {
        let mut rows = lock(&self.rows);
        let row = rows.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        f(row);
        Ok(())
    }
}

#[async_trait]
impl Repository for RowRepository {
    async fn create_item(&self, item: NewItem) -> StoreResult<ItemId> {
        let mut rows = lock(&self.rows);
        let id = rows.keys().next_back().copied().unwrap_or(0) + 1;
        rows.insert(id, item.into_tracked(id));
        Ok(id)
    }

    async fn list_active(&self, owner_id: &str) -> StoreResult<Vec<TrackedItem>> {
        Ok(lock(&self.rows)
            .values()
            .filter(|row| row.active && row.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_all_active(&self) -> StoreResult<Vec<TrackedItem>> {
        Ok(lock(&self.rows).values().filter(|row| row.active).cloned().collect())
    }

    async fn soft_delete(&self, owner_id: &str, id: ItemId) -> StoreResult<bool> {
        match lock(&self.rows).get_mut(&id) {
            Some(row) if row.active && row.owner_id == owner_id => {
                row.active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update(
        &self,
        id: ItemId,
        content: &str,
        fingerprint: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.with_row(id, |row| {
            row.last_content = Some(content.to_string());
            row.last_fingerprint = Some(fingerprint.to_string());
            row.last_checked_at = Some(at);
            row.last_changed_at = Some(at);
        })
    }

    async fn touch_checked_at(&self, id: ItemId, at: DateTime<Utc>) -> StoreResult<()> {
        self.with_row(id, |row| row.last_checked_at = Some(at))
    }

    async fn get(&self, id: ItemId) -> StoreResult<Option<TrackedItem>> {
        Ok(lock(&self.rows).get(&id).cloned())
    }

    async fn count_active(&self, owner_id: &str) -> StoreResult<usize> {
        Ok(lock(&self.rows)
            .values()
            .filter(|row| row.active && row.owner_id == owner_id)
            .count())
    }

    fn max_active_per_owner(&self) -> usize {
        usize::MAX
    }
}

pub struct Harness<R> {
    pub service: Arc<WatchService>,
    pub repository: Arc<R>,
    pub extractor: Arc<ScriptedExtractor>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: ManualTimeProvider,
}

pub fn harness_with<R: Repository + 'static>(
    repository: R,
    notifier: RecordingNotifier,
    concurrency: usize,
) -> Harness<R> {
    let repository = Arc::new(repository);
    let extractor = Arc::new(ScriptedExtractor::default());
    let notifier = Arc::new(notifier);
    let clock = ManualTimeProvider::new(start_time());

    let dispatcher = NotificationDispatcher::new(
        notifier.clone(),
        RetryPolicy::new(2, Duration::from_millis(1)),
    )
    .with_clock(Arc::new(clock.clone()));

    let service = WatchService::new(repository.clone(), extractor.clone(), Arc::new(dispatcher))
        .with_clock(Arc::new(clock.clone()))
        .with_settings(WatchSettings {
            poll_interval: Duration::from_millis(50),
            sweep_concurrency: concurrency,
        });

    Harness {
        service: Arc::new(service),
        repository,
        extractor,
        notifier,
        clock,
    }
}

pub fn harness(cap: usize) -> Harness<MemoryRepository> {
    harness_with(MemoryRepository::new(cap), RecordingNotifier::default(), 4)
}
