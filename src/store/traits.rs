//! Repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::store::error::StoreResult;
use crate::store::types::{ItemId, NewItem, TrackedItem};

/// Persistent state of tracked items
///
/// Every mutation is a single call so a cancelled sweep never leaves an item
/// half written.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Insert an item with its baseline
    ///
    /// Fails with `LimitExceeded` when the owner is at the cap; the check and
    /// the insert are atomic.
    async fn create_item(&self, item: NewItem) -> StoreResult<ItemId>;

    /// Active items of one owner, oldest first
    async fn list_active(&self, owner_id: &str) -> StoreResult<Vec<TrackedItem>>;

    /// Active items of every owner
    async fn list_all_active(&self) -> StoreResult<Vec<TrackedItem>>;

    /// Deactivate an item; true iff a matching active item existed
    async fn soft_delete(&self, owner_id: &str, id: ItemId) -> StoreResult<bool>;

    /// Store new content, moving both checked-at and changed-at to `at`
    async fn update(
        &self,
        id: ItemId,
        content: &str,
        fingerprint: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()>;

    async fn touch_checked_at(&self, id: ItemId, at: DateTime<Utc>) -> StoreResult<()>;

    /// Look up an item regardless of its active flag
    async fn get(&self, id: ItemId) -> StoreResult<Option<TrackedItem>>;

    async fn count_active(&self, owner_id: &str) -> StoreResult<usize>;

    /// Cap on active items per owner
    fn max_active_per_owner(&self) -> usize;
}
