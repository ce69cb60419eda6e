//! In-process repository

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::store::error::{StoreError, StoreResult};
use crate::store::traits::Repository;
use crate::store::types::{ItemId, NewItem, TrackedItem};

#[derive(Default)]
struct MemoryState {
    next_id: ItemId,
    items: BTreeMap<ItemId, TrackedItem>,
}

/// Repository kept in memory; contents are lost on drop
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
    max_active_per_owner: usize,
}

impl MemoryRepository {
    pub fn new(max_active_per_owner: usize) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            max_active_per_owner,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn with_item<F>(&self, id: ItemId, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut TrackedItem),
    {
        let mut state = self.lock();
        let item = state
            .items
            .get_mut(&id)
            .ok_or(StoreError::NotFound { id })?;
        f(item);
        Ok(())
    }
}

fn count_for(state: &MemoryState, owner_id: &str) -> usize {
    state
        .items
        .values()
        .filter(|item| item.active && item.owner_id == owner_id)
        .count()
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_item(&self, item: NewItem) -> StoreResult<ItemId> {
        let mut state = self.lock();
        if count_for(&state, &item.owner_id) >= self.max_active_per_owner {
            return Err(StoreError::LimitExceeded {
                owner_id: item.owner_id,
                limit: self.max_active_per_owner,
            });
        }

        state.next_id += 1;
        let id = state.next_id;
        state.items.insert(id, item.into_tracked(id));
        Ok(id)
    }

    async fn list_active(&self, owner_id: &str) -> StoreResult<Vec<TrackedItem>> {
        let mut items: Vec<TrackedItem> = self
            .lock()
            .items
            .values()
            .filter(|item| item.active && item.owner_id == owner_id)
            .cloned()
            .collect();
        // Newest first
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    async fn list_all_active(&self) -> StoreResult<Vec<TrackedItem>> {
        Ok(self
            .lock()
            .items
            .values()
            .filter(|item| item.active)
            .cloned()
            .collect())
    }

    async fn soft_delete(&self, owner_id: &str, id: ItemId) -> StoreResult<bool> {
        let mut state = self.lock();
        match state.items.get_mut(&id) {
            Some(item) if item.active && item.owner_id == owner_id => {
                item.active = false;
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
        self.with_item(id, |item| {
            item.last_content = Some(content.to_string());
            item.last_fingerprint = Some(fingerprint.to_string());
            item.last_checked_at = Some(at);
            item.last_changed_at = Some(at);
        })
    }

    async fn touch_checked_at(&self, id: ItemId, at: DateTime<Utc>) -> StoreResult<()> {
        self.with_item(id, |item| item.last_checked_at = Some(at))
    }

    async fn get(&self, id: ItemId) -> StoreResult<Option<TrackedItem>> {
        Ok(self.lock().items.get(&id).cloned())
    }

    async fn count_active(&self, owner_id: &str) -> StoreResult<usize> {
        Ok(count_for(&self.lock(), owner_id))
    }

    fn max_active_per_owner(&self) -> usize {
        self.max_active_per_owner
    }
}
