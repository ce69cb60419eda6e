//! Store API

pub use crate::store::error::{StoreError, StoreResult};
pub use crate::store::memory::MemoryRepository;
pub use crate::store::sqlite::SqliteRepository;
pub use crate::store::traits::Repository;
pub use crate::store::types::{Baseline, ItemId, NewItem, TrackedItem, DEFAULT_LABEL};
