//! Store Error Types

use std::fmt;

use crate::store::types::ItemId;

#[derive(Debug, Clone)]
pub enum StoreError {
    /// The owner already has the maximum number of active items
    LimitExceeded { owner_id: String, limit: usize },
    /// No item with this id exists
    NotFound { id: ItemId },
    /// The storage backend failed
    Backend { message: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::LimitExceeded { owner_id, limit } => {
                write!(f, "Owner {} already tracks {} items", owner_id, limit)
            }
            StoreError::NotFound { id } => write!(f, "Tracked item {} not found", id),
            StoreError::Backend { message } => write!(f, "Storage error: {}", message),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend {
            message: err.to_string(),
        }
    }
}

impl crate::core::error_handling::ContextualError for StoreError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, StoreError::LimitExceeded { .. })
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
