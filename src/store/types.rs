//! Tracked item records

use chrono::{DateTime, Utc};

pub type ItemId = i64;

/// Label shown for items created without one
pub const DEFAULT_LABEL: &str = "Tracked Website";

/// One owner's watch on one (URL, selector) pair
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedItem {
    pub id: ItemId,
    pub owner_id: String,
    pub url: String,
    pub selector: String,
    pub label: Option<String>,
    pub last_content: Option<String>,
    pub last_fingerprint: Option<String>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

impl TrackedItem {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(DEFAULT_LABEL)
    }
}

/// Content observed when an item is created
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    pub content: String,
    pub fingerprint: String,
    pub observed_at: DateTime<Utc>,
}

/// Insert request; the baseline is written together with the row
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub owner_id: String,
    pub url: String,
    pub selector: String,
    pub label: Option<String>,
    pub baseline: Baseline,
}

impl NewItem {
    /// The stored record for this request under `id`
    pub(crate) fn into_tracked(self, id: ItemId) -> TrackedItem {
        TrackedItem {
            id,
            owner_id: self.owner_id,
            url: self.url,
            selector: self.selector,
            label: self.label,
            last_content: Some(self.baseline.content),
            last_fingerprint: Some(self.baseline.fingerprint),
            last_checked_at: Some(self.baseline.observed_at),
            last_changed_at: Some(self.baseline.observed_at),
            created_at: self.baseline.observed_at,
            active: true,
        }
    }
}
