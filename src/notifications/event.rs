//! Change notification payload

use chrono::{DateTime, Utc};

use crate::store::api::{ItemId, TrackedItem, DEFAULT_LABEL};

pub const NO_PREVIOUS_CONTENT: &str = "No previous content";

/// A detected content change, addressed to the item's owner
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeNotification {
    pub item_id: ItemId,
    pub label: Option<String>,
    pub url: String,
    pub selector: String,
    pub previous_content: Option<String>,
    pub new_content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChangeNotification {
    pub fn for_item(
        item: &TrackedItem,
        previous_content: Option<String>,
        new_content: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            item_id: item.id,
            label: item.label.clone(),
            url: item.url.clone(),
            selector: item.selector.clone(),
            previous_content,
            new_content,
            timestamp,
        }
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(DEFAULT_LABEL)
    }

    /// Previous content, or a placeholder when nothing was stored
    pub fn display_previous(&self) -> &str {
        match self.previous_content.as_deref() {
            Some(previous) if !previous.is_empty() => previous,
            _ => NO_PREVIOUS_CONTENT,
        }
    }
}
