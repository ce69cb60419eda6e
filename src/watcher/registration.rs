//! Creating tracked items
//!
//! Creation only succeeds when the selector yields content right now; that
//! content is written as the baseline in the same insert.

use crate::core::validation::validate_url;
use crate::detect::fingerprint;
use crate::store::api::{Baseline, NewItem, StoreError, TrackedItem};
use crate::watcher::error::{WatchError, WatchResult};
use crate::watcher::service::WatchService;

/// A request to start watching a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub owner_id: String,
    pub url: String,
    pub selector: String,
    pub label: Option<String>,
}

impl CreateRequest {
    pub fn new(owner_id: &str, url: &str, selector: &str, label: Option<&str>) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            url: url.to_string(),
            selector: selector.to_string(),
            label: label
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        }
    }
}

impl WatchService {
    /// Validate, test-extract and store a new tracked item
    ///
    /// The cap is checked before any network traffic and again atomically by
    /// the repository at insert time.
    pub async fn create_item(&self, request: CreateRequest) -> WatchResult<TrackedItem> {
        let repository = self.repository();
        let limit = repository.max_active_per_owner();
        if repository.count_active(&request.owner_id).await? >= limit {
            return Err(WatchError::LimitExceeded {
                owner_id: request.owner_id,
                limit,
            });
        }

        let url = validate_url(&request.url).map_err(WatchError::InvalidUrl)?;
        let content = self
            .extractor()
            .extract(url.as_str(), &request.selector)
            .await
            .map_err(|e| WatchError::from_extract(url.as_str(), e))?;

        let fingerprint = fingerprint(&content);
        let id = repository
            .create_item(NewItem {
                owner_id: request.owner_id.clone(),
                url: url.to_string(),
                selector: request.selector,
                label: request.label,
                baseline: Baseline {
                    content,
                    fingerprint,
                    observed_at: self.clock().now(),
                },
            })
            .await?;
        log::info!("Owner {} now tracks item {} ({})", request.owner_id, id, url);

        repository
            .get(id)
            .await?
            .ok_or(WatchError::Repository(StoreError::NotFound { id }))
    }
}
