//! Watcher Error Types

use crate::core::validation::ValidationError;
use crate::extract::api::ExtractError;
use crate::store::api::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("{0}")]
    InvalidUrl(ValidationError),

    #[error("Owner {owner_id} already tracks the maximum of {limit} items")]
    LimitExceeded { owner_id: String, limit: usize },

    #[error("Timed out fetching {url} after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Selector '{selector}' matched nothing on {url}")]
    NoMatch { url: String, selector: String },

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Fetching {url} failed: {message}")]
    FetchFailed { url: String, message: String },

    #[error("Repository failure: {0}")]
    Repository(StoreError),
}

impl WatchError {
    /// Map an extraction failure during item creation
    pub fn from_extract(url: &str, error: ExtractError) -> Self {
        match error {
            ExtractError::Timeout { url, timeout_ms } => WatchError::Timeout { url, timeout_ms },
            ExtractError::NoMatch { selector } => WatchError::NoMatch {
                url: url.to_string(),
                selector,
            },
            ExtractError::InvalidSelector { selector, source } => WatchError::InvalidSelector {
                selector,
                message: source.to_string(),
            },
            other => WatchError::FetchFailed {
                url: url.to_string(),
                message: other.to_string(),
            },
        }
    }
}

impl From<StoreError> for WatchError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::LimitExceeded { owner_id, limit } => {
                WatchError::LimitExceeded { owner_id, limit }
            }
            other => WatchError::Repository(other),
        }
    }
}

impl crate::core::error_handling::ContextualError for WatchError {
    fn is_user_actionable(&self) -> bool {
        !matches!(self, WatchError::Repository(_))
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            WatchError::InvalidUrl(_) => Some("❌ Invalid URL format!"),
            WatchError::LimitExceeded { .. } => Some(
                "❌ Limit reached! Please remove some tracked items first.",
            ),
            WatchError::Timeout { .. } => {
                Some("❌ Request timed out. Please try again with a different URL.")
            }
            WatchError::NoMatch { .. } | WatchError::FetchFailed { .. } => Some(
                "❌ Could not extract content with the provided XPath selector. Please check the URL and XPath.",
            ),
            WatchError::InvalidSelector { .. } => {
                Some("❌ The XPath selector is not valid. Please check its syntax.")
            }
            WatchError::Repository(_) => None,
        }
    }
}

pub type WatchResult<T> = Result<T, WatchError>;
