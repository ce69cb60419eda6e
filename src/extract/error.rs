//! Extraction Error Types

use crate::extract::xpath::SelectorError;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Fetch of {} failed{}: {}", .url, status_suffix(.status), .message)]
    Fetch {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Extraction from {url} exceeded {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Selector '{selector}' matched nothing")]
    NoMatch { selector: String },

    #[error("Invalid selector '{selector}': {source}")]
    InvalidSelector {
        selector: String,
        #[source]
        source: SelectorError,
    },

    #[error("HTTP client error: {message}")]
    Client { message: String },

    #[error("Extraction failed: {message}")]
    Internal { message: String },
}

impl ExtractError {
    /// Short tag naming the failure cause, used in sweep logs
    pub fn cause_tag(&self) -> &'static str {
        match self {
            ExtractError::Fetch { status: Some(_), .. } => "http-status",
            ExtractError::Fetch { status: None, .. } => "network",
            ExtractError::Timeout { .. } => "timeout",
            ExtractError::NoMatch { .. } => "no-match",
            ExtractError::InvalidSelector { .. } => "invalid-selector",
            ExtractError::Client { .. } => "client",
            ExtractError::Internal { .. } => "internal",
        }
    }
}

impl crate::core::error_handling::ContextualError for ExtractError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            ExtractError::Timeout { .. }
                | ExtractError::NoMatch { .. }
                | ExtractError::InvalidSelector { .. }
                | ExtractError::Fetch { .. }
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ExtractError::Timeout { .. } => {
                Some("❌ Request timed out. Please try again with a different URL.")
            }
            ExtractError::NoMatch { .. } | ExtractError::Fetch { .. } => Some(
                "❌ Could not extract content with the provided XPath selector. Please check the URL and XPath.",
            ),
            ExtractError::InvalidSelector { .. } => {
                Some("❌ The XPath selector is not valid. Please check its syntax.")
            }
            _ => None,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|code| format!(" with status {}", code))
        .unwrap_or_default()
}

pub type ExtractResult<T> = Result<T, ExtractError>;
