//! Fetching pages and extracting selected text

use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::extract::error::{ExtractError, ExtractResult};
use crate::extract::strategy::{self, Extraction};
use crate::extract::xpath::{Selector, SelectorError};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

/// Produces the current text of `selector` on the page at `url`
///
/// A page where the selector matches nothing is reported as
/// [`ExtractError::NoMatch`], so callers only see `Ok` for matched text.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, url: &str, selector: &str) -> ExtractResult<String>;
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub user_agent: String,
    /// Budget covering request, body read, parsing and evaluation
    pub timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Extractor backed by a shared reqwest client
pub struct HttpExtractor {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl HttpExtractor {
    pub fn new(settings: FetchSettings) -> ExtractResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ExtractError::Client {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    fn timeout_error(&self, url: &str) -> ExtractError {
        ExtractError::Timeout {
            url: url.to_string(),
            timeout_ms: self.settings.timeout.as_millis() as u64,
        }
    }

    async fn fetch_and_evaluate(
        &self,
        url: &str,
        selector: Selector,
        deadline: Instant,
    ) -> ExtractResult<String> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                self.timeout_error(url)
            } else {
                ExtractError::Fetch {
                    url: url.to_string(),
                    status: None,
                    message: format!("Network request failed: {}", e),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Fetch {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                self.timeout_error(url)
            } else {
                ExtractError::Fetch {
                    url: url.to_string(),
                    status: Some(status.as_u16()),
                    message: format!("Failed to read response body: {}", e),
                }
            }
        })?;
        log::trace!("Fetched {} bytes from {}", body.len(), url);

        // Parsing large pages is CPU bound. The deadline lets the blocking
        // task stop on its own after the caller has given up on it.
        let evaluated = tokio::task::spawn_blocking(move || {
            let result = strategy::evaluate_until(&body, &selector, Some(deadline));
            (selector, result)
        })
        .await
        .map_err(|e| ExtractError::Internal {
            message: format!("Selector evaluation task failed: {}", e),
        })?;

        match evaluated {
            (_, Ok(Extraction::Matched(text))) => Ok(text),
            (selector, Ok(Extraction::NoMatch)) => Err(ExtractError::NoMatch {
                selector: selector.as_str().to_string(),
            }),
            (_, Err(SelectorError::DeadlineExceeded)) => Err(self.timeout_error(url)),
            (selector, Err(source)) => Err(ExtractError::InvalidSelector {
                selector: selector.as_str().to_string(),
                source,
            }),
        }
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn extract(&self, url: &str, selector: &str) -> ExtractResult<String> {
        let selector = Selector::parse(selector).map_err(|source| ExtractError::InvalidSelector {
            selector: selector.to_string(),
            source,
        })?;

        let deadline = Instant::now() + self.settings.timeout;
        let extraction = self.fetch_and_evaluate(url, selector, deadline);
        match tokio::time::timeout(self.settings.timeout, extraction).await {
            Ok(result) => result,
            Err(_) => {
                log::debug!("Extraction from {} exceeded {:?}", url, self.settings.timeout);
                Err(self.timeout_error(url))
            }
        }
    }
}
