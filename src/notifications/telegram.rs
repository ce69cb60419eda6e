//! Telegram Bot API transport
//!
//! Owners are Telegram chat ids; messages go through `sendMessage` in HTML
//! parse mode with link previews disabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::notifications::error::{NotificationError, NotificationResult};
use crate::notifications::event::ChangeNotification;
use crate::notifications::templates::{MessageRenderer, CHANGE_HTML};
use crate::notifications::traits::Notifier;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const TRANSPORT: &str = "telegram";

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: String,
    renderer: MessageRenderer,
}

impl TelegramNotifier {
    pub fn new(token: &str, timeout: Duration) -> NotificationResult<Self> {
        Self::with_api_base(TELEGRAM_API_BASE, token, timeout)
    }

    /// Use a different Bot API server, e.g. a local one
    pub fn with_api_base(api_base: &str, token: &str, timeout: Duration) -> NotificationResult<Self> {
        if token.trim().is_empty() {
            return Err(NotificationError::Configuration {
                message: "A Telegram bot token is required for the telegram backend".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotificationError::Transport {
                transport: TRANSPORT.to_string(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                api_base.trim_end_matches('/'),
                token.trim()
            ),
            renderer: MessageRenderer::new()?,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        TRANSPORT
    }

    async fn notify(&self, owner_id: &str, change: &ChangeNotification) -> NotificationResult<()> {
        let text = self.renderer.render(CHANGE_HTML, change)?;
        let body = SendMessage {
            chat_id: owner_id,
            text: &text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotificationError::Transport {
                transport: TRANSPORT.to_string(),
                // Avoid echoing the endpoint, it carries the bot token
                message: format!("request failed: {}", e.without_url()),
            })?;

        let status = response.status();
        let parsed: Option<ApiResponse> = response.json().await.ok();
        match parsed {
            Some(api) if status.is_success() && api.ok => Ok(()),
            Some(api) => Err(NotificationError::Rejected {
                transport: TRANSPORT.to_string(),
                status: status.as_u16(),
                description: api
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            }),
            None => Err(NotificationError::Rejected {
                transport: TRANSPORT.to_string(),
                status: status.as_u16(),
                description: "unreadable API response".to_string(),
            }),
        }
    }
}
