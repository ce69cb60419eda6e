//! Notifier that writes change messages to the log

use async_trait::async_trait;

use crate::notifications::error::NotificationResult;
use crate::notifications::event::ChangeNotification;
use crate::notifications::templates::{MessageRenderer, CHANGE_TEXT};
use crate::notifications::traits::Notifier;

pub struct LogNotifier {
    renderer: MessageRenderer,
}

impl LogNotifier {
    pub fn new() -> NotificationResult<Self> {
        Ok(Self {
            renderer: MessageRenderer::new()?,
        })
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, owner_id: &str, change: &ChangeNotification) -> NotificationResult<()> {
        let message = self.renderer.render(CHANGE_TEXT, change)?;
        log::info!("[owner {}] {}", owner_id, message);
        Ok(())
    }
}
