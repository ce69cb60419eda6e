//! Error types for the notification system

#[derive(Debug, Clone, thiserror::Error)]
pub enum NotificationError {
    #[error("Failed to render {template}: {message}")]
    Template { template: String, message: String },

    #[error("Transport {transport} failed: {message}")]
    Transport { transport: String, message: String },

    #[error("{transport} rejected message (status {status}): {description}")]
    Rejected {
        transport: String,
        status: u16,
        description: String,
    },

    #[error("Notifier configuration error: {message}")]
    Configuration { message: String },
}

impl crate::core::error_handling::ContextualError for NotificationError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, NotificationError::Configuration { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            NotificationError::Configuration { message } => Some(message),
            _ => None,
        }
    }
}

pub type NotificationResult<T> = Result<T, NotificationError>;
