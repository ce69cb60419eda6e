//! Public API for the notification system
//!
//! External modules should import from here rather than directly from
//! internal modules.

// Payload
pub use crate::notifications::event::{ChangeNotification, NO_PREVIOUS_CONTENT};

// Errors
pub use crate::notifications::error::{NotificationError, NotificationResult};

// Dispatch and transports
pub use crate::notifications::log_notifier::LogNotifier;
pub use crate::notifications::manager::NotificationDispatcher;
pub use crate::notifications::telegram::{TelegramNotifier, TELEGRAM_API_BASE};
pub use crate::notifications::templates::{MessageRenderer, CHANGE_HTML, CHANGE_TEXT};

// Traits and statistics
pub use crate::notifications::traits::{DeliveryStatistics, Notifier};
