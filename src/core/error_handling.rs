//! Generic error handling utilities
//!
//! Lets the command layer report any module's error the same way: errors the
//! user can act on are shown verbatim, everything else gets a short context
//! line with the detail kept at debug level.

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)`. When it returns `false`, `user_message()` returns `None`.
pub trait ContextualError: std::error::Error {
    /// True if the message should be displayed directly to the user
    ///
    /// User-actionable: invalid URL, selector without matches, item limit
    /// reached, bad configuration values.
    /// System: database failures, transport failures.
    fn is_user_actionable(&self) -> bool;

    /// The specific user message if this is a user-actionable error
    fn user_message(&self) -> Option<&str>;
}

/// Log an error with a detail level chosen by its specificity
///
/// # Examples
/// ```rust,no_run
/// # use pagewatch::core::error_handling::log_error_with_context;
/// # use pagewatch::store::api::StoreError;
/// let err = StoreError::LimitExceeded { owner_id: "42".into(), limit: 5 };
/// log_error_with_context(&err, "Adding tracked item");
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("{}", user_msg),
        _ => log::error!("{} failed", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

/// Message to print for an error, following the same rules as the log line
pub fn display_message<E: ContextualError>(error: &E, operation_context: &str) -> String {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => user_msg.to_string(),
        _ => format!("{} failed", operation_context),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct TestUserError {
        message: String,
    }

    impl fmt::Display for TestUserError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.message)
        }
    }

    impl std::error::Error for TestUserError {}

    impl ContextualError for TestUserError {
        fn is_user_actionable(&self) -> bool {
            true
        }

        fn user_message(&self) -> Option<&str> {
            Some(&self.message)
        }
    }

    #[derive(Debug)]
    struct TestSystemError {
        internal_details: String,
    }

    impl fmt::Display for TestSystemError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "System error: {}", self.internal_details)
        }
    }

    impl std::error::Error for TestSystemError {}

    impl ContextualError for TestSystemError {
        fn is_user_actionable(&self) -> bool {
            false
        }

        fn user_message(&self) -> Option<&str> {
            None
        }
    }

    #[test]
    fn test_user_actionable_error_shows_specific_message() {
        let error = TestUserError {
            message: "Invalid URL format".to_string(),
        };

        assert_eq!(display_message(&error, "Adding item"), "Invalid URL format");
        log_error_with_context(&error, "Adding item");
    }

    #[test]
    fn test_system_error_uses_generic_context() {
        let error = TestSystemError {
            internal_details: "database is locked".to_string(),
        };

        assert_eq!(display_message(&error, "Listing items"), "Listing items failed");
        assert!(!error.to_string().is_empty());
    }
}
