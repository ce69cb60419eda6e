//! Validation utilities for user input and configuration values

use std::fmt;

/// A user-facing validation failure
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

impl crate::core::error_handling::ContextualError for ValidationError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        Some(&self.message)
    }
}

/// Validate that `value` is an absolute http(s) URL
pub fn validate_url(value: &str) -> Result<url::Url, ValidationError> {
    let parsed = url::Url::parse(value.trim())
        .map_err(|e| ValidationError::new(&format!("Invalid URL '{}': {}", value, e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ValidationError::new(&format!(
                "Invalid URL '{}': unsupported scheme '{}'",
                value, other
            )))
        }
    }

    if parsed.host_str().is_none() {
        return Err(ValidationError::new(&format!(
            "Invalid URL '{}': missing host",
            value
        )));
    }

    Ok(parsed)
}

/// Validate an item id given on the command line
pub fn validate_item_id(value: &str) -> Result<i64, String> {
    match value.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(format!("'{}' is not a valid item id", value)),
    }
}
