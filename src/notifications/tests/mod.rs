//! Notification transport tests
