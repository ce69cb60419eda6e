//! Repository tests
//!
//! Both implementations run the same behavioural checks from `contract`.
