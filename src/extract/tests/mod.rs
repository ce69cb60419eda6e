//! Extraction engine tests
