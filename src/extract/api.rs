//! Extraction API
//!
//! Public surface of the extraction engine: the document model, the XPath
//! selector subset, the fallback strategies and the HTTP extractor.

pub use crate::extract::document::{Document, DocumentKind, NodeId};
pub use crate::extract::error::{ExtractError, ExtractResult};
pub use crate::extract::fetch::{
    Extractor, FetchSettings, HttpExtractor, DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT,
};
pub use crate::extract::strategy::{evaluate, evaluate_until, Extraction, Strategy, FALLBACK_CHAIN};
pub use crate::extract::xpath::{Item, Selector, SelectorError};
