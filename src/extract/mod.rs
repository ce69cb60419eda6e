//! Content Extraction
//!
//! Fetches a page and evaluates an XPath selector against it, falling back
//! from HTML to XML parsing and finally to root-element evaluation. Matched
//! nodes are flattened to a single whitespace-joined string.

pub(crate) mod document;
pub(crate) mod error;
pub(crate) mod fetch;
pub(crate) mod strategy;
pub(crate) mod xpath;

pub mod api;

#[cfg(test)]
mod tests;
