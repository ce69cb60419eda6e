//! Fallback evaluation strategies
//!
//! Page text is tried as HTML, then re-parsed as XML, then the selector is
//! re-run with the root element as context node. The first strategy that
//! selects at least one node wins.

use std::time::Instant;

use crate::extract::document::{Document, NodeId};
use crate::extract::xpath::{Selector, SelectorError};

/// Outcome of one strategy or of the whole chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// At least one node matched; the text may be empty
    Matched(String),
    NoMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Html,
    Xml,
    RootElement,
}

/// Order in which strategies are attempted
pub const FALLBACK_CHAIN: [Strategy; 3] = [Strategy::Html, Strategy::Xml, Strategy::RootElement];

/// Page text with each parse performed at most once
struct ParsedPage<'a> {
    text: &'a str,
    html: Option<Document>,
    xml: Option<Document>,
}

impl<'a> ParsedPage<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            html: None,
            xml: None,
        }
    }

    fn html(&mut self) -> &Document {
        let text = self.text;
        self.html.get_or_insert_with(|| Document::parse_html(text))
    }

    fn xml(&mut self) -> &Document {
        let text = self.text;
        self.xml.get_or_insert_with(|| Document::parse_xml(text))
    }
}

impl Strategy {
    fn attempt(
        self,
        page: &mut ParsedPage<'_>,
        selector: &Selector,
        deadline: Option<Instant>,
    ) -> Result<Extraction, SelectorError> {
        match self {
            Strategy::Html => {
                let doc = page.html();
                run(doc, doc.root(), selector, deadline)
            }
            Strategy::Xml => {
                let doc = page.xml();
                run(doc, doc.root(), selector, deadline)
            }
            Strategy::RootElement => {
                if let Some(root) = page.xml().root_element() {
                    let doc = page.xml();
                    return run(doc, root, selector, deadline);
                }
                let doc = page.html();
                match doc.root_element() {
                    Some(root) => run(doc, root, selector, deadline),
                    None => Ok(Extraction::NoMatch),
                }
            }
        }
    }
}

fn run(
    doc: &Document,
    context: NodeId,
    selector: &Selector,
    deadline: Option<Instant>,
) -> Result<Extraction, SelectorError> {
    let items = selector.select_until(doc, context, deadline)?;
    if items.is_empty() {
        return Ok(Extraction::NoMatch);
    }
    Ok(Extraction::Matched(assemble_text(
        items.iter().map(|item| item.text_content(doc)),
    )))
}

/// Trim each fragment, drop empties, join with single spaces
pub fn assemble_text<I>(fragments: I) -> String
where
    I: IntoIterator<Item = String>,
{
    fragments
        .into_iter()
        .map(|fragment| fragment.trim().to_string())
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run `strategies` in order, stopping at the first match
pub fn first_match<F>(strategies: &[Strategy], mut attempt: F) -> Result<Extraction, SelectorError>
where
    F: FnMut(Strategy) -> Result<Extraction, SelectorError>,
{
    for &strategy in strategies {
        if let Extraction::Matched(text) = attempt(strategy)? {
            log::trace!("Selector matched via {:?} strategy", strategy);
            return Ok(Extraction::Matched(text));
        }
    }
    Ok(Extraction::NoMatch)
}

/// Evaluate `selector` against page text through the full fallback chain
pub fn evaluate(text: &str, selector: &Selector) -> Result<Extraction, SelectorError> {
    evaluate_until(text, selector, None)
}

/// [`evaluate`] that stops with [`SelectorError::DeadlineExceeded`] once
/// `deadline` has passed, checked before each strategy and during evaluation
pub fn evaluate_until(
    text: &str,
    selector: &Selector,
    deadline: Option<Instant>,
) -> Result<Extraction, SelectorError> {
    let mut page = ParsedPage::new(text);
    first_match(&FALLBACK_CHAIN, |strategy| {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(SelectorError::DeadlineExceeded);
        }
        strategy.attempt(&mut page, selector, deadline)
    })
}
