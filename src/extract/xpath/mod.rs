//! A compact XPath 1.0 engine over [`Document`] trees
//!
//! Covers the location-path and predicate subset used for page selectors:
//! the forward and reverse sibling/ancestor axes, attribute and text tests,
//! positional predicates and the core string/boolean/number functions.
//! A selector must evaluate to a node-set; scalar expressions are rejected
//! when the selector is parsed.

mod eval;
mod parser;


use std::time::Instant;

use crate::extract::document::{Document, NodeData, NodeId};
use eval::{Evaluator, Value};
use parser::{Expr, Function};

/// A node or attribute selected by an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Item {
    Node(NodeId),
    Attribute { owner: NodeId, index: usize },
}

impl Item {
    /// Sort key giving document order; attributes follow their owner
    fn order_key(&self) -> (NodeId, usize) {
        match *self {
            Item::Node(id) => (id, 0),
            Item::Attribute { owner, index } => (owner, index + 1),
        }
    }

    /// Text used when extracting content from a selected item
    ///
    /// Mirrors DOM `textContent`: the document node contributes nothing.
    pub fn text_content(&self, doc: &Document) -> String {
        match *self {
            Item::Node(id) => match &doc.node(id).data {
                NodeData::Document => String::new(),
                NodeData::Element { .. } => doc.descendant_text(id),
                NodeData::Text(text) | NodeData::Comment(text) => text.clone(),
            },
            Item::Attribute { owner, index } => doc
                .attributes(owner)
                .get(index)
                .map(|a| a.value.clone())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectorError {
    #[error("syntax error at offset {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("unknown function '{0}()'")]
    UnknownFunction(String),

    #[error("function '{function}()' does not accept {found} argument(s)")]
    Arity { function: String, found: usize },

    #[error("selector evaluates to a {found}, not a node-set")]
    NotNodeSet { found: &'static str },

    #[error("type error: {0}")]
    Type(String),

    #[error("evaluation ran past its deadline")]
    DeadlineExceeded,
}

/// A parsed selector, reusable across documents
#[derive(Debug, Clone)]
pub struct Selector {
    source: String,
    expr: Expr,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let expr = parser::parse(source)?;
        if let Some(found) = scalar_type(&expr) {
            return Err(SelectorError::NotNodeSet { found });
        }
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluate against `doc` with `context` as the context node
    ///
    /// Results are de-duplicated and in document order.
    pub fn select(&self, doc: &Document, context: NodeId) -> Result<Vec<Item>, SelectorError> {
        self.select_until(doc, context, None)
    }

    /// Like [`Selector::select`], giving up once `deadline` has passed
    pub fn select_until(
        &self,
        doc: &Document,
        context: NodeId,
        deadline: Option<Instant>,
    ) -> Result<Vec<Item>, SelectorError> {
        let evaluator = Evaluator::new(doc).with_deadline(deadline);
        match evaluator.evaluate(&self.expr, context)? {
            Value::Nodes(items) => Ok(items),
            Value::Str(_) => Err(SelectorError::NotNodeSet { found: "string" }),
            Value::Num(_) => Err(SelectorError::NotNodeSet { found: "number" }),
            Value::Bool(_) => Err(SelectorError::NotNodeSet { found: "boolean" }),
        }
    }
}

/// The static result type of expressions that can never yield nodes
fn scalar_type(expr: &Expr) -> Option<&'static str> {
    match expr {
        Expr::Path(_) | Expr::Union(..) | Expr::Filter { .. } => None,
        Expr::Literal(_) => Some("string"),
        Expr::Number(_) | Expr::Arithmetic(..) | Expr::Negate(_) => Some("number"),
        Expr::Or(..) | Expr::And(..) | Expr::Compare(..) => Some("boolean"),
        Expr::Function(function, _) => Some(match function {
            Function::Last
            | Function::Position
            | Function::Count
            | Function::StringLength
            | Function::Number => "number",
            Function::Not
            | Function::True
            | Function::False
            | Function::Boolean
            | Function::Contains
            | Function::StartsWith
            | Function::EndsWith => "boolean",
            _ => "string",
        }),
    }
}
