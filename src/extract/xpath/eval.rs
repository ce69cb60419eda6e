//! Expression evaluation over a [`Document`]

use std::time::Instant;

use super::parser::{ArithmeticOp, Axis, CompareOp, Expr, Function, NodeTest, Step};
use super::{Item, SelectorError};
use crate::extract::document::{Document, NodeData, NodeId};

/// Result of evaluating an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nodes(Vec<Item>),
    Str(String),
    Num(f64),
    Bool(bool),
}

#[derive(Debug, Clone, Copy)]
struct Context {
    item: Item,
    position: usize,
    size: usize,
}

pub struct Evaluator<'d> {
    doc: &'d Document,
    deadline: Option<Instant>,
}

impl<'d> Evaluator<'d> {
    pub fn new(doc: &'d Document) -> Self {
        Self {
            doc,
            deadline: None,
        }
    }

    /// Abandon evaluation with [`SelectorError::DeadlineExceeded`] once
    /// `deadline` has passed
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    fn check_deadline(&self) -> Result<(), SelectorError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(SelectorError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Evaluate `expr` with `context` as the single context node
    pub fn evaluate(&self, expr: &Expr, context: NodeId) -> Result<Value, SelectorError> {
        let ctx = Context {
            item: Item::Node(context),
            position: 1,
            size: 1,
        };
        self.eval(expr, &ctx)
    }

    fn eval(&self, expr: &Expr, ctx: &Context) -> Result<Value, SelectorError> {
        match expr {
            Expr::Or(lhs, rhs) => {
                if self.boolean(&self.eval(lhs, ctx)?) {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.boolean(&self.eval(rhs, ctx)?)))
            }
            Expr::And(lhs, rhs) => {
                if !self.boolean(&self.eval(lhs, ctx)?) {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.boolean(&self.eval(rhs, ctx)?)))
            }
            Expr::Compare(op, lhs, rhs) => {
                let lhs = self.eval(lhs, ctx)?;
                let rhs = self.eval(rhs, ctx)?;
                Ok(Value::Bool(self.compare(*op, &lhs, &rhs)))
            }
            Expr::Arithmetic(op, lhs, rhs) => {
                let a = self.number(&self.eval(lhs, ctx)?);
                let b = self.number(&self.eval(rhs, ctx)?);
                Ok(Value::Num(match op {
                    ArithmeticOp::Add => a + b,
                    ArithmeticOp::Subtract => a - b,
                    ArithmeticOp::Multiply => a * b,
                    ArithmeticOp::Divide => a / b,
                    ArithmeticOp::Modulo => a % b,
                }))
            }
            Expr::Negate(operand) => Ok(Value::Num(-self.number(&self.eval(operand, ctx)?))),
            Expr::Union(lhs, rhs) => {
                let mut items = self.node_set(self.eval(lhs, ctx)?, "|")?;
                items.extend(self.node_set(self.eval(rhs, ctx)?, "|")?);
                sort_document_order(&mut items);
                Ok(Value::Nodes(items))
            }
            Expr::Path(path) => {
                let mut current = if path.absolute {
                    vec![Item::Node(self.doc.root())]
                } else {
                    vec![ctx.item]
                };
                for step in &path.steps {
                    current = self.apply_step(&current, step)?;
                }
                Ok(Value::Nodes(current))
            }
            Expr::Filter {
                primary,
                predicates,
                steps,
            } => {
                let mut items = self.node_set(self.eval(primary, ctx)?, "a filter expression")?;
                sort_document_order(&mut items);
                let mut current = self.apply_predicates(items, predicates)?;
                for step in steps {
                    current = self.apply_step(&current, step)?;
                }
                Ok(Value::Nodes(current))
            }
            Expr::Literal(text) => Ok(Value::Str(text.clone())),
            Expr::Number(value) => Ok(Value::Num(*value)),
            Expr::Function(function, args) => self.call(*function, args, ctx),
        }
    }

    fn node_set(&self, value: Value, used_in: &str) -> Result<Vec<Item>, SelectorError> {
        match value {
            Value::Nodes(items) => Ok(items),
            other => Err(SelectorError::Type(format!(
                "{} requires a node-set, found {}",
                used_in,
                type_name(&other)
            ))),
        }
    }

    fn apply_step(&self, inputs: &[Item], step: &Step) -> Result<Vec<Item>, SelectorError> {
        let mut out = Vec::new();
        for &item in inputs {
            self.check_deadline()?;
            let candidates: Vec<Item> = self
                .axis(item, step.axis)
                .into_iter()
                .filter(|&candidate| self.matches_test(candidate, step.axis, &step.test))
                .collect();
            out.extend(self.apply_predicates(candidates, &step.predicates)?);
        }
        sort_document_order(&mut out);
        Ok(out)
    }

    /// Filter `items` (already in proximity order) through each predicate
    fn apply_predicates(
        &self,
        mut items: Vec<Item>,
        predicates: &[Expr],
    ) -> Result<Vec<Item>, SelectorError> {
        for predicate in predicates {
            let size = items.len();
            let mut kept = Vec::with_capacity(size);
            for (index, item) in items.into_iter().enumerate() {
                self.check_deadline()?;
                let ctx = Context {
                    item,
                    position: index + 1,
                    size,
                };
                let keep = match self.eval(predicate, &ctx)? {
                    Value::Num(n) => n == ctx.position as f64,
                    other => self.boolean(&other),
                };
                if keep {
                    kept.push(item);
                }
            }
            items = kept;
        }
        Ok(items)
    }

    /// Items along `axis`, nearest first for reverse axes
    fn axis(&self, item: Item, axis: Axis) -> Vec<Item> {
        let id = match item {
            Item::Node(id) => id,
            Item::Attribute { owner, .. } => {
                return match axis {
                    Axis::SelfAxis => vec![item],
                    Axis::Parent => vec![Item::Node(owner)],
                    Axis::Ancestor => self.ancestors(owner, true),
                    Axis::AncestorOrSelf => {
                        let mut out = vec![item];
                        out.extend(self.ancestors(owner, true));
                        out
                    }
                    _ => Vec::new(),
                };
            }
        };

        let node = self.doc.node(id);
        match axis {
            Axis::Child => node.children.iter().map(|&c| Item::Node(c)).collect(),
            Axis::Descendant => {
                let mut out = Vec::new();
                self.descendants(id, &mut out);
                out
            }
            Axis::DescendantOrSelf => {
                let mut out = vec![item];
                self.descendants(id, &mut out);
                out
            }
            Axis::Parent => node.parent.map(Item::Node).into_iter().collect(),
            Axis::Ancestor => self.ancestors(id, false),
            Axis::AncestorOrSelf => self.ancestors(id, true),
            Axis::FollowingSibling | Axis::PrecedingSibling => {
                let Some(parent) = node.parent else {
                    return Vec::new();
                };
                let siblings = &self.doc.node(parent).children;
                let Some(index) = siblings.iter().position(|&s| s == id) else {
                    return Vec::new();
                };
                if axis == Axis::FollowingSibling {
                    siblings[index + 1..].iter().map(|&s| Item::Node(s)).collect()
                } else {
                    siblings[..index].iter().rev().map(|&s| Item::Node(s)).collect()
                }
            }
            Axis::SelfAxis => vec![item],
            Axis::Attribute => (0..self.doc.attributes(id).len())
                .map(|index| Item::Attribute { owner: id, index })
                .collect(),
        }
    }

    /// Pre-order walk with an explicit stack
    fn descendants(&self, id: NodeId, out: &mut Vec<Item>) {
        let mut pending: Vec<NodeId> = self.doc.node(id).children.iter().rev().copied().collect();
        while let Some(next) = pending.pop() {
            out.push(Item::Node(next));
            pending.extend(self.doc.node(next).children.iter().rev().copied());
        }
    }

    fn ancestors(&self, id: NodeId, include_self: bool) -> Vec<Item> {
        let mut out = Vec::new();
        if include_self {
            out.push(Item::Node(id));
        }
        let mut current = self.doc.node(id).parent;
        while let Some(parent) = current {
            out.push(Item::Node(parent));
            current = self.doc.node(parent).parent;
        }
        out
    }

    fn matches_test(&self, item: Item, axis: Axis, test: &NodeTest) -> bool {
        match item {
            Item::Attribute { owner, index } => match test {
                NodeTest::Node => true,
                NodeTest::Wildcard => axis == Axis::Attribute,
                NodeTest::Name(wanted) => {
                    axis == Axis::Attribute
                        && self
                            .doc
                            .attributes(owner)
                            .get(index)
                            .is_some_and(|a| self.doc.names_match(&a.name, wanted))
                }
                _ => false,
            },
            Item::Node(id) => match (&self.doc.node(id).data, test) {
                (_, NodeTest::Node) => true,
                (NodeData::Element { name, .. }, NodeTest::Name(wanted)) => {
                    self.doc.names_match(name, wanted)
                }
                (NodeData::Element { .. }, NodeTest::Wildcard) => true,
                (NodeData::Text(_), NodeTest::Text) => true,
                (NodeData::Comment(_), NodeTest::Comment) => true,
                _ => false,
            },
        }
    }

    fn call(&self, function: Function, args: &[Expr], ctx: &Context) -> Result<Value, SelectorError> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg, ctx)?);
        }
        let string_arg = |values: &[Value], index: usize| -> String {
            values
                .get(index)
                .map(|v| self.string(v))
                .unwrap_or_else(|| self.item_string(ctx.item))
        };

        Ok(match function {
            Function::Last => Value::Num(ctx.size as f64),
            Function::Position => Value::Num(ctx.position as f64),
            Function::Count => {
                let items = self.node_set(values.remove(0), "count()")?;
                Value::Num(items.len() as f64)
            }
            Function::Name | Function::LocalName => {
                let target = match values.pop() {
                    Some(value) => self.node_set(value, "name()")?.first().copied(),
                    None => Some(ctx.item),
                };
                let name = target.map(|item| self.item_name(item)).unwrap_or_default();
                if function == Function::LocalName {
                    let local = name.rsplit(':').next().unwrap_or_default().to_string();
                    Value::Str(local)
                } else {
                    Value::Str(name)
                }
            }
            Function::String => Value::Str(string_arg(&values, 0)),
            Function::Concat => Value::Str(values.iter().map(|v| self.string(v)).collect()),
            Function::Contains => {
                Value::Bool(string_arg(&values, 0).contains(&string_arg(&values, 1)))
            }
            Function::StartsWith => {
                Value::Bool(string_arg(&values, 0).starts_with(&string_arg(&values, 1)))
            }
            Function::EndsWith => {
                Value::Bool(string_arg(&values, 0).ends_with(&string_arg(&values, 1)))
            }
            Function::NormalizeSpace => Value::Str(
                string_arg(&values, 0)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            Function::StringLength => {
                Value::Num(string_arg(&values, 0).chars().count() as f64)
            }
            Function::Substring => {
                let text = self.string(&values[0]);
                let start = xpath_round(self.number(&values[1]));
                let end = match values.get(2) {
                    Some(length) => start + xpath_round(self.number(length)),
                    None => f64::INFINITY,
                };
                Value::Str(
                    text.chars()
                        .enumerate()
                        .filter(|(i, _)| {
                            let position = (*i + 1) as f64;
                            position >= start && position < end
                        })
                        .map(|(_, c)| c)
                        .collect(),
                )
            }
            Function::Translate => {
                let from: Vec<char> = self.string(&values[1]).chars().collect();
                let to: Vec<char> = self.string(&values[2]).chars().collect();
                Value::Str(
                    self.string(&values[0])
                        .chars()
                        .filter_map(|c| match from.iter().position(|&f| f == c) {
                            Some(index) => to.get(index).copied(),
                            None => Some(c),
                        })
                        .collect(),
                )
            }
            Function::Not => Value::Bool(!self.boolean(&values[0])),
            Function::True => Value::Bool(true),
            Function::False => Value::Bool(false),
            Function::Boolean => Value::Bool(self.boolean(&values[0])),
            Function::Number => match values.first() {
                Some(value) => Value::Num(self.number(value)),
                None => Value::Num(parse_number(&self.item_string(ctx.item))),
            },
        })
    }

    fn item_name(&self, item: Item) -> String {
        match item {
            Item::Node(id) => self.doc.element_name(id).unwrap_or_default().to_string(),
            Item::Attribute { owner, index } => self
                .doc
                .attributes(owner)
                .get(index)
                .map(|a| a.name.clone())
                .unwrap_or_default(),
        }
    }

    /// XPath string-value of a single item
    pub fn item_string(&self, item: Item) -> String {
        match item {
            Item::Node(id) => match &self.doc.node(id).data {
                NodeData::Document | NodeData::Element { .. } => self.doc.descendant_text(id),
                NodeData::Text(text) | NodeData::Comment(text) => text.clone(),
            },
            Item::Attribute { owner, index } => self
                .doc
                .attributes(owner)
                .get(index)
                .map(|a| a.value.clone())
                .unwrap_or_default(),
        }
    }

    fn string(&self, value: &Value) -> String {
        match value {
            Value::Nodes(items) => items
                .first()
                .map(|&item| self.item_string(item))
                .unwrap_or_default(),
            Value::Str(text) => text.clone(),
            Value::Num(n) => format_number(*n),
            Value::Bool(b) => b.to_string(),
        }
    }

    fn number(&self, value: &Value) -> f64 {
        match value {
            Value::Num(n) => *n,
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
            other => parse_number(&self.string(other)),
        }
    }

    fn boolean(&self, value: &Value) -> bool {
        match value {
            Value::Nodes(items) => !items.is_empty(),
            Value::Str(text) => !text.is_empty(),
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Bool(b) => *b,
        }
    }

    fn compare(&self, op: CompareOp, lhs: &Value, rhs: &Value) -> bool {
        match (lhs, rhs) {
            (Value::Nodes(a), Value::Nodes(b)) => a.iter().any(|&x| {
                let x = Value::Str(self.item_string(x));
                b.iter()
                    .any(|&y| self.compare_atomic(op, &x, &Value::Str(self.item_string(y))))
            }),
            (Value::Nodes(items), Value::Bool(_)) => {
                self.compare_atomic(op, &Value::Bool(!items.is_empty()), rhs)
            }
            (Value::Bool(_), Value::Nodes(items)) => {
                self.compare_atomic(op, lhs, &Value::Bool(!items.is_empty()))
            }
            (Value::Nodes(items), other) => items
                .iter()
                .any(|&x| self.compare_atomic(op, &Value::Str(self.item_string(x)), other)),
            (other, Value::Nodes(items)) => items
                .iter()
                .any(|&y| self.compare_atomic(op, other, &Value::Str(self.item_string(y)))),
            _ => self.compare_atomic(op, lhs, rhs),
        }
    }

    fn compare_atomic(&self, op: CompareOp, lhs: &Value, rhs: &Value) -> bool {
        match op {
            CompareOp::Eq | CompareOp::NotEq => {
                let equal = match (lhs, rhs) {
                    (Value::Bool(_), _) | (_, Value::Bool(_)) => {
                        self.boolean(lhs) == self.boolean(rhs)
                    }
                    (Value::Num(_), _) | (_, Value::Num(_)) => self.number(lhs) == self.number(rhs),
                    _ => self.string(lhs) == self.string(rhs),
                };
                (op == CompareOp::Eq) == equal
            }
            CompareOp::Lt => self.number(lhs) < self.number(rhs),
            CompareOp::Le => self.number(lhs) <= self.number(rhs),
            CompareOp::Gt => self.number(lhs) > self.number(rhs),
            CompareOp::Ge => self.number(lhs) >= self.number(rhs),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Nodes(_) => "node-set",
        Value::Str(_) => "string",
        Value::Num(_) => "number",
        Value::Bool(_) => "boolean",
    }
}

fn sort_document_order(items: &mut Vec<Item>) {
    items.sort_by_key(|item| item.order_key());
    items.dedup();
}

fn xpath_round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        n
    } else {
        (n + 0.5).floor()
    }
}

/// Parse per the XPath Number production; anything else is NaN
fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let valid = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|&c| c == '.').count() <= 1
        && digits != ".";
    if !valid {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
