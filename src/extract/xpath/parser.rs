//! Tokenizer and recursive-descent parser for the XPath 1.0 subset

use super::SelectorError;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    Arithmetic(ArithmeticOp, Box<Expr>, Box<Expr>),
    Negate(Box<Expr>),
    Union(Box<Expr>, Box<Expr>),
    Path(LocationPath),
    /// A primary expression with predicates, optionally continued by steps
    Filter {
        primary: Box<Expr>,
        predicates: Vec<Expr>,
        steps: Vec<Step>,
    },
    Literal(String),
    Number(f64),
    Function(Function, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn any_descendant_or_self() -> Self {
        Self {
            axis: Axis::DescendantOrSelf,
            test: NodeTest::Node,
            predicates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    SelfAxis,
    Attribute,
}

impl Axis {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Self::Child,
            "descendant" => Self::Descendant,
            "descendant-or-self" => Self::DescendantOrSelf,
            "parent" => Self::Parent,
            "ancestor" => Self::Ancestor,
            "ancestor-or-self" => Self::AncestorOrSelf,
            "following-sibling" => Self::FollowingSibling,
            "preceding-sibling" => Self::PrecedingSibling,
            "self" => Self::SelfAxis,
            "attribute" => Self::Attribute,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    Name(String),
    Wildcard,
    Text,
    Node,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Last,
    Position,
    Count,
    Name,
    LocalName,
    String,
    Concat,
    Contains,
    StartsWith,
    EndsWith,
    NormalizeSpace,
    StringLength,
    Substring,
    Translate,
    Not,
    True,
    False,
    Boolean,
    Number,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "last" => Self::Last,
            "position" => Self::Position,
            "count" => Self::Count,
            "name" => Self::Name,
            "local-name" => Self::LocalName,
            "string" => Self::String,
            "concat" => Self::Concat,
            "contains" => Self::Contains,
            "starts-with" => Self::StartsWith,
            "ends-with" => Self::EndsWith,
            "normalize-space" => Self::NormalizeSpace,
            "string-length" => Self::StringLength,
            "substring" => Self::Substring,
            "translate" => Self::Translate,
            "not" => Self::Not,
            "true" => Self::True,
            "false" => Self::False,
            "boolean" => Self::Boolean,
            "number" => Self::Number,
            _ => return None,
        })
    }

    /// Accepted argument counts, `None` meaning unbounded
    fn arity(self) -> (usize, Option<usize>) {
        match self {
            Self::Last | Self::Position | Self::True | Self::False => (0, Some(0)),
            Self::Count | Self::Not | Self::Boolean => (1, Some(1)),
            Self::Name
            | Self::LocalName
            | Self::String
            | Self::NormalizeSpace
            | Self::StringLength
            | Self::Number => (0, Some(1)),
            Self::Contains | Self::StartsWith | Self::EndsWith => (2, Some(2)),
            Self::Substring => (2, Some(3)),
            Self::Translate => (3, Some(3)),
            Self::Concat => (2, None),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Slash,
    DoubleSlash,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    At,
    Comma,
    Pipe,
    Dot,
    DotDot,
    DoubleColon,
    Star,
    Multiply,
    Plus,
    Minus,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Div,
    Mod,
    Literal(String),
    Number(f64),
    Name(String),
}

impl Token {
    /// Whether a following `*` or NCName must be read as an operator
    fn allows_operator_after(&self) -> bool {
        !matches!(
            self,
            Token::At
                | Token::DoubleColon
                | Token::LeftParen
                | Token::LeftBracket
                | Token::Comma
                | Token::Slash
                | Token::DoubleSlash
                | Token::Pipe
                | Token::Plus
                | Token::Minus
                | Token::Eq
                | Token::NotEq
                | Token::Lt
                | Token::Le
                | Token::Gt
                | Token::Ge
                | Token::And
                | Token::Or
                | Token::Div
                | Token::Mod
                | Token::Multiply
        )
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, SelectorError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens: Vec<(usize, Token)> = Vec::new();
    let mut i = 0;

    let peek = |i: usize| chars.get(i).map(|&(_, c)| c);

    while i < chars.len() {
        let (offset, c) = chars[i];
        let operator_context = tokens
            .last()
            .map(|(_, t)| t.allows_operator_after())
            .unwrap_or(false);

        let token = match c {
            ' ' | '\t' | '\n' | '\r' => {
                i += 1;
                continue;
            }
            '/' if peek(i + 1) == Some('/') => {
                i += 2;
                Token::DoubleSlash
            }
            '/' => {
                i += 1;
                Token::Slash
            }
            '[' => {
                i += 1;
                Token::LeftBracket
            }
            ']' => {
                i += 1;
                Token::RightBracket
            }
            '(' => {
                i += 1;
                Token::LeftParen
            }
            ')' => {
                i += 1;
                Token::RightParen
            }
            '@' => {
                i += 1;
                Token::At
            }
            ',' => {
                i += 1;
                Token::Comma
            }
            '|' => {
                i += 1;
                Token::Pipe
            }
            '+' => {
                i += 1;
                Token::Plus
            }
            '-' => {
                i += 1;
                Token::Minus
            }
            '=' => {
                i += 1;
                Token::Eq
            }
            '!' if peek(i + 1) == Some('=') => {
                i += 2;
                Token::NotEq
            }
            '<' if peek(i + 1) == Some('=') => {
                i += 2;
                Token::Le
            }
            '<' => {
                i += 1;
                Token::Lt
            }
            '>' if peek(i + 1) == Some('=') => {
                i += 2;
                Token::Ge
            }
            '>' => {
                i += 1;
                Token::Gt
            }
            ':' if peek(i + 1) == Some(':') => {
                i += 2;
                Token::DoubleColon
            }
            '*' => {
                i += 1;
                if operator_context {
                    Token::Multiply
                } else {
                    Token::Star
                }
            }
            '.' if peek(i + 1) == Some('.') => {
                i += 2;
                Token::DotDot
            }
            '.' if !peek(i + 1).is_some_and(|n| n.is_ascii_digit()) => {
                i += 1;
                Token::Dot
            }
            '"' | '\'' => {
                let quote = c;
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end].1 != quote {
                    end += 1;
                }
                if end >= chars.len() {
                    return Err(SelectorError::Syntax {
                        position: offset,
                        message: "unterminated string literal".to_string(),
                    });
                }
                let literal: String = chars[start..end].iter().map(|&(_, c)| c).collect();
                i = end + 1;
                Token::Literal(literal)
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().map(|&(_, c)| c).collect();
                let value = text.parse::<f64>().map_err(|_| SelectorError::Syntax {
                    position: offset,
                    message: format!("invalid number '{}'", text),
                })?;
                Token::Number(value)
            }
            c if is_name_start(c) => {
                let start = i;
                while i < chars.len() && is_name_char(chars[i].1) {
                    i += 1;
                }
                // Prefixed name such as dc:creator, but not an axis separator
                if peek(i) == Some(':')
                    && peek(i + 1) != Some(':')
                    && peek(i + 1).is_some_and(is_name_start)
                {
                    i += 1;
                    while i < chars.len() && is_name_char(chars[i].1) {
                        i += 1;
                    }
                }
                let name: String = chars[start..i].iter().map(|&(_, c)| c).collect();
                match name.as_str() {
                    "and" if operator_context => Token::And,
                    "or" if operator_context => Token::Or,
                    "div" if operator_context => Token::Div,
                    "mod" if operator_context => Token::Mod,
                    _ => Token::Name(name),
                }
            }
            other => {
                return Err(SelectorError::Syntax {
                    position: offset,
                    message: format!("unexpected character '{}'", other),
                })
            }
        };

        tokens.push((offset, token));
    }

    Ok(tokens)
}

/// Deepest allowed nesting of parentheses, predicates, arguments and unary minus
pub const MAX_NESTING: usize = 64;

/// Longest accepted selector, in tokens; bounds operator chains
pub const MAX_TOKENS: usize = 512;

/// Parse a selector into an expression tree
pub fn parse(source: &str) -> Result<Expr, SelectorError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(SelectorError::Syntax {
            position: 0,
            message: "empty selector".to_string(),
        });
    }
    if let Some((position, _)) = tokens.get(MAX_TOKENS) {
        return Err(SelectorError::Syntax {
            position: *position,
            message: format!("selector is longer than {} tokens", MAX_TOKENS),
        });
    }

    let mut parser = Parser {
        tokens,
        index: 0,
        source_len: source.len(),
        depth: 0,
    };
    let expr = parser.parse_or()?;
    if let Some((position, token)) = parser.tokens.get(parser.index) {
        return Err(SelectorError::Syntax {
            position: *position,
            message: format!("unexpected {:?}", token),
        });
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    index: usize,
    source_len: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index).map(|(_, t)| t)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.index + offset).map(|(_, t)| t)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.index)
            .map(|(p, _)| *p)
            .unwrap_or(self.source_len)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).map(|(_, t)| t.clone());
        self.index += 1;
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), SelectorError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {:?}", expected)))
        }
    }

    fn error(&self, message: String) -> SelectorError {
        SelectorError::Syntax {
            position: self.position(),
            message,
        }
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, SelectorError>,
    ) -> Result<T, SelectorError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(format!(
                "expression nested deeper than {} levels",
                MAX_NESTING
            )));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_or(&mut self) -> Result<Expr, SelectorError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::Or) {
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, SelectorError> {
        let mut lhs = self.parse_equality()?;
        while self.eat(&Token::And) {
            let rhs = self.parse_equality()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, SelectorError> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => CompareOp::Eq,
                Some(Token::NotEq) => CompareOp::NotEq,
                _ => return Ok(lhs),
            };
            self.index += 1;
            let rhs = self.parse_relational()?;
            lhs = Expr::Compare(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_relational(&mut self) -> Result<Expr, SelectorError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => CompareOp::Lt,
                Some(Token::Le) => CompareOp::Le,
                Some(Token::Gt) => CompareOp::Gt,
                Some(Token::Ge) => CompareOp::Ge,
                _ => return Ok(lhs),
            };
            self.index += 1;
            let rhs = self.parse_additive()?;
            lhs = Expr::Compare(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, SelectorError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithmeticOp::Add,
                Some(Token::Minus) => ArithmeticOp::Subtract,
                _ => return Ok(lhs),
            };
            self.index += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Arithmetic(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, SelectorError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Multiply) => ArithmeticOp::Multiply,
                Some(Token::Div) => ArithmeticOp::Divide,
                Some(Token::Mod) => ArithmeticOp::Modulo,
                _ => return Ok(lhs),
            };
            self.index += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Arithmetic(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, SelectorError> {
        if self.eat(&Token::Minus) {
            let operand = self.nested(Self::parse_unary)?;
            return Ok(Expr::Negate(Box::new(operand)));
        }
        self.parse_union()
    }

    fn parse_union(&mut self) -> Result<Expr, SelectorError> {
        let mut lhs = self.parse_path_expr()?;
        while self.eat(&Token::Pipe) {
            let rhs = self.parse_path_expr()?;
            lhs = Expr::Union(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn starts_primary(&self) -> bool {
        match self.peek() {
            Some(Token::LeftParen) | Some(Token::Literal(_)) | Some(Token::Number(_)) => true,
            Some(Token::Name(name)) => {
                self.peek_at(1) == Some(&Token::LeftParen) && !is_node_type(name)
            }
            _ => false,
        }
    }

    fn parse_path_expr(&mut self) -> Result<Expr, SelectorError> {
        if !self.starts_primary() {
            return Ok(Expr::Path(self.parse_location_path()?));
        }

        let primary = self.parse_primary()?;
        let predicates = self.parse_predicates()?;
        let mut steps = Vec::new();
        loop {
            if self.eat(&Token::Slash) {
                steps.push(self.parse_step()?);
            } else if self.eat(&Token::DoubleSlash) {
                steps.push(Step::any_descendant_or_self());
                steps.push(self.parse_step()?);
            } else {
                break;
            }
        }

        if predicates.is_empty() && steps.is_empty() {
            Ok(primary)
        } else {
            Ok(Expr::Filter {
                primary: Box::new(primary),
                predicates,
                steps,
            })
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, SelectorError> {
        match self.advance() {
            Some(Token::LeftParen) => {
                let inner = self.nested(Self::parse_or)?;
                self.expect(&Token::RightParen)?;
                Ok(inner)
            }
            Some(Token::Literal(text)) => Ok(Expr::Literal(text)),
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Name(name)) => {
                let function = Function::from_name(&name)
                    .ok_or_else(|| SelectorError::UnknownFunction(name.clone()))?;
                self.expect(&Token::LeftParen)?;
                let mut args = Vec::new();
                if !self.eat(&Token::RightParen) {
                    loop {
                        args.push(self.nested(Self::parse_or)?);
                        if self.eat(&Token::Comma) {
                            continue;
                        }
                        self.expect(&Token::RightParen)?;
                        break;
                    }
                }
                let (min, max) = function.arity();
                if args.len() < min || max.is_some_and(|max| args.len() > max) {
                    return Err(SelectorError::Arity {
                        function: name,
                        found: args.len(),
                    });
                }
                Ok(Expr::Function(function, args))
            }
            _ => {
                self.index = self.index.saturating_sub(1);
                Err(self.error("expected expression".to_string()))
            }
        }
    }

    fn parse_predicates(&mut self) -> Result<Vec<Expr>, SelectorError> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LeftBracket) {
            predicates.push(self.nested(Self::parse_or)?);
            self.expect(&Token::RightBracket)?;
        }
        Ok(predicates)
    }

    fn parse_location_path(&mut self) -> Result<LocationPath, SelectorError> {
        let mut steps = Vec::new();
        let absolute = match self.peek() {
            Some(Token::Slash) => {
                self.index += 1;
                // A lone "/" selects the document node
                if !self.starts_step() {
                    return Ok(LocationPath {
                        absolute: true,
                        steps,
                    });
                }
                true
            }
            Some(Token::DoubleSlash) => {
                self.index += 1;
                steps.push(Step::any_descendant_or_self());
                true
            }
            _ => false,
        };

        steps.push(self.parse_step()?);
        loop {
            if self.eat(&Token::Slash) {
                steps.push(self.parse_step()?);
            } else if self.eat(&Token::DoubleSlash) {
                steps.push(Step::any_descendant_or_self());
                steps.push(self.parse_step()?);
            } else {
                break;
            }
        }

        Ok(LocationPath { absolute, steps })
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Name(_))
                | Some(Token::Star)
                | Some(Token::At)
                | Some(Token::Dot)
                | Some(Token::DotDot)
        )
    }

    fn parse_step(&mut self) -> Result<Step, SelectorError> {
        if self.eat(&Token::Dot) {
            return Ok(Step {
                axis: Axis::SelfAxis,
                test: NodeTest::Node,
                predicates: self.parse_predicates()?,
            });
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step {
                axis: Axis::Parent,
                test: NodeTest::Node,
                predicates: self.parse_predicates()?,
            });
        }

        let mut axis = Axis::Child;
        if self.eat(&Token::At) {
            axis = Axis::Attribute;
        } else if let (Some(Token::Name(name)), Some(Token::DoubleColon)) =
            (self.peek(), self.peek_at(1))
        {
            let name = name.clone();
            axis = Axis::from_name(&name)
                .ok_or_else(|| self.error(format!("unsupported axis '{}'", name)))?;
            self.index += 2;
        }

        let test = match self.advance() {
            Some(Token::Star) => NodeTest::Wildcard,
            Some(Token::Name(name)) if self.peek() == Some(&Token::LeftParen) => {
                let test = match name.as_str() {
                    "text" => NodeTest::Text,
                    "node" => NodeTest::Node,
                    "comment" => NodeTest::Comment,
                    _ => {
                        self.index = self.index.saturating_sub(1);
                        return Err(self.error(format!("unexpected function '{}' in path", name)));
                    }
                };
                self.expect(&Token::LeftParen)?;
                self.expect(&Token::RightParen)?;
                test
            }
            Some(Token::Name(name)) => NodeTest::Name(name),
            _ => {
                self.index = self.index.saturating_sub(1);
                return Err(self.error("expected node test".to_string()));
            }
        };

        Ok(Step {
            axis,
            test,
            predicates: self.parse_predicates()?,
        })
    }
}

fn is_node_type(name: &str) -> bool {
    matches!(name, "text" | "node" | "comment" | "processing-instruction")
}
