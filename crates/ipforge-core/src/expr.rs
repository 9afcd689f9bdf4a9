//! Integer expressions used by parameter defaults, bounds and widths.
//!
//! Grammar (usual precedence, left associative):
//!
//! ```text
//! expr  := term (('+' | '-') term)*
//! term  := unary (('*' | '/' | '%') unary)*
//! unary := '-' unary | atom
//! atom  := INT | IDENT | '`' IDENT | '(' expr ')'
//! ```
//!
//! Integers are decimal or `0x` hexadecimal and may contain `_` separators.
//! A leading backtick marks a Verilog macro reference; it is accepted and
//! dropped, so `` `IOB_DMA_SWREG_ADDR_W `` and `IOB_DMA_SWREG_ADDR_W` name the
//! same value.

use serde::{Deserialize, Serialize};

/// Error produced while parsing an expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at offset {position}")]
pub struct ParseError {
    pub position: usize,
    pub message: String,
}

/// Error produced while evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("undefined name '{0}'")]
    Undefined(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("arithmetic overflow")]
    Overflow,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinOp {
    fn apply(self, lhs: i64, rhs: i64) -> Result<i64, EvalError> {
        match self {
            BinOp::Add => lhs.checked_add(rhs).ok_or(EvalError::Overflow),
            BinOp::Sub => lhs.checked_sub(rhs).ok_or(EvalError::Overflow),
            BinOp::Mul => lhs.checked_mul(rhs).ok_or(EvalError::Overflow),
            BinOp::Div | BinOp::Rem if rhs == 0 => Err(EvalError::DivisionByZero),
            BinOp::Div => lhs.checked_div(rhs).ok_or(EvalError::Overflow),
            BinOp::Rem => lhs.checked_rem(rhs).ok_or(EvalError::Overflow),
        }
    }
}

/// Expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Literal(i64),
    Ident(String),
    Neg(Box<Node>),
    Binary {
        op: BinOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
}

impl Node {
    fn eval<F>(&self, lookup: &F) -> Result<i64, EvalError>
    where
        F: Fn(&str) -> Option<i64>,
    {
        match self {
            Node::Literal(v) => Ok(*v),
            Node::Ident(name) => lookup(name).ok_or_else(|| EvalError::Undefined(name.clone())),
            Node::Neg(inner) => inner.eval(lookup)?.checked_neg().ok_or(EvalError::Overflow),
            Node::Binary { op, lhs, rhs } => op.apply(lhs.eval(lookup)?, rhs.eval(lookup)?),
        }
    }

    fn collect_idents<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Node::Literal(_) => {}
            Node::Ident(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Node::Neg(inner) => inner.collect_idents(out),
            Node::Binary { lhs, rhs, .. } => {
                lhs.collect_idents(out);
                rhs.collect_idents(out);
            }
        }
    }
}

/// Serialized form of an expression: a bare integer or a source string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawExpr {
    Int(i64),
    Text(String),
}

/// A parsed integer expression that remembers its source text.
///
/// Equality compares the parsed tree, so `"2*16"` equals `"2 * 16"` but not
/// `"32"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawExpr", into = "RawExpr")]
pub struct Expr {
    source: String,
    node: Node,
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for Expr {}

impl Expr {
    /// Parse an expression from source text.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            end: source.len(),
        };
        let node = parser.expr()?;
        if let Some((offset, tok)) = parser.peek() {
            return Err(ParseError {
                position: offset,
                message: format!("unexpected {tok}"),
            });
        }
        Ok(Expr {
            source: source.trim().to_string(),
            node,
        })
    }

    /// An integer literal.
    pub fn literal(value: i64) -> Self {
        Expr {
            source: value.to_string(),
            node: Node::Literal(value),
        }
    }

    /// The source text as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed tree.
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Names referenced by the expression, in first-occurrence order.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.node.collect_idents(&mut out);
        out
    }

    /// The value when the expression is a plain integer literal.
    pub fn as_literal(&self) -> Option<i64> {
        match self.node {
            Node::Literal(v) => Some(v),
            _ => None,
        }
    }

    /// Evaluate with `lookup` resolving identifiers.
    pub fn eval<F>(&self, lookup: F) -> Result<i64, EvalError>
    where
        F: Fn(&str) -> Option<i64>,
    {
        self.node.eval(&lookup)
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::str::FromStr for Expr {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Expr::parse(s)
    }
}

impl TryFrom<RawExpr> for Expr {
    type Error = ParseError;

    fn try_from(raw: RawExpr) -> Result<Self, Self::Error> {
        match raw {
            RawExpr::Int(v) => Ok(Expr::literal(v)),
            RawExpr::Text(s) => Expr::parse(&s),
        }
    }
}

impl From<Expr> for RawExpr {
    fn from(expr: Expr) -> Self {
        match expr.node {
            Node::Literal(v) if expr.source == v.to_string() => RawExpr::Int(v),
            _ => RawExpr::Text(expr.source),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Int(i64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Int(v) => write!(f, "integer {v}"),
            Token::Ident(name) => write!(f, "identifier '{name}'"),
            Token::Op(c) => write!(f, "'{c}'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, ParseError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        match c {
            '0'..='9' => {
                let (radix, digits_start) =
                    if c == '0' && matches!(bytes.get(i + 1), Some(b'x') | Some(b'X')) {
                        (16, i + 2)
                    } else {
                        (10, i)
                    };
                i = digits_start;
                while i < bytes.len() && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                let digits: String = source[digits_start..i].chars().filter(|c| *c != '_').collect();
                let value = i64::from_str_radix(&digits, radix).map_err(|_| ParseError {
                    position: start,
                    message: format!("invalid integer literal '{}'", &source[start..i]),
                })?;
                tokens.push((start, Token::Int(value)));
            }
            '`' | 'a'..='z' | 'A'..='Z' | '_' => {
                let name_start = if c == '`' { i + 1 } else { i };
                i = name_start;
                while i < bytes.len() && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                if i == name_start || (bytes[name_start] as char).is_ascii_digit() {
                    return Err(ParseError {
                        position: start,
                        message: "expected identifier after '`'".to_string(),
                    });
                }
                tokens.push((start, Token::Ident(source[name_start..i].to_string())));
            }
            '+' | '-' | '*' | '/' | '%' => {
                tokens.push((start, Token::Op(c)));
                i += 1;
            }
            '(' => {
                tokens.push((start, Token::LParen));
                i += 1;
            }
            ')' => {
                tokens.push((start, Token::RParen));
                i += 1;
            }
            other => {
                return Err(ParseError {
                    position: start,
                    message: format!("unexpected character '{other}'"),
                })
            }
        }
    }

    Ok(tokens)
}

struct Parser<'t> {
    tokens: &'t [(usize, Token)],
    pos: usize,
    end: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> Option<(usize, &'t Token)> {
        self.tokens.get(self.pos).map(|(offset, tok)| (*offset, tok))
    }

    fn next_op(&mut self, ops: &[char]) -> Option<char> {
        match self.peek() {
            Some((_, Token::Op(c))) if ops.contains(c) => {
                self.pos += 1;
                Some(*c)
            }
            _ => None,
        }
    }

    fn expr(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.term()?;
        while let Some(c) = self.next_op(&['+', '-']) {
            let rhs = self.term()?;
            let op = if c == '+' { BinOp::Add } else { BinOp::Sub };
            lhs = Node::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.unary()?;
        while let Some(c) = self.next_op(&['*', '/', '%']) {
            let rhs = self.unary()?;
            let op = match c {
                '*' => BinOp::Mul,
                '/' => BinOp::Div,
                _ => BinOp::Rem,
            };
            lhs = Node::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Node, ParseError> {
        if self.next_op(&['-']).is_some() {
            return Ok(Node::Neg(Box::new(self.unary()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Node, ParseError> {
        let Some((offset, tok)) = self.peek() else {
            return Err(ParseError {
                position: self.end,
                message: "unexpected end of expression".to_string(),
            });
        };
        self.pos += 1;
        match tok {
            Token::Int(v) => Ok(Node::Literal(*v)),
            Token::Ident(name) => Ok(Node::Ident(name.clone())),
            Token::LParen => {
                let inner = self.expr()?;
                match self.peek() {
                    Some((_, Token::RParen)) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    Some((at, other)) => Err(ParseError {
                        position: at,
                        message: format!("expected ')', found {other}"),
                    }),
                    None => Err(ParseError {
                        position: self.end,
                        message: "unclosed '('".to_string(),
                    }),
                }
            }
            other => Err(ParseError {
                position: offset,
                message: format!("unexpected {other}"),
            }),
        }
    }
}
