//! FILENAME: core/parser/src/ast.rs
//! PURPOSE: Defines the node model shared by the tokenizer, the prefix rewrite
//! and the evaluator.
//! CONTEXT: The tokenizer produces a flat, infix-ordered sequence of `Node`s per
//! nesting level (groups and method calls own their nested sequences). The
//! rewrite in `parser.rs` reorders every level into prefix order, and the
//! evaluator walks that order with a value stack.
//!
//! Every node keeps the byte offset and the exact source text it came from, so
//! errors raised late (during evaluation) can still point at the formula.
//!
//! NODE TYPES are bit flags: a single node has exactly one bit set, while a
//! method signature may declare a union (`TEXT | NUMBER`). Checks are
//! intersections.

use crate::token::Operator;
use bigdecimal::BigDecimal;
use bitflags::bitflags;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Type tag of a node, also used as a type declaration in plugin signatures.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct NodeType: u16 {
        const TEXT = 1;
        const NUMBER = 1 << 1;
        const BOOLEAN = 1 << 2;
        const DATETIME = 1 << 3;
        const GROUP = 1 << 4;
        const OPERATOR = 1 << 5;
        const COMMA = 1 << 6;
        const VARIABLE = 1 << 7;
        const METHOD = 1 << 8;

        /// Any scalar value.
        const VALUE = Self::TEXT.bits()
            | Self::NUMBER.bits()
            | Self::BOOLEAN.bits()
            | Self::DATETIME.bits();
    }
}

impl NodeType {
    /// Returns true if a node of type `actual` satisfies this declaration.
    pub fn accepts(self, actual: NodeType) -> bool {
        self.intersects(actual)
    }
}

/// Renders a type the way error messages spell it: `string or number`.
impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(NodeType, &str); 9] = [
            (NodeType::TEXT, "string"),
            (NodeType::NUMBER, "number"),
            (NodeType::BOOLEAN, "boolean"),
            (NodeType::DATETIME, "date"),
            (NodeType::GROUP, "group"),
            (NodeType::OPERATOR, "operator"),
            (NodeType::COMMA, "comma"),
            (NodeType::VARIABLE, "variable"),
            (NodeType::METHOD, "method"),
        ];

        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    write!(f, " or ")?;
                }
                write!(f, "{}", name)?;
                first = false;
            }
        }
        if first {
            write!(f, "unknown")?;
        }
        Ok(())
    }
}

/// A resolved scalar: what literals, variables, operators and methods produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Text(String),
    Number(BigDecimal),
    Boolean(bool),
    Datetime(NaiveDateTime),
}

impl Value {
    /// The single-bit type tag matching this value.
    pub fn node_type(&self) -> NodeType {
        match self {
            Value::Text(_) => NodeType::TEXT,
            Value::Number(_) => NodeType::NUMBER,
            Value::Boolean(_) => NodeType::BOOLEAN,
            Value::Datetime(_) => NodeType::DATETIME,
        }
    }

    pub fn as_number(&self) -> Option<&BigDecimal> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&NaiveDateTime> {
        match self {
            Value::Datetime(d) => Some(d),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Number(n) => write!(f, "{}", n.normalized()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Datetime(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(BigDecimal::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(BigDecimal::from(value))
    }
}

impl From<BigDecimal> for Value {
    fn from(value: BigDecimal) -> Self {
        Value::Number(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Datetime(value)
    }
}

/// One element of a formula tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Byte offset of the node in the (trimmed) formula text.
    pub index: usize,
    /// The exact source text that produced this node.
    pub chars: String,
    pub kind: NodeKind,
}

/// Variant-specific content of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Text, Number, Boolean or Datetime.
    Value(Value),
    /// A parenthesized sub-expression. Never empty once scanned.
    Group(Vec<Node>),
    Operator(Operator),
    /// Structural marker between method arguments; never survives into `params`.
    Comma,
    Variable(String),
    Method { name: String, params: Vec<Node> },
}

impl Node {
    pub fn new_value(index: usize, chars: impl Into<String>, value: Value) -> Self {
        Node {
            index,
            chars: chars.into(),
            kind: NodeKind::Value(value),
        }
    }

    pub fn new_text(index: usize, chars: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new_value(index, chars, Value::Text(value.into()))
    }

    pub fn new_number(index: usize, chars: impl Into<String>, value: BigDecimal) -> Self {
        Self::new_value(index, chars, Value::Number(value))
    }

    pub fn new_boolean(index: usize, chars: impl Into<String>, value: bool) -> Self {
        Self::new_value(index, chars, Value::Boolean(value))
    }

    pub fn new_datetime(index: usize, chars: impl Into<String>, value: NaiveDateTime) -> Self {
        Self::new_value(index, chars, Value::Datetime(value))
    }

    pub fn new_group(index: usize, chars: impl Into<String>, body: Vec<Node>) -> Self {
        Node {
            index,
            chars: chars.into(),
            kind: NodeKind::Group(body),
        }
    }

    pub fn new_operator(index: usize, chars: impl Into<String>, op: Operator) -> Self {
        Node {
            index,
            chars: chars.into(),
            kind: NodeKind::Operator(op),
        }
    }

    pub fn new_comma(index: usize) -> Self {
        Node {
            index,
            chars: ",".to_string(),
            kind: NodeKind::Comma,
        }
    }

    pub fn new_variable(index: usize, chars: impl Into<String>, key: impl Into<String>) -> Self {
        Node {
            index,
            chars: chars.into(),
            kind: NodeKind::Variable(key.into()),
        }
    }

    pub fn new_method(
        index: usize,
        chars: impl Into<String>,
        name: impl Into<String>,
        params: Vec<Node>,
    ) -> Self {
        Node {
            index,
            chars: chars.into(),
            kind: NodeKind::Method {
                name: name.into(),
                params,
            },
        }
    }

    /// The single-bit type tag of this node.
    pub fn node_type(&self) -> NodeType {
        match &self.kind {
            NodeKind::Value(value) => value.node_type(),
            NodeKind::Group(_) => NodeType::GROUP,
            NodeKind::Operator(_) => NodeType::OPERATOR,
            NodeKind::Comma => NodeType::COMMA,
            NodeKind::Variable(_) => NodeType::VARIABLE,
            NodeKind::Method { .. } => NodeType::METHOD,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self.kind, NodeKind::Value(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group(_))
    }

    pub fn is_operator(&self) -> bool {
        matches!(self.kind, NodeKind::Operator(_))
    }

    pub fn is_comma(&self) -> bool {
        matches!(self.kind, NodeKind::Comma)
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.kind, NodeKind::Variable(_))
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, NodeKind::Method { .. })
    }

    pub fn as_value(&self) -> Option<&Value> {
        match &self.kind {
            NodeKind::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_operator(&self) -> Option<Operator> {
        match self.kind {
            NodeKind::Operator(op) => Some(op),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self.kind {
            NodeKind::Value(value) => Some(value),
            _ => None,
        }
    }
}
