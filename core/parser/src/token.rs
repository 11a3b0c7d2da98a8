//! FILENAME: core/parser/src/token.rs
//! PURPOSE: Operator table and character classes for the formula tokenizer.
//! CONTEXT: The tokenizer dispatches on one character at a time. `CharClass`
//! is the result of that first look; `Operator` is what an operator run
//! resolves to once it ends.

use std::fmt;

/// The ten binary operators of the language.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Operator {
    // Comparison operators (lowest precedence)
    GreaterThan,  // >
    GreaterEqual, // >=
    LessThan,     // <
    LessEqual,    // <=
    Equal,        // ==
    NotEqual,     // !=

    // Arithmetic operators
    Add,      // +
    Subtract, // -
    Multiply, // *
    Divide,   // /
}

impl Operator {
    /// Resolves a scanned operator run. Returns None for unknown runs like `+*`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            ">" => Operator::GreaterThan,
            ">=" => Operator::GreaterEqual,
            "<" => Operator::LessThan,
            "<=" => Operator::LessEqual,
            "==" => Operator::Equal,
            "!=" => Operator::NotEqual,
            "+" => Operator::Add,
            "-" => Operator::Subtract,
            "*" => Operator::Multiply,
            "/" => Operator::Divide,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::GreaterThan => ">",
            Operator::GreaterEqual => ">=",
            Operator::LessThan => "<",
            Operator::LessEqual => "<=",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
        }
    }

    /// Binding weight: comparison 1, additive 2, multiplicative 3.
    pub fn weight(self) -> u8 {
        match self {
            Operator::GreaterThan
            | Operator::GreaterEqual
            | Operator::LessThan
            | Operator::LessEqual
            | Operator::Equal
            | Operator::NotEqual => 1,
            Operator::Add | Operator::Subtract => 2,
            Operator::Multiply | Operator::Divide => 3,
        }
    }

    pub fn is_comparison(self) -> bool {
        self.weight() == 1
    }

    /// `+` and `-` double as numeric signs in operand position.
    pub fn is_sign(self) -> bool {
        matches!(self, Operator::Add | Operator::Subtract)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// What the base dispatcher sees at the current scan position.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum CharClass {
    End,
    Space(char),
    GroupStart,
    GroupEnd,
    Digit(char),
    DecimalPoint,
    Operator(char),
    Quote(char),
    VariableStart,
    MethodStart,
    Comma,
    Other(char),
}

impl CharClass {
    pub fn of(ch: Option<char>) -> Self {
        match ch {
            None => CharClass::End,
            Some(c) if c.is_whitespace() => CharClass::Space(c),
            Some('(') => CharClass::GroupStart,
            Some(')') => CharClass::GroupEnd,
            Some(c) if c.is_ascii_digit() => CharClass::Digit(c),
            Some('.') => CharClass::DecimalPoint,
            Some(c) if is_operator_char(c) => CharClass::Operator(c),
            Some(c @ ('\'' | '"')) => CharClass::Quote(c),
            Some('{') => CharClass::VariableStart,
            Some('$') => CharClass::MethodStart,
            Some(',') => CharClass::Comma,
            Some(c) => CharClass::Other(c),
        }
    }
}

/// Characters an operator run is made of. `!` only appears inside `!=`.
pub fn is_operator_char(ch: char) -> bool {
    matches!(ch, '+' | '-' | '*' | '/' | '<' | '>' | '=' | '!')
}

/// Characters allowed in a method name after `$`.
pub fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
