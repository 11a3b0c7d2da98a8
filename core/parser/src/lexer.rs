//! FILENAME: core/parser/src/lexer.rs
//! PURPOSE: Scans a formula string into an infix-ordered node tree.
//! CONTEXT: This is the first stage of the pipeline. Lexing and structural
//! parsing happen in the same forward pass: the scanner is a push-down state
//! machine that "sinks" into a fresh frame at every `(` (group or method
//! arguments) and "rises" back out at the matching `)`, handing the finished
//! inner sequence to a continuation that attaches it to its owner.
//!
//! STATE: one scan step at a time over `index`. `mode` says which sub-scanner
//! consumes the next character; `resolve` is the sequence built at the current
//! depth and `frames` holds the suspended outer levels. The node produced last
//! at a depth is always `resolve.last()`.
//!
//! POSITION RULES:
//! - An operand (number, group, variable, method) may start an expression,
//!   follow an Operator, or follow a Comma inside a method argument list.
//! - An operator must follow a Number, Group, Variable or Method. A leading
//!   `+`/`-` in operand position is a numeric sign instead.
//! - Strings may only start an expression or a method argument.

use crate::ast::{Node, NodeKind, NodeType};
use crate::error::{FormulaError, FormulaResult};
use crate::token::{is_name_char, is_operator_char, CharClass, Operator};
use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use once_cell::sync::Lazy;
use regex::Regex;
use std::mem;
use std::str::FromStr;

static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([1-9][0-9]*|0)?(\.\d*)?(e[+-]?\d+)?$").unwrap()
});

/// Which sub-scanner owns the next character.
#[derive(Debug)]
enum Mode {
    Base,
    Number(NumberScan),
    Operator { origin: usize, symbol: String },
    Text { origin: usize, quote: char, content: String },
    Variable { origin: usize, key: String },
    MethodName { origin: usize, name: String },
    /// A group body was attached; the `)` itself is still pending.
    GroupClose,
    /// Method params were attached; the `)` itself is still pending.
    MethodClose { name: String },
}

/// How a suspended frame takes back the sequence built one level deeper.
#[derive(Debug)]
enum Resume {
    Group { origin: usize },
    Method { origin: usize, name: String },
}

#[derive(Debug)]
struct Frame {
    depth: usize,
    resolve: Vec<Node>,
    resume: Resume,
}

#[derive(Debug)]
struct NumberScan {
    origin: usize,
    /// Set when the scan started from a `+`/`-` in operand position.
    sign: Option<Operator>,
    literal: String,
    has_decimal: bool,
    is_scientific: bool,
}

impl NumberScan {
    fn new(origin: usize, sign: Option<Operator>) -> Self {
        NumberScan {
            origin,
            sign,
            literal: String::new(),
            has_decimal: false,
            is_scientific: false,
        }
    }

    /// Validates the accumulated literal and converts it to an exact decimal.
    fn finish(&self) -> FormulaResult<BigDecimal> {
        let literal = self.literal.as_str();
        if !NUMBER_PATTERN.is_match(literal) {
            return Err(FormulaError::InvalidToken);
        }

        // The pattern admits an empty mantissa (`e5`, `.`); a number needs a digit before `e`.
        let mantissa = literal.split('e').next().unwrap_or_default();
        if !mantissa.chars().any(|c| c.is_ascii_digit()) {
            return Err(FormulaError::InvalidToken);
        }

        let mut canonical = String::with_capacity(literal.len() + 2);
        if self.sign == Some(Operator::Subtract) {
            canonical.push('-');
        }
        if mantissa.starts_with('.') {
            canonical.push('0');
        }
        canonical.push_str(mantissa.strip_suffix('.').unwrap_or(mantissa));
        if let Some(exponent) = literal.split('e').nth(1) {
            canonical.push('e');
            canonical.push_str(exponent);
        }

        let value = BigDecimal::from_str(&canonical).map_err(|_| FormulaError::InvalidToken)?;
        match value.to_f64() {
            Some(approx) if !approx.is_finite() => Err(FormulaError::WillBeInfinity),
            // Too small for a double; the literal reads as zero.
            Some(approx) if approx == 0.0 => Ok(BigDecimal::zero()),
            Some(_) => Ok(value),
            None => Err(FormulaError::WillBeInfinity),
        }
    }
}

/// The scanner. Consumed by `tokenize`, which returns the top-level sequence.
pub struct Tokenizer<'a> {
    text: &'a str,
    index: usize,
    depth: usize,
    resolve: Vec<Node>,
    mode: Mode,
    frames: Vec<Frame>,
    completed: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Tokenizer {
            text,
            index: 0,
            depth: 0,
            resolve: Vec::new(),
            mode: Mode::Base,
            frames: Vec::new(),
            completed: false,
        }
    }

    /// Runs the scan to completion and returns the infix-ordered top level.
    pub fn tokenize(mut self) -> FormulaResult<Vec<Node>> {
        while !self.completed {
            self.step()?;
        }
        Ok(self.resolve)
    }

    fn step(&mut self) -> FormulaResult<()> {
        let ch = self.peek();
        match mem::replace(&mut self.mode, Mode::Base) {
            Mode::Base => self.scan_base(ch),
            Mode::Number(scan) => self.scan_number(scan, ch),
            Mode::Operator { origin, symbol } => self.scan_operator(origin, symbol, ch),
            Mode::Text {
                origin,
                quote,
                content,
            } => self.scan_text(origin, quote, content, ch),
            Mode::Variable { origin, key } => self.scan_variable(origin, key, ch),
            Mode::MethodName { origin, name } => self.scan_method_name(origin, name, ch),
            Mode::GroupClose => match ch {
                Some(')') => {
                    self.index += 1;
                    Ok(())
                }
                _ => Err(FormulaError::UnexpectedGroupEnd),
            },
            Mode::MethodClose { name } => match ch {
                Some(')') => {
                    self.index += 1;
                    Ok(())
                }
                _ => Err(FormulaError::NotCalled(name)),
            },
        }
    }

    // ----- scan position helpers -----

    fn peek(&self) -> Option<char> {
        self.text[self.index..].chars().next()
    }

    fn advance(&mut self, ch: char) {
        self.index += ch.len_utf8();
    }

    fn last(&self) -> Option<&Node> {
        self.resolve.last()
    }

    /// Nothing has been produced yet at this depth.
    fn is_begin(&self) -> bool {
        self.resolve.is_empty()
    }

    /// The last node at this depth has one of the given types.
    fn is_behind(&self, ty: NodeType) -> bool {
        self.last().is_some_and(|node| node.node_type().intersects(ty))
    }

    /// The construct that opened this depth has one of the given types.
    fn is_in(&self, ty: NodeType) -> bool {
        self.depth > 0
            && self
                .frames
                .last()
                .and_then(|frame| frame.resolve.last())
                .is_some_and(|owner| owner.node_type().intersects(ty))
    }

    fn is_operand_position(&self) -> bool {
        self.is_begin()
            || self.is_behind(NodeType::OPERATOR)
            || (self.is_in(NodeType::METHOD) && self.is_behind(NodeType::COMMA))
    }

    fn push(&mut self, node: Node) {
        self.resolve.push(node);
        self.mode = Mode::Base;
    }

    /// Suspends the current level and starts an empty one beneath it.
    fn sink(&mut self, resume: Resume) {
        self.frames.push(Frame {
            depth: self.depth,
            resolve: mem::take(&mut self.resolve),
            resume,
        });
        self.depth += 1;
        self.mode = Mode::Base;
    }

    /// Restores the enclosing level and lets its continuation adopt `inner`.
    fn rise(&mut self) -> FormulaResult<()> {
        let inner = mem::take(&mut self.resolve);
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| FormulaError::UnexpectedToken(")".to_string()))?;
        self.depth = frame.depth;
        self.resolve = frame.resolve;

        // Span runs through the pending `)`, or to the end of text if there is none.
        let end = match self.peek() {
            Some(c) => self.index + c.len_utf8(),
            None => self.text.len(),
        };

        match frame.resume {
            Resume::Group { origin } => {
                let chars = self.text[origin..end].to_string();
                if let Some(owner) = self.resolve.last_mut() {
                    owner.chars = chars;
                    owner.kind = NodeKind::Group(inner);
                }
                self.mode = Mode::GroupClose;
            }
            Resume::Method { origin, name } => {
                let params = self.split_params(inner)?;
                let chars = self.text[origin..end].to_string();
                if let Some(owner) = self.resolve.last_mut() {
                    owner.chars = chars;
                    owner.kind = NodeKind::Method {
                        name: name.clone(),
                        params,
                    };
                }
                self.mode = Mode::MethodClose { name };
            }
        }
        Ok(())
    }

    /// Splits a flat argument run on commas. A multi-node run becomes a Group
    /// spanning exactly that run.
    fn split_params(&self, inner: Vec<Node>) -> FormulaResult<Vec<Node>> {
        let mut params = Vec::new();
        let mut run: Vec<Node> = Vec::new();
        let mut saw_comma = false;

        for node in inner {
            if node.is_comma() {
                if run.is_empty() {
                    return Err(FormulaError::UnexpectedToken(",".to_string()));
                }
                params.push(self.wrap_run(mem::take(&mut run)));
                saw_comma = true;
            } else {
                run.push(node);
            }
        }

        if !run.is_empty() {
            params.push(self.wrap_run(run));
        } else if saw_comma {
            return Err(FormulaError::UnexpectedToken(",".to_string()));
        }
        Ok(params)
    }

    fn wrap_run(&self, mut run: Vec<Node>) -> Node {
        if run.len() == 1 {
            if let Some(node) = run.pop() {
                return node;
            }
        }
        let start = run.first().map_or(0, |n| n.index);
        let end = run.last().map_or(start, |n| n.index + n.chars.len());
        Node::new_group(start, &self.text[start..end], run)
    }

    // ----- sub-scanners -----

    fn scan_base(&mut self, ch: Option<char>) -> FormulaResult<()> {
        match CharClass::of(ch) {
            CharClass::End => {
                if !self.frames.is_empty() {
                    return self.rise();
                }
                if self.is_begin() || self.is_behind(NodeType::OPERATOR) {
                    return Err(FormulaError::UnexpectedEnd);
                }
                self.completed = true;
            }
            CharClass::Space(c) => self.advance(c),
            CharClass::GroupStart => {
                if !self.is_operand_position() {
                    return Err(match self.last() {
                        Some(last) => FormulaError::NotAFunction(last.chars.clone()),
                        None => FormulaError::UnexpectedToken("(".to_string()),
                    });
                }
                let origin = self.index;
                self.resolve.push(Node::new_group(origin, "()", Vec::new()));
                self.index += 1;
                self.sink(Resume::Group { origin });
            }
            CharClass::GroupEnd => {
                if !self.is_in(NodeType::GROUP | NodeType::METHOD)
                    || self.is_behind(NodeType::OPERATOR)
                {
                    return Err(FormulaError::UnexpectedToken(")".to_string()));
                }
                if self.is_in(NodeType::GROUP) && self.is_begin() {
                    return Err(FormulaError::GroupEmpty);
                }
                return self.rise();
            }
            CharClass::Digit(_) | CharClass::DecimalPoint => {
                if !self.is_operand_position() {
                    return Err(FormulaError::UnexpectedType("number".to_string()));
                }
                self.mode = Mode::Number(NumberScan::new(self.index, None));
            }
            CharClass::Operator(_) => {
                self.mode = Mode::Operator {
                    origin: self.index,
                    symbol: String::new(),
                };
            }
            CharClass::Quote(quote) => {
                if self.is_behind(NodeType::OPERATOR) {
                    return Err(FormulaError::StringFollowOperator);
                }
                let origin = self.index;
                self.advance(quote);
                self.mode = Mode::Text {
                    origin,
                    quote,
                    content: String::new(),
                };
            }
            CharClass::VariableStart => {
                if !self.is_operand_position() {
                    return Err(FormulaError::UnexpectedToken("{".to_string()));
                }
                let origin = self.index;
                self.index += 1;
                self.mode = Mode::Variable {
                    origin,
                    key: String::new(),
                };
            }
            CharClass::MethodStart => {
                if !self.is_operand_position() {
                    return Err(FormulaError::UnexpectedToken("$".to_string()));
                }
                let origin = self.index;
                self.index += 1;
                self.mode = Mode::MethodName {
                    origin,
                    name: String::new(),
                };
            }
            CharClass::Comma => {
                if !self.is_in(NodeType::METHOD) || self.is_behind(NodeType::OPERATOR) {
                    return Err(FormulaError::UnexpectedToken(",".to_string()));
                }
                self.push(Node::new_comma(self.index));
                self.index += 1;
            }
            // A bare exponent is scanned as a number so it fails as a malformed literal.
            CharClass::Other('e') if self.is_operand_position() => {
                self.mode = Mode::Number(NumberScan::new(self.index, None));
            }
            CharClass::Other(c) => return Err(FormulaError::UnexpectedToken(c.to_string())),
        }
        Ok(())
    }

    fn scan_number(&mut self, mut scan: NumberScan, ch: Option<char>) -> FormulaResult<()> {
        match ch {
            Some(c) if c.is_ascii_digit() => scan.literal.push(c),
            Some('.') => {
                if scan.has_decimal || scan.is_scientific {
                    return Err(FormulaError::UnexpectedType("number".to_string()));
                }
                scan.has_decimal = true;
                scan.literal.push('.');
            }
            Some('e') => {
                if scan.is_scientific {
                    return Err(FormulaError::InvalidToken);
                }
                scan.is_scientific = true;
                scan.literal.push('e');
            }
            Some(c @ ('+' | '-')) if scan.literal.ends_with('e') => scan.literal.push(c),
            _ => {
                if scan.literal.is_empty() {
                    // A sign with nothing numeric after it.
                    return Err(match (ch, scan.sign) {
                        (None, _) => FormulaError::UnexpectedEnd,
                        (Some(_), Some(sign)) => FormulaError::UnexpectedToken(sign.to_string()),
                        (Some(c), None) => FormulaError::UnexpectedToken(c.to_string()),
                    });
                }
                let value = scan.finish()?;
                let text = self.text;
                let chars = &text[scan.origin..self.index];
                self.push(Node::new_number(scan.origin, chars, value));
                return Ok(());
            }
        }

        // Only ASCII reaches here.
        self.index += 1;
        self.mode = Mode::Number(scan);
        Ok(())
    }

    fn scan_operator(
        &mut self,
        origin: usize,
        mut symbol: String,
        ch: Option<char>,
    ) -> FormulaResult<()> {
        if let Some(c) = ch.filter(|c| is_operator_char(*c)) {
            symbol.push(c);
            self.index += 1;
            self.mode = Mode::Operator { origin, symbol };
            return Ok(());
        }

        let Some(op) = Operator::from_symbol(&symbol) else {
            return Err(FormulaError::UnexpectedToken(symbol));
        };

        if op.is_sign() && self.is_operand_position() {
            self.mode = Mode::Number(NumberScan::new(origin, Some(op)));
        } else if self.is_behind(
            NodeType::NUMBER | NodeType::GROUP | NodeType::VARIABLE | NodeType::METHOD,
        ) {
            self.push(Node::new_operator(origin, symbol, op));
        } else {
            return Err(FormulaError::UnexpectedToken(symbol));
        }
        Ok(())
    }

    fn scan_text(
        &mut self,
        origin: usize,
        quote: char,
        mut content: String,
        ch: Option<char>,
    ) -> FormulaResult<()> {
        let Some(c) = ch else {
            return Err(FormulaError::UnexpectedEnd);
        };
        self.advance(c);

        if c != quote {
            content.push(c);
            self.mode = Mode::Text {
                origin,
                quote,
                content,
            };
            return Ok(());
        }

        if self.is_begin() || (self.is_in(NodeType::METHOD) && self.is_behind(NodeType::COMMA)) {
            let text = self.text;
            self.push(Node::new_text(origin, &text[origin..self.index], content));
            Ok(())
        } else if self.is_behind(NodeType::OPERATOR) {
            Err(FormulaError::StringFollowOperator)
        } else {
            Err(FormulaError::UnexpectedType("string".to_string()))
        }
    }

    fn scan_variable(
        &mut self,
        origin: usize,
        mut key: String,
        ch: Option<char>,
    ) -> FormulaResult<()> {
        match ch {
            None => Err(FormulaError::UnexpectedEnd),
            Some('}') => {
                if key.is_empty() {
                    return Err(FormulaError::VariableNameEmpty);
                }
                self.index += 1;
                let text = self.text;
                self.push(Node::new_variable(origin, &text[origin..self.index], key));
                Ok(())
            }
            Some(c) => {
                key.push(c);
                self.advance(c);
                self.mode = Mode::Variable { origin, key };
                Ok(())
            }
        }
    }

    fn scan_method_name(
        &mut self,
        origin: usize,
        mut name: String,
        ch: Option<char>,
    ) -> FormulaResult<()> {
        match ch {
            Some('(') => {
                if name.is_empty() {
                    return Err(FormulaError::FunctionNameEmpty);
                }
                self.resolve
                    .push(Node::new_method(origin, name.clone(), name.clone(), Vec::new()));
                self.index += 1;
                self.sink(Resume::Method { origin, name });
                Ok(())
            }
            Some(c) if is_name_char(c) => {
                name.push(c);
                self.advance(c);
                self.mode = Mode::MethodName { origin, name };
                Ok(())
            }
            _ if name.is_empty() => Err(FormulaError::UnexpectedToken("$".to_string())),
            _ => Err(FormulaError::NotCalled(name)),
        }
    }
}

/// Convenience function to scan a formula without the prefix rewrite.
pub fn tokenize(text: &str) -> FormulaResult<Vec<Node>> {
    Tokenizer::new(text).tokenize()
}
