//! FILENAME: core/parser/src/parser.rs
//! PURPOSE: Reorders scanned formulas into the prefix order the evaluator walks.
//! CONTEXT: The tokenizer yields infix sequences per nesting level. This module
//! rewrites every level (groups and method arguments included) with an
//! operator-weight stack, and offers a `Parser` that memoizes finished trees
//! per formula text.
//!
//! REWRITE: the sequence is walked right to left. Operands go straight to the
//! output. An incoming operator first moves held operators to the output while
//! the held one binds strictly tighter, then is held itself. Held operators are
//! flushed at the end. Walking from the right keeps equal weights
//! left-associative once the evaluator pops the left operand first.

use crate::ast::{Node, NodeKind};
use crate::error::FormulaResult;
use crate::lexer::Tokenizer;
use log::{debug, trace};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::sync::Arc;

/// Parses formula text into a prefix-ordered tree.
pub fn parse(text: &str) -> FormulaResult<Vec<Node>> {
    let nodes = Tokenizer::new(text.trim()).tokenize()?;
    Ok(infix_to_prefix(nodes))
}

/// Rewrites one infix level, recursing into nested sequences.
pub fn infix_to_prefix(nodes: Vec<Node>) -> Vec<Node> {
    let mut output = Vec::with_capacity(nodes.len());
    let mut held: Vec<Node> = Vec::new();

    for node in nodes.into_iter().rev() {
        match node.as_operator() {
            Some(op) => {
                while held
                    .last()
                    .and_then(Node::as_operator)
                    .is_some_and(|top| top.weight() > op.weight())
                {
                    if let Some(top) = held.pop() {
                        output.push(top);
                    }
                }
                held.push(node);
            }
            None => output.push(rewrite_nested(node)),
        }
    }

    while let Some(op) = held.pop() {
        output.push(op);
    }
    output
}

fn rewrite_nested(node: Node) -> Node {
    let Node { index, chars, kind } = node;
    let kind = match kind {
        NodeKind::Group(body) => NodeKind::Group(infix_to_prefix(body)),
        NodeKind::Method { name, params } => NodeKind::Method {
            name,
            params: rewrite_params(params),
        },
        other => other,
    };
    Node { index, chars, kind }
}

fn rewrite_params(params: Vec<Node>) -> Vec<Node> {
    params.into_iter().map(rewrite_nested).collect()
}

// ============================================================================
// CACHED PARSER
// ============================================================================

#[derive(Default)]
struct ParseCache {
    entries: FxHashMap<String, Arc<[Node]>>,
    /// Least recently used at the front.
    order: VecDeque<String>,
}

impl ParseCache {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }
}

/// Parser with a bounded least-recently-used cache keyed by formula text.
/// A capacity of zero disables caching.
pub struct Parser {
    capacity: usize,
    cache: Mutex<ParseCache>,
}

impl Parser {
    pub fn new(capacity: usize) -> Self {
        Parser {
            capacity,
            cache: Mutex::new(ParseCache::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached trees.
    pub fn len(&self) -> usize {
        self.cache.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut cache = self.cache.lock();
        cache.entries.clear();
        cache.order.clear();
    }

    /// Returns the prefix tree for `text`. Failures are never cached.
    pub fn parse(&self, text: &str) -> FormulaResult<Arc<[Node]>> {
        // Keyed on the trimmed text, which is all `parse` reads.
        let text = text.trim();
        if self.capacity == 0 {
            return parse(text).map(Arc::from);
        }

        {
            let mut cache = self.cache.lock();
            if let Some(tree) = cache.entries.get(text).cloned() {
                cache.touch(text);
                trace!("parse cache hit: {}", text);
                return Ok(tree);
            }
        }

        let tree: Arc<[Node]> = Arc::from(parse(text)?);

        let mut cache = self.cache.lock();
        if !cache.entries.contains_key(text) {
            while cache.entries.len() >= self.capacity {
                let Some(evicted) = cache.order.pop_front() else {
                    break;
                };
                cache.entries.remove(&evicted);
                debug!("parse cache evicted: {}", evicted);
            }
            cache.order.push_back(text.to_string());
        }
        cache.entries.insert(text.to_string(), Arc::clone(&tree));
        Ok(tree)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new(256)
    }
}
