//! FILENAME: core/parser/src/lib.rs
//! PURPOSE: Library root for the formula parser.
//! CONTEXT: This crate turns formula strings into prefix-ordered node trees
//! that the engine evaluates against registered methods and variables.
//!
//! PIPELINE: Formula String --> Tokenizer --> Infix Nodes --> Rewrite --> Prefix Nodes --> Evaluator
//!
//! SUPPORTED FEATURES:
//! - Numbers: 1, 0.5, .5, 1e3, 1.5e-3, signed -2 / +2 in operand position
//! - Strings: "text" or 'text' at expression or argument start
//! - Arithmetic: +, -, *, /
//! - Comparison: >, >=, <, <=, ==, !=
//! - Variables: {name}
//! - Method calls: $name(arg, arg)
//! - Parentheses for grouping

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

// Register the separate tests module
#[cfg(test)]
mod tests;

// Re-export commonly used types for convenience
pub use ast::{Node, NodeKind, NodeType, Value};
pub use error::{ErrorCategory, FormulaError, FormulaResult};
pub use lexer::{tokenize, Tokenizer};
pub use parser::{infix_to_prefix, parse, Parser};
pub use token::Operator;
