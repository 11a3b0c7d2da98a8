//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Main library entry point for the formula engine.
//! CONTEXT: Re-exports public types and modules for use by other crates.

pub mod config;
pub mod decimal;
pub mod evaluator;
pub mod formula;
pub mod method_manager;
pub mod plugin;
pub mod plugins;
pub mod variable_manager;

// Re-export commonly used types at the crate root
pub use config::{FormulaOptions, DEFAULT_CACHE_CAPACITY};
pub use evaluator::{Evaluator, TempVars};
pub use formula::Formula;
pub use method_manager::MethodManager;
pub use plugin::{MethodFn, MethodInput, Plugin, PluginMethod, PluginVariable};
pub use variable_manager::VariableManager;

pub use formula_parser::{
    parse, ErrorCategory, FormulaError, FormulaResult, Node, NodeKind, NodeType, Operator, Value,
};
