//! FILENAME: core/engine/src/plugins/mod.rs
//! PURPOSE: Built-in plugin library.
//! CONTEXT: These are ordinary plugins built on the public plugin contract;
//! the core does not special-case them. Hosts register the ones they want.

pub mod arithmetic;
pub mod datetime;
pub mod logic;
pub mod math;
pub mod text;

use crate::plugin::Plugin;
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::NaiveDateTime;
use formula_parser::{FormulaError, FormulaResult, NodeType, Value};

pub use arithmetic::arithmetic;
pub use datetime::datetime;
pub use logic::logic;
pub use math::math;
pub use text::text;

/// Every built-in plugin, in registration order.
pub fn all() -> Vec<Plugin> {
    vec![arithmetic(), logic(), text(), datetime(), math()]
}

// ============================================================================
// ARGUMENT ACCESS
// ============================================================================
// Arity and types are validated by the method registry before a callable
// runs; these helpers still fail cleanly if invoked directly.

fn arg(args: &[Value], index: usize) -> FormulaResult<&Value> {
    args.get(index)
        .ok_or(FormulaError::LeastNArgumentsIsRequired(index + 1))
}

fn mismatch(value: &Value, expected: NodeType) -> FormulaError {
    FormulaError::NotAssignableParameter {
        actual: value.node_type(),
        expected,
    }
}

pub(crate) fn number_arg(args: &[Value], index: usize) -> FormulaResult<&BigDecimal> {
    let value = arg(args, index)?;
    value.as_number().ok_or_else(|| mismatch(value, NodeType::NUMBER))
}

pub(crate) fn text_arg(args: &[Value], index: usize) -> FormulaResult<&str> {
    let value = arg(args, index)?;
    value.as_text().ok_or_else(|| mismatch(value, NodeType::TEXT))
}

pub(crate) fn boolean_arg(args: &[Value], index: usize) -> FormulaResult<bool> {
    let value = arg(args, index)?;
    value.as_boolean().ok_or_else(|| mismatch(value, NodeType::BOOLEAN))
}

pub(crate) fn datetime_arg(args: &[Value], index: usize) -> FormulaResult<&NaiveDateTime> {
    let value = arg(args, index)?;
    value
        .as_datetime()
        .ok_or_else(|| mismatch(value, NodeType::DATETIME))
}

/// A number argument truncated to an integer.
pub(crate) fn integer_arg(args: &[Value], index: usize, what: &str) -> FormulaResult<i64> {
    number_arg(args, index)?
        .with_scale(0)
        .to_i64()
        .ok_or_else(|| FormulaError::InvalidData(what.to_string()))
}

/// A non-negative integer argument usable as a count or position.
pub(crate) fn count_arg(args: &[Value], index: usize, what: &str) -> FormulaResult<usize> {
    let n = integer_arg(args, index, what)?;
    usize::try_from(n).map_err(|_| FormulaError::InvalidData(what.to_string()))
}

pub(crate) fn number(n: impl Into<BigDecimal>) -> Value {
    Value::Number(n.into())
}
