//! FILENAME: core/engine/src/plugins/arithmetic.rs
//! PURPOSE: Arithmetic plugin: the operator functions as methods plus `$number`.

use super::{number, number_arg};
use crate::decimal;
use crate::plugin::{Plugin, PluginMethod};
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDateTime;
use formula_parser::{FormulaError, FormulaResult, NodeType, Value};
use std::str::FromStr;

type NumberOp = fn(&BigDecimal, &BigDecimal) -> FormulaResult<BigDecimal>;
type Compare = fn(&BigDecimal, &BigDecimal) -> bool;

fn numeric(name: &str, description: &str, op: NumberOp) -> PluginMethod {
    PluginMethod::new(name, NodeType::NUMBER, move |args| {
        Ok(number(op(number_arg(args, 0)?, number_arg(args, 1)?)?))
    })
    .describe(description)
    .required("x", NodeType::NUMBER)
    .required("y", NodeType::NUMBER)
}

fn comparison(name: &str, description: &str, cmp: Compare) -> PluginMethod {
    PluginMethod::new(name, NodeType::BOOLEAN, move |args| {
        Ok(Value::Boolean(cmp(number_arg(args, 0)?, number_arg(args, 1)?)))
    })
    .describe(description)
    .required("x", NodeType::NUMBER)
    .required("y", NodeType::NUMBER)
}

/// Explicit conversion to a number. Text is parsed (blank text is zero),
/// booleans map to 1/0 and datetimes to epoch milliseconds.
pub fn to_number(value: &Value) -> FormulaResult<BigDecimal> {
    match value {
        Value::Number(n) => Ok(n.clone()),
        Value::Boolean(b) => Ok(BigDecimal::from(i32::from(*b))),
        Value::Datetime(d) => Ok(BigDecimal::from(epoch_millis(d))),
        Value::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(BigDecimal::zero());
            }
            BigDecimal::from_str(s)
                .map_err(|_| FormulaError::UnexpectedType("number".to_string()))
                .map(decimal::bound_scale)
                .and_then(decimal::ensure_finite)
        }
    }
}

fn epoch_millis(d: &NaiveDateTime) -> i64 {
    d.and_utc().timestamp_millis()
}

/// Methods shared by the Arithmetic and Math plugins.
pub(crate) fn number_methods() -> Vec<PluginMethod> {
    vec![
        numeric("add", "Sum of two numbers", decimal::add),
        numeric("minus", "Difference of two numbers", decimal::minus),
        numeric("multi", "Product of two numbers", decimal::multi),
        numeric("div", "Quotient of two numbers", decimal::div),
        numeric("pow", "x raised to the power y", decimal::pow),
        comparison("gte", "x >= y", decimal::gte),
        comparison("gt", "x > y", decimal::gt),
        comparison("lte", "x <= y", decimal::lte),
        comparison("lt", "x < y", decimal::lt),
        comparison("eq", "x == y", decimal::eq),
        comparison("neq", "x != y", decimal::neq),
        PluginMethod::new("number", NodeType::NUMBER, |args| {
            let value = args
                .first()
                .ok_or(FormulaError::LeastNArgumentsIsRequired(1))?;
            Ok(number(to_number(value)?))
        })
        .describe("Convert a value to a number")
        .optional("value", NodeType::VALUE),
    ]
}

pub fn arithmetic() -> Plugin {
    Plugin::new("Arithmetic").methods(number_methods())
}
