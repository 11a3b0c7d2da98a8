//! FILENAME: core/engine/src/plugins/math.rs
//! PURPOSE: Math plugin: the number methods plus `$average`, `$fixed` and `{PI}`.
//! CONTEXT: Shares its number methods with the Arithmetic plugin. Registering
//! both keeps the first registration of each shared name.

use super::{count_arg, number, number_arg};
use crate::decimal;
use crate::plugin::{Plugin, PluginMethod, PluginVariable};
use bigdecimal::{BigDecimal, RoundingMode};
use formula_parser::{FormulaError, NodeType, Value};
use std::str::FromStr;

const PI: &str = "3.141592653589793";

/// Most fractional digits `$fixed` will render.
const MAX_FIXED_DIGITS: usize = 100;

pub fn math() -> Plugin {
    let mut plugin = Plugin::new("Math").methods(super::arithmetic::number_methods());

    plugin = plugin
        .method(
            PluginMethod::new("average", NodeType::NUMBER, |args| {
                let sum = decimal::add(number_arg(args, 0)?, number_arg(args, 1)?)?;
                Ok(number(decimal::div(&sum, &BigDecimal::from(2))?))
            })
            .describe("Mean of two numbers")
            .required("x", NodeType::NUMBER)
            .required("y", NodeType::NUMBER),
        )
        .method(
            PluginMethod::new("fixed", NodeType::TEXT, |args| {
                let value = number_arg(args, 0)?;
                let digits = count_arg(args, 1, "decimals")?;
                if digits > MAX_FIXED_DIGITS {
                    return Err(FormulaError::InvalidData("decimals".to_string()));
                }
                let scale = i64::try_from(digits)
                    .map_err(|_| FormulaError::InvalidData("decimals".to_string()))?;
                Ok(Value::Text(
                    value.with_scale_round(scale, RoundingMode::HalfUp).to_string(),
                ))
            })
            .describe("Fixed-point text with the given number of decimals")
            .required("value", NodeType::NUMBER)
            .required("decimals", NodeType::NUMBER),
        );

    if let Ok(pi) = BigDecimal::from_str(PI) {
        plugin = plugin.variable(PluginVariable::new("PI", NodeType::NUMBER, pi).describe("Pi"));
    }
    plugin
}
