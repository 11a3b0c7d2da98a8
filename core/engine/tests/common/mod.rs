//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for formula engine integration tests.

#![allow(dead_code)]

use bigdecimal::BigDecimal;
use formula_engine::{plugins, Formula, FormulaOptions, FormulaResult, TempVars, Value};
use std::str::FromStr;

/// Test harness wrapping a `Formula` and a set of temporary bindings.
pub struct TestHarness {
    pub formula: Formula,
    pub temp_vars: TempVars,
}

impl TestHarness {
    /// Create a harness with no plugins.
    pub fn new() -> Self {
        TestHarness {
            formula: Formula::new(),
            temp_vars: TempVars::new(),
        }
    }

    /// Create a harness with every built-in plugin registered.
    pub fn with_builtins() -> Self {
        let options = FormulaOptions::new().with_plugins(plugins::all());
        TestHarness {
            formula: Formula::with_options(options).expect("built-in plugins register"),
            temp_vars: TempVars::new(),
        }
    }

    /// Bind a temporary variable for subsequent calculations.
    pub fn bind(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.temp_vars.insert(name.to_string(), value.into());
        self
    }

    pub fn calc(&self, text: &str) -> FormulaResult<Value> {
        self.formula.calculate(text, &self.temp_vars)
    }

    /// Calculate and unwrap, panicking with the formula text on failure.
    pub fn value(&self, text: &str) -> Value {
        match self.calc(text) {
            Ok(value) => value,
            Err(err) => panic!("{} failed: {}", text, err),
        }
    }
}

pub fn num(text: &str) -> Value {
    Value::Number(BigDecimal::from_str(text).expect("valid decimal"))
}

pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}
