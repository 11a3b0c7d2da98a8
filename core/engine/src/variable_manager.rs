//! FILENAME: core/engine/src/variable_manager.rs
//! PURPOSE: Registry of named, typed variables contributed by plugins.

use crate::plugin::PluginVariable;
use formula_parser::{FormulaError, FormulaResult, Value};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct VariableManager {
    variables: FxHashMap<String, PluginVariable>,
}

impl VariableManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a variable. Redeclaration and type mismatch are errors.
    pub fn add(&mut self, variable: PluginVariable) -> FormulaResult<()> {
        if self.has(&variable.name) {
            return Err(FormulaError::RedeclareVariable(variable.name));
        }
        let actual = variable.value.node_type();
        if !variable.ty.accepts(actual) {
            return Err(FormulaError::NotAssignableType {
                actual,
                expected: variable.ty,
            });
        }
        self.variables.insert(variable.name.clone(), variable);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<PluginVariable> {
        self.variables.remove(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn get(&self, name: &str) -> FormulaResult<&Value> {
        self.variables
            .get(name)
            .map(|variable| &variable.value)
            .ok_or_else(|| FormulaError::VariableNotDefined(name.to_string()))
    }

    /// Replaces the value of a declared variable, keeping its declared type.
    pub fn set(&mut self, name: &str, value: Value) -> FormulaResult<()> {
        let variable = self
            .variables
            .get_mut(name)
            .ok_or_else(|| FormulaError::VariableNotDefined(name.to_string()))?;
        let actual = value.node_type();
        if !variable.ty.accepts(actual) {
            return Err(FormulaError::NotAssignableType {
                actual,
                expected: variable.ty,
            });
        }
        variable.value = value;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
