//! FILENAME: core/engine/src/formula.rs
//! PURPOSE: The `Formula` facade: plugin registration, parsing and evaluation.
//! CONTEXT: Owns the method and variable registries behind one read-write lock
//! and a cached parser. Evaluations share the read side; registration and
//! variable updates take the write side, so a calculation always sees one
//! consistent registry state.

use crate::config::FormulaOptions;
use crate::evaluator::{Evaluator, TempVars};
use crate::method_manager::MethodManager;
use crate::plugin::Plugin;
use crate::variable_manager::VariableManager;
use formula_parser::{FormulaResult, Node, Parser, Value};
use log::{debug, warn};
use parking_lot::RwLock;
use std::sync::Arc;

/// Names a plugin actually installed, so unregistering removes only those.
#[derive(Debug, Clone)]
struct Registered {
    name: String,
    methods: Vec<String>,
    variables: Vec<String>,
}

#[derive(Debug, Default)]
struct Registry {
    methods: MethodManager,
    variables: VariableManager,
    plugins: Vec<Registered>,
}

pub struct Formula {
    registry: RwLock<Registry>,
    parser: Parser,
}

impl Formula {
    /// An engine with no plugins and the default cache.
    pub fn new() -> Self {
        Formula {
            registry: RwLock::new(Registry::default()),
            parser: Parser::new(FormulaOptions::default().cache_capacity),
        }
    }

    /// Builds an engine and registers the configured plugins in order.
    pub fn with_options(options: FormulaOptions) -> FormulaResult<Self> {
        let formula = Formula {
            registry: RwLock::new(Registry::default()),
            parser: Parser::new(options.cache_capacity),
        };
        for plugin in options.plugins {
            formula.register(plugin)?;
        }
        Ok(formula)
    }

    /// Installs a plugin. A plugin name already registered is skipped with a
    /// warning. On error nothing from this plugin is installed.
    pub fn register(&self, plugin: Plugin) -> FormulaResult<()> {
        let mut registry = self.registry.write();
        if registry.plugins.iter().any(|p| p.name == plugin.name) {
            warn!("The plugin {} has been registered!", plugin.name);
            return Ok(());
        }

        let mut methods = registry.methods.clone();
        let mut variables = registry.variables.clone();
        let mut record = Registered {
            name: plugin.name,
            methods: Vec::new(),
            variables: Vec::new(),
        };

        for method in plugin.methods {
            let name = method.name.clone();
            if methods.add(method)? {
                record.methods.push(name);
            }
        }
        for variable in plugin.variables {
            let name = variable.name.clone();
            variables.add(variable)?;
            record.variables.push(name);
        }

        debug!(
            "registered plugin {} ({} methods, {} variables)",
            record.name,
            record.methods.len(),
            record.variables.len()
        );
        registry.methods = methods;
        registry.variables = variables;
        registry.plugins.push(record);
        Ok(())
    }

    /// Removes a plugin and everything it installed. Returns false if no
    /// plugin by that name is registered.
    pub fn unregister(&self, name: &str) -> bool {
        let mut registry = self.registry.write();
        let Some(position) = registry.plugins.iter().position(|p| p.name == name) else {
            return false;
        };
        let record = registry.plugins.remove(position);
        for method in &record.methods {
            registry.methods.remove(method);
        }
        for variable in &record.variables {
            registry.variables.remove(variable);
        }
        debug!("unregistered plugin {}", record.name);
        true
    }

    /// Parses (or fetches from cache) the prefix tree of `text`.
    pub fn parse(&self, text: &str) -> FormulaResult<Arc<[Node]>> {
        self.parser.parse(text)
    }

    /// Evaluates `text`. Keys in `temp_vars` shadow registered variables.
    pub fn calculate(&self, text: &str, temp_vars: &TempVars) -> FormulaResult<Value> {
        let tree = self.parser.parse(text)?;
        let registry = self.registry.read();
        Evaluator::new(&registry.methods, &registry.variables).evaluate(&tree, temp_vars)
    }

    pub fn set_variable(&self, name: &str, value: impl Into<Value>) -> FormulaResult<()> {
        self.registry.write().variables.set(name, value.into())
    }

    pub fn get_variable(&self, name: &str) -> FormulaResult<Value> {
        self.registry.read().variables.get(name).cloned()
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.registry.read().methods.has(name)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.registry.read().variables.has(name)
    }

    /// Registered plugin names in registration order.
    pub fn plugin_names(&self) -> Vec<String> {
        self.registry
            .read()
            .plugins
            .iter()
            .map(|p| p.name.clone())
            .collect()
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }
}

impl Default for Formula {
    fn default() -> Self {
        Self::new()
    }
}
