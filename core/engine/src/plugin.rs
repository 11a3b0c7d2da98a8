//! FILENAME: core/engine/src/plugin.rs
//! PURPOSE: Descriptors for the methods and variables a plugin contributes.
//! CONTEXT: A plugin is a named bundle handed to `Formula::register`. Methods
//! declare positional inputs with type masks and a required flag; the method
//! registry validates calls against these declarations before invoking the
//! callable with plain scalar values.

use formula_parser::{FormulaResult, NodeType, Value};
use std::fmt;
use std::sync::Arc;

/// The callable behind a method. Receives the resolved arguments in order.
pub type MethodFn = Arc<dyn Fn(&[Value]) -> FormulaResult<Value> + Send + Sync>;

/// One declared positional input of a method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodInput {
    pub ty: NodeType,
    pub name: String,
    pub description: Option<String>,
    pub required: bool,
}

/// A method exposed to formulas as `$name(...)`.
#[derive(Clone)]
pub struct PluginMethod {
    pub name: String,
    pub description: Option<String>,
    pub inputs: Vec<MethodInput>,
    /// Type mask the result must intersect.
    pub output: NodeType,
    pub method: MethodFn,
}

impl PluginMethod {
    pub fn new<F>(name: impl Into<String>, output: NodeType, method: F) -> Self
    where
        F: Fn(&[Value]) -> FormulaResult<Value> + Send + Sync + 'static,
    {
        PluginMethod {
            name: name.into(),
            description: None,
            inputs: Vec::new(),
            output,
            method: Arc::new(method),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a required input.
    pub fn required(mut self, name: impl Into<String>, ty: NodeType) -> Self {
        self.inputs.push(MethodInput {
            ty,
            name: name.into(),
            description: None,
            required: true,
        });
        self
    }

    /// Appends an optional input.
    pub fn optional(mut self, name: impl Into<String>, ty: NodeType) -> Self {
        self.inputs.push(MethodInput {
            ty,
            name: name.into(),
            description: None,
            required: false,
        });
        self
    }

    pub fn required_count(&self) -> usize {
        self.inputs.iter().filter(|input| input.required).count()
    }
}

impl fmt::Debug for PluginMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginMethod")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

/// A named value exposed to formulas as `{name}`.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginVariable {
    pub name: String,
    pub description: Option<String>,
    /// Declared type; every assigned value must intersect it.
    pub ty: NodeType,
    pub value: Value,
}

impl PluginVariable {
    pub fn new(name: impl Into<String>, ty: NodeType, value: impl Into<Value>) -> Self {
        PluginVariable {
            name: name.into(),
            description: None,
            ty,
            value: value.into(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A named bundle of methods and variables.
#[derive(Debug, Clone, Default)]
pub struct Plugin {
    pub name: String,
    pub methods: Vec<PluginMethod>,
    pub variables: Vec<PluginVariable>,
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        Plugin {
            name: name.into(),
            methods: Vec::new(),
            variables: Vec::new(),
        }
    }

    pub fn method(mut self, method: PluginMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn methods(mut self, methods: impl IntoIterator<Item = PluginMethod>) -> Self {
        self.methods.extend(methods);
        self
    }

    pub fn variable(mut self, variable: PluginVariable) -> Self {
        self.variables.push(variable);
        self
    }
}
