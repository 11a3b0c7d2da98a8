//! FILENAME: core/engine/src/method_manager.rs
//! PURPOSE: Registry of callable methods and the call contract.
//! CONTEXT: The evaluator hands over a Method node whose parameters are
//! already resolved to values. The registry checks arity in a fixed order
//! (too many, none when some are required, too few), then parameter types,
//! invokes the callable, and finally checks the result type.

use crate::plugin::PluginMethod;
use formula_parser::{FormulaError, FormulaResult, Node, NodeKind, NodeType, Value};
use log::warn;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct MethodManager {
    methods: FxHashMap<String, PluginMethod>,
}

impl MethodManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a method. Returns Ok(false) if the name is already taken.
    pub fn add(&mut self, method: PluginMethod) -> FormulaResult<bool> {
        if self.has(&method.name) {
            warn!("The function {} has already been registered!", method.name);
            return Ok(false);
        }

        let last_required = method.inputs.iter().rposition(|input| input.required);
        let first_optional = method.inputs.iter().position(|input| !input.required);
        if let (Some(required), Some(optional)) = (last_required, first_optional) {
            if required > optional {
                return Err(FormulaError::RequiredFollowOptional(method.name));
            }
        }

        self.methods.insert(method.name.clone(), method);
        Ok(true)
    }

    pub fn remove(&mut self, name: &str) -> Option<PluginMethod> {
        self.methods.remove(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&PluginMethod> {
        self.methods.get(name)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Invokes the method named by `node`. Parameters must already be values.
    /// The result carries the call's offset and source text.
    pub fn call(&self, node: &Node) -> FormulaResult<Node> {
        let NodeKind::Method { name, params } = &node.kind else {
            return Err(FormulaError::NotAFunction(node.chars.clone()));
        };
        let descriptor = self
            .methods
            .get(name)
            .ok_or_else(|| FormulaError::NotAFunction(name.clone()))?;

        let declared = descriptor.inputs.len();
        let required = descriptor.required_count();
        let got = params.len();

        if got > declared {
            return Err(FormulaError::MostNArgumentsIsRequired(declared));
        } else if required > 0 && got == 0 {
            return Err(FormulaError::LeastNArgumentsIsRequired(required));
        } else if required > got {
            return Err(if required != declared {
                FormulaError::ExpectedN2MArguments {
                    min: required,
                    max: declared,
                    got,
                }
            } else {
                FormulaError::ExpectedNArguments {
                    expected: declared,
                    got,
                }
            });
        }

        let mut args: Vec<Value> = Vec::with_capacity(got);
        for (param, input) in params.iter().zip(&descriptor.inputs) {
            let actual = param.node_type();
            match param.as_value() {
                Some(value) if input.ty.accepts(actual) => args.push(value.clone()),
                _ => {
                    return Err(FormulaError::NotAssignableParameter {
                        actual,
                        expected: input.ty,
                    })
                }
            }
        }

        let result = (descriptor.method)(&args).map_err(|err| FormulaError::Custom {
            span: node.chars.clone(),
            source: Box::new(err),
        })?;

        let actual = result.node_type();
        if !descriptor.output.accepts(actual) {
            return Err(FormulaError::NotAssignableType {
                actual,
                expected: descriptor.output,
            });
        }
        Ok(Node::new_value(node.index, node.chars.clone(), result))
    }

    /// Declared output type of a registered method.
    pub fn output_of(&self, name: &str) -> Option<NodeType> {
        self.methods.get(name).map(|m| m.output)
    }
}
