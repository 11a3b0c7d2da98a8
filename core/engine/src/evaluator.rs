//! FILENAME: core/engine/src/evaluator.rs
//! PURPOSE: Evaluates prefix-ordered formula trees to a single value.
//! CONTEXT: After a formula is rewritten into prefix order, this module walks
//! each level left to right with a value stack. Operators pop their left
//! operand first, then the right one. Groups and method arguments are
//! evaluated as independent sub-expressions, depth first.
//!
//! SUPPORTED FEATURES:
//! - Literal values pass through unchanged
//! - Variable lookup: temporary bindings first, then the variable registry
//! - Binary operations on numbers: +, -, *, /, >, >=, <, <=, ==, !=
//! - Method calls through the method registry
//!
//! The tree is only borrowed; evaluating never mutates it, so one cached
//! tree can serve any number of concurrent evaluations.

use crate::decimal;
use crate::method_manager::MethodManager;
use crate::variable_manager::VariableManager;
use formula_parser::{FormulaError, FormulaResult, Node, NodeKind, NodeType, Operator, Value};
use std::collections::HashMap;

/// Per-call variable bindings that shadow the variable registry.
pub type TempVars = HashMap<String, Value>;

pub struct Evaluator<'a> {
    methods: &'a MethodManager,
    variables: &'a VariableManager,
}

impl<'a> Evaluator<'a> {
    pub fn new(methods: &'a MethodManager, variables: &'a VariableManager) -> Self {
        Evaluator { methods, variables }
    }

    /// Evaluates one prefix-ordered level to its value.
    pub fn evaluate(&self, nodes: &[Node], temp_vars: &TempVars) -> FormulaResult<Value> {
        let node = self.evaluate_level(nodes, temp_vars)?;
        node.into_value().ok_or(FormulaError::UnexpectedEnd)
    }

    /// Evaluates a level, keeping the source span of the result.
    fn evaluate_level(&self, nodes: &[Node], temp_vars: &TempVars) -> FormulaResult<Node> {
        let mut stack: Vec<Node> = Vec::with_capacity(nodes.len());

        for node in nodes {
            match &node.kind {
                NodeKind::Value(_) => stack.push(node.clone()),
                NodeKind::Variable(key) => stack.push(self.eval_variable(node, key, temp_vars)?),
                NodeKind::Operator(op) => {
                    let lhs = stack.pop().ok_or(FormulaError::UnexpectedEnd)?;
                    let rhs = stack.pop().ok_or(FormulaError::UnexpectedEnd)?;
                    stack.push(self.eval_operator(*op, node, lhs, rhs)?);
                }
                NodeKind::Group(body) => {
                    let result = self.evaluate_level(body, temp_vars)?;
                    stack.push(rewrap(node, result)?);
                }
                NodeKind::Method { name, params } => {
                    stack.push(self.eval_method(node, name, params, temp_vars)?);
                }
                NodeKind::Comma => {
                    return Err(FormulaError::UnexpectedToken(node.chars.clone()));
                }
            }
        }

        match (stack.pop(), stack.is_empty()) {
            (Some(result), true) => Ok(result),
            _ => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn eval_variable(&self, node: &Node, key: &str, temp_vars: &TempVars) -> FormulaResult<Node> {
        let value = match temp_vars.get(key) {
            Some(value) => value.clone(),
            None => self.variables.get(key)?.clone(),
        };
        Ok(Node::new_value(node.index, node.chars.clone(), value))
    }

    fn eval_operator(
        &self,
        op: Operator,
        node: &Node,
        lhs: Node,
        rhs: Node,
    ) -> FormulaResult<Node> {
        let left = number_operand(&lhs)?;
        let right = number_operand(&rhs)?;
        let value = decimal::apply(op, left, right)?;
        let chars = format!("{}{}{}", lhs.chars, node.chars, rhs.chars);
        Ok(Node::new_value(lhs.index, chars, value))
    }

    fn eval_method(
        &self,
        node: &Node,
        name: &str,
        params: &[Node],
        temp_vars: &TempVars,
    ) -> FormulaResult<Node> {
        let mut resolved = Vec::with_capacity(params.len());
        for param in params {
            let value_node = match &param.kind {
                NodeKind::Value(_) => param.clone(),
                _ => {
                    let result = self.evaluate_level(std::slice::from_ref(param), temp_vars)?;
                    rewrap(param, result)?
                }
            };
            resolved.push(value_node);
        }

        let call = Node::new_method(node.index, node.chars.clone(), name, resolved);
        self.methods.call(&call)
    }
}

/// Gives a sub-expression result the offset and text of the node it replaces.
fn rewrap(origin: &Node, result: Node) -> FormulaResult<Node> {
    let value = result.into_value().ok_or(FormulaError::UnexpectedEnd)?;
    Ok(Node::new_value(origin.index, origin.chars.clone(), value))
}

fn number_operand(node: &Node) -> FormulaResult<&bigdecimal::BigDecimal> {
    match node.as_value() {
        Some(Value::Number(n)) => Ok(n),
        _ => Err(FormulaError::NotAssignableParameter {
            actual: node.node_type(),
            expected: NodeType::NUMBER,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{PluginMethod, PluginVariable};
    use bigdecimal::BigDecimal;
    use formula_parser::parse;
    use std::str::FromStr;

    fn eval(text: &str) -> FormulaResult<Value> {
        let methods = MethodManager::new();
        let variables = VariableManager::new();
        let nodes = parse(text)?;
        Evaluator::new(&methods, &variables).evaluate(&nodes, &TempVars::new())
    }

    fn number(s: &str) -> Value {
        Value::Number(BigDecimal::from_str(s).unwrap())
    }

    #[test]
    fn test_precedence_and_grouping() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), number("7"));
        assert_eq!(eval("8 - 3 - 2").unwrap(), number("3"));
        assert_eq!(eval("10 / 2 / 5").unwrap(), number("1"));
        assert_eq!(eval("(1+(2-3)*4)/5").unwrap(), number("-0.6"));
    }

    #[test]
    fn test_comparison_yields_boolean() {
        assert_eq!(eval("1 + 1 > 1").unwrap(), Value::Boolean(true));
        assert_eq!(eval("2 * 3 == 6").unwrap(), Value::Boolean(true));
        assert_eq!(eval("2 != 2").unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_division_by_zero_surfaces() {
        assert_eq!(eval("1 / (2 - 2)"), Err(FormulaError::DivisionByZero));
    }

    #[test]
    fn test_operators_require_numbers() {
        let mut methods = MethodManager::new();
        methods
            .add(PluginMethod::new("t", NodeType::TEXT, |_| Ok(Value::from("x"))))
            .unwrap();
        let variables = VariableManager::new();
        let nodes = parse("1 + $t()").unwrap();
        let result = Evaluator::new(&methods, &variables).evaluate(&nodes, &TempVars::new());
        assert_eq!(
            result,
            Err(FormulaError::NotAssignableParameter {
                actual: NodeType::TEXT,
                expected: NodeType::NUMBER,
            })
        );
    }

    #[test]
    fn test_temp_vars_shadow_registry() {
        let methods = MethodManager::new();
        let mut variables = VariableManager::new();
        variables
            .add(PluginVariable::new("x", NodeType::NUMBER, 1))
            .unwrap();
        let nodes = parse("{x} * 10").unwrap();
        let evaluator = Evaluator::new(&methods, &variables);

        assert_eq!(evaluator.evaluate(&nodes, &TempVars::new()).unwrap(), number("10"));

        let mut temp = TempVars::new();
        temp.insert("x".to_string(), Value::from(5));
        assert_eq!(evaluator.evaluate(&nodes, &temp).unwrap(), number("50"));
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(
            eval("{missing} + 1"),
            Err(FormulaError::VariableNotDefined("missing".to_string()))
        );
    }

    #[test]
    fn test_method_arguments_are_resolved_first() {
        let mut methods = MethodManager::new();
        methods
            .add(
                PluginMethod::new("echo", NodeType::VALUE, |args| Ok(args[0].clone()))
                    .required("value", NodeType::VALUE),
            )
            .unwrap();
        let variables = VariableManager::new();
        let evaluator = Evaluator::new(&methods, &variables);

        let nodes = parse("$echo(2 * (3 + 1)) + $echo($echo(1))").unwrap();
        assert_eq!(evaluator.evaluate(&nodes, &TempVars::new()).unwrap(), number("9"));
    }
}
