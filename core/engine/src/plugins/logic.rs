//! FILENAME: core/engine/src/plugins/logic.rs
//! PURPOSE: Logic plugin: boolean constants, connectives and `$if`.

use super::boolean_arg;
use crate::plugin::{Plugin, PluginMethod};
use formula_parser::{NodeType, Value};

fn connective(name: &str, description: &str, f: fn(bool, bool) -> bool) -> PluginMethod {
    PluginMethod::new(name, NodeType::BOOLEAN, move |args| {
        Ok(Value::Boolean(f(boolean_arg(args, 0)?, boolean_arg(args, 1)?)))
    })
    .describe(description)
    .required("condition1", NodeType::BOOLEAN)
    .required("condition2", NodeType::BOOLEAN)
}

pub fn logic() -> Plugin {
    Plugin::new("Logic")
        .method(
            PluginMethod::new("true", NodeType::BOOLEAN, |_| Ok(Value::Boolean(true)))
                .describe("Returns true"),
        )
        .method(
            PluginMethod::new("false", NodeType::BOOLEAN, |_| Ok(Value::Boolean(false)))
                .describe("Returns false"),
        )
        .method(connective("and", "Both conditions hold", |a, b| a && b))
        .method(connective("or", "Either condition holds", |a, b| a || b))
        .method(connective("xor", "Exactly one condition holds", |a, b| a != b))
        .method(
            PluginMethod::new("not", NodeType::BOOLEAN, |args| {
                Ok(Value::Boolean(!boolean_arg(args, 0)?))
            })
            .describe("Negation")
            .required("value", NodeType::BOOLEAN),
        )
        .method(
            // Missing branches fall back to the condition's own truth value.
            PluginMethod::new("if", NodeType::VALUE, |args| {
                let (index, fallback) = if boolean_arg(args, 0)? {
                    (1, true)
                } else {
                    (2, false)
                };
                Ok(args
                    .get(index)
                    .cloned()
                    .unwrap_or(Value::Boolean(fallback)))
            })
            .describe("Pick a value by condition")
            .required("condition", NodeType::BOOLEAN)
            .optional("value_if_true", NodeType::VALUE)
            .optional("value_if_false", NodeType::VALUE),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use formula_parser::FormulaResult;

    fn call(name: &str, args: &[Value]) -> FormulaResult<Value> {
        let plugin = logic();
        let method = plugin.methods.iter().find(|m| m.name == name).unwrap();
        (method.method)(args)
    }

    #[test]
    fn test_connectives() {
        let t = Value::Boolean(true);
        let f = Value::Boolean(false);
        assert_eq!(call("and", &[t.clone(), f.clone()]).unwrap(), f);
        assert_eq!(call("or", &[t.clone(), f.clone()]).unwrap(), t);
        assert_eq!(call("xor", &[t.clone(), t.clone()]).unwrap(), f);
        assert_eq!(call("not", &[f.clone()]).unwrap(), t);
    }

    #[test]
    fn test_if_defaults() {
        assert_eq!(
            call("if", &[Value::Boolean(true), Value::from("yes"), Value::from("no")]).unwrap(),
            Value::from("yes")
        );
        assert_eq!(
            call("if", &[Value::Boolean(false), Value::from("yes")]).unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(call("if", &[Value::Boolean(true)]).unwrap(), Value::Boolean(true));
    }
}
