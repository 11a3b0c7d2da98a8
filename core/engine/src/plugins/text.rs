//! FILENAME: core/engine/src/plugins/text.rs
//! PURPOSE: Text plugin: conversion, slicing, case and search helpers.
//! CONTEXT: Positions and lengths count characters, not bytes.

use super::{count_arg, number, text_arg};
use crate::plugin::{Plugin, PluginMethod};
use formula_parser::{FormulaError, FormulaResult, NodeType, Value};
use regex::Regex;

/// Longest text, in bytes, a method may build.
pub const MAX_TEXT_LEN: usize = 10 * 1024 * 1024;

/// Characters `[start, start + len)` of `text`, clamped to its length.
fn char_slice(text: &str, start: usize, len: usize) -> String {
    text.chars().skip(start).take(len).collect()
}

/// Zero-based character index of `needle` in `haystack` at or after `start`.
fn find_from(haystack: &str, needle: &str, start: usize) -> Option<usize> {
    let offset = haystack
        .char_indices()
        .nth(start)
        .map(|(i, _)| i)
        .or_else(|| (start == haystack.chars().count()).then_some(haystack.len()))?;
    let byte = haystack[offset..].find(needle)? + offset;
    Some(haystack[..byte].chars().count())
}

fn proper(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            if word.is_empty() || !word.chars().all(|c| c.is_ascii_alphabetic()) {
                return word.to_string();
            }
            let mut chars = word.chars();
            let head = chars.next().map(|c| c.to_ascii_uppercase());
            head.into_iter()
                .chain(chars.map(|c| c.to_ascii_lowercase()))
                .collect()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn single_text(name: &str, description: &str, f: fn(&str) -> String) -> PluginMethod {
    PluginMethod::new(name, NodeType::TEXT, move |args| Ok(Value::Text(f(text_arg(args, 0)?))))
        .describe(description)
        .required("text", NodeType::TEXT)
}

fn replace(args: &[Value]) -> FormulaResult<Value> {
    let text = text_arg(args, 0)?;
    let pattern = Regex::new(text_arg(args, 1)?)
        .map_err(|_| FormulaError::InvalidData("old_text".to_string()))?;
    let replacement = text_arg(args, 2)?;
    Ok(Value::Text(pattern.replace_all(text, replacement).into_owned()))
}

pub fn text() -> Plugin {
    Plugin::new("Text")
        .method(
            PluginMethod::new("text", NodeType::TEXT, |args| {
                let value = args
                    .first()
                    .ok_or(FormulaError::LeastNArgumentsIsRequired(1))?;
                Ok(Value::Text(value.to_string()))
            })
            .describe("Convert a value to text")
            .required("value", NodeType::VALUE),
        )
        .method(
            PluginMethod::new("concat", NodeType::TEXT, |args| {
                Ok(Value::Text(format!("{}{}", text_arg(args, 0)?, text_arg(args, 1)?)))
            })
            .describe("Join two strings")
            .required("text1", NodeType::TEXT)
            .required("text2", NodeType::TEXT),
        )
        .method(
            PluginMethod::new("find", NodeType::NUMBER, |args| {
                let haystack = text_arg(args, 0)?;
                let needle = text_arg(args, 1)?;
                let start = match args.get(2) {
                    Some(_) => count_arg(args, 2, "start_num")?,
                    None => 0,
                };
                let found = find_from(haystack, needle, start)
                    .and_then(|i| i64::try_from(i).ok())
                    .unwrap_or(-1);
                Ok(number(found))
            })
            .describe("Position of a substring, case sensitive; -1 when absent")
            .required("text", NodeType::TEXT)
            .required("find_text", NodeType::TEXT)
            .optional("start_num", NodeType::NUMBER),
        )
        .method(
            PluginMethod::new("exact", NodeType::BOOLEAN, |args| {
                Ok(Value::Boolean(text_arg(args, 0)? == text_arg(args, 1)?))
            })
            .describe("Case sensitive equality")
            .required("text1", NodeType::TEXT)
            .required("text2", NodeType::TEXT),
        )
        .method(
            PluginMethod::new("mid", NodeType::TEXT, |args| {
                let text = text_arg(args, 0)?;
                let start = count_arg(args, 1, "start_num")?;
                let len = count_arg(args, 2, "num_chars")?;
                Ok(Value::Text(char_slice(text, start, len)))
            })
            .describe("Characters from a position")
            .required("text", NodeType::TEXT)
            .required("start_num", NodeType::NUMBER)
            .required("num_chars", NodeType::NUMBER),
        )
        .method(
            PluginMethod::new("left", NodeType::TEXT, |args| {
                let text = text_arg(args, 0)?;
                let len = count_arg(args, 1, "num_chars")?;
                Ok(Value::Text(char_slice(text, 0, len)))
            })
            .describe("Leading characters")
            .required("text", NodeType::TEXT)
            .required("num_chars", NodeType::NUMBER),
        )
        .method(
            PluginMethod::new("right", NodeType::TEXT, |args| {
                let text = text_arg(args, 0)?;
                let len = count_arg(args, 1, "num_chars")?;
                let total = text.chars().count();
                Ok(Value::Text(char_slice(text, total.saturating_sub(len), len)))
            })
            .describe("Trailing characters")
            .required("text", NodeType::TEXT)
            .required("num_chars", NodeType::NUMBER),
        )
        .method(
            PluginMethod::new("len", NodeType::NUMBER, |args| {
                let count = text_arg(args, 0)?.chars().count();
                let count = i64::try_from(count)
                    .map_err(|_| FormulaError::InvalidData("text".to_string()))?;
                Ok(number(count))
            })
            .describe("Number of characters")
            .required("text", NodeType::TEXT),
        )
        .method(single_text("lower", "Lower case", str::to_lowercase))
        .method(single_text("upper", "Upper case", str::to_uppercase))
        .method(single_text(
            "proper",
            "Capitalize each English word",
            proper,
        ))
        .method(
            PluginMethod::new("replace", NodeType::TEXT, replace)
                .describe("Replace every match of a pattern")
                .required("text", NodeType::TEXT)
                .required("old_text", NodeType::TEXT)
                .required("new_text", NodeType::TEXT),
        )
        .method(
            PluginMethod::new("repeat", NodeType::TEXT, |args| {
                let text = text_arg(args, 0)?;
                let count = count_arg(args, 1, "count")?;
                match text.len().checked_mul(count) {
                    Some(len) if len <= MAX_TEXT_LEN => Ok(Value::Text(text.repeat(count))),
                    _ => Err(FormulaError::InvalidData("count".to_string())),
                }
            })
            .describe("Repeat a string")
            .required("text", NodeType::TEXT)
            .required("count", NodeType::NUMBER),
        )
        .method(single_text(
            "trim",
            "Strip outer spaces and collapse inner runs",
            |text| {
                text.trim()
                    .split(' ')
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            },
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> FormulaResult<Value> {
        let plugin = text();
        let method = plugin.methods.iter().find(|m| m.name == name).unwrap();
        (method.method)(args)
    }

    fn t(s: &str) -> Value {
        Value::from(s)
    }

    #[test]
    fn test_slicing_counts_characters() {
        assert_eq!(call("mid", &[t("héllo"), Value::from(1), Value::from(3)]).unwrap(), t("éll"));
        assert_eq!(call("left", &[t("héllo"), Value::from(2)]).unwrap(), t("hé"));
        assert_eq!(call("right", &[t("héllo"), Value::from(2)]).unwrap(), t("lo"));
        assert_eq!(call("right", &[t("ab"), Value::from(5)]).unwrap(), t("ab"));
        assert_eq!(call("len", &[t("héllo")]).unwrap(), Value::from(5));
    }

    #[test]
    fn test_find() {
        assert_eq!(call("find", &[t("abcabc"), t("c")]).unwrap(), Value::from(2));
        assert_eq!(
            call("find", &[t("abcabc"), t("c"), Value::from(3)]).unwrap(),
            Value::from(5)
        );
        assert_eq!(call("find", &[t("abc"), t("z")]).unwrap(), Value::from(-1));
        assert_eq!(
            call("find", &[t("abc"), t("a"), Value::from(10)]).unwrap(),
            Value::from(-1)
        );
    }

    #[test]
    fn test_case_helpers() {
        assert_eq!(call("upper", &[t("abc")]).unwrap(), t("ABC"));
        assert_eq!(call("proper", &[t("hELLO wORLD 42x")]).unwrap(), t("Hello World 42x"));
        assert_eq!(call("trim", &[t("  a   b  ")]).unwrap(), t("a b"));
    }

    #[test]
    fn test_replace_and_repeat() {
        assert_eq!(call("replace", &[t("a-b-c"), t("-"), t("+")]).unwrap(), t("a+b+c"));
        assert_eq!(call("replace", &[t("a1b22"), t(r"\d+"), t("#")]).unwrap(), t("a#b#"));
        assert_eq!(
            call("replace", &[t("x"), t("("), t("y")]),
            Err(FormulaError::InvalidData("old_text".to_string()))
        );
        assert_eq!(call("repeat", &[t("ab"), Value::from(3)]).unwrap(), t("ababab"));
        assert_eq!(
            call("repeat", &[t("ab"), Value::from(-1)]),
            Err(FormulaError::InvalidData("count".to_string()))
        );
    }

    #[test]
    fn test_repeat_rejects_oversized_results() {
        assert_eq!(
            call("repeat", &[t("abc"), Value::from(9_000_000_000_000_000_000i64)]),
            Err(FormulaError::InvalidData("count".to_string()))
        );
        assert_eq!(
            call("repeat", &[t("ab"), Value::from(MAX_TEXT_LEN as i64)]),
            Err(FormulaError::InvalidData("count".to_string()))
        );
        let filled = call("repeat", &[t("a"), Value::from(MAX_TEXT_LEN as i64)]).unwrap();
        assert_eq!(filled.as_text().map(str::len), Some(MAX_TEXT_LEN));
        assert_eq!(call("repeat", &[t(""), Value::from(i64::from(u32::MAX))]).unwrap(), t(""));
    }

    #[test]
    fn test_text_conversion() {
        assert_eq!(call("text", &[Value::from(12)]).unwrap(), t("12"));
        assert_eq!(call("text", &[Value::Boolean(true)]).unwrap(), t("true"));
    }
}
