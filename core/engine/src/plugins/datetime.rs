//! FILENAME: core/engine/src/plugins/datetime.rs
//! PURPOSE: Datetime plugin: construction, formatting and field accessors.
//! CONTEXT: Datetimes are naive (no zone). `$now()` reads the local clock.
//! Setters reject out-of-range fields instead of rolling over into the
//! neighbouring unit.

use super::{datetime_arg, integer_arg, number, text_arg};
use crate::plugin::{Plugin, PluginMethod};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, Timelike};
use formula_parser::{FormulaError, FormulaResult, NodeType, Value};
use std::fmt::Write;

pub const DEFAULT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TEXT_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

fn invalid(what: &str) -> FormulaError {
    FormulaError::InvalidData(what.to_string())
}

/// Parses RFC 3339 or `YYYY-MM-DD[ HH:MM:SS]` text.
pub fn parse_datetime(text: &str) -> FormulaResult<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.naive_utc());
    }
    for format in TEXT_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| invalid("datetime"))
}

/// Formats with a strftime pattern. Unknown specifiers are rejected.
pub fn format_datetime(date: &NaiveDateTime, pattern: &str) -> FormulaResult<String> {
    let items: Vec<Item> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(invalid("format"));
    }
    let mut out = String::new();
    write!(out, "{}", date.format_with_items(items.into_iter()))
        .map_err(|_| invalid("format"))?;
    Ok(out)
}

fn to_datetime(args: &[Value]) -> FormulaResult<Value> {
    let value = args.first().ok_or(FormulaError::LeastNArgumentsIsRequired(1))?;
    let date = match value {
        Value::Text(s) => parse_datetime(s)?,
        Value::Number(_) => {
            let millis = integer_arg(args, 0, "datetime")?;
            DateTime::from_timestamp_millis(millis)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| invalid("datetime"))?
        }
        other => {
            return Err(FormulaError::NotAssignableParameter {
                actual: other.node_type(),
                expected: NodeType::NUMBER | NodeType::TEXT,
            })
        }
    };
    Ok(Value::Datetime(date))
}

fn getter(field: &str, f: fn(&NaiveDateTime) -> i64) -> PluginMethod {
    PluginMethod::new(format!("get{}", field), NodeType::NUMBER, move |args| {
        Ok(number(f(datetime_arg(args, 0)?)))
    })
    .describe(format!("{} of a datetime", field))
    .required("date", NodeType::DATETIME)
}

fn setter(field: &str, f: fn(&NaiveDateTime, i64) -> Option<NaiveDateTime>) -> PluginMethod {
    let what = field.to_lowercase();
    PluginMethod::new(format!("set{}", field), NodeType::DATETIME, move |args| {
        let date = datetime_arg(args, 0)?;
        let n = integer_arg(args, 1, &what)?;
        f(date, n).map(Value::Datetime).ok_or_else(|| invalid(&what))
    })
    .describe(format!("Replace the {} of a datetime", field.to_lowercase()))
    .required("date", NodeType::DATETIME)
    .required(field.to_lowercase(), NodeType::NUMBER)
}

fn to_u32(n: i64) -> Option<u32> {
    u32::try_from(n).ok()
}

pub fn datetime() -> Plugin {
    Plugin::new("Datetime")
        .method(
            PluginMethod::new("datetime", NodeType::DATETIME, to_datetime)
                .describe("Datetime from text or epoch milliseconds")
                .required("value", NodeType::NUMBER | NodeType::TEXT),
        )
        .method(
            PluginMethod::new("format", NodeType::TEXT, |args| {
                let date = datetime_arg(args, 0)?;
                let pattern = match args.get(1) {
                    Some(_) => text_arg(args, 1)?,
                    None => DEFAULT_FORMAT,
                };
                Ok(Value::Text(format_datetime(date, pattern)?))
            })
            .describe("Format a datetime with a strftime pattern")
            .required("date", NodeType::DATETIME)
            .optional("format", NodeType::TEXT),
        )
        .method(
            PluginMethod::new("now", NodeType::DATETIME, |_| {
                Ok(Value::Datetime(Local::now().naive_local()))
            })
            .describe("Current local time"),
        )
        .method(getter("Year", |d| i64::from(d.year())))
        .method(setter("Year", |d, n| d.with_year(i32::try_from(n).ok()?)))
        .method(getter("Month", |d| i64::from(d.month())))
        .method(setter("Month", |d, n| d.with_month(to_u32(n)?)))
        .method(getter("Date", |d| i64::from(d.day())))
        .method(setter("Date", |d, n| d.with_day(to_u32(n)?)))
        .method(getter("Hours", |d| i64::from(d.hour())))
        .method(setter("Hours", |d, n| d.with_hour(to_u32(n)?)))
        .method(getter("Minutes", |d| i64::from(d.minute())))
        .method(setter("Minutes", |d, n| d.with_minute(to_u32(n)?)))
        .method(getter("Seconds", |d| i64::from(d.second())))
        .method(setter("Seconds", |d, n| d.with_second(to_u32(n)?)))
        .method(getter("Milliseconds", |d| {
            i64::from(d.nanosecond() / 1_000_000 % 1000)
        }))
        .method(setter("Milliseconds", |d, n| {
            let ms = to_u32(n).filter(|ms| *ms < 1000)?;
            d.with_nanosecond(ms * 1_000_000)
        }))
}
