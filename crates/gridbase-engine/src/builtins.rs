//! Built-in formula functions and their metadata.
//!
//! Conventions:
//! - Formula-facing names are ALL CAPS; lookups are case-insensitive.
//! - Every builtin takes already-evaluated arguments and returns a `Value`.
//! - `IF` is listed here but the evaluator short-circuits it so only the
//!   taken branch is evaluated.
//! - If you add a builtin, add it to `BUILTINS`; the name index is built
//!   from that table.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, SecondsFormat};

use crate::engine::Value;
use crate::error::{FormulaError, Result};

pub type BuiltinFn = fn(&[Value]) -> Result<Value>;

pub struct Builtin {
    pub name: &'static str,
    pub description: &'static str,
    pub func: BuiltinFn,
}

pub const BUILTINS: &[Builtin] = &[
    // Text
    Builtin {
        name: "CONCAT",
        description: "Join all arguments as text with no separator",
        func: concat,
    },
    Builtin {
        name: "UPPER",
        description: "Uppercase text",
        func: upper,
    },
    Builtin {
        name: "LOWER",
        description: "Lowercase text",
        func: lower,
    },
    Builtin {
        name: "TRIM",
        description: "Strip leading and trailing whitespace",
        func: trim,
    },
    Builtin {
        name: "LEN",
        description: "Number of characters in text",
        func: len,
    },
    Builtin {
        name: "LEFT",
        description: "First n characters of text",
        func: left,
    },
    Builtin {
        name: "RIGHT",
        description: "Last n characters of text",
        func: right,
    },
    Builtin {
        name: "MID",
        description: "Substring from a 1-based start position",
        func: mid,
    },
    Builtin {
        name: "SUBSTITUTE",
        description: "Replace every occurrence of old with new",
        func: substitute,
    },
    // Numeric
    Builtin {
        name: "SUM",
        description: "Sum of numeric values",
        func: sum,
    },
    Builtin {
        name: "AVERAGE",
        description: "Mean of numeric values",
        func: average,
    },
    Builtin {
        name: "AVG",
        description: "Mean of numeric values",
        func: average,
    },
    Builtin {
        name: "MIN",
        description: "Smallest numeric value",
        func: min,
    },
    Builtin {
        name: "MAX",
        description: "Largest numeric value",
        func: max,
    },
    Builtin {
        name: "ROUND",
        description: "Round to a number of decimal places (default 0)",
        func: round,
    },
    Builtin {
        name: "FLOOR",
        description: "Round down to an integer",
        func: floor,
    },
    Builtin {
        name: "CEILING",
        description: "Round up to an integer",
        func: ceiling,
    },
    Builtin {
        name: "CEIL",
        description: "Round up to an integer",
        func: ceiling,
    },
    Builtin {
        name: "ABS",
        description: "Absolute value",
        func: abs,
    },
    // Logic
    Builtin {
        name: "IF",
        description: "Choose between two values on a condition",
        func: if_fn,
    },
    Builtin {
        name: "AND",
        description: "True when every argument is truthy",
        func: and,
    },
    Builtin {
        name: "OR",
        description: "True when any argument is truthy",
        func: or,
    },
    Builtin {
        name: "NOT",
        description: "Logical negation",
        func: not,
    },
    Builtin {
        name: "ISBLANK",
        description: "True for null, empty text or an empty list",
        func: is_blank,
    },
    // Date
    Builtin {
        name: "TODAY",
        description: "Current date as YYYY-MM-DD",
        func: today,
    },
    Builtin {
        name: "NOW",
        description: "Current timestamp (RFC 3339)",
        func: now,
    },
    Builtin {
        name: "YEAR",
        description: "Year of a date, 0 if unparseable",
        func: year,
    },
    Builtin {
        name: "MONTH",
        description: "Month of a date, 0 if unparseable",
        func: month,
    },
    Builtin {
        name: "DAY",
        description: "Day of month of a date, 0 if unparseable",
        func: day,
    },
];

/// Find a builtin by name, ignoring case.
pub fn lookup_builtin(name: &str) -> Option<&'static Builtin> {
    static INDEX: OnceLock<HashMap<&'static str, &'static Builtin>> = OnceLock::new();
    let index = INDEX.get_or_init(|| BUILTINS.iter().map(|b| (b.name, b)).collect());
    index.get(name.to_ascii_uppercase().as_str()).copied()
}

fn arity_error(function: &str, expected: &'static str, got: usize) -> FormulaError {
    FormulaError::ArgumentCount {
        function: function.to_string(),
        expected,
        got,
    }
}

fn expect_args<'a, const N: usize>(
    function: &str,
    expected: &'static str,
    args: &'a [Value],
) -> Result<&'a [Value; N]> {
    args.try_into()
        .map_err(|_| arity_error(function, expected, args.len()))
}

/// Flatten array arguments into one list of numbers.
fn numbers(args: &[Value]) -> Vec<f64> {
    fn push(value: &Value, out: &mut Vec<f64>) {
        match value {
            Value::Array(items) => items.iter().for_each(|v| push(v, out)),
            other => out.push(other.to_number()),
        }
    }
    let mut out = Vec::with_capacity(args.len());
    args.iter().for_each(|v| push(v, &mut out));
    out
}

/// Non-negative character count from a numeric argument (fraction truncated).
fn char_count(value: &Value) -> usize {
    let n = value.to_number();
    if n.is_nan() || n <= 0.0 { 0 } else { n as usize }
}

fn concat(args: &[Value]) -> Result<Value> {
    Ok(Value::String(args.iter().map(Value::to_text).collect()))
}

fn upper(args: &[Value]) -> Result<Value> {
    let [s] = expect_args::<1>("UPPER", "1", args)?;
    Ok(Value::String(s.to_text().to_uppercase()))
}

fn lower(args: &[Value]) -> Result<Value> {
    let [s] = expect_args::<1>("LOWER", "1", args)?;
    Ok(Value::String(s.to_text().to_lowercase()))
}

fn trim(args: &[Value]) -> Result<Value> {
    let [s] = expect_args::<1>("TRIM", "1", args)?;
    Ok(Value::String(s.to_text().trim().to_string()))
}

fn len(args: &[Value]) -> Result<Value> {
    let [s] = expect_args::<1>("LEN", "1", args)?;
    Ok(Value::Number(s.to_text().chars().count() as f64))
}

fn left(args: &[Value]) -> Result<Value> {
    let [s, n] = expect_args::<2>("LEFT", "2", args)?;
    let text = s.to_text();
    Ok(Value::String(text.chars().take(char_count(n)).collect()))
}

fn right(args: &[Value]) -> Result<Value> {
    let [s, n] = expect_args::<2>("RIGHT", "2", args)?;
    let text = s.to_text();
    let total = text.chars().count();
    let take = char_count(n).min(total);
    Ok(Value::String(text.chars().skip(total - take).collect()))
}

fn mid(args: &[Value]) -> Result<Value> {
    let [s, start, length] = expect_args::<3>("MID", "3", args)?;
    let text = s.to_text();
    let skip = char_count(start).max(1) - 1;
    Ok(Value::String(
        text.chars().skip(skip).take(char_count(length)).collect(),
    ))
}

fn substitute(args: &[Value]) -> Result<Value> {
    let [s, old, new] = expect_args::<3>("SUBSTITUTE", "3", args)?;
    let text = s.to_text();
    let old = old.to_text();
    if old.is_empty() {
        return Ok(Value::String(text));
    }
    Ok(Value::String(text.replace(&old, &new.to_text())))
}

fn sum(args: &[Value]) -> Result<Value> {
    Ok(Value::Number(numbers(args).iter().sum()))
}

fn average(args: &[Value]) -> Result<Value> {
    let values = numbers(args);
    if values.is_empty() {
        return Ok(Value::Number(0.0));
    }
    Ok(Value::Number(
        values.iter().sum::<f64>() / values.len() as f64,
    ))
}

fn min(args: &[Value]) -> Result<Value> {
    let min = numbers(args).into_iter().reduce(f64::min);
    Ok(Value::Number(min.unwrap_or(0.0)))
}

fn max(args: &[Value]) -> Result<Value> {
    let max = numbers(args).into_iter().reduce(f64::max);
    Ok(Value::Number(max.unwrap_or(0.0)))
}

fn round(args: &[Value]) -> Result<Value> {
    const MAX_PRECISION: f64 = 15.0;
    let (x, precision) = match args {
        [x] => (x.to_number(), 0),
        [x, p] => (
            x.to_number(),
            p.to_number().trunc().clamp(-MAX_PRECISION, MAX_PRECISION) as i32,
        ),
        _ => return Err(arity_error("ROUND", "1 or 2", args.len())),
    };
    let factor = 10f64.powi(precision);
    Ok(Value::Number((x * factor).round() / factor))
}

fn floor(args: &[Value]) -> Result<Value> {
    let [x] = expect_args::<1>("FLOOR", "1", args)?;
    Ok(Value::Number(x.to_number().floor()))
}

fn ceiling(args: &[Value]) -> Result<Value> {
    let [x] = expect_args::<1>("CEILING", "1", args)?;
    Ok(Value::Number(x.to_number().ceil()))
}

fn abs(args: &[Value]) -> Result<Value> {
    let [x] = expect_args::<1>("ABS", "1", args)?;
    Ok(Value::Number(x.to_number().abs()))
}

fn if_fn(args: &[Value]) -> Result<Value> {
    let [cond, then, otherwise] = expect_args::<3>("IF", "3", args)?;
    Ok(if cond.to_bool() {
        then.clone()
    } else {
        otherwise.clone()
    })
}

fn and(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(args.iter().all(Value::to_bool)))
}

fn or(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(args.iter().any(Value::to_bool)))
}

fn not(args: &[Value]) -> Result<Value> {
    let [x] = expect_args::<1>("NOT", "1", args)?;
    Ok(Value::Bool(!x.to_bool()))
}

fn is_blank(args: &[Value]) -> Result<Value> {
    let [x] = expect_args::<1>("ISBLANK", "1", args)?;
    Ok(Value::Bool(x.is_blank()))
}

fn today(args: &[Value]) -> Result<Value> {
    let [] = expect_args::<0>("TODAY", "0", args)?;
    Ok(Value::String(Local::now().format("%Y-%m-%d").to_string()))
}

fn now(args: &[Value]) -> Result<Value> {
    let [] = expect_args::<0>("NOW", "0", args)?;
    Ok(Value::String(
        Local::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    ))
}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive `YYYY-MM-DDTHH:MM:SS`.
fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|ts| ts.date())
}

fn date_part(function: &str, args: &[Value], part: fn(&NaiveDate) -> i32) -> Result<Value> {
    let [x] = expect_args::<1>(function, "1", args)?;
    let n = parse_date(&x.to_text()).map(|d| part(&d)).unwrap_or(0);
    Ok(Value::Number(n as f64))
}

fn year(args: &[Value]) -> Result<Value> {
    date_part("YEAR", args, |d| d.year())
}

fn month(args: &[Value]) -> Result<Value> {
    date_part("MONTH", args, |d| d.month() as i32)
}

fn day(args: &[Value]) -> Result<Value> {
    date_part("DAY", args, |d| d.day() as i32)
}
