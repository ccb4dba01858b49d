//! Value helpers shared by the pipeline stages.
//!
//! - values_equal: Compare two JSON values for equality
//! - compare_numbers: Exact integer ordering, f64 for floats
//! - compare_values: Compare two JSON values for ordering
//! - to_bool: Convert JSON value to boolean
//! - display_string: String representation used by text operators and search
//! - like_regex: Translate a `%`/`_` LIKE pattern into a regex

use std::cmp::Ordering;

use regex::Regex;
use serde_json::{Number, Value};

/// Exact integer form of a number, if it has one.
#[inline]
fn as_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// Order two numbers: integers exactly, anything involving a float via f64.
pub fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (as_integer(a), as_integer(b)) {
        return a.cmp(&b);
    }
    let a_f64 = a.as_f64().unwrap_or(0.0);
    let b_f64 = b.as_f64().unwrap_or(0.0);
    a_f64.partial_cmp(&b_f64).unwrap_or(Ordering::Equal)
}

/// Compare two JSON values for equality.
///
/// Numbers compare by value, so `1001` equals `1001.0`.
#[inline]
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b) == Ordering::Equal,
        _ => left == right,
    }
}

/// Bucket identity of a number; numerically equal numbers share one.
pub fn number_key(n: &Number) -> String {
    if let Some(i) = as_integer(n) {
        return i.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e38 => format!("{}", f as i128),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Create a serde_json::Number from an f64 value.
#[inline]
pub fn number_from_f64(n: f64) -> serde_json::Number {
    serde_json::Number::from_f64(n).unwrap_or_else(|| serde_json::Number::from(0))
}

/// Convert a JSON value to boolean.
///
/// - Bool: returns the value
/// - Null: returns false
/// - Number: returns false if 0, true otherwise
/// - String: returns false if empty, true otherwise
/// - Array: returns false if empty, true otherwise
/// - Object: returns false if empty, true otherwise
#[inline]
pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().unwrap_or(0.0) != 0.0,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Compare two JSON values for ordering.
///
/// Null < Bool < Number < String; mismatched non-null kinds compare equal so
/// a stable sort leaves them in place.
#[inline]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

/// String form of a scalar for text matching. Null has none.
pub fn display_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if as_integer(n).is_some() => Some(n.to_string()),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        other => Some(other.to_string()),
    }
}

/// Lowercase when `ignore_case` is set.
#[inline]
pub fn fold_case(s: &str, ignore_case: bool) -> String {
    if ignore_case {
        s.to_lowercase()
    } else {
        s.to_string()
    }
}

/// Safely compile a regex with size limits.
pub fn safe_regex(pattern: &str) -> Result<Regex, regex::Error> {
    if pattern.len() > 1000 {
        return Err(regex::Error::Syntax(
            "Pattern too long (max 1000 chars)".to_string(),
        ));
    }
    Regex::new(pattern)
}

/// Convert a LIKE pattern (`%` any run, `_` one char) into an anchored regex.
pub fn like_regex(pattern: &str, ignore_case: bool) -> Result<Regex, regex::Error> {
    let mut regex_pattern = String::new();
    if ignore_case {
        regex_pattern.push_str("(?i)");
    }
    regex_pattern.push('^');
    for c in pattern.chars() {
        match c {
            '%' => regex_pattern.push_str(".*"),
            '_' => regex_pattern.push('.'),
            '^' | '$' | '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '\\' => {
                regex_pattern.push('\\');
                regex_pattern.push(c);
            }
            _ => regex_pattern.push(c),
        }
    }
    regex_pattern.push('$');
    safe_regex(&regex_pattern)
}
