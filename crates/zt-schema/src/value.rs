//! JSON value helpers with JavaScript semantics.
//!
//! Parsed data is carried as `Option<serde_json::Value>`, where `None` is the
//! JavaScript `undefined` (a missing key or an absent input).

use serde_json::{Map, Number, Value};

/// Largest integer a double represents exactly (`Number.MAX_SAFE_INTEGER`).
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Runtime type name of a value, as the library reports it in issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedType {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// `boolean`
    Boolean,
    /// `number`
    Number,
    /// A number that is not a number (coercion output).
    NaN,
    /// `string`
    String,
    /// `array`
    Array,
    /// `object`
    Object,
}

impl ParsedType {
    /// Type of an optional value.
    #[must_use]
    pub fn of(value: Option<&Value>) -> Self {
        match value {
            None => Self::Undefined,
            Some(Value::Null) => Self::Null,
            Some(Value::Bool(_)) => Self::Boolean,
            Some(Value::Number(_)) => Self::Number,
            Some(Value::String(_)) => Self::String,
            Some(Value::Array(_)) => Self::Array,
            Some(Value::Object(_)) => Self::Object,
        }
    }

    /// Lowercase name used in messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::NaN => "nan",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

/// Build a JSON number the way `JSON.stringify` would print it.
///
/// Integral doubles become integers; NaN and infinities become `null`.
#[must_use]
pub fn number_value(n: f64) -> Value {
    if !n.is_finite() {
        return Value::Null;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        #[allow(clippy::cast_possible_truncation)]
        return Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(Value::Null, Value::Number)
}

/// Format a double like `Number.prototype.toString`.
#[must_use]
pub fn js_number_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e21 {
        return format!("{n:.0}");
    }
    format!("{n}")
}

/// JavaScript truthiness.
#[must_use]
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// `String(value)`.
#[must_use]
pub fn to_js_string(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.as_f64().map_or_else(|| n.to_string(), js_number_string),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_js_string(Some(other)),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
    }
}

/// `Number(value)`; may return NaN.
#[must_use]
pub fn to_js_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_js_number(s),
        Some(Value::Array(items)) => match items.as_slice() {
            [] => 0.0,
            [single] => to_js_number(Some(single)),
            _ => f64::NAN,
        },
        Some(Value::Object(_)) => f64::NAN,
    }
}

fn parse_js_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let radix = match digits.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        // Signed radix literals are NaN in JavaScript
        if negative || s.starts_with('+') {
            return f64::NAN;
        }
        #[allow(clippy::cast_precision_loss)]
        return u64::from_str_radix(&digits[2..], radix).map_or(f64::NAN, |n| n as f64);
    }
    let magnitude = match digits {
        "Infinity" => f64::INFINITY,
        _ if digits.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')) => {
            digits.parse::<f64>().unwrap_or(f64::NAN)
        }
        _ => f64::NAN,
    };
    if negative { -magnitude } else { magnitude }
}

/// Strict equality between two JSON values (`===` for primitives).
#[must_use]
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => false,
        _ => a == b,
    }
}

/// Whether a key is an array index, which JavaScript orders first.
fn is_array_index(key: &str) -> bool {
    if key == "0" {
        return true;
    }
    !key.starts_with('0')
        && key.chars().all(|c| c.is_ascii_digit())
        && key.parse::<u32>().is_ok_and(|n| n < u32::MAX)
}

/// Normalize a parsed output for rendering the way `JSON.stringify` would.
///
/// Numbers take their shortest form, integer-like object keys move to the
/// front in ascending order and everything else keeps insertion order.
#[must_use]
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => number_value(f),
            _ => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        Value::Object(map) => {
            let (mut indexed, named): (Vec<_>, Vec<_>) =
                map.into_iter().partition(|(key, _)| is_array_index(key));
            indexed.sort_by_key(|(key, _)| key.parse::<u32>().unwrap_or(u32::MAX));
            let mut out = Map::new();
            for (key, item) in indexed.into_iter().chain(named) {
                out.insert(key, canonicalize(item));
            }
            Value::Object(out)
        }
        other => other,
    }
}

/// Render a value the way the library quotes it in messages (`'a'`, `5`).
#[must_use]
pub fn quote_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{s}'"),
        Value::Number(n) => n.as_f64().map_or_else(|| n.to_string(), js_number_string),
        other => other.to_string(),
    }
}

/// Render a value as `JSON.stringify` would for messages (`"a"`, `5`).
#[must_use]
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::Number(n) => n.as_f64().map_or_else(|| n.to_string(), js_number_string),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_number_value_collapses_integral_doubles() {
        assert_eq!(number_value(1.0), json!(1));
        assert_eq!(number_value(1.5), json!(1.5));
        assert_eq!(number_value(f64::NAN), Value::Null);
    }

    #[test]
    fn test_js_number_string() {
        assert_eq!(js_number_string(5.0), "5");
        assert_eq!(js_number_string(0.1), "0.1");
        assert_eq!(js_number_string(-3.0), "-3");
        assert_eq!(js_number_string(f64::NAN), "NaN");
    }

    #[test]
    fn test_coercions() {
        assert_eq!(to_js_string(Some(&json!([1, null, "a"]))), "1,,a");
        assert_eq!(to_js_string(Some(&json!({"a": 1}))), "[object Object]");
        assert_eq!(to_js_number(Some(&json!(" 12 "))), 12.0);
        assert_eq!(to_js_number(Some(&json!(""))), 0.0);
        assert_eq!(to_js_number(Some(&json!("0x10"))), 16.0);
        assert!(to_js_number(Some(&json!("12px"))).is_nan());
        assert_eq!(to_js_number(Some(&Value::Null)), 0.0);
        assert!(to_js_number(None).is_nan());
    }

    #[test]
    fn test_truthy() {
        assert!(!truthy(None));
        assert!(!truthy(Some(&json!(0))));
        assert!(!truthy(Some(&json!(""))));
        assert!(truthy(Some(&json!([]))));
        assert!(truthy(Some(&json!("a"))));
    }

    #[test]
    fn test_canonicalize_orders_index_keys_first() {
        let value: Value = serde_json::from_str(r#"{"b": 1.0, "10": 2, "2": 3, "a": [4.0]}"#).unwrap();
        let rendered = serde_json::to_string(&canonicalize(value)).unwrap();
        assert_eq!(rendered, r#"{"2":3,"10":2,"b":1,"a":[4]}"#);
    }
}
