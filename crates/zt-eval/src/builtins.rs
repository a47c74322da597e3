//! String, array and regular expression methods available to callbacks.

use zt_schema::compile_js_regex;

use crate::error::{CompileError, Result};
use crate::interp::Evaluator;
use crate::value::{Function, Value, strict_equals};

const STRING_METHODS: &[&str] = &[
    "endsWith",
    "includes",
    "indexOf",
    "slice",
    "split",
    "startsWith",
    "toLowerCase",
    "toUpperCase",
    "trim",
];

const ARRAY_METHODS: &[&str] = &[
    "every", "filter", "find", "includes", "indexOf", "join", "map", "slice", "some",
];

const REGEXP_METHODS: &[&str] = &["test"];

/// Bound method `key` of a string, array or regular expression.
pub fn method(target: &Value, key: &str) -> Option<Value> {
    let names = match target {
        Value::String(_) => STRING_METHODS,
        Value::Array(_) => ARRAY_METHODS,
        Value::RegExp { .. } => REGEXP_METHODS,
        _ => return None,
    };
    let name = *names.iter().find(|name| **name == key)?;
    Some(Value::Function(Function::Builtin {
        receiver: Box::new(target.clone()),
        name,
    }))
}

fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&Value::Undefined)
}

fn text_arg(args: &[Value], index: usize) -> String {
    arg(args, index).to_js_string().unwrap_or_default()
}

/// Relative index as taken by `slice` and `indexOf`, clamped to `0..=len`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn relative_index(value: &Value, len: usize, default: usize) -> usize {
    if matches!(value, Value::Undefined) {
        return default;
    }
    let n = value.to_number();
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

#[allow(clippy::cast_precision_loss)]
fn index_value(index: Option<usize>) -> Value {
    Value::Number(index.map_or(-1.0, |i| i as f64))
}

fn callback(args: &[Value], receiver: &Value, name: &str) -> Result<Function> {
    match arg(args, 0) {
        Value::Function(function) => Ok(function.clone()),
        other => Err(CompileError::type_error(format!(
            "{} is not a function (in {}.{name})",
            other.to_js_string().unwrap_or_else(|| other.type_of().to_string()),
            receiver.type_of()
        ))),
    }
}

/// `Array.prototype.includes` equality: like `===` but `NaN` finds `NaN`.
fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => strict_equals(a, b),
    }
}

/// Call builtin `name` on `receiver`.
pub fn call(ev: &mut Evaluator, receiver: &Value, name: &str, args: &[Value]) -> Result<Value> {
    match receiver {
        Value::String(s) => call_string(s, name, args),
        Value::Array(items) => call_array(ev, receiver, items, name, args),
        Value::RegExp { source, flags } => {
            let regex = compile_js_regex(source, flags)?;
            Ok(Value::Bool(regex.is_match(&text_arg(args, 0))))
        }
        _ => Err(CompileError::type_error(format!("{name} is not a function"))),
    }
}

fn call_string(s: &str, name: &str, args: &[Value]) -> Result<Value> {
    let units: Vec<u16> = s.encode_utf16().collect();
    let needle: Vec<u16> = text_arg(args, 0).encode_utf16().collect();
    let find = |from: usize| {
        (from..=units.len().saturating_sub(needle.len()))
            .find(|&i| units.get(i..i + needle.len()) == Some(needle.as_slice()))
    };
    Ok(match name {
        "includes" => Value::Bool(find(relative_index(arg(args, 1), units.len(), 0)).is_some()),
        "indexOf" => index_value(find(relative_index(arg(args, 1), units.len(), 0))),
        "startsWith" => Value::Bool(units.starts_with(&needle)),
        "endsWith" => Value::Bool(units.ends_with(&needle)),
        "slice" => {
            let start = relative_index(arg(args, 0), units.len(), 0);
            let end = relative_index(arg(args, 1), units.len(), units.len());
            let part = units.get(start..end.max(start)).unwrap_or_default();
            Value::string(String::from_utf16_lossy(part))
        }
        "split" => match arg(args, 0) {
            Value::Undefined => Value::array(vec![Value::string(s)]),
            _ => {
                let separator = text_arg(args, 0);
                let parts: Vec<Value> = if separator.is_empty() {
                    units
                        .iter()
                        .map(|unit| Value::string(String::from_utf16_lossy(&[*unit])))
                        .collect()
                } else {
                    s.split(separator.as_str()).map(Value::string).collect()
                };
                Value::array(parts)
            }
        },
        "trim" => Value::string(s.trim()),
        "toLowerCase" => Value::string(s.to_lowercase()),
        "toUpperCase" => Value::string(s.to_uppercase()),
        _ => return Err(CompileError::type_error(format!("{name} is not a function"))),
    })
}

#[allow(clippy::cast_precision_loss)]
fn call_array(
    ev: &mut Evaluator,
    receiver: &Value,
    items: &[Value],
    name: &str,
    args: &[Value],
) -> Result<Value> {
    Ok(match name {
        "includes" => Value::Bool(items.iter().any(|item| same_value_zero(item, arg(args, 0)))),
        "indexOf" => index_value(items.iter().position(|item| strict_equals(item, arg(args, 0)))),
        "join" => {
            let separator = match arg(args, 0) {
                Value::Undefined => ",".to_string(),
                other => other.to_js_string().unwrap_or_default(),
            };
            let parts: Vec<String> = items
                .iter()
                .map(|item| {
                    if item.is_nullish() {
                        String::new()
                    } else {
                        item.to_js_string().unwrap_or_default()
                    }
                })
                .collect();
            Value::string(parts.join(&separator))
        }
        "slice" => {
            let start = relative_index(arg(args, 0), items.len(), 0);
            let end = relative_index(arg(args, 1), items.len(), items.len());
            Value::array(items.get(start..end.max(start)).unwrap_or_default().to_vec())
        }
        _ => {
            let function = callback(args, receiver, name)?;
            let mut mapped = Vec::new();
            for (index, item) in items.iter().enumerate() {
                let out = ev.call(&function, vec![item.clone(), Value::Number(index as f64)])?;
                match name {
                    "every" if !out.truthy() => return Ok(Value::Bool(false)),
                    "some" if out.truthy() => return Ok(Value::Bool(true)),
                    "find" if out.truthy() => return Ok(item.clone()),
                    "filter" if out.truthy() => mapped.push(item.clone()),
                    "map" => mapped.push(out),
                    _ => {}
                }
            }
            match name {
                "every" => Value::Bool(true),
                "some" => Value::Bool(false),
                "find" => Value::Undefined,
                "filter" | "map" => Value::array(mapped),
                _ => return Err(CompileError::type_error(format!("{name} is not a function"))),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn call_on(receiver: &Value, name: &str, args: &[Value]) -> serde_json::Value {
        call(&mut Evaluator::new(), receiver, name, args)
            .unwrap()
            .to_json()
            .unwrap()
    }

    #[test]
    fn test_string_methods() {
        let s = Value::string("Hello world");
        assert_eq!(call_on(&s, "includes", &[Value::string("lo w")]), json!(true));
        assert_eq!(call_on(&s, "indexOf", &[Value::string("o")]), json!(4));
        assert_eq!(call_on(&s, "slice", &[Value::Number(-5.0)]), json!("world"));
        assert_eq!(
            call_on(&s, "split", &[Value::string(" ")]),
            json!(["Hello", "world"])
        );
        assert_eq!(call_on(&s, "startsWith", &[Value::string("Hell")]), json!(true));
    }

    #[test]
    fn test_array_includes_nan() {
        let items = Value::array(vec![Value::Number(f64::NAN)]);
        assert_eq!(call_on(&items, "includes", &[Value::Number(f64::NAN)]), json!(true));
        assert_eq!(call_on(&items, "indexOf", &[Value::Number(f64::NAN)]), json!(-1));
    }

    #[test]
    fn test_join_skips_nullish() {
        let items = Value::array(vec![Value::Number(1.0), Value::Null, Value::string("x")]);
        assert_eq!(call_on(&items, "join", &[Value::string("-")]), json!("1--x"));
    }

    #[test]
    fn test_method_lookup() {
        assert!(method(&Value::string("a"), "trim").is_some());
        assert!(method(&Value::string("a"), "map").is_none());
        assert!(method(&Value::Number(1.0), "trim").is_none());
    }

    #[test]
    fn test_regex_test() {
        let regex = Value::RegExp {
            source: "^a+$".into(),
            flags: "i".into(),
        };
        assert_eq!(call_on(&regex, "test", &[Value::string("AAA")]), json!(true));
        assert_eq!(call_on(&regex, "test", &[Value::string("ab")]), json!(false));
    }

    #[test]
    fn test_callback_must_be_function() {
        let items = Value::array(vec![Value::Number(1.0)]);
        let err = call(&mut Evaluator::new(), &items, "map", &[Value::Number(3.0)]).unwrap_err();
        assert!(err.message.contains("is not a function"));
    }
}
