//! Runtime values of the evaluator.

use std::fmt;
use std::sync::Arc;

use serde_json::Value as Json;
use zt_schema::value::{js_number_string, number_value};
use zt_schema::{Library, Schema};

use crate::ast::ArrowFunction;
use crate::interp::Env;

/// An evaluated value.
#[derive(Clone)]
pub enum Value {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// Boolean.
    Bool(bool),
    /// Number.
    Number(f64),
    /// String.
    String(Arc<str>),
    /// Array.
    Array(Arc<Vec<Value>>),
    /// Plain object with insertion-ordered keys.
    Object(Arc<Vec<(String, Value)>>),
    /// Regular expression literal.
    RegExp {
        /// Pattern.
        source: Arc<str>,
        /// Flags.
        flags: Arc<str>,
    },
    /// Callable.
    Function(Function),
    /// The library namespace (`z`) or one of its sub-namespaces.
    Namespace(Namespace),
    /// A schema.
    Schema(Schema),
}

/// A namespace object of the loaded library.
#[derive(Debug, Clone)]
pub struct Namespace {
    /// Library instance.
    pub library: Arc<Library>,
    /// `z.coerce` rather than `z`.
    pub coerce: bool,
}

/// Callable values.
#[derive(Clone)]
pub enum Function {
    /// User-written arrow function with its captured scope.
    Arrow(Arc<Closure>),
    /// A constructor exported by the namespace.
    Export {
        /// Namespace the export belongs to.
        namespace: Namespace,
        /// Export name.
        name: String,
    },
    /// A schema method bound to its receiver.
    SchemaMethod {
        /// Receiver.
        schema: Schema,
        /// Method name.
        name: String,
    },
    /// A string, array or regex method bound to its receiver.
    Builtin {
        /// Receiver.
        receiver: Box<Value>,
        /// Method name.
        name: &'static str,
    },
}

/// An arrow function and the scope it closes over.
pub struct Closure {
    /// Parsed function.
    pub function: Arc<ArrowFunction>,
    /// Captured scope.
    pub env: Env,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("params", &self.function.params.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arrow(closure) => closure.fmt(f),
            Self::Export { name, .. } => write!(f, "Export({name})"),
            Self::SchemaMethod { schema, name } => write!(f, "{}.{name}", schema.type_name()),
            Self::Builtin { name, .. } => write!(f, "Builtin({name})"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&js_number_string(*n)),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Array(items) => f.debug_list().entries(items.iter()).finish(),
            Self::Object(entries) => f
                .debug_map()
                .entries(entries.iter().map(|(k, v)| (k, v)))
                .finish(),
            Self::RegExp { source, flags } => write!(f, "/{source}/{flags}"),
            Self::Function(func) => func.fmt(f),
            Self::Namespace(ns) => write!(f, "Namespace(coerce: {})", ns.coerce),
            Self::Schema(schema) => write!(f, "{}", schema.type_name()),
        }
    }
}

impl Value {
    /// String value.
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Self::String(s.into())
    }

    /// Array value.
    #[must_use]
    pub fn array(items: Vec<Value>) -> Self {
        Self::Array(Arc::new(items))
    }

    /// Object value.
    #[must_use]
    pub fn object(entries: Vec<(String, Value)>) -> Self {
        Self::Object(Arc::new(entries))
    }

    /// `typeof value`
    #[must_use]
    pub fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Function(_) => "function",
            Self::Null
            | Self::Array(_)
            | Self::Object(_)
            | Self::RegExp { .. }
            | Self::Namespace(_)
            | Self::Schema(_) => "object",
        }
    }

    /// `null` or `undefined`.
    #[must_use]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// JavaScript truthiness.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// `Number(value)`
    #[must_use]
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::String(s) => zt_schema::value::to_js_number(Some(&Json::String(s.to_string()))),
            Self::Array(_) => self.to_js_string().map_or(f64::NAN, |s| {
                zt_schema::value::to_js_number(Some(&Json::String(s)))
            }),
            _ => f64::NAN,
        }
    }

    /// `String(value)`; `None` for values whose conversion would throw.
    #[must_use]
    pub fn to_js_string(&self) -> Option<String> {
        Some(match self {
            Self::Undefined => "undefined".to_string(),
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => js_number_string(*n),
            Self::String(s) => s.to_string(),
            Self::Array(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items.iter() {
                    parts.push(if item.is_nullish() {
                        String::new()
                    } else {
                        item.to_js_string()?
                    });
                }
                parts.join(",")
            }
            Self::RegExp { source, flags } => format!("/{source}/{flags}"),
            Self::Function(_) => "function () { [native code] }".to_string(),
            Self::Object(_) | Self::Namespace(_) | Self::Schema(_) => "[object Object]".to_string(),
        })
    }

    /// Convert to JSON the way `JSON.stringify` would; `None` is `undefined`.
    #[must_use]
    pub fn to_json(&self) -> Option<Json> {
        match self {
            Self::Undefined | Self::Function(_) => None,
            Self::Null => Some(Json::Null),
            Self::Bool(b) => Some(Json::Bool(*b)),
            Self::Number(n) => Some(number_value(*n)),
            Self::String(s) => Some(Json::String(s.to_string())),
            Self::Array(items) => Some(Json::Array(
                items
                    .iter()
                    .map(|item| item.to_json().unwrap_or(Json::Null))
                    .collect(),
            )),
            Self::Object(entries) => Some(Json::Object(
                entries
                    .iter()
                    .filter_map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
                    .collect(),
            )),
            Self::RegExp { .. } | Self::Namespace(_) | Self::Schema(_) => {
                Some(Json::Object(serde_json::Map::new()))
            }
        }
    }

    /// Convert parsed JSON into a runtime value.
    #[must_use]
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(*b),
            Json::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Self::string(s.as_str()),
            Json::Array(items) => Self::array(items.iter().map(Self::from_json).collect()),
            Json::Object(map) => Self::object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Own property of a plain object.
    #[must_use]
    pub fn get_own(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Insert or replace `key`, keeping the first position like object literals do.
pub fn set_property(entries: &mut Vec<(String, Value)>, key: String, value: Value) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => entries.push((key, value)),
    }
}

/// `a === b`
#[must_use]
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => Arc::ptr_eq(x, y),
        (Value::Object(x), Value::Object(y)) => Arc::ptr_eq(x, y),
        (Value::RegExp { source: x, .. }, Value::RegExp { source: y, .. }) => Arc::ptr_eq(x, y),
        (Value::Namespace(x), Value::Namespace(y)) => {
            x.library.id() == y.library.id() && x.coerce == y.coerce
        }
        _ => false,
    }
}

/// `a == b`
#[must_use]
pub fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (x, y) if x.is_nullish() && y.is_nullish() => true,
        (x, _) | (_, x) if x.is_nullish() => false,
        (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
            a.to_number() == b.to_number()
        }
        (Value::Bool(_), _) => loose_equals(&Value::Number(a.to_number()), b),
        (_, Value::Bool(_)) => loose_equals(a, &Value::Number(b.to_number())),
        (Value::Number(_) | Value::String(_), Value::Array(_) | Value::Object(_))
        | (Value::Array(_) | Value::Object(_), Value::Number(_) | Value::String(_)) => {
            let primitive = |v: &Value| match v {
                Value::Array(_) | Value::Object(_) => {
                    v.to_js_string().map_or(Value::Undefined, Value::string)
                }
                other => other.clone(),
            };
            loose_equals(&primitive(a), &primitive(b))
        }
        _ => strict_equals(a, b),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_json_conversion() {
        let input = json!({"a": [1, 2.5, null], "b": {"c": "d"}, "e": true});
        let value = Value::from_json(&input);
        assert_eq!(value.to_json(), Some(input));
        assert_eq!(Value::Undefined.to_json(), None);
        assert_eq!(
            Value::array(vec![Value::Undefined, Value::Number(f64::NAN)]).to_json(),
            Some(json!([null, null]))
        );
    }

    #[test]
    fn test_object_conversion_drops_undefined() {
        let value = Value::object(vec![
            ("a".to_string(), Value::Undefined),
            ("b".to_string(), Value::Number(1.0)),
        ]);
        assert_eq!(value.to_json(), Some(json!({"b": 1})));
    }

    #[test]
    fn test_equality() {
        assert!(loose_equals(&Value::Null, &Value::Undefined));
        assert!(!strict_equals(&Value::Null, &Value::Undefined));
        assert!(loose_equals(&Value::Number(1.0), &Value::string("1")));
        assert!(loose_equals(&Value::Bool(true), &Value::Number(1.0)));
        assert!(!loose_equals(&Value::Number(0.0), &Value::Null));
        assert!(!strict_equals(&Value::Number(f64::NAN), &Value::Number(f64::NAN)));

        let array = Value::array(vec![]);
        assert!(strict_equals(&array, &array.clone()));
        assert!(!strict_equals(&array, &Value::array(vec![])));
    }

    #[test]
    fn test_string_conversion() {
        let array = Value::array(vec![Value::Number(1.0), Value::Null, Value::string("x")]);
        assert_eq!(array.to_js_string().as_deref(), Some("1,,x"));
        assert_eq!(Value::Number(0.1 + 0.2).to_js_string().as_deref(), Some("0.30000000000000004"));
        assert_eq!(Value::string(" 42 ").to_number(), 42.0);
    }
}
