//! Library exports and schema methods as seen from source text.

use std::sync::Arc;

use serde_json::Value as Json;
use zt_schema::{
    ApiGeneration, COERCE_EXPORTS, NumberCheck, NumberCheckKind, ParseOutcome, PathSegment, Schema,
    SchemaKind, StringCheck, StringCheckKind, error_json,
};

use crate::callback::FunctionCallback;
use crate::error::{CompileError, ErrorKind, Result};
use crate::interp::Evaluator;
use crate::value::{Function, Namespace, Value};

/// Member `key` of a namespace object.
pub fn namespace_member(namespace: &Namespace, key: &str) -> Option<Value> {
    if namespace.coerce {
        return COERCE_EXPORTS.contains(&key).then(|| export(namespace, key));
    }
    if key == "coerce" && namespace.library.has_export(key) {
        return Some(Value::Namespace(Namespace {
            library: Arc::clone(&namespace.library),
            coerce: true,
        }));
    }
    namespace
        .library
        .has_export(key)
        .then(|| export(namespace, key))
}

fn export(namespace: &Namespace, name: &str) -> Value {
    Value::Function(Function::Export {
        namespace: namespace.clone(),
        name: name.to_string(),
    })
}

/// Property `key` of a schema: a bound method or an introspection field.
pub fn schema_property(schema: &Schema, key: &str) -> Option<Value> {
    if schema.supports(key) {
        return Some(Value::Function(Function::SchemaMethod {
            schema: schema.clone(),
            name: key.to_string(),
        }));
    }
    match key {
        "shape" => schema.shape().map(|shape| {
            Value::object(
                shape
                    .iter()
                    .map(|(k, s)| (k.clone(), Value::Schema(s.clone())))
                    .collect(),
            )
        }),
        "element" => schema.element().cloned().map(Value::Schema),
        "options" => match schema.kind() {
            SchemaKind::Union(options) | SchemaKind::DiscriminatedUnion { options, .. } => Some(
                Value::array(options.iter().cloned().map(Value::Schema).collect()),
            ),
            SchemaKind::Enum { values } => {
                Some(Value::array(values.iter().map(Value::from_json).collect()))
            }
            _ => None,
        },
        "enum" => schema.enum_values().map(|values| {
            Value::object(
                values
                    .iter()
                    .map(|v| {
                        let key = Value::from_json(v).to_js_string().unwrap_or_default();
                        (key, Value::from_json(v))
                    })
                    .collect(),
            )
        }),
        "description" => schema.description().map(Value::string),
        _ => None,
    }
}

// Argument helpers

fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&Value::Undefined)
}

fn schema_arg(args: &[Value], index: usize, method: &str) -> Result<Schema> {
    match arg(args, index) {
        Value::Schema(schema) => Ok(schema.clone()),
        other => Err(CompileError::type_error(format!(
            "{method} expects a schema, received {}",
            other.type_of()
        ))),
    }
}

fn schema_list(value: &Value, method: &str) -> Result<Vec<Schema>> {
    let Value::Array(items) = value else {
        return Err(CompileError::type_error(format!(
            "{method} expects an array of schemas"
        )));
    };
    items
        .iter()
        .map(|item| match item {
            Value::Schema(schema) => Ok(schema.clone()),
            other => Err(CompileError::type_error(format!(
                "{method} expects an array of schemas, received {}",
                other.type_of()
            ))),
        })
        .collect()
}

fn shape_arg(value: &Value, method: &str) -> Result<Vec<(String, Schema)>> {
    match value {
        Value::Undefined => Ok(Vec::new()),
        Value::Object(entries) => entries
            .iter()
            .map(|(key, value)| match value {
                Value::Schema(schema) => Ok((key.clone(), schema.clone())),
                _ => Err(CompileError::type_error(format!(
                    "{method}: invalid schema for key \"{key}\""
                ))),
            })
            .collect(),
        other => Err(CompileError::type_error(format!(
            "{method} expects an object shape, received {}",
            other.type_of()
        ))),
    }
}

/// Keys set to a truthy value in a `{key: true}` mask.
fn mask_arg(value: &Value, method: &str) -> Result<Vec<String>> {
    match value {
        Value::Object(entries) => Ok(entries
            .iter()
            .filter(|(_, v)| v.truthy())
            .map(|(k, _)| k.clone())
            .collect()),
        _ => Err(CompileError::type_error(format!(
            "{method} expects a mask object"
        ))),
    }
}

fn string_arg(value: &Value, method: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.to_string()),
        other => Err(CompileError::type_error(format!(
            "{method} expects a string, received {}",
            other.type_of()
        ))),
    }
}

fn number_arg(value: &Value, method: &str) -> Result<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(CompileError::type_error(format!(
            "{method} expects a number, received {}",
            other.type_of()
        ))),
    }
}

/// A length bound, rounded so the comparison matches a fractional bound.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn length_arg(value: &Value, method: &str, round_up: bool) -> Result<usize> {
    let n = number_arg(value, method)?;
    if !n.is_finite() || n < 0.0 {
        return Err(CompileError::new(
            ErrorKind::Range,
            format!("{method} expects a non-negative length"),
        ));
    }
    Ok(if round_up { n.ceil() } else { n.floor() } as usize)
}

/// Custom message from a string or a `{message}` / `{error}` params object.
fn message_arg(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.to_string()),
        Value::Object(_) => ["message", "error"]
            .iter()
            .find_map(|key| match value.get_own(key) {
                Some(Value::String(s)) => Some(s.to_string()),
                _ => None,
            }),
        _ => None,
    }
}

fn path_arg(value: &Value) -> Vec<PathSegment> {
    match value.get_own("path") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(index_segment(*n)),
                other => other.to_js_string().map(PathSegment::Key),
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn index_segment(n: f64) -> PathSegment {
    PathSegment::Index(n as usize)
}

fn function_arg(args: &[Value], index: usize, method: &str) -> Result<Function> {
    match arg(args, index) {
        Value::Function(function) => Ok(function.clone()),
        other => Err(CompileError::type_error(format!(
            "{method} expects a function, received {}",
            other.type_of()
        ))),
    }
}

/// JSON for a literal-like argument; `None` for `undefined`.
fn literal_json(value: &Value) -> Result<Option<Json>> {
    match value {
        Value::Undefined => Ok(None),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(value.to_json()),
        other => Err(CompileError::type_error(format!(
            "Invalid literal value of type {}",
            other.type_of()
        ))),
    }
}

/// Value for `default` and `catch`; functions are called once up front.
fn fixed_value(ev: &mut Evaluator, value: &Value) -> Result<Option<Json>> {
    match value {
        Value::Function(function) => Ok(ev.call(function, Vec::new())?.to_json()),
        other => Ok(other.to_json()),
    }
}

/// The message a throwing parse carries: its issues as indented JSON.
fn parse_error_message(issues: &[zt_schema::Issue], generation: ApiGeneration) -> String {
    let error = error_json(issues, generation);
    serde_json::to_string_pretty(&error["issues"]).unwrap_or_default()
}

/// Call the namespace export `name`.
pub fn call_export(namespace: &Namespace, name: &str, args: &[Value]) -> Result<Value> {
    let lib = &namespace.library;
    let generation = lib.generation();
    let qualified = if namespace.coerce {
        format!("z.coerce.{name}")
    } else {
        format!("z.{name}")
    };

    if namespace.coerce {
        let schema = match name {
            "string" => lib.coerce_string(),
            "number" => lib.coerce_number(),
            "boolean" => lib.coerce_boolean(),
            _ => return Err(CompileError::type_error(format!("{qualified} is not a function"))),
        };
        return Ok(Value::Schema(schema));
    }

    let schema = match name {
        "string" => lib.string(),
        "number" => lib.number(),
        "int" => lib.int(),
        "boolean" => lib.boolean(),
        "null" => lib.null(),
        "undefined" => lib.undefined(),
        "void" => lib.void(),
        "any" => lib.any(),
        "unknown" => lib.unknown(),
        "never" => lib.never(),
        "email" => lib.string_format(StringCheck::new(StringCheckKind::Email, message_arg(arg(args, 0)))),
        "url" => lib.string_format(StringCheck::new(StringCheckKind::Url, message_arg(arg(args, 0)))),
        "uuid" => lib.string_format(StringCheck::new(StringCheckKind::Uuid, message_arg(arg(args, 0)))),
        "literal" => match arg(args, 0) {
            Value::Array(items) if generation == ApiGeneration::V4 => {
                let options = items
                    .iter()
                    .map(|item| {
                        Ok(match literal_json(item)? {
                            Some(json) => lib.literal(json),
                            None => lib.undefined(),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                lib.union(options)
            }
            value => match literal_json(value)? {
                Some(json) => lib.literal(json),
                None => lib.undefined(),
            },
        },
        "enum" => match arg(args, 0) {
            Value::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Ok(s.to_string()),
                        other => Err(CompileError::type_error(format!(
                            "{qualified} expects string values, received {}",
                            other.type_of()
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                lib.enumeration(values)?
            }
            value @ Value::Object(_) if generation == ApiGeneration::V4 => {
                lib.native_enum(enum_entries(value)?)
            }
            other => {
                return Err(CompileError::type_error(format!(
                    "{qualified} expects an array of strings, received {}",
                    other.type_of()
                )));
            }
        },
        "nativeEnum" => lib.native_enum(enum_entries(arg(args, 0))?),
        "object" => lib.object(shape_arg(arg(args, 0), &qualified)?),
        "strictObject" => lib.strict_object(shape_arg(arg(args, 0), &qualified)?),
        "looseObject" => lib.loose_object(shape_arg(arg(args, 0), &qualified)?),
        "array" => lib.array(schema_arg(args, 0, &qualified)?),
        "optional" => lib.optional(schema_arg(args, 0, &qualified)?),
        "nullable" => lib.nullable(schema_arg(args, 0, &qualified)?),
        "union" => lib.union(schema_list(arg(args, 0), &qualified)?),
        "discriminatedUnion" => {
            let key = string_arg(arg(args, 0), &qualified)?;
            lib.discriminated_union(key, schema_list(arg(args, 1), &qualified)?)?
        }
        "intersection" => lib.intersection(
            schema_arg(args, 0, &qualified)?,
            schema_arg(args, 1, &qualified)?,
        ),
        "tuple" => lib.tuple(schema_list(arg(args, 0), &qualified)?),
        "record" => match arg(args, 1) {
            Value::Undefined if generation == ApiGeneration::V4 => {
                // The newer generation requires an explicit key schema
                return Err(CompileError::type_error(
                    "Cannot read properties of undefined (reading '_zod')",
                ));
            }
            Value::Undefined => lib.record(None, schema_arg(args, 0, &qualified)?),
            _ => lib.record(
                Some(schema_arg(args, 0, &qualified)?),
                schema_arg(args, 1, &qualified)?,
            ),
        },
        _ => return Err(CompileError::type_error(format!("{qualified} is not a function"))),
    };
    Ok(Value::Schema(schema))
}

fn enum_entries(value: &Value) -> Result<Vec<(String, Json)>> {
    match value {
        Value::Object(entries) => Ok(entries
            .iter()
            .filter_map(|(k, v)| v.to_json().map(|json| (k.clone(), json)))
            .collect()),
        other => Err(CompileError::type_error(format!(
            "Expected an enum object, received {}",
            other.type_of()
        ))),
    }
}

/// Call the schema method `name` on `schema`.
pub fn call_schema_method(
    ev: &mut Evaluator,
    schema: &Schema,
    name: &str,
    args: &[Value],
) -> Result<Value> {
    let generation = schema.generation();
    let first = arg(args, 0);
    let s = schema;

    let string_check = |kind: StringCheckKind, message: &Value| {
        s.with_string_check(StringCheck::new(kind, message_arg(message)))
    };
    let number_check = |check: NumberCheck| s.with_number_checks([check]);

    let out = match name {
        // Parsing
        "parse" => {
            let input = first.to_json();
            return match s.safe_parse(input.as_ref())? {
                ParseOutcome::Success(data) => {
                    Ok(data.as_ref().map_or(Value::Undefined, Value::from_json))
                }
                ParseOutcome::Failure(issues) => Err(CompileError::new(
                    ErrorKind::Error,
                    parse_error_message(&issues, generation),
                )),
            };
        }
        "safeParse" => {
            let outcome = s.safe_parse(first.to_json().as_ref())?;
            return Ok(Value::from_json(&outcome.to_json(generation)));
        }

        // Wrappers shared by every kind
        "optional" => s.optional(),
        "nullable" => s.nullable(),
        "nullish" => s.nullish(),
        "array" => s.array(),
        "brand" | "readonly" => s.clone(),
        "or" => s.or(schema_arg(args, 0, name)?),
        "and" => s.and(schema_arg(args, 0, name)?),
        "pipe" => s.pipe(schema_arg(args, 0, name)?),
        "describe" => s.describe(&first.to_js_string().unwrap_or_default()),
        "default" => match fixed_value(ev, first)? {
            Some(value) => s.default_value(value),
            None => s.clone(),
        },
        "catch" => s.catch_value(fixed_value(ev, first)?.unwrap_or(Json::Null)),
        "refine" => {
            let check = FunctionCallback::shared(function_arg(args, 0, name)?);
            let params = arg(args, 1);
            s.refine(check, message_arg(params), path_arg(params))
        }
        "transform" => s.transform(FunctionCallback::shared(function_arg(args, 0, name)?)),
        "unwrap" => s.unwrap_inner()?,

        // Size bounds shared by strings, numbers and arrays
        "min" | "max" | "length" | "nonempty" => match s.kind() {
            SchemaKind::String(_) => match name {
                "min" => string_check(StringCheckKind::Min(length_arg(first, name, true)?), arg(args, 1))?,
                "max" => string_check(StringCheckKind::Max(length_arg(first, name, false)?), arg(args, 1))?,
                "length" => {
                    string_check(StringCheckKind::Length(length_arg(first, name, false)?), arg(args, 1))?
                }
                _ => string_check(StringCheckKind::Min(1), first)?,
            },
            SchemaKind::Number(_) => match name {
                "min" => number_check(NumberCheck::min(number_arg(first, name)?, true, message_arg(arg(args, 1))))?,
                _ => number_check(NumberCheck::max(number_arg(first, name)?, true, message_arg(arg(args, 1))))?,
            },
            _ => match name {
                "min" => s.array_min(length_arg(first, name, true)?, message_arg(arg(args, 1)))?,
                "max" => s.array_max(length_arg(first, name, false)?, message_arg(arg(args, 1)))?,
                "length" => s.array_length(length_arg(first, name, false)?, message_arg(arg(args, 1)))?,
                _ => s.array_min(1, message_arg(first))?,
            },
        },

        // Strings
        "email" => string_check(StringCheckKind::Email, first)?,
        "url" => string_check(StringCheckKind::Url, first)?,
        "uuid" => string_check(StringCheckKind::Uuid, first)?,
        "datetime" => string_check(StringCheckKind::Datetime, first)?,
        "regex" => match first {
            Value::RegExp { source, flags } => {
                s.with_string_check(StringCheck::regex(source, flags, message_arg(arg(args, 1)))?)?
            }
            other => {
                return Err(CompileError::type_error(format!(
                    "regex expects a regular expression, received {}",
                    other.type_of()
                )));
            }
        },
        "startsWith" => string_check(StringCheckKind::StartsWith(string_arg(first, name)?), arg(args, 1))?,
        "endsWith" => string_check(StringCheckKind::EndsWith(string_arg(first, name)?), arg(args, 1))?,
        "includes" => string_check(StringCheckKind::Includes(string_arg(first, name)?), arg(args, 1))?,
        "trim" => string_check(StringCheckKind::Trim, &Value::Undefined)?,
        "toLowerCase" => string_check(StringCheckKind::ToLowerCase, &Value::Undefined)?,
        "toUpperCase" => string_check(StringCheckKind::ToUpperCase, &Value::Undefined)?,

        // Numbers
        "gt" => number_check(NumberCheck::min(number_arg(first, name)?, false, message_arg(arg(args, 1))))?,
        "gte" => number_check(NumberCheck::min(number_arg(first, name)?, true, message_arg(arg(args, 1))))?,
        "lt" => number_check(NumberCheck::max(number_arg(first, name)?, false, message_arg(arg(args, 1))))?,
        "lte" => number_check(NumberCheck::max(number_arg(first, name)?, true, message_arg(arg(args, 1))))?,
        "int" => number_check(NumberCheck::int(message_arg(first)))?,
        "positive" => number_check(NumberCheck::min(0.0, false, message_arg(first)))?,
        "nonnegative" => number_check(NumberCheck::min(0.0, true, message_arg(first)))?,
        "negative" => number_check(NumberCheck::max(0.0, false, message_arg(first)))?,
        "nonpositive" => number_check(NumberCheck::max(0.0, true, message_arg(first)))?,
        "multipleOf" | "step" => number_check(NumberCheck::new(
            NumberCheckKind::MultipleOf(number_arg(first, name)?),
            message_arg(arg(args, 1)),
        ))?,
        "finite" => number_check(NumberCheck::new(NumberCheckKind::Finite, message_arg(first)))?,
        "safe" => s.with_number_checks(NumberCheck::safe(message_arg(first)))?,

        // Objects
        "extend" => s.extend(shape_arg(first, name)?)?,
        "merge" => s.merge(&schema_arg(args, 0, name)?)?,
        "pick" => s.pick(&mask_arg(first, name)?)?,
        "omit" => s.omit(&mask_arg(first, name)?)?,
        "partial" | "required" => {
            let keys = match first {
                Value::Undefined => None,
                mask => Some(mask_arg(mask, name)?),
            };
            if name == "partial" {
                s.partial(keys.as_deref())?
            } else {
                s.required(keys.as_deref())?
            }
        }
        "strict" => s.strict()?,
        "passthrough" => s.passthrough()?,
        "strip" => s.strip()?,
        "catchall" => s.catchall(schema_arg(args, 0, name)?)?,
        "keyof" => s.keyof()?,

        _ => {
            return Err(CompileError::type_error(format!(
                "{}.{name} is not a function",
                s.type_name()
            )));
        }
    };
    Ok(Value::Schema(out))
}
