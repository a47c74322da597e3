//! Validation issues.
//!
//! Each kind carries only its own data. The message is fixed when the issue
//! is raised, and [`Issue::to_json`] lays the issue out the way the given
//! API generation serializes it.

use serde_json::{Map, Value, json};

use crate::generation::ApiGeneration;
use crate::value::{js_number_string, number_value, quote_value, stringify_value};

/// One step of an issue path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object key.
    Key(String),
    /// Array or tuple index.
    Index(usize),
}

impl PathSegment {
    fn to_json(&self) -> Value {
        match self {
            Self::Key(key) => Value::String(key.clone()),
            Self::Index(index) => json!(index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// What a size bound applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeOrigin {
    /// Character count.
    String,
    /// Numeric value.
    Number,
    /// Element count.
    Array,
}

impl SizeOrigin {
    const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Array => "array",
        }
    }
}

/// String format checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringFormat {
    /// Email address.
    Email,
    /// URL.
    Url,
    /// UUID.
    Uuid,
    /// ISO 8601 datetime.
    Datetime,
    /// Regular expression, with its `/source/flags` rendering.
    Regex(String),
    /// Required prefix.
    StartsWith(String),
    /// Required suffix.
    EndsWith(String),
    /// Required substring.
    Includes(String),
}

/// Issue kinds raised by the schema types.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueKind {
    /// Wrong runtime type.
    InvalidType {
        /// Expected type name.
        expected: String,
        /// Received type name.
        received: String,
    },
    /// Value differs from a literal.
    InvalidLiteral {
        /// The literal.
        expected: Value,
        /// What was received (`None` for undefined).
        received: Option<Value>,
    },
    /// Value is not one of the enum options.
    InvalidEnumValue {
        /// Allowed values.
        options: Vec<Value>,
        /// Received value.
        received: Value,
    },
    /// Below a lower bound.
    TooSmall {
        /// Bounded quantity.
        origin: SizeOrigin,
        /// The bound.
        minimum: f64,
        /// Whether the bound itself is allowed.
        inclusive: bool,
        /// Raised by an exact-length check.
        exact: bool,
    },
    /// Above an upper bound.
    TooBig {
        /// Bounded quantity.
        origin: SizeOrigin,
        /// The bound.
        maximum: f64,
        /// Whether the bound itself is allowed.
        inclusive: bool,
        /// Raised by an exact-length check.
        exact: bool,
    },
    /// String does not have the required format.
    InvalidString(StringFormat),
    /// Number is not a multiple of the divisor.
    NotMultipleOf {
        /// The divisor.
        divisor: f64,
    },
    /// Number is infinite.
    NotFinite,
    /// Strict object received keys outside its shape.
    UnrecognizedKeys {
        /// Offending keys, in input order.
        keys: Vec<String>,
    },
    /// No union option matched.
    InvalidUnion {
        /// Issues of every option, in option order.
        errors: Vec<Vec<Issue>>,
    },
    /// Discriminator value matches no option.
    InvalidDiscriminator {
        /// Discriminator key.
        discriminator: String,
        /// Known discriminator values.
        options: Vec<Value>,
    },
    /// Both intersection sides succeeded with incompatible outputs.
    InvalidIntersection,
    /// A refinement returned a falsy value.
    Custom,
}

/// A single validation issue.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    /// Issue kind and its data.
    pub kind: IssueKind,
    /// Location in the input.
    pub path: Vec<PathSegment>,
    /// Human-readable message.
    pub message: String,
}

impl Issue {
    /// Raise an issue with the generation's default message unless a custom
    /// one is given.
    #[must_use]
    pub fn new(
        kind: IssueKind,
        path: Vec<PathSegment>,
        message: Option<String>,
        generation: ApiGeneration,
    ) -> Self {
        let message = message.unwrap_or_else(|| default_message(&kind, generation));
        Self {
            kind,
            path,
            message,
        }
    }

    /// Issue code as serialized by the generation.
    #[must_use]
    pub fn code(&self, generation: ApiGeneration) -> &'static str {
        let v4 = generation == ApiGeneration::V4;
        match &self.kind {
            IssueKind::InvalidType { .. } => "invalid_type",
            IssueKind::InvalidLiteral { .. } if v4 => "invalid_value",
            IssueKind::InvalidLiteral { .. } => "invalid_literal",
            IssueKind::InvalidEnumValue { .. } if v4 => "invalid_value",
            IssueKind::InvalidEnumValue { .. } => "invalid_enum_value",
            IssueKind::TooSmall { .. } => "too_small",
            IssueKind::TooBig { .. } => "too_big",
            IssueKind::InvalidString(_) if v4 => "invalid_format",
            IssueKind::InvalidString(_) => "invalid_string",
            IssueKind::NotMultipleOf { .. } => "not_multiple_of",
            IssueKind::NotFinite if v4 => "invalid_type",
            IssueKind::NotFinite => "not_finite",
            IssueKind::UnrecognizedKeys { .. } => "unrecognized_keys",
            IssueKind::InvalidUnion { .. } => "invalid_union",
            IssueKind::InvalidDiscriminator { .. } if v4 => "invalid_union",
            IssueKind::InvalidDiscriminator { .. } => "invalid_union_discriminator",
            IssueKind::InvalidIntersection if v4 => "custom",
            IssueKind::InvalidIntersection => "invalid_intersection_types",
            IssueKind::Custom => "custom",
        }
    }

    /// Serialize the issue with the generation's field layout.
    #[must_use]
    pub fn to_json(&self, generation: ApiGeneration) -> Value {
        match generation {
            ApiGeneration::V3 => self.to_json_v3(),
            ApiGeneration::V4 => self.to_json_v4(),
        }
    }

    fn path_json(&self) -> Value {
        Value::Array(self.path.iter().map(PathSegment::to_json).collect())
    }

    fn to_json_v3(&self) -> Value {
        let code = self.code(ApiGeneration::V3);
        let mut out = Map::new();
        // Check-driven issues carry their message ahead of the path.
        let mut message_first = false;
        match &self.kind {
            IssueKind::InvalidType { expected, received } => {
                out.insert("code".into(), code.into());
                out.insert("expected".into(), expected.as_str().into());
                out.insert("received".into(), received.as_str().into());
                message_first = expected == "integer";
            }
            IssueKind::InvalidLiteral { expected, received } => {
                if let Some(received) = received {
                    out.insert("received".into(), received.clone());
                }
                out.insert("code".into(), code.into());
                out.insert("expected".into(), expected.clone());
            }
            IssueKind::InvalidEnumValue { options, received } => {
                out.insert("received".into(), received.clone());
                out.insert("code".into(), code.into());
                out.insert("options".into(), Value::Array(options.clone()));
            }
            IssueKind::TooSmall {
                origin,
                minimum,
                inclusive,
                exact,
            } => {
                out.insert("code".into(), code.into());
                out.insert("minimum".into(), number_value(*minimum));
                out.insert("type".into(), origin.name().into());
                out.insert("inclusive".into(), (*inclusive).into());
                out.insert("exact".into(), (*exact).into());
                message_first = true;
            }
            IssueKind::TooBig {
                origin,
                maximum,
                inclusive,
                exact,
            } => {
                out.insert("code".into(), code.into());
                out.insert("maximum".into(), number_value(*maximum));
                out.insert("type".into(), origin.name().into());
                out.insert("inclusive".into(), (*inclusive).into());
                out.insert("exact".into(), (*exact).into());
                message_first = true;
            }
            IssueKind::InvalidString(format) => {
                let validation = match format {
                    StringFormat::Email => json!("email"),
                    StringFormat::Url => json!("url"),
                    StringFormat::Uuid => json!("uuid"),
                    StringFormat::Datetime => json!("datetime"),
                    StringFormat::Regex(_) => json!("regex"),
                    StringFormat::StartsWith(prefix) => json!({ "startsWith": prefix }),
                    StringFormat::EndsWith(suffix) => json!({ "endsWith": suffix }),
                    StringFormat::Includes(needle) => json!({ "includes": needle }),
                };
                out.insert("validation".into(), validation);
                out.insert("code".into(), code.into());
                message_first = true;
            }
            IssueKind::NotMultipleOf { divisor } => {
                out.insert("code".into(), code.into());
                out.insert("multipleOf".into(), number_value(*divisor));
                message_first = true;
            }
            IssueKind::UnrecognizedKeys { keys } => {
                out.insert("code".into(), code.into());
                out.insert("keys".into(), json!(keys));
            }
            IssueKind::InvalidUnion { errors } => {
                out.insert("code".into(), code.into());
                let union_errors = errors
                    .iter()
                    .map(|issues| error_json(issues, ApiGeneration::V3))
                    .collect();
                out.insert("unionErrors".into(), Value::Array(union_errors));
            }
            IssueKind::InvalidDiscriminator { options, .. } => {
                out.insert("code".into(), code.into());
                out.insert("options".into(), Value::Array(options.clone()));
            }
            IssueKind::InvalidIntersection => {
                out.insert("code".into(), code.into());
            }
            IssueKind::NotFinite | IssueKind::Custom => {
                out.insert("code".into(), code.into());
                message_first = true;
            }
        }
        if message_first {
            out.insert("message".into(), self.message.as_str().into());
            out.insert("path".into(), self.path_json());
        } else {
            out.insert("path".into(), self.path_json());
            out.insert("message".into(), self.message.as_str().into());
        }
        Value::Object(out)
    }

    fn to_json_v4(&self) -> Value {
        let code = self.code(ApiGeneration::V4);
        let mut out = Map::new();
        match &self.kind {
            IssueKind::InvalidType { expected, .. } => {
                out.insert("expected".into(), expected.as_str().into());
                out.insert("code".into(), code.into());
            }
            IssueKind::InvalidLiteral { expected, .. } => {
                out.insert("code".into(), code.into());
                out.insert("values".into(), json!([expected]));
            }
            IssueKind::InvalidEnumValue { options, .. } => {
                out.insert("code".into(), code.into());
                out.insert("values".into(), Value::Array(options.clone()));
            }
            IssueKind::TooSmall {
                origin,
                minimum,
                inclusive,
                ..
            } => {
                out.insert("origin".into(), origin.name().into());
                out.insert("code".into(), code.into());
                out.insert("minimum".into(), number_value(*minimum));
                out.insert("inclusive".into(), (*inclusive).into());
            }
            IssueKind::TooBig {
                origin,
                maximum,
                inclusive,
                ..
            } => {
                out.insert("origin".into(), origin.name().into());
                out.insert("code".into(), code.into());
                out.insert("maximum".into(), number_value(*maximum));
                out.insert("inclusive".into(), (*inclusive).into());
            }
            IssueKind::InvalidString(format) => {
                out.insert("origin".into(), "string".into());
                out.insert("code".into(), code.into());
                let (name, extra) = match format {
                    StringFormat::Email => ("email", None),
                    StringFormat::Url => ("url", None),
                    StringFormat::Uuid => ("uuid", None),
                    StringFormat::Datetime => ("datetime", None),
                    StringFormat::Regex(pattern) => ("regex", Some(("pattern", pattern))),
                    StringFormat::StartsWith(prefix) => ("starts_with", Some(("prefix", prefix))),
                    StringFormat::EndsWith(suffix) => ("ends_with", Some(("suffix", suffix))),
                    StringFormat::Includes(needle) => ("includes", Some(("includes", needle))),
                };
                out.insert("format".into(), name.into());
                if let Some((key, value)) = extra {
                    out.insert(key.into(), value.as_str().into());
                }
            }
            IssueKind::NotFinite => {
                out.insert("expected".into(), "number".into());
                out.insert("code".into(), code.into());
            }
            IssueKind::NotMultipleOf { divisor } => {
                out.insert("origin".into(), "number".into());
                out.insert("code".into(), code.into());
                out.insert("divisor".into(), number_value(*divisor));
            }
            IssueKind::UnrecognizedKeys { keys } => {
                out.insert("code".into(), code.into());
                out.insert("keys".into(), json!(keys));
            }
            IssueKind::InvalidUnion { errors } => {
                out.insert("code".into(), code.into());
                let errors = errors
                    .iter()
                    .map(|issues| {
                        Value::Array(
                            issues
                                .iter()
                                .map(|issue| issue.to_json(ApiGeneration::V4))
                                .collect(),
                        )
                    })
                    .collect();
                out.insert("errors".into(), Value::Array(errors));
            }
            IssueKind::InvalidDiscriminator { discriminator, .. } => {
                out.insert("code".into(), code.into());
                out.insert("errors".into(), json!([]));
                out.insert("note".into(), "No matching discriminator".into());
                out.insert("discriminator".into(), discriminator.as_str().into());
            }
            IssueKind::InvalidIntersection | IssueKind::Custom => {
                out.insert("code".into(), code.into());
            }
        }
        out.insert("path".into(), self.path_json());
        out.insert("message".into(), self.message.as_str().into());
        Value::Object(out)
    }
}

/// Serialized error object: `{"issues": [...], "name": "ZodError"}`.
#[must_use]
pub fn error_json(issues: &[Issue], generation: ApiGeneration) -> Value {
    json!({
        "issues": issues.iter().map(|issue| issue.to_json(generation)).collect::<Vec<_>>(),
        "name": "ZodError",
    })
}

pub(crate) fn join_quoted(values: &[Value], separator: &str) -> String {
    values
        .iter()
        .map(quote_value)
        .collect::<Vec<_>>()
        .join(separator)
}

fn join_stringified(values: &[Value], separator: &str) -> String {
    values
        .iter()
        .map(stringify_value)
        .collect::<Vec<_>>()
        .join(separator)
}

fn default_message(kind: &IssueKind, generation: ApiGeneration) -> String {
    match generation {
        ApiGeneration::V3 => message_v3(kind),
        ApiGeneration::V4 => message_v4(kind),
    }
}

fn message_v3(kind: &IssueKind) -> String {
    match kind {
        IssueKind::InvalidType { received, .. } if received == "undefined" => {
            "Required".to_string()
        }
        IssueKind::InvalidType { expected, received } => {
            format!("Expected {expected}, received {received}")
        }
        IssueKind::InvalidLiteral { expected, .. } => {
            format!("Invalid literal value, expected {}", stringify_value(expected))
        }
        IssueKind::InvalidEnumValue { options, received } => {
            let received = match received {
                Value::String(s) => s.clone(),
                other => stringify_value(other),
            };
            format!(
                "Invalid enum value. Expected {}, received '{received}'",
                join_quoted(options, " | ")
            )
        }
        IssueKind::TooSmall {
            origin,
            minimum,
            inclusive,
            exact,
        } => {
            let n = js_number_string(*minimum);
            match (origin, exact, inclusive) {
                (SizeOrigin::String, true, _) => format!("String must contain exactly {n} character(s)"),
                (SizeOrigin::String, false, true) => format!("String must contain at least {n} character(s)"),
                (SizeOrigin::String, false, false) => format!("String must contain over {n} character(s)"),
                (SizeOrigin::Array, true, _) => format!("Array must contain exactly {n} element(s)"),
                (SizeOrigin::Array, false, true) => format!("Array must contain at least {n} element(s)"),
                (SizeOrigin::Array, false, false) => format!("Array must contain more than {n} element(s)"),
                (SizeOrigin::Number, true, _) => format!("Number must be exactly {n}"),
                (SizeOrigin::Number, false, true) => format!("Number must be greater than or equal to {n}"),
                (SizeOrigin::Number, false, false) => format!("Number must be greater than {n}"),
            }
        }
        IssueKind::TooBig {
            origin,
            maximum,
            inclusive,
            exact,
        } => {
            let n = js_number_string(*maximum);
            match (origin, exact, inclusive) {
                (SizeOrigin::String, true, _) => format!("String must contain exactly {n} character(s)"),
                (SizeOrigin::String, false, true) => format!("String must contain at most {n} character(s)"),
                (SizeOrigin::String, false, false) => format!("String must contain under {n} character(s)"),
                (SizeOrigin::Array, true, _) => format!("Array must contain exactly {n} element(s)"),
                (SizeOrigin::Array, false, true) => format!("Array must contain at most {n} element(s)"),
                (SizeOrigin::Array, false, false) => format!("Array must contain less than {n} element(s)"),
                (SizeOrigin::Number, true, _) => format!("Number must be exactly {n}"),
                (SizeOrigin::Number, false, true) => format!("Number must be less than or equal to {n}"),
                (SizeOrigin::Number, false, false) => format!("Number must be less than {n}"),
            }
        }
        IssueKind::InvalidString(format) => match format {
            StringFormat::Email => "Invalid email".to_string(),
            StringFormat::Url => "Invalid url".to_string(),
            StringFormat::Uuid => "Invalid uuid".to_string(),
            StringFormat::Datetime => "Invalid datetime".to_string(),
            StringFormat::Regex(_) => "Invalid".to_string(),
            StringFormat::StartsWith(prefix) => format!("Invalid input: must start with \"{prefix}\""),
            StringFormat::EndsWith(suffix) => format!("Invalid input: must end with \"{suffix}\""),
            StringFormat::Includes(needle) => format!("Invalid input: must include \"{needle}\""),
        },
        IssueKind::NotMultipleOf { divisor } => {
            format!("Number must be a multiple of {}", js_number_string(*divisor))
        }
        IssueKind::NotFinite => "Number must be finite".to_string(),
        IssueKind::UnrecognizedKeys { keys } => {
            let keys: Vec<String> = keys.iter().map(|k| format!("'{k}'")).collect();
            format!("Unrecognized key(s) in object: {}", keys.join(", "))
        }
        IssueKind::InvalidUnion { .. } | IssueKind::Custom => "Invalid input".to_string(),
        IssueKind::InvalidDiscriminator { options, .. } => {
            format!("Invalid discriminator value. Expected {}", join_quoted(options, " | "))
        }
        IssueKind::InvalidIntersection => "Intersection results could not be merged".to_string(),
    }
}

fn message_v4(kind: &IssueKind) -> String {
    match kind {
        IssueKind::InvalidType { expected, received } => {
            let received = if received == "nan" { "NaN" } else { received };
            format!("Invalid input: expected {expected}, received {received}")
        }
        IssueKind::InvalidLiteral { expected, .. } => {
            format!("Invalid input: expected {}", stringify_value(expected))
        }
        IssueKind::InvalidEnumValue { options, .. } => {
            format!("Invalid option: expected one of {}", join_stringified(options, "|"))
        }
        IssueKind::TooSmall {
            origin,
            minimum,
            inclusive,
            ..
        } => {
            let adj = if *inclusive { ">=" } else { ">" };
            let n = js_number_string(*minimum);
            match origin {
                SizeOrigin::Number => format!("Too small: expected number to be {adj}{n}"),
                SizeOrigin::String => format!("Too small: expected string to have {adj}{n} characters"),
                SizeOrigin::Array => format!("Too small: expected array to have {adj}{n} items"),
            }
        }
        IssueKind::TooBig {
            origin,
            maximum,
            inclusive,
            ..
        } => {
            let adj = if *inclusive { "<=" } else { "<" };
            let n = js_number_string(*maximum);
            match origin {
                SizeOrigin::Number => format!("Too big: expected number to be {adj}{n}"),
                SizeOrigin::String => format!("Too big: expected string to have {adj}{n} characters"),
                SizeOrigin::Array => format!("Too big: expected array to have {adj}{n} items"),
            }
        }
        IssueKind::InvalidString(format) => match format {
            StringFormat::Email => "Invalid email address".to_string(),
            StringFormat::Url => "Invalid URL".to_string(),
            StringFormat::Uuid => "Invalid UUID".to_string(),
            StringFormat::Datetime => "Invalid ISO datetime".to_string(),
            StringFormat::Regex(pattern) => format!("Invalid string: must match pattern {pattern}"),
            StringFormat::StartsWith(prefix) => format!("Invalid string: must start with \"{prefix}\""),
            StringFormat::EndsWith(suffix) => format!("Invalid string: must end with \"{suffix}\""),
            StringFormat::Includes(needle) => format!("Invalid string: must include \"{needle}\""),
        },
        IssueKind::NotMultipleOf { divisor } => {
            format!("Invalid number: must be a multiple of {}", js_number_string(*divisor))
        }
        IssueKind::NotFinite => "Invalid input: expected number, received Infinity".to_string(),
        IssueKind::UnrecognizedKeys { keys } => {
            let plural = if keys.len() > 1 { "s" } else { "" };
            let keys: Vec<String> = keys.iter().map(|k| format!("\"{k}\"")).collect();
            format!("Unrecognized key{plural}: {}", keys.join(", "))
        }
        IssueKind::InvalidUnion { .. } | IssueKind::InvalidDiscriminator { .. } | IssueKind::Custom => {
            "Invalid input".to_string()
        }
        IssueKind::InvalidIntersection => "Unmergable intersection".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_issue(generation: ApiGeneration, received: &str) -> Issue {
        Issue::new(
            IssueKind::InvalidType {
                expected: "string".to_string(),
                received: received.to_string(),
            },
            vec![PathSegment::from("key")],
            None,
            generation,
        )
    }

    #[test]
    fn test_invalid_type_messages() {
        assert_eq!(
            type_issue(ApiGeneration::V3, "number").message,
            "Expected string, received number"
        );
        assert_eq!(type_issue(ApiGeneration::V3, "undefined").message, "Required");
        assert_eq!(
            type_issue(ApiGeneration::V4, "number").message,
            "Invalid input: expected string, received number"
        );
    }

    #[test]
    fn test_v3_layout() {
        let json = type_issue(ApiGeneration::V3, "number").to_json(ApiGeneration::V3);
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["code", "expected", "received", "path", "message"]);
        assert_eq!(json["path"], json!(["key"]));
    }

    #[test]
    fn test_v4_layout_omits_received() {
        let json = type_issue(ApiGeneration::V4, "number").to_json(ApiGeneration::V4);
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["expected", "code", "path", "message"]);
    }

    #[test]
    fn test_size_messages() {
        let kind = IssueKind::TooSmall {
            origin: SizeOrigin::String,
            minimum: 3.0,
            inclusive: true,
            exact: false,
        };
        let v3 = Issue::new(kind.clone(), vec![], None, ApiGeneration::V3);
        let v4 = Issue::new(kind, vec![], None, ApiGeneration::V4);
        assert_eq!(v3.message, "String must contain at least 3 character(s)");
        assert_eq!(v4.message, "Too small: expected string to have >=3 characters");
    }

    #[test]
    fn test_enum_message() {
        let kind = IssueKind::InvalidEnumValue {
            options: vec![json!("a"), json!("b")],
            received: json!("c"),
        };
        let v3 = Issue::new(kind.clone(), vec![], None, ApiGeneration::V3);
        let v4 = Issue::new(kind, vec![], None, ApiGeneration::V4);
        assert_eq!(v3.message, "Invalid enum value. Expected 'a' | 'b', received 'c'");
        assert_eq!(v4.message, "Invalid option: expected one of \"a\"|\"b\"");
    }

    #[test]
    fn test_custom_message_wins() {
        let issue = Issue::new(IssueKind::Custom, vec![], Some("Too short".to_string()), ApiGeneration::V3);
        assert_eq!(issue.message, "Too short");
    }

    #[test]
    fn test_error_json() {
        let issue = type_issue(ApiGeneration::V3, "number");
        let json = error_json(&[issue], ApiGeneration::V3);
        assert_eq!(json["name"], "ZodError");
        assert_eq!(json["issues"].as_array().map(Vec::len), Some(1));
    }
}
