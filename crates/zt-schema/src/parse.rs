//! Non-throwing parse.
//!
//! Every schema kind reports one of three states. `Valid` carries an output
//! and raised nothing. `Dirty` carries an output but raised issues (a failed
//! length check, an unknown key), so wrappers can still inspect the value.
//! `Aborted` has no usable output.

use serde_json::{Map, Value};

use crate::error::CallbackError;
use crate::generation::ApiGeneration;
use crate::issue::{Issue, IssueKind, PathSegment, SizeOrigin, error_json, join_quoted};
use crate::schema::{ArrayDef, NumberDef, ObjectDef, Schema, SchemaKind, StringDef, UnknownKeys};
use crate::value::{
    ParsedType, number_value, strict_equals, to_js_number, to_js_string, truthy,
};

/// Result of a non-throwing parse.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The canonical output; `None` is `undefined`.
    Success(Option<Value>),
    /// Every issue raised, in the order they were found.
    Failure(Vec<Issue>),
}

impl ParseOutcome {
    /// Check if the parse succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Issues of a failed parse; empty on success.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        match self {
            Self::Success(_) => &[],
            Self::Failure(issues) => issues,
        }
    }

    /// The `safeParse` result object: `{success, data}` or `{success, error}`.
    #[must_use]
    pub fn to_json(&self, generation: ApiGeneration) -> Value {
        let mut out = Map::new();
        match self {
            Self::Success(data) => {
                out.insert("success".into(), Value::Bool(true));
                if let Some(data) = data {
                    out.insert("data".into(), data.clone());
                }
            }
            Self::Failure(issues) => {
                out.insert("success".into(), Value::Bool(false));
                out.insert("error".into(), error_json(issues, generation));
            }
        }
        Value::Object(out)
    }
}

#[derive(Debug)]
enum Parsed {
    Valid(Option<Value>),
    Dirty(Option<Value>),
    Aborted,
}

impl Parsed {
    fn new(value: Option<Value>, dirty: bool) -> Self {
        if dirty {
            Self::Dirty(value)
        } else {
            Self::Valid(value)
        }
    }
}

type Step = Result<Parsed, CallbackError>;

struct ParseContext {
    generation: ApiGeneration,
    path: Vec<PathSegment>,
    issues: Vec<Issue>,
}

impl ParseContext {
    fn new(generation: ApiGeneration) -> Self {
        Self {
            generation,
            path: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// Context at the same location that collects its own issues.
    fn fork(&self) -> Self {
        Self {
            generation: self.generation,
            path: self.path.clone(),
            issues: Vec::new(),
        }
    }

    fn raise(&mut self, kind: IssueKind, message: Option<String>) {
        let issue = Issue::new(kind, self.path.clone(), message, self.generation);
        self.issues.push(issue);
    }

    fn invalid_type(&mut self, expected: &str, input: Option<&Value>) -> Parsed {
        self.raise(
            IssueKind::InvalidType {
                expected: expected.to_string(),
                received: ParsedType::of(input).name().to_string(),
            },
            None,
        );
        Parsed::Aborted
    }

    /// Run `parse` one path segment deeper.
    fn at(&mut self, segment: PathSegment, parse: impl FnOnce(&mut Self) -> Step) -> Step {
        self.path.push(segment);
        let result = parse(self);
        self.path.pop();
        result
    }
}

impl Schema {
    /// Parse without throwing. `None` parses `undefined`.
    ///
    /// Returns `Err` only when a user callback threw.
    pub fn safe_parse(&self, input: Option<&Value>) -> Result<ParseOutcome, CallbackError> {
        let mut ctx = ParseContext::new(self.generation());
        let parsed = self.parse_with(input, &mut ctx)?;
        Ok(match parsed {
            Parsed::Valid(value) if ctx.issues.is_empty() => ParseOutcome::Success(value),
            _ => ParseOutcome::Failure(ctx.issues),
        })
    }

    fn parse_with(&self, input: Option<&Value>, ctx: &mut ParseContext) -> Step {
        match self.kind() {
            SchemaKind::String(def) => Ok(parse_string(def, input, ctx)),
            SchemaKind::Number(def) => Ok(parse_number(def, input, ctx)),
            SchemaKind::Boolean { coerce: true } => Ok(Parsed::Valid(Some(Value::Bool(truthy(input))))),
            SchemaKind::Boolean { coerce: false } => Ok(match input {
                Some(Value::Bool(b)) => Parsed::Valid(Some(Value::Bool(*b))),
                other => ctx.invalid_type("boolean", other),
            }),
            SchemaKind::Null => Ok(match input {
                Some(Value::Null) => Parsed::Valid(Some(Value::Null)),
                other => ctx.invalid_type("null", other),
            }),
            SchemaKind::Undefined => Ok(match input {
                None => Parsed::Valid(None),
                other => ctx.invalid_type("undefined", other),
            }),
            SchemaKind::Void => Ok(match input {
                None => Parsed::Valid(None),
                other => ctx.invalid_type("void", other),
            }),
            SchemaKind::Any | SchemaKind::Unknown => Ok(Parsed::Valid(input.cloned())),
            SchemaKind::Never => Ok(ctx.invalid_type("never", input)),
            SchemaKind::Literal(expected) => Ok(match input {
                Some(value) if strict_equals(value, expected) => Parsed::Valid(Some(value.clone())),
                other => {
                    ctx.raise(
                        IssueKind::InvalidLiteral {
                            expected: expected.clone(),
                            received: other.cloned(),
                        },
                        None,
                    );
                    Parsed::Aborted
                }
            }),
            SchemaKind::Enum { values } => Ok(parse_enum(values, input, ctx)),
            SchemaKind::Array(def) => parse_array(def, input, ctx),
            SchemaKind::Object(def) => parse_object(def, input, ctx),
            SchemaKind::Union(options) => parse_union(options, input, ctx),
            SchemaKind::DiscriminatedUnion {
                discriminator,
                options,
            } => parse_discriminated(discriminator, options, input, ctx),
            SchemaKind::Intersection(left, right) => {
                let left = left.parse_with(input, ctx)?;
                let right = right.parse_with(input, ctx)?;
                let (left, right, dirty) = match (left, right) {
                    (Parsed::Aborted, _) | (_, Parsed::Aborted) => return Ok(Parsed::Aborted),
                    (Parsed::Valid(l), Parsed::Valid(r)) => (l, r, false),
                    (Parsed::Valid(l) | Parsed::Dirty(l), Parsed::Valid(r) | Parsed::Dirty(r)) => {
                        (l, r, true)
                    }
                };
                Ok(match merge_values(left, right) {
                    Some(merged) => Parsed::new(merged, dirty),
                    None => {
                        ctx.raise(IssueKind::InvalidIntersection, None);
                        Parsed::Aborted
                    }
                })
            }
            SchemaKind::Tuple { items, rest } => parse_tuple(items, rest.as_ref(), input, ctx),
            SchemaKind::Record { key, value } => parse_record(key.as_ref(), value, input, ctx),
            SchemaKind::Optional(inner) => match input {
                None => Ok(Parsed::Valid(None)),
                Some(_) => inner.parse_with(input, ctx),
            },
            SchemaKind::Nullable(inner) => match input {
                Some(Value::Null) => Ok(Parsed::Valid(Some(Value::Null))),
                _ => inner.parse_with(input, ctx),
            },
            SchemaKind::Default { inner, value } => match input {
                None => inner.parse_with(Some(value), ctx),
                Some(_) => inner.parse_with(input, ctx),
            },
            SchemaKind::Catch { inner, value } => {
                let mut scratch = ctx.fork();
                let parsed = inner.parse_with(input, &mut scratch)?;
                Ok(match parsed {
                    Parsed::Valid(output) if scratch.issues.is_empty() => Parsed::Valid(output),
                    _ => Parsed::Valid(Some(value.clone())),
                })
            }
            SchemaKind::Refine {
                inner,
                check,
                message,
                path,
            } => {
                let (output, dirty) = match inner.parse_with(input, ctx)? {
                    Parsed::Aborted => return Ok(Parsed::Aborted),
                    Parsed::Valid(output) => (output, false),
                    Parsed::Dirty(output) => (output, true),
                };
                let verdict = check.call(output.as_ref())?;
                if truthy(verdict.as_ref()) {
                    return Ok(Parsed::new(output, dirty));
                }
                let mut issue_path = ctx.path.clone();
                issue_path.extend(path.iter().cloned());
                ctx.issues.push(Issue::new(
                    IssueKind::Custom,
                    issue_path,
                    message.clone(),
                    ctx.generation,
                ));
                Ok(Parsed::Dirty(output))
            }
            SchemaKind::Transform { inner, transform } => match inner.parse_with(input, ctx)? {
                Parsed::Valid(output) => Ok(Parsed::Valid(transform.call(output.as_ref())?)),
                other => Ok(other),
            },
            SchemaKind::Pipe { input: first, output } => match first.parse_with(input, ctx)? {
                Parsed::Valid(value) => output.parse_with(value.as_ref(), ctx),
                other => Ok(other),
            },
        }
    }
}

fn parse_string(def: &StringDef, input: Option<&Value>, ctx: &mut ParseContext) -> Parsed {
    let mut value = if def.coerce {
        to_js_string(input)
    } else {
        match input {
            Some(Value::String(s)) => s.clone(),
            other => return ctx.invalid_type("string", other),
        }
    };
    let mut dirty = false;
    for check in &def.checks {
        if let Some(kind) = check.apply(&mut value) {
            ctx.raise(kind, check.message.clone());
            dirty = true;
        }
    }
    Parsed::new(Some(Value::String(value)), dirty)
}

fn parse_number(def: &NumberDef, input: Option<&Value>, ctx: &mut ParseContext) -> Parsed {
    let n = if def.coerce {
        to_js_number(input)
    } else {
        match input {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
            other => return ctx.invalid_type("number", other),
        }
    };
    if n.is_nan() {
        ctx.raise(
            IssueKind::InvalidType {
                expected: "number".to_string(),
                received: ParsedType::NaN.name().to_string(),
            },
            None,
        );
        return Parsed::Aborted;
    }
    let mut dirty = false;
    for check in &def.checks {
        if let Some(kind) = check.apply(n, ctx.generation) {
            ctx.raise(kind, check.message.clone());
            dirty = true;
        }
    }
    Parsed::new(Some(number_value(n)), dirty)
}

fn parse_enum(values: &[Value], input: Option<&Value>, ctx: &mut ParseContext) -> Parsed {
    if let Some(value) = input
        && values.iter().any(|option| strict_equals(option, value))
    {
        return Parsed::Valid(Some(value.clone()));
    }
    if ctx.generation == ApiGeneration::V3 {
        // The older generation type-checks before the membership test
        let numeric = values.iter().any(Value::is_number);
        let type_ok = match input {
            Some(Value::String(_)) => true,
            Some(Value::Number(_)) => numeric,
            _ => false,
        };
        if !type_ok {
            ctx.raise(
                IssueKind::InvalidType {
                    expected: join_quoted(values, " | "),
                    received: ParsedType::of(input).name().to_string(),
                },
                None,
            );
            return Parsed::Aborted;
        }
    }
    ctx.raise(
        IssueKind::InvalidEnumValue {
            options: values.to_vec(),
            received: input.cloned().unwrap_or(Value::Null),
        },
        None,
    );
    Parsed::Aborted
}

fn parse_array(def: &ArrayDef, input: Option<&Value>, ctx: &mut ParseContext) -> Step {
    let Some(Value::Array(items)) = input else {
        return Ok(ctx.invalid_type("array", input));
    };
    let len = items.len();
    let mut dirty = false;

    if let Some(bound) = &def.exact {
        let kind = if len > bound.value {
            Some(IssueKind::TooBig {
                origin: SizeOrigin::Array,
                maximum: bound.value as f64,
                inclusive: true,
                exact: true,
            })
        } else if len < bound.value {
            Some(IssueKind::TooSmall {
                origin: SizeOrigin::Array,
                minimum: bound.value as f64,
                inclusive: true,
                exact: true,
            })
        } else {
            None
        };
        if let Some(kind) = kind {
            ctx.raise(kind, bound.message.clone());
            dirty = true;
        }
    }
    if let Some(bound) = &def.min
        && len < bound.value
    {
        ctx.raise(
            IssueKind::TooSmall {
                origin: SizeOrigin::Array,
                minimum: bound.value as f64,
                inclusive: true,
                exact: false,
            },
            bound.message.clone(),
        );
        dirty = true;
    }
    if let Some(bound) = &def.max
        && len > bound.value
    {
        ctx.raise(
            IssueKind::TooBig {
                origin: SizeOrigin::Array,
                maximum: bound.value as f64,
                inclusive: true,
                exact: false,
            },
            bound.message.clone(),
        );
        dirty = true;
    }

    let mut output = Vec::with_capacity(len);
    let mut aborted = false;
    for (index, item) in items.iter().enumerate() {
        match ctx.at(PathSegment::Index(index), |ctx| def.item.parse_with(Some(item), ctx))? {
            Parsed::Valid(value) => output.push(value.unwrap_or(Value::Null)),
            Parsed::Dirty(value) => {
                dirty = true;
                output.push(value.unwrap_or(Value::Null));
            }
            Parsed::Aborted => aborted = true,
        }
    }
    if aborted {
        return Ok(Parsed::Aborted);
    }
    Ok(Parsed::new(Some(Value::Array(output)), dirty))
}

fn parse_object(def: &ObjectDef, input: Option<&Value>, ctx: &mut ParseContext) -> Step {
    let Some(Value::Object(map)) = input else {
        return Ok(ctx.invalid_type("object", input));
    };
    let mut output = Map::new();
    let mut dirty = false;
    let mut aborted = false;

    let mut record = |key: &str, parsed: Parsed, output: &mut Map<String, Value>| match parsed {
        Parsed::Valid(value) | Parsed::Dirty(value) => {
            if let Some(value) = value {
                output.insert(key.to_string(), value);
            }
        }
        Parsed::Aborted => aborted = true,
    };

    for (key, schema) in &def.shape {
        let parsed = ctx.at(PathSegment::Key(key.clone()), |ctx| {
            schema.parse_with(map.get(key), ctx)
        })?;
        dirty |= matches!(parsed, Parsed::Dirty(_));
        record(key, parsed, &mut output);
    }

    let extras: Vec<&String> = map.keys().filter(|k| def.field(k).is_none()).collect();
    if let Some(catchall) = &def.catchall {
        for key in extras {
            let parsed = ctx.at(PathSegment::Key(key.clone()), |ctx| {
                catchall.parse_with(map.get(key), ctx)
            })?;
            dirty |= matches!(parsed, Parsed::Dirty(_));
            record(key, parsed, &mut output);
        }
    } else {
        match def.unknown_keys {
            UnknownKeys::Strip => {}
            UnknownKeys::Passthrough => {
                for key in extras {
                    if let Some(value) = map.get(key) {
                        output.insert(key.clone(), value.clone());
                    }
                }
            }
            UnknownKeys::Strict => {
                if !extras.is_empty() {
                    ctx.raise(
                        IssueKind::UnrecognizedKeys {
                            keys: extras.into_iter().cloned().collect(),
                        },
                        None,
                    );
                    dirty = true;
                }
            }
        }
    }

    if aborted {
        return Ok(Parsed::Aborted);
    }
    Ok(Parsed::new(Some(Value::Object(output)), dirty))
}

fn parse_union(options: &[Schema], input: Option<&Value>, ctx: &mut ParseContext) -> Step {
    let mut first_dirty: Option<(Option<Value>, Vec<Issue>)> = None;
    let mut errors = Vec::with_capacity(options.len());

    for option in options {
        let mut scratch = ctx.fork();
        match option.parse_with(input, &mut scratch)? {
            Parsed::Valid(value) if scratch.issues.is_empty() => return Ok(Parsed::Valid(value)),
            Parsed::Valid(value) | Parsed::Dirty(value) => {
                if first_dirty.is_none() {
                    first_dirty = Some((value, scratch.issues));
                } else {
                    errors.push(scratch.issues);
                }
            }
            Parsed::Aborted => errors.push(scratch.issues),
        }
    }

    if let Some((value, issues)) = first_dirty {
        ctx.issues.extend(issues);
        return Ok(Parsed::Dirty(value));
    }
    ctx.raise(IssueKind::InvalidUnion { errors }, None);
    Ok(Parsed::Aborted)
}

fn parse_discriminated(
    discriminator: &str,
    options: &[Schema],
    input: Option<&Value>,
    ctx: &mut ParseContext,
) -> Step {
    let Some(Value::Object(map)) = input else {
        return Ok(ctx.invalid_type("object", input));
    };
    let tag = map.get(discriminator);
    let selected = options.iter().find(|option| {
        let values = option.discriminator_values(discriminator).unwrap_or_default();
        tag.is_some_and(|tag| values.iter().any(|v| strict_equals(v, tag)))
    });
    match selected {
        Some(option) => option.parse_with(input, ctx),
        None => {
            let known = options
                .iter()
                .filter_map(|option| option.discriminator_values(discriminator))
                .flatten()
                .collect();
            ctx.at(PathSegment::Key(discriminator.to_string()), |ctx| {
                ctx.raise(
                    IssueKind::InvalidDiscriminator {
                        discriminator: discriminator.to_string(),
                        options: known,
                    },
                    None,
                );
                Ok(Parsed::Aborted)
            })
        }
    }
}

fn parse_tuple(
    items: &[Schema],
    rest: Option<&Schema>,
    input: Option<&Value>,
    ctx: &mut ParseContext,
) -> Step {
    let Some(Value::Array(values)) = input else {
        return Ok(ctx.invalid_type("array", input));
    };
    if values.len() < items.len() {
        ctx.raise(
            IssueKind::TooSmall {
                origin: SizeOrigin::Array,
                minimum: items.len() as f64,
                inclusive: true,
                exact: false,
            },
            None,
        );
        return Ok(Parsed::Aborted);
    }
    let mut dirty = false;
    if rest.is_none() && values.len() > items.len() {
        ctx.raise(
            IssueKind::TooBig {
                origin: SizeOrigin::Array,
                maximum: items.len() as f64,
                inclusive: true,
                exact: false,
            },
            None,
        );
        dirty = true;
    }

    let mut output = Vec::with_capacity(values.len());
    let mut aborted = false;
    for (index, value) in values.iter().enumerate() {
        let Some(schema) = items.get(index).or(rest) else {
            break;
        };
        match ctx.at(PathSegment::Index(index), |ctx| schema.parse_with(Some(value), ctx))? {
            Parsed::Valid(value) => output.push(value.unwrap_or(Value::Null)),
            Parsed::Dirty(value) => {
                dirty = true;
                output.push(value.unwrap_or(Value::Null));
            }
            Parsed::Aborted => aborted = true,
        }
    }
    if aborted {
        return Ok(Parsed::Aborted);
    }
    Ok(Parsed::new(Some(Value::Array(output)), dirty))
}

fn parse_record(
    key_schema: Option<&Schema>,
    value_schema: &Schema,
    input: Option<&Value>,
    ctx: &mut ParseContext,
) -> Step {
    let Some(Value::Object(map)) = input else {
        return Ok(ctx.invalid_type("object", input));
    };
    let mut output = Map::new();
    let mut dirty = false;
    let mut aborted = false;

    for (key, value) in map {
        let segment = PathSegment::Key(key.clone());
        let out_key = match key_schema {
            Some(schema) => {
                let key_value = Value::String(key.clone());
                match ctx.at(segment.clone(), |ctx| schema.parse_with(Some(&key_value), ctx))? {
                    Parsed::Aborted => {
                        aborted = true;
                        key.clone()
                    }
                    Parsed::Valid(parsed) | Parsed::Dirty(parsed) => match parsed {
                        Some(Value::String(s)) => s,
                        _ => key.clone(),
                    },
                }
            }
            None => key.clone(),
        };
        match ctx.at(segment, |ctx| value_schema.parse_with(Some(value), ctx))? {
            Parsed::Valid(parsed) => {
                if let Some(parsed) = parsed {
                    output.insert(out_key, parsed);
                }
            }
            Parsed::Dirty(parsed) => {
                dirty = true;
                if let Some(parsed) = parsed {
                    output.insert(out_key, parsed);
                }
            }
            Parsed::Aborted => aborted = true,
        }
    }
    if aborted {
        return Ok(Parsed::Aborted);
    }
    Ok(Parsed::new(Some(Value::Object(output)), dirty))
}

/// Merge two intersection outputs; `None` when they conflict.
fn merge_values(left: Option<Value>, right: Option<Value>) -> Option<Option<Value>> {
    match (left, right) {
        (None, None) => Some(None),
        (Some(Value::Object(mut a)), Some(Value::Object(b))) => {
            for (key, b_value) in b {
                let merged = match a.remove(&key) {
                    Some(a_value) => merge_values(Some(a_value), Some(b_value))?,
                    None => Some(b_value),
                };
                if let Some(merged) = merged {
                    a.insert(key, merged);
                }
            }
            Some(Some(Value::Object(a)))
        }
        (Some(Value::Array(a)), Some(Value::Array(b))) => {
            if a.len() != b.len() {
                return None;
            }
            a.into_iter()
                .zip(b)
                .map(|(x, y)| merge_values(Some(x), Some(y)).map(|m| m.unwrap_or(Value::Null)))
                .collect::<Option<Vec<_>>>()
                .map(|items| Some(Value::Array(items)))
        }
        (Some(a), Some(b)) if strict_equals(&a, &b) => Some(Some(a)),
        _ => None,
    }
}
