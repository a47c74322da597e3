//! Schema values and their builder methods.
//!
//! A [`Schema`] is immutable: every builder method returns a new schema that
//! shares the unchanged parts of the old one. Schemas remember which library
//! instance built them.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::checks::{NumberCheck, StringCheck};
use crate::error::{CallbackError, Result, SchemaError};
use crate::generation::ApiGeneration;
use crate::issue::PathSegment;
use crate::library::LibraryId;

/// A user function invoked while parsing (`refine`, `transform`).
///
/// `None` stands for `undefined` on both sides.
pub trait Callback: Send + Sync + fmt::Debug {
    /// Invoke the function with one argument.
    fn call(&self, input: Option<&Value>) -> std::result::Result<Option<Value>, CallbackError>;
}

/// Handling of keys outside an object's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    /// Drop them from the output.
    #[default]
    Strip,
    /// Reject them.
    Strict,
    /// Keep them in the output.
    Passthrough,
}

/// String schema definition.
#[derive(Debug, Clone, Default)]
pub struct StringDef {
    /// Checks and transforms, in order.
    pub checks: Vec<StringCheck>,
    /// Convert the input with `String(input)` first.
    pub coerce: bool,
}

/// Number schema definition.
#[derive(Debug, Clone, Default)]
pub struct NumberDef {
    /// Checks, in order.
    pub checks: Vec<NumberCheck>,
    /// Convert the input with `Number(input)` first.
    pub coerce: bool,
}

/// A length bound with its custom message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthBound {
    /// Bound value.
    pub value: usize,
    /// Message overriding the default.
    pub message: Option<String>,
}

/// Array schema definition.
#[derive(Debug, Clone)]
pub struct ArrayDef {
    /// Element schema.
    pub item: Schema,
    /// Minimum element count.
    pub min: Option<LengthBound>,
    /// Maximum element count.
    pub max: Option<LengthBound>,
    /// Exact element count.
    pub exact: Option<LengthBound>,
}

impl ArrayDef {
    /// Unbounded array of `item`.
    #[must_use]
    pub fn new(item: Schema) -> Self {
        Self {
            item,
            min: None,
            max: None,
            exact: None,
        }
    }
}

/// Object schema definition.
#[derive(Debug, Clone)]
pub struct ObjectDef {
    /// Declared keys, in declaration order.
    pub shape: Vec<(String, Schema)>,
    /// Unknown key policy.
    pub unknown_keys: UnknownKeys,
    /// Schema for keys outside the shape; overrides the policy.
    pub catchall: Option<Schema>,
}

impl ObjectDef {
    /// Object with the given shape and policy.
    #[must_use]
    pub fn new(shape: Vec<(String, Schema)>, unknown_keys: UnknownKeys) -> Self {
        Self {
            shape,
            unknown_keys,
            catchall: None,
        }
    }

    /// Schema declared for `key`.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Schema> {
        self.shape.iter().find(|(k, _)| k == key).map(|(_, s)| s)
    }
}

/// All schema kinds.
#[derive(Debug, Clone)]
pub enum SchemaKind {
    /// `string`
    String(StringDef),
    /// `number`
    Number(NumberDef),
    /// `boolean`
    Boolean {
        /// Convert with `Boolean(input)` first.
        coerce: bool,
    },
    /// `null`
    Null,
    /// `undefined`
    Undefined,
    /// `void`
    Void,
    /// `any`
    Any,
    /// `unknown`
    Unknown,
    /// `never`
    Never,
    /// A single literal value.
    Literal(Value),
    /// One of a fixed set of values.
    Enum {
        /// Allowed values.
        values: Vec<Value>,
    },
    /// Array of one element schema.
    Array(ArrayDef),
    /// Object with a declared shape.
    Object(ObjectDef),
    /// First matching option.
    Union(Vec<Schema>),
    /// Option selected by a discriminator key.
    DiscriminatedUnion {
        /// Discriminator key.
        discriminator: String,
        /// Object options.
        options: Vec<Schema>,
    },
    /// Both sides must match; outputs are merged.
    Intersection(Schema, Schema),
    /// Fixed-length array.
    Tuple {
        /// Positional schemas.
        items: Vec<Schema>,
        /// Schema for extra elements.
        rest: Option<Schema>,
    },
    /// String-keyed map.
    Record {
        /// Key schema; any string when absent.
        key: Option<Schema>,
        /// Value schema.
        value: Schema,
    },
    /// Also accepts `undefined`.
    Optional(Schema),
    /// Also accepts `null`.
    Nullable(Schema),
    /// Replaces `undefined` before parsing.
    Default {
        /// Wrapped schema.
        inner: Schema,
        /// Replacement value.
        value: Value,
    },
    /// Replaces any failure with a value.
    Catch {
        /// Wrapped schema.
        inner: Schema,
        /// Replacement value.
        value: Value,
    },
    /// Runs a predicate on the parsed value.
    Refine {
        /// Wrapped schema.
        inner: Schema,
        /// Predicate; falsy results raise a custom issue.
        check: Arc<dyn Callback>,
        /// Message for the custom issue.
        message: Option<String>,
        /// Path appended to the issue.
        path: Vec<PathSegment>,
    },
    /// Maps the parsed value.
    Transform {
        /// Wrapped schema.
        inner: Schema,
        /// Mapping function.
        transform: Arc<dyn Callback>,
    },
    /// Parses the output of one schema with another.
    Pipe {
        /// First stage.
        input: Schema,
        /// Second stage.
        output: Schema,
    },
}

impl SchemaKind {
    /// Type name used in debugging and listings.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "ZodString",
            Self::Number(_) => "ZodNumber",
            Self::Boolean { .. } => "ZodBoolean",
            Self::Null => "ZodNull",
            Self::Undefined => "ZodUndefined",
            Self::Void => "ZodVoid",
            Self::Any => "ZodAny",
            Self::Unknown => "ZodUnknown",
            Self::Never => "ZodNever",
            Self::Literal(_) => "ZodLiteral",
            Self::Enum { .. } => "ZodEnum",
            Self::Array(_) => "ZodArray",
            Self::Object(_) => "ZodObject",
            Self::Union(_) => "ZodUnion",
            Self::DiscriminatedUnion { .. } => "ZodDiscriminatedUnion",
            Self::Intersection(..) => "ZodIntersection",
            Self::Tuple { .. } => "ZodTuple",
            Self::Record { .. } => "ZodRecord",
            Self::Optional(_) => "ZodOptional",
            Self::Nullable(_) => "ZodNullable",
            Self::Default { .. } => "ZodDefault",
            Self::Catch { .. } => "ZodCatch",
            Self::Refine { .. } | Self::Transform { .. } => "ZodEffects",
            Self::Pipe { .. } => "ZodPipeline",
        }
    }
}

/// Methods every schema has.
const COMMON_METHODS: &[&str] = &[
    "and",
    "array",
    "brand",
    "catch",
    "default",
    "describe",
    "nullable",
    "nullish",
    "optional",
    "or",
    "parse",
    "pipe",
    "readonly",
    "refine",
    "safeParse",
    "transform",
];

const STRING_METHODS: &[&str] = &[
    "datetime",
    "email",
    "endsWith",
    "includes",
    "length",
    "max",
    "min",
    "nonempty",
    "regex",
    "startsWith",
    "toLowerCase",
    "toUpperCase",
    "trim",
    "url",
    "uuid",
];

const NUMBER_METHODS: &[&str] = &[
    "finite",
    "gt",
    "gte",
    "int",
    "lt",
    "lte",
    "max",
    "min",
    "multipleOf",
    "negative",
    "nonnegative",
    "nonpositive",
    "positive",
    "safe",
    "step",
];

const ARRAY_METHODS: &[&str] = &["length", "max", "min", "nonempty"];

const OBJECT_METHODS: &[&str] = &[
    "catchall",
    "extend",
    "keyof",
    "merge",
    "omit",
    "partial",
    "passthrough",
    "pick",
    "required",
    "strict",
    "strip",
];

const WRAPPER_METHODS: &[&str] = &["unwrap"];

/// A schema built by one library instance.
#[derive(Clone)]
pub struct Schema {
    owner: LibraryId,
    generation: ApiGeneration,
    kind: Arc<SchemaKind>,
    description: Option<Arc<str>>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("owner", &self.owner)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Schema {
    pub(crate) fn new(owner: LibraryId, generation: ApiGeneration, kind: SchemaKind) -> Self {
        Self {
            owner,
            generation,
            kind: Arc::new(kind),
            description: None,
        }
    }

    /// Build a sibling schema of the same instance.
    fn derive(&self, kind: SchemaKind) -> Self {
        Self::new(self.owner, self.generation, kind)
    }

    fn unsupported(method: &str) -> SchemaError {
        SchemaError::UnsupportedMethod {
            method: method.to_string(),
        }
    }

    /// Instance that built this schema.
    pub fn owner(&self) -> LibraryId {
        self.owner
    }

    /// API generation of the owning instance.
    pub fn generation(&self) -> ApiGeneration {
        self.generation
    }

    /// Schema definition.
    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    /// Text set by `describe`.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Type name of the definition (`ZodString`, ...).
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Whether the schema has a method called `name`.
    #[must_use]
    pub fn supports(&self, name: &str) -> bool {
        if COMMON_METHODS.contains(&name) {
            return true;
        }
        let specific = match self.kind() {
            SchemaKind::String(_) => STRING_METHODS,
            SchemaKind::Number(_) => NUMBER_METHODS,
            SchemaKind::Array(_) => ARRAY_METHODS,
            SchemaKind::Object(_) => OBJECT_METHODS,
            SchemaKind::Optional(_) | SchemaKind::Nullable(_) => WRAPPER_METHODS,
            _ => &[],
        };
        specific.contains(&name)
    }

    // Wrappers shared by every kind

    /// `.optional()`
    #[must_use]
    pub fn optional(&self) -> Self {
        self.derive(SchemaKind::Optional(self.clone()))
    }

    /// `.nullable()`
    #[must_use]
    pub fn nullable(&self) -> Self {
        self.derive(SchemaKind::Nullable(self.clone()))
    }

    /// `.nullish()`
    #[must_use]
    pub fn nullish(&self) -> Self {
        self.nullable().optional()
    }

    /// `.default(value)`
    #[must_use]
    pub fn default_value(&self, value: Value) -> Self {
        self.derive(SchemaKind::Default {
            inner: self.clone(),
            value,
        })
    }

    /// `.catch(value)`
    #[must_use]
    pub fn catch_value(&self, value: Value) -> Self {
        self.derive(SchemaKind::Catch {
            inner: self.clone(),
            value,
        })
    }

    /// `.array()`
    #[must_use]
    pub fn array(&self) -> Self {
        self.derive(SchemaKind::Array(ArrayDef::new(self.clone())))
    }

    /// `.or(other)`
    #[must_use]
    pub fn or(&self, other: Self) -> Self {
        self.derive(SchemaKind::Union(vec![self.clone(), other]))
    }

    /// `.and(other)`
    #[must_use]
    pub fn and(&self, other: Self) -> Self {
        self.derive(SchemaKind::Intersection(self.clone(), other))
    }

    /// `.refine(check, message)`
    #[must_use]
    pub fn refine(
        &self,
        check: Arc<dyn Callback>,
        message: Option<String>,
        path: Vec<PathSegment>,
    ) -> Self {
        self.derive(SchemaKind::Refine {
            inner: self.clone(),
            check,
            message,
            path,
        })
    }

    /// `.transform(f)`
    #[must_use]
    pub fn transform(&self, transform: Arc<dyn Callback>) -> Self {
        self.derive(SchemaKind::Transform {
            inner: self.clone(),
            transform,
        })
    }

    /// `.pipe(next)`
    #[must_use]
    pub fn pipe(&self, output: Self) -> Self {
        self.derive(SchemaKind::Pipe {
            input: self.clone(),
            output,
        })
    }

    /// `.describe(text)`
    #[must_use]
    pub fn describe(&self, text: &str) -> Self {
        Self {
            description: Some(Arc::from(text)),
            ..self.clone()
        }
    }

    /// `.unwrap()` on optional and nullable schemas.
    pub fn unwrap_inner(&self) -> Result<Self> {
        match self.kind() {
            SchemaKind::Optional(inner) | SchemaKind::Nullable(inner) => Ok(inner.clone()),
            _ => Err(Self::unsupported("unwrap")),
        }
    }

    // String and number checks

    /// Append a string check or transform.
    pub fn with_string_check(&self, check: StringCheck) -> Result<Self> {
        match self.kind() {
            SchemaKind::String(def) => {
                let mut def = def.clone();
                def.checks.push(check);
                Ok(self.derive(SchemaKind::String(def)))
            }
            _ => Err(Self::unsupported("string check")),
        }
    }

    /// Append number checks.
    pub fn with_number_checks(&self, checks: impl IntoIterator<Item = NumberCheck>) -> Result<Self> {
        match self.kind() {
            SchemaKind::Number(def) => {
                let mut def = def.clone();
                def.checks.extend(checks);
                Ok(self.derive(SchemaKind::Number(def)))
            }
            _ => Err(Self::unsupported("number check")),
        }
    }

    // Array bounds

    fn with_array_def(&self, method: &str, update: impl FnOnce(&mut ArrayDef)) -> Result<Self> {
        match self.kind() {
            SchemaKind::Array(def) => {
                let mut def = def.clone();
                update(&mut def);
                Ok(self.derive(SchemaKind::Array(def)))
            }
            _ => Err(Self::unsupported(method)),
        }
    }

    /// Array `.min(n)` / `.nonempty()`
    pub fn array_min(&self, value: usize, message: Option<String>) -> Result<Self> {
        self.with_array_def("min", |def| def.min = Some(LengthBound { value, message }))
    }

    /// Array `.max(n)`
    pub fn array_max(&self, value: usize, message: Option<String>) -> Result<Self> {
        self.with_array_def("max", |def| def.max = Some(LengthBound { value, message }))
    }

    /// Array `.length(n)`
    pub fn array_length(&self, value: usize, message: Option<String>) -> Result<Self> {
        self.with_array_def("length", |def| def.exact = Some(LengthBound { value, message }))
    }

    /// Element schema of an array.
    #[must_use]
    pub fn element(&self) -> Option<&Self> {
        match self.kind() {
            SchemaKind::Array(def) => Some(&def.item),
            _ => None,
        }
    }

    // Object operations

    fn object_def(&self, method: &str) -> Result<&ObjectDef> {
        match self.kind() {
            SchemaKind::Object(def) => Ok(def),
            _ => Err(Self::unsupported(method)),
        }
    }

    fn with_object_def(&self, def: ObjectDef) -> Self {
        self.derive(SchemaKind::Object(def))
    }

    /// Declared shape of an object schema.
    #[must_use]
    pub fn shape(&self) -> Option<&[(String, Self)]> {
        match self.kind() {
            SchemaKind::Object(def) => Some(&def.shape),
            _ => None,
        }
    }

    /// `.extend({...})`: later keys replace earlier ones in place.
    pub fn extend(&self, fields: Vec<(String, Self)>) -> Result<Self> {
        let mut def = self.object_def("extend")?.clone();
        for (key, schema) in fields {
            match def.shape.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = schema,
                None => def.shape.push((key, schema)),
            }
        }
        Ok(self.with_object_def(def))
    }

    /// `.merge(other)`: other's keys win and its unknown-key policy applies.
    pub fn merge(&self, other: &Self) -> Result<Self> {
        let theirs = other.object_def("merge")?;
        let merged = self.extend(theirs.shape.clone())?;
        let mut def = merged.object_def("merge")?.clone();
        def.unknown_keys = theirs.unknown_keys;
        def.catchall.clone_from(&theirs.catchall);
        Ok(self.with_object_def(def))
    }

    fn check_mask(&self, def: &ObjectDef, keys: &[String]) -> Result<()> {
        // Only the newer generation rejects unknown mask keys
        if self.generation == ApiGeneration::V4
            && let Some(missing) = keys.iter().find(|k| def.field(k).is_none())
        {
            return Err(SchemaError::UnknownKey(missing.clone()));
        }
        Ok(())
    }

    /// `.pick({key: true})`
    pub fn pick(&self, keys: &[String]) -> Result<Self> {
        let mut def = self.object_def("pick")?.clone();
        self.check_mask(&def, keys)?;
        def.shape.retain(|(k, _)| keys.contains(k));
        Ok(self.with_object_def(def))
    }

    /// `.omit({key: true})`
    pub fn omit(&self, keys: &[String]) -> Result<Self> {
        let mut def = self.object_def("omit")?.clone();
        self.check_mask(&def, keys)?;
        def.shape.retain(|(k, _)| !keys.contains(k));
        Ok(self.with_object_def(def))
    }

    /// `.partial()` or `.partial({key: true})`
    pub fn partial(&self, keys: Option<&[String]>) -> Result<Self> {
        let mut def = self.object_def("partial")?.clone();
        if let Some(keys) = keys {
            self.check_mask(&def, keys)?;
        }
        for (key, schema) in &mut def.shape {
            if keys.is_none_or(|keys| keys.contains(key)) {
                *schema = schema.optional();
            }
        }
        Ok(self.with_object_def(def))
    }

    /// `.required()` or `.required({key: true})`
    pub fn required(&self, keys: Option<&[String]>) -> Result<Self> {
        let mut def = self.object_def("required")?.clone();
        if let Some(keys) = keys {
            self.check_mask(&def, keys)?;
        }
        for (key, schema) in &mut def.shape {
            if keys.is_none_or(|keys| keys.contains(key)) {
                while let SchemaKind::Optional(inner) = schema.kind() {
                    *schema = inner.clone();
                }
            }
        }
        Ok(self.with_object_def(def))
    }

    fn with_unknown_keys(&self, method: &str, policy: UnknownKeys) -> Result<Self> {
        let mut def = self.object_def(method)?.clone();
        def.unknown_keys = policy;
        Ok(self.with_object_def(def))
    }

    /// `.strict()`
    pub fn strict(&self) -> Result<Self> {
        self.with_unknown_keys("strict", UnknownKeys::Strict)
    }

    /// `.passthrough()`
    pub fn passthrough(&self) -> Result<Self> {
        self.with_unknown_keys("passthrough", UnknownKeys::Passthrough)
    }

    /// `.strip()`
    pub fn strip(&self) -> Result<Self> {
        self.with_unknown_keys("strip", UnknownKeys::Strip)
    }

    /// `.catchall(schema)`
    pub fn catchall(&self, schema: Self) -> Result<Self> {
        let mut def = self.object_def("catchall")?.clone();
        def.catchall = Some(schema);
        Ok(self.with_object_def(def))
    }

    /// `.keyof()`
    pub fn keyof(&self) -> Result<Self> {
        let def = self.object_def("keyof")?;
        let values = def
            .shape
            .iter()
            .map(|(k, _)| Value::String(k.clone()))
            .collect();
        Ok(self.derive(SchemaKind::Enum { values }))
    }

    // Introspection

    /// Values of an enum schema.
    #[must_use]
    pub fn enum_values(&self) -> Option<Vec<Value>> {
        match self.kind() {
            SchemaKind::Enum { values } => Some(values.clone()),
            _ => None,
        }
    }

    /// Literal values the field `key` of this object schema accepts.
    ///
    /// `None` when this is not an object or the field is not literal-valued.
    #[must_use]
    pub fn discriminator_values(&self, key: &str) -> Option<Vec<Value>> {
        match self.kind() {
            SchemaKind::Object(def) => def.field(key).and_then(Self::literal_values),
            _ => None,
        }
    }

    fn literal_values(&self) -> Option<Vec<Value>> {
        match self.kind() {
            SchemaKind::Literal(value) => Some(vec![value.clone()]),
            SchemaKind::Enum { values } => Some(values.clone()),
            SchemaKind::Null => Some(vec![Value::Null]),
            SchemaKind::Nullable(inner) => {
                let mut values = inner.literal_values()?;
                values.push(Value::Null);
                Some(values)
            }
            SchemaKind::Optional(inner)
            | SchemaKind::Default { inner, .. }
            | SchemaKind::Catch { inner, .. }
            | SchemaKind::Refine { inner, .. }
            | SchemaKind::Transform { inner, .. } => inner.literal_values(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::library::Library;

    fn lib() -> Library {
        Library::new("3.24.2", ApiGeneration::V3)
    }

    fn keys(schema: &Schema) -> Vec<&str> {
        schema
            .shape()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str())
            .collect()
    }

    #[test]
    fn test_builders_keep_owner() {
        let lib = lib();
        let schema = lib.string().optional().nullable().array();
        assert_eq!(schema.owner(), lib.id());
        assert_eq!(schema.type_name(), "ZodArray");
    }

    #[test]
    fn test_builders_are_immutable() {
        let lib = lib();
        let base = lib.object(vec![("a".to_string(), lib.string())]);
        let extended = base.extend(vec![("b".to_string(), lib.number())]).unwrap();
        assert_eq!(keys(&base), ["a"]);
        assert_eq!(keys(&extended), ["a", "b"]);
    }

    #[test]
    fn test_extend_replaces_in_place() {
        let lib = lib();
        let base = lib.object(vec![
            ("a".to_string(), lib.string()),
            ("b".to_string(), lib.string()),
        ]);
        let extended = base.extend(vec![("a".to_string(), lib.number())]).unwrap();
        assert_eq!(keys(&extended), ["a", "b"]);
        assert_eq!(extended.shape().unwrap()[0].1.type_name(), "ZodNumber");
    }

    #[test]
    fn test_pick_omit() {
        let lib = lib();
        let base = lib.object(vec![
            ("a".to_string(), lib.string()),
            ("b".to_string(), lib.string()),
        ]);
        assert_eq!(keys(&base.pick(&["b".to_string()]).unwrap()), ["b"]);
        assert_eq!(keys(&base.omit(&["b".to_string()]).unwrap()), ["a"]);
        // The older generation ignores unknown mask keys
        assert!(base.pick(&["zz".to_string()]).is_ok());
    }

    #[test]
    fn test_v4_pick_rejects_unknown_keys() {
        let lib = Library::new("4.0.0", ApiGeneration::V4);
        let base = lib.object(vec![("a".to_string(), lib.string())]);
        assert_eq!(
            base.pick(&["zz".to_string()]).unwrap_err(),
            SchemaError::UnknownKey("zz".to_string())
        );
    }

    #[test]
    fn test_required_unwraps_optionals() {
        let lib = lib();
        let base = lib.object(vec![("a".to_string(), lib.string().optional().optional())]);
        let required = base.required(None).unwrap();
        assert_eq!(required.shape().unwrap()[0].1.type_name(), "ZodString");
    }

    #[test]
    fn test_keyof() {
        let lib = lib();
        let base = lib.object(vec![("a".to_string(), lib.string())]);
        assert_eq!(base.keyof().unwrap().enum_values(), Some(vec![json!("a")]));
    }

    #[test]
    fn test_method_support() {
        let lib = lib();
        assert!(lib.string().supports("email"));
        assert!(!lib.number().supports("email"));
        assert!(lib.number().supports("optional"));
        assert!(lib.string().optional().supports("unwrap"));
        assert!(lib.string().with_number_checks([]).is_err());
    }

    #[test]
    fn test_describe() {
        let lib = lib();
        let schema = lib.string().describe("a name");
        assert_eq!(schema.description(), Some("a name"));
    }
}
