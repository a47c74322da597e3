//! Library instances and their exported surface.
//!
//! A [`Library`] stands for one loaded copy of the validation library. Every
//! schema it builds is stamped with the instance's [`LibraryId`], so a schema
//! from one load is never mistaken for a schema of another.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use crate::checks::{NumberCheck, StringCheck};
use crate::error::{Result, SchemaError};
use crate::generation::ApiGeneration;
use crate::schema::{ArrayDef, NumberDef, ObjectDef, Schema, SchemaKind, StringDef, UnknownKeys};

static NEXT_LIBRARY_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one library instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LibraryId(u64);

impl LibraryId {
    fn next() -> Self {
        Self(NEXT_LIBRARY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for LibraryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lib#{}", self.0)
    }
}

/// Members exported by every generation.
const COMMON_EXPORTS: &[&str] = &[
    "any",
    "array",
    "boolean",
    "coerce",
    "discriminatedUnion",
    "enum",
    "intersection",
    "literal",
    "never",
    "null",
    "nullable",
    "number",
    "object",
    "optional",
    "record",
    "string",
    "tuple",
    "undefined",
    "union",
    "unknown",
    "void",
];

const V3_EXPORTS: &[&str] = &["nativeEnum"];

const V4_EXPORTS: &[&str] = &[
    "email",
    "int",
    "looseObject",
    "strictObject",
    "url",
    "uuid",
];

/// Members of the `coerce` namespace.
pub const COERCE_EXPORTS: &[&str] = &["boolean", "number", "string"];

/// One instantiated copy of the validation library.
#[derive(Debug)]
pub struct Library {
    id: LibraryId,
    version: String,
    generation: ApiGeneration,
}

impl Library {
    /// Instantiate the library surface for `version`.
    pub fn new(version: impl Into<String>, generation: ApiGeneration) -> Self {
        Self {
            id: LibraryId::next(),
            version: version.into(),
            generation,
        }
    }

    /// Instance identity.
    pub fn id(&self) -> LibraryId {
        self.id
    }

    /// Version this instance was loaded for.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// API generation of this instance.
    pub fn generation(&self) -> ApiGeneration {
        self.generation
    }

    /// Whether the namespace exports `name`.
    #[must_use]
    pub fn has_export(&self, name: &str) -> bool {
        let extra = match self.generation {
            ApiGeneration::V3 => V3_EXPORTS,
            ApiGeneration::V4 => V4_EXPORTS,
        };
        COMMON_EXPORTS.contains(&name) || extra.contains(&name)
    }

    /// Whether `schema` was built by this instance.
    #[must_use]
    pub fn owns(&self, schema: &Schema) -> bool {
        schema.owner() == self.id
    }

    fn make(&self, kind: SchemaKind) -> Schema {
        Schema::new(self.id, self.generation, kind)
    }

    /// `z.string()`
    pub fn string(&self) -> Schema {
        self.make(SchemaKind::String(StringDef::default()))
    }

    /// `z.coerce.string()`
    pub fn coerce_string(&self) -> Schema {
        self.make(SchemaKind::String(StringDef {
            coerce: true,
            ..StringDef::default()
        }))
    }

    /// `z.number()`
    pub fn number(&self) -> Schema {
        self.make(SchemaKind::Number(NumberDef::default()))
    }

    /// `z.coerce.number()`
    pub fn coerce_number(&self) -> Schema {
        self.make(SchemaKind::Number(NumberDef {
            coerce: true,
            ..NumberDef::default()
        }))
    }

    /// `z.int()`
    pub fn int(&self) -> Schema {
        self.make(SchemaKind::Number(NumberDef {
            checks: vec![NumberCheck::int(None)],
            coerce: false,
        }))
    }

    /// `z.boolean()`
    pub fn boolean(&self) -> Schema {
        self.make(SchemaKind::Boolean { coerce: false })
    }

    /// `z.coerce.boolean()`
    pub fn coerce_boolean(&self) -> Schema {
        self.make(SchemaKind::Boolean { coerce: true })
    }

    /// `z.email()`, `z.url()`, `z.uuid()`: a string with one format check.
    pub fn string_format(&self, check: StringCheck) -> Schema {
        self.make(SchemaKind::String(StringDef {
            checks: vec![check],
            coerce: false,
        }))
    }

    /// `z.null()`
    pub fn null(&self) -> Schema {
        self.make(SchemaKind::Null)
    }

    /// `z.undefined()`
    pub fn undefined(&self) -> Schema {
        self.make(SchemaKind::Undefined)
    }

    /// `z.void()`
    pub fn void(&self) -> Schema {
        self.make(SchemaKind::Void)
    }

    /// `z.any()`
    pub fn any(&self) -> Schema {
        self.make(SchemaKind::Any)
    }

    /// `z.unknown()`
    pub fn unknown(&self) -> Schema {
        self.make(SchemaKind::Unknown)
    }

    /// `z.never()`
    pub fn never(&self) -> Schema {
        self.make(SchemaKind::Never)
    }

    /// `z.literal(value)`
    pub fn literal(&self, value: Value) -> Schema {
        self.make(SchemaKind::Literal(value))
    }

    /// `z.enum([...])`
    pub fn enumeration(&self, values: Vec<String>) -> Result<Schema> {
        if values.is_empty() {
            return Err(SchemaError::EmptyEnum);
        }
        Ok(self.make(SchemaKind::Enum {
            values: values.into_iter().map(Value::String).collect(),
        }))
    }

    /// `z.nativeEnum(obj)`: the object's values, minus reverse mappings of
    /// numeric members.
    pub fn native_enum(&self, entries: Vec<(String, Value)>) -> Schema {
        let numeric_names: Vec<String> = entries
            .iter()
            .filter(|(_, v)| v.is_number())
            .map(|(k, _)| k.clone())
            .collect();
        let mut values = Vec::new();
        for (key, value) in entries {
            // Numeric enums map values back to names; those keys are not members
            let is_reverse = key.parse::<f64>().is_ok()
                && value.as_str().is_some_and(|name| numeric_names.iter().any(|n| n == name));
            if !is_reverse && !values.contains(&value) {
                values.push(value);
            }
        }
        self.make(SchemaKind::Enum { values })
    }

    /// `z.object({...})`
    pub fn object(&self, shape: Vec<(String, Schema)>) -> Schema {
        self.make(SchemaKind::Object(ObjectDef::new(shape, UnknownKeys::Strip)))
    }

    /// `z.strictObject({...})`
    pub fn strict_object(&self, shape: Vec<(String, Schema)>) -> Schema {
        self.make(SchemaKind::Object(ObjectDef::new(shape, UnknownKeys::Strict)))
    }

    /// `z.looseObject({...})`
    pub fn loose_object(&self, shape: Vec<(String, Schema)>) -> Schema {
        self.make(SchemaKind::Object(ObjectDef::new(shape, UnknownKeys::Passthrough)))
    }

    /// `z.array(item)`
    pub fn array(&self, item: Schema) -> Schema {
        self.make(SchemaKind::Array(ArrayDef::new(item)))
    }

    /// `z.union([...])`
    pub fn union(&self, options: Vec<Schema>) -> Schema {
        self.make(SchemaKind::Union(options))
    }

    /// `z.discriminatedUnion(key, [...])`
    pub fn discriminated_union(
        &self,
        discriminator: impl Into<String>,
        options: Vec<Schema>,
    ) -> Result<Schema> {
        let discriminator = discriminator.into();
        let mut seen: Vec<Value> = Vec::new();
        for option in &options {
            let values = option.discriminator_values(&discriminator).ok_or_else(|| {
                SchemaError::MissingDiscriminator {
                    discriminator: discriminator.clone(),
                }
            })?;
            for value in values {
                if seen.contains(&value) {
                    return Err(SchemaError::DuplicateDiscriminator {
                        discriminator,
                        value: value.to_string(),
                    });
                }
                seen.push(value);
            }
        }
        Ok(self.make(SchemaKind::DiscriminatedUnion {
            discriminator,
            options,
        }))
    }

    /// `z.intersection(a, b)`
    pub fn intersection(&self, left: Schema, right: Schema) -> Schema {
        self.make(SchemaKind::Intersection(left, right))
    }

    /// `z.tuple([...])`
    pub fn tuple(&self, items: Vec<Schema>) -> Schema {
        self.make(SchemaKind::Tuple { items, rest: None })
    }

    /// `z.record(value)` or `z.record(key, value)`
    pub fn record(&self, key: Option<Schema>, value: Schema) -> Schema {
        self.make(SchemaKind::Record { key, value })
    }

    /// `z.optional(inner)`
    pub fn optional(&self, inner: Schema) -> Schema {
        inner.optional()
    }

    /// `z.nullable(inner)`
    pub fn nullable(&self, inner: Schema) -> Schema {
        inner.nullable()
    }
}
