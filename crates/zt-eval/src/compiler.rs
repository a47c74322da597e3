//! Compile schema source text against a loaded library module.

use std::sync::Arc;

use serde_json::Value as Json;
use tracing::debug;
use zt_loader::LoadedModule;
use zt_schema::{ApiGeneration, CallbackError, ParseOutcome, Schema};

use crate::error::{CompileError, Result};
use crate::interp::{Env, Evaluator};
use crate::parser::parse_expression;
use crate::value::Value;

/// A compiled schema together with the module that built it.
#[derive(Debug, Clone)]
pub struct SchemaHandle {
    schema: Schema,
    module: Arc<LoadedModule>,
}

impl SchemaHandle {
    /// The compiled schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Module the schema belongs to.
    pub fn module(&self) -> &Arc<LoadedModule> {
        &self.module
    }

    /// Exact library version.
    pub fn version(&self) -> &str {
        self.module.version()
    }

    /// API generation of the library.
    pub fn generation(&self) -> ApiGeneration {
        self.module.generation()
    }

    /// Run the non-throwing parse on `input`; `None` is `undefined`.
    pub fn safe_parse(&self, input: Option<&Json>) -> std::result::Result<ParseOutcome, CallbackError> {
        self.schema.safe_parse(input)
    }
}

/// Trim the source and drop a single trailing semicolon.
pub fn normalize_source(source: &str) -> &str {
    let trimmed = source.trim();
    trimmed.strip_suffix(';').unwrap_or(trimmed)
}

/// Evaluate `source` as one expression with only `z` and `zod` in scope.
pub fn evaluate(source: &str, module: &LoadedModule) -> Result<Value> {
    let source = normalize_source(source);
    let expr = parse_expression(source)?;
    let env = Env::root(Arc::clone(module.library()));
    Evaluator::new().eval(&expr, &env)
}

/// Accept `value` only if it is a schema built by `module`'s library.
pub fn typecheck(value: Value, module: &Arc<LoadedModule>) -> Result<SchemaHandle> {
    match value {
        Value::Schema(schema) if module.library().owns(&schema) => Ok(SchemaHandle {
            schema,
            module: Arc::clone(module),
        }),
        _ => Err(CompileError::not_a_schema()),
    }
}

/// Compile `source` into a schema of `module`.
pub fn compile(source: &str, module: &Arc<LoadedModule>) -> Result<SchemaHandle> {
    let result = evaluate(source, module).and_then(|value| typecheck(value, module));
    match &result {
        Ok(handle) => debug!(
            version = module.version(),
            schema = handle.schema().type_name(),
            "Compiled schema"
        ),
        Err(err) => debug!(
            version = module.version(),
            kind = %err.kind,
            error = %err.message,
            "Schema compilation failed"
        ),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_source() {
        assert_eq!(normalize_source("  z.string();\n"), "z.string()");
        assert_eq!(normalize_source("z.string();;"), "z.string();");
        assert_eq!(normalize_source(""), "");
    }

    #[test]
    fn test_typecheck_rejects_plain_values() {
        let module = Arc::new(LoadedModule::new("3.24.2", "zod@3.24.2", ApiGeneration::V3));
        let err = typecheck(Value::Number(1.0), &module).unwrap_err();
        assert_eq!(err, CompileError::not_a_schema());
    }
}
