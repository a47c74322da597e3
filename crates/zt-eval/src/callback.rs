//! User functions handed to the library as refinements and transforms.

use std::sync::Arc;

use serde_json::Value as Json;
use zt_schema::{Callback, CallbackError};

use crate::interp::Evaluator;
use crate::value::{Function, Value};

/// A function value invoked by the library during parsing.
#[derive(Debug, Clone)]
pub struct FunctionCallback {
    function: Function,
}

impl FunctionCallback {
    /// Wrap `function` for use as a schema callback.
    pub fn shared(function: Function) -> Arc<dyn Callback> {
        Arc::new(Self { function })
    }
}

impl Callback for FunctionCallback {
    fn call(&self, input: Option<&Json>) -> Result<Option<Json>, CallbackError> {
        let arg = input.map_or(Value::Undefined, Value::from_json);
        Evaluator::new()
            .call(&self.function, vec![arg])
            .map(|out| out.to_json())
            .map_err(|err| CallbackError::named(err.kind.name(), err.message))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use zt_schema::{ApiGeneration, Library};

    use super::*;
    use crate::interp::Env;
    use crate::parser::parse_expression;

    fn function(source: &str) -> Function {
        let env = Env::root(Arc::new(Library::new("3.24.2", ApiGeneration::V3)));
        let expr = parse_expression(source).unwrap();
        match Evaluator::new().eval(&expr, &env).unwrap() {
            Value::Function(function) => function,
            other => panic!("not a function: {other:?}"),
        }
    }

    #[test]
    fn test_callback_round_trips_json() {
        let double = FunctionCallback::shared(function("(n) => n * 2"));
        assert_eq!(double.call(Some(&json!(21))).unwrap(), Some(json!(42)));
        let keys = FunctionCallback::shared(function("(o) => ({...o, seen: true})"));
        assert_eq!(
            keys.call(Some(&json!({"a": 1}))).unwrap(),
            Some(json!({"a": 1, "seen": true}))
        );
    }

    #[test]
    fn test_undefined_on_both_sides() {
        let id = FunctionCallback::shared(function("(v) => v"));
        assert_eq!(id.call(None).unwrap(), None);
    }

    #[test]
    fn test_throw_becomes_callback_error() {
        let bad = FunctionCallback::shared(function("(v) => v.x.y"));
        let err = bad.call(Some(&json!({}))).unwrap_err();
        assert_eq!(err.name, "TypeError");
        assert_eq!(
            err.message,
            "Cannot read properties of undefined (reading 'y')"
        );
    }
}
