//! Tree-walking evaluator.
//!
//! Scopes hold only the library namespace (as `z` and `zod`) and the
//! parameters of enclosing arrow functions. There is no assignment, so
//! evaluation has no side effects beyond the values it returns.

use std::cmp::Ordering;
use std::sync::Arc;

use zt_schema::{Library, compile_js_regex};

use crate::ast::{BinaryOp, Element, Expr, LogicalOp, Param, Property, UnaryOp};
use crate::builtins;
use crate::error::{CompileError, Result};
use crate::guard::DepthGuard;
use crate::methods;
use crate::value::{Closure, Function, Namespace, Value, loose_equals, set_property, strict_equals};

/// Names the root scope binds to the namespace.
pub const NAMESPACE_ALIASES: [&str; 2] = ["z", "zod"];

/// A lexical scope.
#[derive(Clone)]
pub struct Env {
    namespace: Namespace,
    frame: Option<Arc<Frame>>,
}

struct Frame {
    bindings: Vec<(String, Value)>,
    parent: Option<Arc<Frame>>,
}

impl Env {
    /// Root scope for one library instance.
    #[must_use]
    pub fn root(library: Arc<Library>) -> Self {
        Self {
            namespace: Namespace {
                library,
                coerce: false,
            },
            frame: None,
        }
    }

    /// Library bound in this scope.
    pub fn library(&self) -> &Arc<Library> {
        &self.namespace.library
    }

    fn lookup(&self, name: &str) -> Result<Value> {
        let mut frame = self.frame.as_deref();
        while let Some(current) = frame {
            if let Some((_, value)) = current.bindings.iter().rev().find(|(n, _)| n == name) {
                return Ok(value.clone());
            }
            frame = current.parent.as_deref();
        }
        if NAMESPACE_ALIASES.contains(&name) {
            return Ok(Value::Namespace(self.namespace.clone()));
        }
        Err(CompileError::not_defined(name))
    }

    fn extend(&self, bindings: Vec<(String, Value)>) -> Self {
        Self {
            namespace: self.namespace.clone(),
            frame: Some(Arc::new(Frame {
                bindings,
                parent: self.frame.clone(),
            })),
        }
    }
}

/// `Cannot read properties of undefined (reading 'key')`
pub fn cannot_read(target: &Value, key: &str) -> CompileError {
    let target = if matches!(target, Value::Null) { "null" } else { "undefined" };
    CompileError::type_error(format!(
        "Cannot read properties of {target} (reading '{key}')"
    ))
}

/// ECMAScript `ToInt32`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    let wrapped = n.trunc().rem_euclid(4_294_967_296.0);
    wrapped as u32 as i32
}

/// Property key for a computed member access.
fn property_key(value: &Value) -> Result<String> {
    value
        .to_js_string()
        .ok_or_else(|| CompileError::type_error("Cannot convert object to primitive value"))
}

/// Evaluates expressions; nesting is tracked per thread by [`DepthGuard`].
#[derive(Debug, Default)]
pub struct Evaluator;

impl Evaluator {
    /// Fresh evaluator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate `expr` in `env`.
    pub fn eval(&mut self, expr: &Expr, env: &Env) -> Result<Value> {
        let _guard = DepthGuard::enter()?;
        self.eval_node(expr, env)
    }

    fn eval_node(&mut self, expr: &Expr, env: &Env) -> Result<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::String(s) => Ok(Value::string(s.as_str())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Undefined => Ok(Value::Undefined),
            Expr::Regex { source, flags } => {
                compile_js_regex(source, flags)?;
                Ok(Value::RegExp {
                    source: Arc::from(source.as_str()),
                    flags: Arc::from(flags.as_str()),
                })
            }
            Expr::Ident(name) => env.lookup(name),
            Expr::Array(elements) => Ok(Value::array(self.eval_elements(elements, env)?)),
            Expr::Object(properties) => self.eval_object(properties, env),
            Expr::Member { .. } | Expr::Call { .. } | Expr::Chain(_) => {
                Ok(self.eval_chain(expr, env)?.unwrap_or(Value::Undefined))
            }
            Expr::Unary(op, operand) => self.eval_unary(*op, operand, env),
            Expr::Binary(op, left, right) => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                Ok(binary(*op, &left, &right))
            }
            Expr::Logical(op, left, right) => {
                let left = self.eval(left, env)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.truthy(),
                    LogicalOp::Or => left.truthy(),
                    LogicalOp::Nullish => !left.is_nullish(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(right, env)
                }
            }
            Expr::Conditional(test, then, otherwise) => {
                if self.eval(test, env)?.truthy() {
                    self.eval(then, env)
                } else {
                    self.eval(otherwise, env)
                }
            }
            Expr::Sequence(items) => {
                let mut last = Value::Undefined;
                for item in items {
                    last = self.eval(item, env)?;
                }
                Ok(last)
            }
            Expr::Arrow(function) => Ok(Value::Function(Function::Arrow(Arc::new(Closure {
                function: Arc::clone(function),
                env: env.clone(),
            })))),
        }
    }

    /// Evaluate a member/call chain; `None` when a `?.` link short-circuited.
    fn eval_chain(&mut self, expr: &Expr, env: &Env) -> Result<Option<Value>> {
        match expr {
            Expr::Chain(inner) => Ok(Some(
                self.eval_chain(inner, env)?.unwrap_or(Value::Undefined),
            )),
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let Some(target) = self.eval_link(object, env)? else {
                    return Ok(None);
                };
                if *optional && target.is_nullish() {
                    return Ok(None);
                }
                let key = match property.as_ref() {
                    Expr::String(name) => name.clone(),
                    computed => property_key(&self.eval(computed, env)?)?,
                };
                get_property(&target, &key).map(Some)
            }
            Expr::Call {
                callee,
                args,
                optional,
            } => {
                let Some(function) = self.eval_link(callee, env)? else {
                    return Ok(None);
                };
                if *optional && function.is_nullish() {
                    return Ok(None);
                }
                let args = self.eval_elements(args, env)?;
                match function {
                    Value::Function(function) => self.call(&function, args).map(Some),
                    _ => Err(CompileError::type_error(format!(
                        "{} is not a function",
                        callee.describe()
                    ))),
                }
            }
            other => self.eval(other, env).map(Some),
        }
    }

    fn eval_link(&mut self, expr: &Expr, env: &Env) -> Result<Option<Value>> {
        match expr {
            Expr::Member { .. } | Expr::Call { .. } => {
                let _guard = DepthGuard::enter()?;
                self.eval_chain(expr, env)
            }
            other => self.eval(other, env).map(Some),
        }
    }

    fn eval_elements(&mut self, elements: &[Element], env: &Env) -> Result<Vec<Value>> {
        let mut out = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                Element::Item(expr) => out.push(self.eval(expr, env)?),
                Element::Spread(expr) => match self.eval(expr, env)? {
                    Value::Array(items) => out.extend(items.iter().cloned()),
                    Value::String(s) => out.extend(s.chars().map(|c| Value::string(c.to_string()))),
                    other => {
                        return Err(CompileError::type_error(format!(
                            "{} is not iterable",
                            other.to_js_string().unwrap_or_default()
                        )));
                    }
                },
            }
        }
        Ok(out)
    }

    fn eval_object(&mut self, properties: &[Property], env: &Env) -> Result<Value> {
        let mut entries = Vec::with_capacity(properties.len());
        for property in properties {
            match property {
                Property::Named(key, expr) => {
                    let value = self.eval(expr, env)?;
                    set_property(&mut entries, key.clone(), value);
                }
                Property::Computed(key, expr) => {
                    let key = property_key(&self.eval(key, env)?)?;
                    let value = self.eval(expr, env)?;
                    set_property(&mut entries, key, value);
                }
                Property::Spread(expr) => match self.eval(expr, env)? {
                    Value::Object(source) => {
                        for (key, value) in source.iter() {
                            set_property(&mut entries, key.clone(), value.clone());
                        }
                    }
                    Value::Array(items) => {
                        for (index, value) in items.iter().enumerate() {
                            set_property(&mut entries, index.to_string(), value.clone());
                        }
                    }
                    Value::String(s) => {
                        for (index, c) in s.chars().enumerate() {
                            set_property(&mut entries, index.to_string(), Value::string(c.to_string()));
                        }
                    }
                    // Primitives and library objects contribute no own properties
                    _ => {}
                },
            }
        }
        Ok(Value::object(entries))
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr, env: &Env) -> Result<Value> {
        if op == UnaryOp::TypeOf
            && let Expr::Ident(name) = operand
        {
            // `typeof` on an undeclared name does not throw
            return Ok(match env.lookup(name) {
                Ok(value) => Value::string(value.type_of()),
                Err(_) => Value::string("undefined"),
            });
        }
        let value = self.eval(operand, env)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!value.truthy()),
            UnaryOp::Neg => Value::Number(-value.to_number()),
            UnaryOp::Plus => Value::Number(value.to_number()),
            UnaryOp::BitNot => Value::Number(f64::from(!to_int32(value.to_number()))),
            UnaryOp::TypeOf => Value::string(value.type_of()),
            UnaryOp::Void => Value::Undefined,
        })
    }

    /// Call `function` with `args`.
    pub fn call(&mut self, function: &Function, args: Vec<Value>) -> Result<Value> {
        match function {
            Function::Arrow(closure) => self.call_closure(closure, args),
            Function::Export { namespace, name } => methods::call_export(namespace, name, &args),
            Function::SchemaMethod { schema, name } => {
                methods::call_schema_method(self, schema, name, &args)
            }
            Function::Builtin { receiver, name } => builtins::call(self, receiver, name, &args),
        }
    }

    fn call_closure(&mut self, closure: &Closure, args: Vec<Value>) -> Result<Value> {
        let mut args = args.into_iter();
        let mut bindings = Vec::new();
        for param in &closure.function.params {
            let arg = args.next().unwrap_or(Value::Undefined);
            match param {
                Param::Name(name) => bindings.push((name.clone(), arg)),
                Param::Object(fields) => {
                    if arg.is_nullish() {
                        return Err(CompileError::type_error(format!(
                            "Cannot destructure '{}' as it is {}.",
                            arg.to_js_string().unwrap_or_default(),
                            arg.to_js_string().unwrap_or_default()
                        )));
                    }
                    for (key, local) in fields {
                        bindings.push((local.clone(), get_property(&arg, key)?));
                    }
                }
            }
        }
        let env = closure.env.extend(bindings);
        match &closure.function.body {
            Some(body) => self.eval(body, &env),
            None => Ok(Value::Undefined),
        }
    }
}

/// `target[key]`
pub fn get_property(target: &Value, key: &str) -> Result<Value> {
    let value = match target {
        Value::Undefined | Value::Null => return Err(cannot_read(target, key)),
        Value::String(s) => {
            if key == "length" {
                #[allow(clippy::cast_precision_loss)]
                return Ok(Value::Number(s.encode_utf16().count() as f64));
            }
            if let Ok(index) = key.parse::<usize>() {
                let units: Vec<u16> = s.encode_utf16().collect();
                return Ok(units
                    .get(index)
                    .map_or(Value::Undefined, |unit| {
                        Value::string(String::from_utf16_lossy(&[*unit]))
                    }));
            }
            builtins::method(target, key)
        }
        Value::Array(items) => {
            if key == "length" {
                #[allow(clippy::cast_precision_loss)]
                return Ok(Value::Number(items.len() as f64));
            }
            if let Ok(index) = key.parse::<usize>() {
                return Ok(items.get(index).cloned().unwrap_or(Value::Undefined));
            }
            builtins::method(target, key)
        }
        Value::Object(_) => target.get_own(key).cloned(),
        Value::RegExp { source, flags } => match key {
            "source" => Some(Value::String(Arc::clone(source))),
            "flags" => Some(Value::String(Arc::clone(flags))),
            _ => builtins::method(target, key),
        },
        Value::Namespace(namespace) => methods::namespace_member(namespace, key),
        Value::Schema(schema) => methods::schema_property(schema, key),
        Value::Bool(_) | Value::Number(_) | Value::Function(_) => None,
    };
    Ok(value.unwrap_or(Value::Undefined))
}

fn is_primitive(value: &Value) -> bool {
    matches!(
        value,
        Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
    )
}

/// Convert objects to their string primitive, leave primitives alone.
fn to_primitive(value: &Value) -> Value {
    if is_primitive(value) {
        value.clone()
    } else {
        value.to_js_string().map_or(Value::Undefined, Value::string)
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (to_primitive(left), to_primitive(right)) {
        (Value::String(a), Value::String(b)) => Some(a.encode_utf16().cmp(b.encode_utf16())),
        (a, b) => a.to_number().partial_cmp(&b.to_number()),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    let num = |f: fn(f64, f64) -> f64| Value::Number(f(left.to_number(), right.to_number()));
    let int = |f: fn(i32, i32) -> i32| {
        Value::Number(f64::from(f(
            to_int32(left.to_number()),
            to_int32(right.to_number()),
        )))
    };
    match op {
        BinaryOp::Add => {
            let (a, b) = (to_primitive(left), to_primitive(right));
            if matches!(a, Value::String(_)) || matches!(b, Value::String(_)) {
                let text = format!(
                    "{}{}",
                    a.to_js_string().unwrap_or_default(),
                    b.to_js_string().unwrap_or_default()
                );
                Value::string(text)
            } else {
                Value::Number(a.to_number() + b.to_number())
            }
        }
        BinaryOp::Sub => num(|a, b| a - b),
        BinaryOp::Mul => num(|a, b| a * b),
        BinaryOp::Div => num(|a, b| a / b),
        BinaryOp::Rem => num(|a, b| a % b),
        BinaryOp::Pow => num(|a, b| {
            if a.abs() == 1.0 && b.is_infinite() {
                f64::NAN
            } else {
                a.powf(b)
            }
        }),
        BinaryOp::LooseEq => Value::Bool(loose_equals(left, right)),
        BinaryOp::LooseNe => Value::Bool(!loose_equals(left, right)),
        BinaryOp::StrictEq => Value::Bool(strict_equals(left, right)),
        BinaryOp::StrictNe => Value::Bool(!strict_equals(left, right)),
        BinaryOp::Lt => Value::Bool(compare(left, right) == Some(Ordering::Less)),
        BinaryOp::Gt => Value::Bool(compare(left, right) == Some(Ordering::Greater)),
        BinaryOp::Le => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Ge => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::BitAnd => int(|a, b| a & b),
        BinaryOp::BitOr => int(|a, b| a | b),
        BinaryOp::BitXor => int(|a, b| a ^ b),
    }
}

#[cfg(test)]
mod tests {
    use zt_schema::ApiGeneration;

    use super::*;
    use crate::error::ErrorKind;
    use crate::parser::parse_expression;

    fn eval(source: &str) -> Result<Value> {
        let env = Env::root(Arc::new(Library::new("3.24.2", ApiGeneration::V3)));
        let expr = parse_expression(source)?;
        Evaluator::new().eval(&expr, &env)
    }

    fn eval_json(source: &str) -> serde_json::Value {
        eval(source).unwrap().to_json().unwrap()
    }

    #[test]
    fn test_arithmetic_and_strings() {
        assert_eq!(eval_json("1 + 2 * 3"), serde_json::json!(7));
        assert_eq!(eval_json("'a' + 1"), serde_json::json!("a1"));
        assert_eq!(eval_json("[1, 2] + ''"), serde_json::json!("1,2"));
        assert_eq!(eval_json("7 % 3 ** 2"), serde_json::json!(7));
        assert_eq!(eval_json("~5 | 1"), serde_json::json!(-5));
    }

    #[test]
    fn test_logical_short_circuit() {
        // The right side would throw if evaluated
        assert_eq!(eval_json("false && missing"), serde_json::json!(false));
        assert_eq!(eval_json("1 || missing"), serde_json::json!(1));
        assert_eq!(eval_json("null ?? 'x'"), serde_json::json!("x"));
        assert_eq!(eval_json("0 ?? 'x'"), serde_json::json!(0));
    }

    #[test]
    fn test_scope_contains_only_namespace() {
        assert_eq!(eval("window").unwrap_err().message, "window is not defined");
        assert_eq!(eval("Math.max(1, 2)").unwrap_err().kind, ErrorKind::Reference);
        assert!(matches!(eval("zod").unwrap(), Value::Namespace(_)));
        assert_eq!(eval_json("typeof window"), serde_json::json!("undefined"));
        assert_eq!(eval_json("typeof z.string"), serde_json::json!("function"));
    }

    #[test]
    fn test_arrow_closures() {
        assert_eq!(eval_json("((a) => (b) => a + b)(1)(2)"), serde_json::json!(3));
        assert_eq!(eval_json("(({ x, y: w }) => x * w)({x: 3, y: 4})"), serde_json::json!(12));
        assert_eq!(eval_json("(() => { return 5; })()"), serde_json::json!(5));
        assert!(eval("(() => {})()").unwrap().to_json().is_none());
    }

    #[test]
    fn test_property_access_errors() {
        assert_eq!(
            eval("undefined.x").unwrap_err().message,
            "Cannot read properties of undefined (reading 'x')"
        );
        assert_eq!(
            eval("z.nope()").unwrap_err().message,
            "z.nope is not a function"
        );
        assert_eq!(
            eval("z.string().shape.x").unwrap_err().message,
            "Cannot read properties of undefined (reading 'x')"
        );
    }

    #[test]
    fn test_optional_chaining() {
        assert!(eval("undefined?.a.b.c").unwrap().to_json().is_none());
        assert!(eval("z.nope?.()").unwrap().to_json().is_none());
        assert_eq!(eval_json("({a: {b: 2}})?.a.b"), serde_json::json!(2));
    }

    #[test]
    fn test_spread() {
        assert_eq!(
            eval_json("{...{a: 1, b: 2}, b: 3, ...[9]}"),
            serde_json::json!({"a": 1, "b": 3, "0": 9})
        );
        assert_eq!(eval_json("[0, ...[1, 2], ...'ab']"), serde_json::json!([0, 1, 2, "a", "b"]));
        assert_eq!(eval("[...1]").unwrap_err().message, "1 is not iterable");
    }

    #[test]
    fn test_invalid_regex_literal() {
        let err = eval("/(/").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert!(err.message.starts_with("Invalid regular expression: /(/"));
    }

    #[test]
    fn test_to_int32() {
        assert_eq!(to_int32(4_294_967_297.0), 1);
        assert_eq!(to_int32(-1.5), -1);
        assert_eq!(to_int32(f64::NAN), 0);
    }
}
