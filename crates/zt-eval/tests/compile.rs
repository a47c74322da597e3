//! Compiling schema source against loaded modules of both API generations.

use std::sync::Arc;

use serde_json::json;
use zt_eval::{ErrorKind, NOT_A_SCHEMA, compile, evaluate, typecheck};
use zt_loader::LoadedModule;
use zt_schema::{ApiGeneration, ParseOutcome};

fn v3() -> Arc<LoadedModule> {
    Arc::new(LoadedModule::new("3.24.2", "zod@3.24.2/+esm", ApiGeneration::V3))
}

fn v4() -> Arc<LoadedModule> {
    Arc::new(LoadedModule::new("4.1.5", "zod@4.1.5/+esm", ApiGeneration::V4))
}

fn parse(source: &str, module: &Arc<LoadedModule>, input: serde_json::Value) -> serde_json::Value {
    let handle = compile(source, module).unwrap();
    handle
        .safe_parse(Some(&input))
        .unwrap()
        .to_json(module.generation())
}

#[test]
fn default_schema_accepts_default_json() {
    let module = v3();
    let handle = compile("z.object({\n    key: z.string()\n})", &module).unwrap();
    let outcome = handle.safe_parse(Some(&json!({"key": "value"}))).unwrap();
    assert_eq!(outcome, ParseOutcome::Success(Some(json!({"key": "value"}))));
    assert_eq!(handle.version(), "3.24.2");
}

#[test]
fn non_schema_results_are_rejected() {
    let module = v3();
    for source in ["123", "'text'", "{}", "z", "z.string", "undefined"] {
        let err = compile(source, &module).unwrap_err();
        assert_eq!(err.message, NOT_A_SCHEMA, "source: {source}");
    }
}

#[test]
fn only_namespace_names_are_in_scope() {
    let module = v3();
    let err = compile("foo", &module).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Reference);
    assert_eq!(err.to_string(), "foo is not defined");
    assert!(compile("zod.string()", &module).is_ok());
    assert_eq!(
        compile("process.env", &module).unwrap_err().to_string(),
        "process is not defined"
    );
}

#[test]
fn trailing_semicolon_is_stripped() {
    assert!(compile("  z.number();  \n", &v3()).is_ok());
    let err = compile("z.number();;", &v3()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
}

#[test]
fn syntax_errors_surface_their_message() {
    let err = compile("z.object({", &v3()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert_eq!(err.to_console_string(), format!("SyntaxError: {}", err.message));
}

#[test]
fn schema_from_another_instance_is_not_accepted() {
    let first = v3();
    let second = v3();
    let value = evaluate("z.string()", &second).unwrap();
    assert_eq!(typecheck(value, &first).unwrap_err().message, NOT_A_SCHEMA);
}

#[test]
fn refine_reports_custom_message_and_path() {
    let source = r#"z.object({ a: z.string(), b: z.string() })
        .refine((v) => v.a === v.b, { message: "Must match", path: ["b"] })"#;
    let out = parse(source, &v3(), json!({"a": "x", "b": "y"}));
    assert_eq!(out["success"], json!(false));
    assert_eq!(out["error"]["issues"][0]["code"], json!("custom"));
    assert_eq!(out["error"]["issues"][0]["message"], json!("Must match"));
    assert_eq!(out["error"]["issues"][0]["path"], json!(["b"]));

    let ok = parse(source, &v3(), json!({"a": "x", "b": "x"}));
    assert_eq!(ok["success"], json!(true));
}

#[test]
fn transform_runs_user_function() {
    let out = parse(
        "z.string().transform((s) => s.split(',').map((p) => p.trim()))",
        &v3(),
        json!("a, b ,c"),
    );
    assert_eq!(out["data"], json!(["a", "b", "c"]));
}

#[test]
fn coerce_namespace_converts_input() {
    let out = parse("z.coerce.number().int()", &v3(), json!("42"));
    assert_eq!(out, json!({"success": true, "data": 42}));
    assert_eq!(
        compile("z.coerce.object({})", &v3()).unwrap_err().to_string(),
        "z.coerce.object is not a function"
    );
}

#[test]
fn newer_exports_need_the_newer_generation() {
    assert_eq!(
        compile("z.email()", &v3()).unwrap_err().to_string(),
        "z.email is not a function"
    );
    let out = parse("z.email()", &v4(), json!("user@example.com"));
    assert_eq!(out["success"], json!(true));
    assert!(compile("z.nativeEnum({ A: 'a' })", &v4()).is_err());
}

#[test]
fn single_argument_record_differs_by_generation() {
    let out = parse("z.record(z.number())", &v3(), json!({"a": 1}));
    assert_eq!(out["success"], json!(true));
    let err = compile("z.record(z.number())", &v4()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
    assert_eq!(err.message, "Cannot read properties of undefined (reading '_zod')");
}

#[test]
fn parse_inside_source_throws_issue_list() {
    let err = compile("z.string().parse(1)", &v3()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Error);
    insta::assert_snapshot!(err.message, @r#"
    [
      {
        "code": "invalid_type",
        "expected": "string",
        "received": "number",
        "path": [],
        "message": "Expected string, received number"
      }
    ]
    "#);
}

#[test]
fn failed_parse_serializes_generation_layout() {
    let out = parse("z.object({ key: z.string() })", &v3(), json!({"key": 1}));
    insta::assert_json_snapshot!(out, @r#"
    {
      "success": false,
      "error": {
        "issues": [
          {
            "code": "invalid_type",
            "expected": "string",
            "received": "number",
            "path": [
              "key"
            ],
            "message": "Expected string, received number"
          }
        ],
        "name": "ZodError"
      }
    }
    "#);
}

#[test]
fn regex_literals_and_string_checks() {
    let source = r"z.string().regex(/^[a-z]+$/i, 'letters only').min(2)";
    assert_eq!(parse(source, &v3(), json!("Ab"))["success"], json!(true));
    let out = parse(source, &v3(), json!("a1"));
    assert_eq!(out["error"]["issues"][0]["message"], json!("letters only"));
}

#[test]
fn default_and_catch_fill_values() {
    let out = parse(
        "z.object({ n: z.number().default(() => 7), s: z.string().catch('fallback') })",
        &v3(),
        json!({"s": 5}),
    );
    assert_eq!(out["data"], json!({"n": 7, "s": "fallback"}));
}

#[test]
fn callback_errors_surface_from_safe_parse() {
    let handle = compile("z.any().refine((v) => v.deep.value)", &v3()).unwrap();
    let err = handle.safe_parse(Some(&json!({}))).unwrap_err();
    assert_eq!(err.message, "Cannot read properties of undefined (reading 'value')");
}

/// Run `source` on a thread with the stack size of a default test or
/// tokio worker thread.
fn compile_on_small_stack(source: impl Into<String>) -> zt_eval::CompileError {
    let source = source.into();
    std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(move || compile(&source, &v3()).unwrap_err())
        .unwrap()
        .join()
        .unwrap()
}

#[test]
fn unbounded_recursion_is_a_range_error() {
    let err = compile_on_small_stack("(f => f(f))(f => f(f))");
    assert_eq!(err.kind, ErrorKind::Range);
    assert_eq!(err.message, "Maximum call stack size exceeded");
}

#[test]
fn recursion_through_callbacks_is_a_range_error() {
    let err = compile_on_small_stack("(f => f(f))(f => z.any().refine(x => f(f)).safeParse(1))");
    assert_eq!(err.kind, ErrorKind::Range);
    assert_eq!(err.message, "Maximum call stack size exceeded");
}

#[test]
fn deep_nesting_on_small_stack_is_a_range_error() {
    let source = format!("{}z.string(){}", "z.array(".repeat(200), ")".repeat(200));
    let err = compile_on_small_stack(source);
    assert_eq!(err.kind, ErrorKind::Range);
}

#[test]
fn moderately_nested_schema_still_compiles() {
    let source = "z.object({ a: z.object({ b: z.object({ c: z.object({ d: z.object({ \
                  e: z.array(z.string().min(1).max(10).trim()).optional() }) }) }) }) })";
    let out = parse(source, &v3(), json!({"a": {"b": {"c": {"d": {"e": ["x"]}}}}}));
    assert_eq!(out["success"], json!(true));
}
