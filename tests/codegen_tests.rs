//! Generated Lua text and compile-time rejections, through the full pipeline.

use pretty_assertions::assert_eq;

use exx::types::ErrorKind;
use exx::{CodegenOptions, CompileError, Compiler, CompilerOptions};

fn compile(source: &str) -> Result<String, CompileError> {
    let mut compiler = Compiler::default();
    compiler.compile_source("Main", source).map(|compiled| compiled.lua)
}

fn compile_ok(source: &str) -> String {
    compile(source).unwrap_or_else(|err| panic!("compilation failed: {}", err.render()))
}

fn error_kind(source: &str) -> ErrorKind {
    match compile(source) {
        Ok(lua) => panic!("expected an error, got:\n{}", lua),
        Err(err) => err
            .as_type_error()
            .map(|e| e.kind())
            .unwrap_or_else(|| panic!("expected a type error, got {}", err)),
    }
}

#[test]
fn whole_module_output() {
    let lua = compile_ok(
        r#"
        type Option<T> = Some(T) | None;
        export fn add(a: number, b: number) -> number { a + b }
        export fn or_zero(o: Option<number>) -> number { match o { Some(n) => n, None => 0 } }
        "#,
    );
    assert_eq!(
        lua,
        r#"-- Generated by exx from module Main
local _M = {}
local function Some(_1)
  return { tag = "Some", _1 }
end
local _direct_add, add
function _direct_add(a, b)
  return a + b
end
function add(a)
  return function(b)
    return _direct_add(a, b)
  end
end
local function or_zero(o)
  if o.tag == "Some" then
    local n = o[1]
    return n
  else
    return 0
  end
end
_M.add = add
_M.or_zero = or_zero
return _M
"#
    );
}

#[test]
fn exported_constructors() {
    let lua = compile_ok("export type Shape = Circle(number) | Dot;");
    assert!(lua.contains("_M.Circle = Circle\n"), "{}", lua);
    assert!(lua.contains("_M.Dot = { tag = \"Dot\" }\n"), "{}", lua);
}

#[test]
fn all_call_forms_reach_the_direct_entry() {
    let lua = compile_ok(
        r#"
        fn add3(a: number, b: number, c: number) -> number { a + b + c }
        let x = add3(1, 2, 3);
        let y = add3(1)(2, 3);
        let z = add3(1, 2)(3);
        let w = add3(1)(2)(3);
        "#,
    );
    for name in ["x", "y", "z", "w"] {
        let line = format!("local {} = _direct_add3(1, 2, 3)", name);
        assert!(lua.contains(&line), "missing `{}` in\n{}", line, lua);
    }
}

#[test]
fn curried_calls_without_flattening() {
    let mut compiler = Compiler::new(CompilerOptions {
        codegen: CodegenOptions {
            flatten_calls: false,
            module_header: false,
        },
        ..Default::default()
    });
    let lua = compiler
        .compile_source(
            "Main",
            "fn add3(a: number, b: number, c: number) -> number { a + b + c } let x = add3(1, 2, 3);",
        )
        .unwrap()
        .lua;
    assert!(!lua.contains("_direct"), "{}", lua);
    assert!(lua.contains("local x = add3(1)(2)(3)"), "{}", lua);
}

#[test]
fn foreign_calls_are_native() {
    let lua = compile_ok(
        r#"
        import foreign string.upper as upper: (string) -> string;
        import foreign math.max as max: (number, number) -> number;
        let s = upper("abc");
        let m = max(1, 2);
        print(s);
        "#,
    );
    assert!(lua.contains("local s = string.upper(\"abc\")"), "{}", lua);
    assert!(lua.contains("local m = math.max(1, 2)"), "{}", lua);
    assert!(lua.contains("print(s)"), "{}", lua);
}

#[test]
fn imports_become_require() {
    let mut compiler = Compiler::default();
    compiler
        .compile_source("Math", "export fn square(n: number) -> number { n * n }")
        .unwrap();
    let lua = compiler
        .compile_source("Main", "import Math; let y = Math.square(3);")
        .unwrap()
        .lua;
    assert!(lua.contains("local Math = require(\"Math\")\n"), "{}", lua);
    assert!(lua.contains("local y = Math.square(3)\n"), "{}", lua);
}

// === Rejections ===

#[test]
fn missing_constructor_is_reported() {
    let source = r#"
        type Option<T> = Some(T) | None;
        fn get(o: Option<number>) -> number { match o { Some(x) => x } }
    "#;
    assert_eq!(error_kind(source), ErrorKind::NonExhaustiveMatch);

    let message = compile(source).unwrap_err().to_string();
    assert!(message.contains("None"), "{}", message);
}

#[test]
fn wildcard_completes_a_match() {
    compile_ok(
        r#"
        type Option<T> = Some(T) | None;
        fn get(o: Option<number>) -> number { match o { Some(x) => x, _ => 0 } }
        "#,
    );
}

#[test]
fn arm_after_wildcard_is_redundant() {
    let source = r#"
        type Option<T> = Some(T) | None;
        fn get(o: Option<number>) -> number { match o { _ => 0, Some(x) => x } }
    "#;
    assert_eq!(error_kind(source), ErrorKind::RedundantPattern);
}

#[test]
fn numbers_need_a_catch_all() {
    assert_eq!(
        error_kind("fn f(n: number) -> string { match n { 0 => \"zero\", 1 => \"one\" } }"),
        ErrorKind::NonExhaustiveMatch
    );
    compile_ok("fn f(n: number) -> string { match n { 0 => \"zero\", _ => \"many\" } }");
}

#[test]
fn literal_unions_are_finite() {
    let status = r#"type Status = "loading" | "success" | "error";"#;
    compile_ok(&format!(
        r#"{status} fn f(s: Status) -> number {{ match s {{ "loading" => 1, "success" => 2, "error" => 3 }} }}"#
    ));
    assert_eq!(
        error_kind(&format!(
            r#"{status} fn f(s: Status) -> number {{ match s {{ "loading" => 1, "success" => 2 }} }}"#
        )),
        ErrorKind::NonExhaustiveMatch
    );
}

#[test]
fn nothing_is_emitted_for_a_rejected_module() {
    let mut compiler = Compiler::default();
    assert!(compiler.compile_source("Main", "let x: string = 1;").is_err());
    assert!(compiler.interface("Main").is_none());
}
