//! Type checking of whole modules

use exx::ast::statement::Statement;
use exx::parser::parse_source;
use exx::types::{CheckedModule, ErrorKind, Infer, SignatureTable, Type, TypeError};

fn check(source: &str) -> Result<CheckedModule, TypeError> {
    let module = parse_source(source).expect("parsing failed");
    Infer::new()
        .with_signatures(SignatureTable::prelude())
        .check_module("Main", &module)
}

fn check_ok(source: &str) -> CheckedModule {
    match check(source) {
        Ok(checked) => checked,
        Err(err) => panic!("type check failed: {}", err),
    }
}

fn check_err(source: &str) -> TypeError {
    match check(source) {
        Ok(_) => panic!("expected a type error"),
        Err(err) => err,
    }
}

/// Type of the value bound by the top-level `let` named `name`.
fn binding_type(checked: &CheckedModule, name: &str) -> Type {
    checked
        .module
        .statements()
        .find_map(|stmt| match stmt {
            Statement::Let(binding) if binding.name.value == name => Some(binding.value.info().clone()),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no binding named {}", name))
}

#[test]
fn literals_have_primitive_types() {
    let checked = check_ok(r#"let n = 1; let s = "a"; let b = true; let u = ();"#);
    assert_eq!(binding_type(&checked, "n"), Type::Number);
    assert_eq!(binding_type(&checked, "s"), Type::String);
    assert_eq!(binding_type(&checked, "b"), Type::Boolean);
    assert_eq!(binding_type(&checked, "u"), Type::Unit);
}

#[test]
fn generic_identity_at_two_types() {
    let checked = check_ok(
        r#"
        fn identity<T>(x: T) -> T { x }
        let a = identity(42);
        let b = identity("hello");
        "#,
    );
    assert_eq!(binding_type(&checked, "a"), Type::Number);
    assert_eq!(binding_type(&checked, "b"), Type::String);
}

#[test]
fn let_bound_lambda_is_generalized() {
    let checked = check_ok(
        r#"
        let twice = (f, x) -> f(f(x));
        let n = twice((x: number) -> x + 1, 0);
        let s = twice((x: string) -> x ++ "!", "hi");
        "#,
    );
    assert_eq!(binding_type(&checked, "n"), Type::Number);
    assert_eq!(binding_type(&checked, "s"), Type::String);
}

#[test]
fn rigid_type_parameter_cannot_be_specialized() {
    let err = check_err("fn bad<T>(x: T) -> T { x + 1 }");
    assert_eq!(err.kind(), ErrorKind::Unification);
}

#[test]
fn unbound_identifier() {
    let err = check_err("let x = y + 1;");
    assert_eq!(err.kind(), ErrorKind::UnboundIdentifier);
    assert!(err.to_string().contains('y'));
}

#[test]
fn immutable_assignment_is_rejected() {
    let err = check_err("let x = 10; x = 20;");
    assert_eq!(err.kind(), ErrorKind::ImmutableAssignment);
}

#[test]
fn var_assignment_is_accepted() {
    check_ok("var x = 10; x = 20;");
}

#[test]
fn var_assignment_must_keep_type() {
    let err = check_err(r#"var x = 10; x = "twenty";"#);
    assert_eq!(err.kind(), ErrorKind::Unification);
}

#[test]
fn union_literal_membership() {
    let status = r#"type Status = "loading" | "success" | "error";"#;
    check_ok(&format!(r#"{status} let state: Status = "loading";"#));

    let err = check_err(&format!(r#"{status} let state: Status = "paused";"#));
    assert_eq!(err.kind(), ErrorKind::Unification);
    assert!(err.to_string().contains("paused"), "{}", err);
}

#[test]
fn branches_must_agree() {
    let err = check_err(r#"let x = if true { 1 } else { "one" };"#);
    assert_eq!(err.kind(), ErrorKind::Unification);

    let err = check_err(r#"fn f(n: number) -> number { match n { 1 => 1, _ => "many" } }"#);
    assert_eq!(err.kind(), ErrorKind::Unification);
}

#[test]
fn constructor_field_types_are_checked() {
    let option = "type Option<T> = Some(T) | None;";
    let checked = check_ok(&format!("{option} let o = Some(1);"));
    assert_eq!(binding_type(&checked, "o"), Type::adt("Option", vec![Type::Number]));

    let err = check_err(&format!("{option} let o: Option<string> = Some(1);"));
    assert_eq!(err.kind(), ErrorKind::Unification);
}

#[test]
fn constructor_arity_is_checked() {
    let err = check_err("type Pair<A, B> = Pair(A, B); fn f(p: Pair<number, number>) -> number { match p { Pair(a) => a } }");
    assert_eq!(err.kind(), ErrorKind::ArityMismatch);
}

#[test]
fn calling_a_non_function() {
    let err = check_err("let x = 1; let y = x(2);");
    assert!(matches!(err.kind(), ErrorKind::Unification | ErrorKind::ArityMismatch));
}

#[test]
fn too_many_arguments() {
    let err = check_err("fn add(a: number, b: number) -> number { a + b } let x = add(1, 2, 3);");
    assert_eq!(err.kind(), ErrorKind::ArityMismatch);
}

#[test]
fn call_forms_are_interchangeable() {
    let checked = check_ok(
        r#"
        fn add3(a: number, b: number, c: number) -> number { a + b + c }
        let x = add3(1, 2, 3);
        let y = add3(1)(2, 3);
        let z = add3(1, 2)(3);
        let w = add3(1)(2)(3);
        let partial = add3(1);
        "#,
    );
    for name in ["x", "y", "z", "w"] {
        assert_eq!(binding_type(&checked, name), Type::Number);
    }
    assert_eq!(
        binding_type(&checked, "partial"),
        Type::curried(vec![Type::Number, Type::Number], Type::Number)
    );
}

#[test]
fn mutual_recursion_needs_rec_group() {
    let source = r#"
        fn even(n: number) -> boolean { if n == 0 { true } else { odd(n - 1) } }
        fn odd(n: number) -> boolean { if n == 0 { false } else { even(n - 1) } }
    "#;
    assert_eq!(check_err(source).kind(), ErrorKind::UnboundIdentifier);

    check_ok(&format!("rec {{ {} }}", source));
}

#[test]
fn self_recursive_function() {
    check_ok("fn fact(n: number) -> number { if n == 0 { 1 } else { n * fact(n - 1) } }");
}

#[test]
fn let_rec_allows_self_reference() {
    check_ok("let rec count = (n: number) -> if n == 0 { 0 } else { count(n - 1) };");
    let err = check_err("let count = (n: number) -> if n == 0 { 0 } else { count(n - 1) };");
    assert_eq!(err.kind(), ErrorKind::UnboundIdentifier);
}

#[test]
fn recursive_type_is_rejected() {
    let err = check_err("let f = (x) -> x(x);");
    assert_eq!(err.kind(), ErrorKind::RecursiveType);
}

#[test]
fn foreign_import_uses_declared_signature() {
    let checked = check_ok(
        r#"
        import foreign string.upper as upper: (string) -> string;
        let s = upper("abc");
        "#,
    );
    assert_eq!(binding_type(&checked, "s"), Type::String);

    let err = check_err("import foreign string.upper as upper: (string) -> string; let s = upper(1);");
    assert_eq!(err.kind(), ErrorKind::Unification);
}

#[test]
fn foreign_import_without_signature() {
    let err = check_err("import foreign os.time; let t = time();");
    assert_eq!(err.kind(), ErrorKind::UndeclaredForeignSignature);
}

#[test]
fn prelude_functions_are_typed() {
    let checked = check_ok(r#"let s = tostring(1); print(s);"#);
    assert_eq!(binding_type(&checked, "s"), Type::String);

    let err = check_err("print(1);");
    assert_eq!(err.kind(), ErrorKind::Unification);
}

#[test]
fn interface_exports_only_exported_names() {
    let checked = check_ok(
        r#"
        export fn square(n: number) -> number { n * n }
        fn hidden() -> number { 1 }
        export type Shape = Circle(number) | Dot;
        "#,
    );
    assert!(checked.interface.value("square").is_some());
    assert!(checked.interface.value("hidden").is_none());
    assert!(checked.interface.types.is_constructor("Main.Circle"));
}

#[test]
fn rendered_errors_point_at_source() {
    let err = check_err("let x = 1;\nlet y = x + \"a\";");
    let rendered = err.render();
    assert!(rendered.contains("type mismatch"), "{}", rendered);
}
