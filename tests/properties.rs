//! Property-based tests for unification and generated code
//!
//! - Unification is sound: a successful unifier makes both sides equal
//! - Unification succeeds symmetrically and is reflexive
//! - Applying a unifier is idempotent
//! - The occurs check rejects infinite types
//! - Generic functions instantiate independently at every use
//! - Arithmetic compiled to Lua evaluates like the host arithmetic

use proptest::prelude::*;

use exx::Compiler;
use exx::interpreter::Interpreter;
use exx::ast::statement::Statement;
use exx::parser::parse_source;
use exx::types::{Infer, Substitution, Type, TypeVar, unify};

// ============================================================================
// Type Generators
// ============================================================================

fn arb_var() -> impl Strategy<Value = Type> {
    (0usize..4).prop_map(|id| Type::Var(TypeVar::new(id)))
}

/// Types without unions, so that a unifier has to make both sides identical.
fn arb_type(depth: u32) -> BoxedStrategy<Type> {
    let leaf = prop_oneof![
        Just(Type::Number),
        Just(Type::String),
        Just(Type::Boolean),
        Just(Type::Unit),
        arb_var(),
    ];
    leaf.prop_recursive(depth, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Type::func(a, b)),
            inner.clone().prop_map(|t| Type::adt("Option", vec![t])),
            (inner.clone(), inner).prop_map(|(a, b)| Type::adt("Pair", vec![a, b])),
        ]
    })
    .boxed()
}

// ============================================================================
// Unification
// ============================================================================

proptest! {
    #[test]
    fn unifier_makes_types_equal(t1 in arb_type(3), t2 in arb_type(3)) {
        if let Ok(subst) = unify(&t1, &t2, &Substitution::empty()) {
            prop_assert_eq!(subst.apply(&t1), subst.apply(&t2));
        }
    }

    #[test]
    fn unification_is_symmetric(t1 in arb_type(3), t2 in arb_type(3)) {
        let forward = unify(&t1, &t2, &Substitution::empty()).is_ok();
        let backward = unify(&t2, &t1, &Substitution::empty()).is_ok();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn unification_is_reflexive(t in arb_type(3)) {
        let subst = unify(&t, &t, &Substitution::empty());
        prop_assert!(subst.is_ok());
    }

    #[test]
    fn applying_a_unifier_is_idempotent(t1 in arb_type(3), t2 in arb_type(3), sample in arb_type(3)) {
        if let Ok(subst) = unify(&t1, &t2, &Substitution::empty()) {
            let once = subst.apply(&sample);
            prop_assert_eq!(subst.apply(&once), once);
        }
    }

    #[test]
    fn occurs_check_rejects_infinite_types(id in 0usize..4, t in arb_type(2)) {
        let var = Type::Var(TypeVar::new(id));
        let cyclic = Type::func(var.clone(), t);
        prop_assert!(unify(&var, &cyclic, &Substitution::empty()).is_err());
    }
}

// ============================================================================
// Generalization
// ============================================================================

/// A literal in source form together with its type.
fn arb_literal() -> impl Strategy<Value = (String, Type)> {
    prop_oneof![
        (0u32..1000).prop_map(|n| (n.to_string(), Type::Number)),
        "[a-z]{0,8}".prop_map(|s| (format!("\"{}\"", s), Type::String)),
        any::<bool>().prop_map(|b| (b.to_string(), Type::Boolean)),
        Just(("()".to_string(), Type::Unit)),
    ]
}

proptest! {
    #[test]
    fn generic_uses_do_not_interfere(uses in prop::collection::vec(arb_literal(), 1..5)) {
        let mut source = String::from("fn identity<T>(x: T) -> T { x }\n");
        for (i, (literal, _)) in uses.iter().enumerate() {
            source.push_str(&format!("let v{i} = identity({literal});\n"));
        }
        let module = parse_source(&source).expect("parse failed");
        let checked = match Infer::new().check_module("Main", &module) {
            Ok(checked) => checked,
            Err(err) => return Err(TestCaseError::fail(err.to_string())),
        };
        let inferred: Vec<Type> = checked
            .module
            .statements()
            .filter_map(|stmt| match stmt {
                Statement::Let(binding) => Some(binding.value.info().clone()),
                _ => None,
            })
            .collect();
        let expected: Vec<Type> = uses.into_iter().map(|(_, ty)| ty).collect();
        prop_assert_eq!(inferred, expected);
    }
}

// ============================================================================
// Generated Code
// ============================================================================

fn run(source: &str) -> Vec<String> {
    let mut compiler = Compiler::default();
    let compiled = compiler
        .compile_source("Main", source)
        .unwrap_or_else(|err| panic!("compilation failed: {}", err.render()));
    let mut interpreter = Interpreter::new();
    interpreter
        .load("Main", &compiled.chunk)
        .unwrap_or_else(|err| panic!("runtime error: {}", err));
    interpreter.take_output()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn compiled_arithmetic_matches_host(a in 0u32..1000, b in 0u32..1000, c in 1u32..100) {
        let source = format!(
            "fn combine(x: number, y: number, z: number) -> number {{ x * y + z }}\n\
             print(tostring(combine({a}, {b}, {c})));\n\
             print(tostring(combine({a})({b})({c})));"
        );
        let expected = (a as u64 * b as u64 + c as u64).to_string();
        prop_assert_eq!(run(&source), vec![expected.clone(), expected]);
    }

    #[test]
    fn compiled_comparison_matches_host(a in 0u32..100, b in 0u32..100) {
        let source = format!(
            "let smaller = if {a} < {b} {{ \"left\" }} else if {a} == {b} {{ \"same\" }} else {{ \"right\" }};\n\
             print(smaller);"
        );
        let expected = if a < b {
            "left"
        } else if a == b {
            "same"
        } else {
            "right"
        };
        prop_assert_eq!(run(&source), vec![expected.to_string()]);
    }
}
