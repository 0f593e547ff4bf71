use thiserror::Error;

use super::subst::Substitution;
use super::ty::{Tag, Type, TypeVar, UnionType};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnifyError {
    #[error("type mismatch: expected {expected}, found {found}")]
    Mismatch { expected: Type, found: Type },
    #[error("occurs check: cannot construct infinite type {var} = {ty}")]
    OccursCheck { var: TypeVar, ty: Type },
}

/// Check if a type variable occurs within a type (occurs check).
///
/// The occurs check prevents the creation of infinite types by ensuring
/// we never create a substitution like `'t0 = 't0 -> number`.
///
/// ```text
/// occurs_in('t0, number) = false
/// occurs_in('t0, 't0) = true
/// occurs_in('t0, Option<'t0>) = true
/// occurs_in('t0, 't1 -> 't2) = false
/// ```
///
/// `ty` is expected to already have the current substitution applied.
fn occurs_in(var: &TypeVar, ty: &Type) -> bool {
    match ty {
        Type::Number | Type::String | Type::Boolean | Type::Unit => false,
        Type::Var(v) => v == var,
        Type::Func(t1, t2) => occurs_in(var, t1) || occurs_in(var, t2),
        Type::Generic { args, .. } | Type::Adt { args, .. } => {
            args.iter().any(|arg| occurs_in(var, arg))
        }
        Type::Union(union) => union.tags.iter().any(|tag| match tag {
            Tag::Type(t) => occurs_in(var, t),
            _ => false,
        }),
    }
}

/// Unify two types under an existing substitution, returning the extended
/// substitution that makes them equal.
///
/// # Algorithm
///
/// Both sides are first resolved through `subst`, then decomposed structurally:
///
/// ```text
/// Unify(number, number) = ∅
/// Unify('t0, number)    = [t0 := number]
/// Unify('t0, 't0 -> number) = Error   // occurs check
///
/// Unify(t1 -> t2, t3 -> t4):
///   1. Unify t1 with t3, extending S
///   2. Unify t2 with t4 under the extended S
///
/// Unify(Option<'t0>, Option<number>) = [t0 := number]
/// Unify(Option<number>, Result<number>) = Error   // names differ
/// ```
///
/// # Unions
///
/// Two unions unify only when their tag sets are equal; there is no implicit
/// widening. A non-union type unifies with a union when it unifies with one of
/// the union's type members (e.g. `Option<number>` against
/// `Option<number> | "none"`); the first member that fits wins. Literal
/// members (`"loading"`, `42`, `true`) never absorb a whole primitive type here:
/// literal values are checked for membership by the inference engine, which
/// knows the literal.
///
/// # Returns
///
/// * `Ok(Substitution)` - `subst` extended so that both types become equal
/// * `Err(UnifyError::Mismatch)` - the types cannot be made equal
/// * `Err(UnifyError::OccursCheck)` - binding would create an infinite type
pub fn unify(t1: &Type, t2: &Type, subst: &Substitution) -> Result<Substitution, UnifyError> {
    let mut result = subst.clone();
    unify_in_place(t1, t2, &mut result)?;
    Ok(result)
}

/// Same as [`unify`] but extends `subst` directly. On error `subst` may hold a
/// partial extension and should be discarded.
pub fn unify_in_place(t1: &Type, t2: &Type, subst: &mut Substitution) -> Result<(), UnifyError> {
    let a = shallow(t1, subst);
    let b = shallow(t2, subst);

    match (&a, &b) {
        (Type::Number, Type::Number)
        | (Type::String, Type::String)
        | (Type::Boolean, Type::Boolean)
        | (Type::Unit, Type::Unit) => Ok(()),

        (Type::Var(v1), Type::Var(v2)) if v1 == v2 => Ok(()),
        (Type::Var(v), t) | (t, Type::Var(v)) => bind(v, t, subst),

        (Type::Func(a1, r1), Type::Func(a2, r2)) => {
            unify_in_place(a1, a2, subst)?;
            unify_in_place(r1, r2, subst)
        }

        (
            Type::Generic {
                name: n1,
                args: args1,
            },
            Type::Generic {
                name: n2,
                args: args2,
            },
        )
        | (
            Type::Adt {
                name: n1,
                args: args1,
            },
            Type::Adt {
                name: n2,
                args: args2,
            },
        ) if n1 == n2 && args1.len() == args2.len() => {
            for (x, y) in args1.iter().zip(args2) {
                unify_in_place(x, y, subst)?;
            }
            Ok(())
        }

        (Type::Union(u1), Type::Union(u2)) => {
            let u1 = subst.apply(&Type::Union(u1.clone()));
            let u2 = subst.apply(&Type::Union(u2.clone()));
            if u1 == u2 {
                Ok(())
            } else {
                Err(UnifyError::Mismatch {
                    expected: u1,
                    found: u2,
                })
            }
        }

        (Type::Union(union), other) => unify_member(union, other, subst).map_err(|_| {
            UnifyError::Mismatch {
                expected: subst.apply(&a),
                found: subst.apply(&b),
            }
        }),
        (other, Type::Union(union)) => unify_member(union, other, subst).map_err(|_| {
            UnifyError::Mismatch {
                expected: subst.apply(&a),
                found: subst.apply(&b),
            }
        }),

        _ => Err(UnifyError::Mismatch {
            expected: subst.apply(&a),
            found: subst.apply(&b),
        }),
    }
}

/// Follow variable bindings at the top of a type only.
fn shallow(ty: &Type, subst: &Substitution) -> Type {
    match ty {
        Type::Var(v) => match subst.get(v) {
            Some(bound) => shallow(bound, subst),
            None => ty.clone(),
        },
        _ => ty.clone(),
    }
}

fn bind(var: &TypeVar, ty: &Type, subst: &mut Substitution) -> Result<(), UnifyError> {
    let ty = subst.apply(ty);
    if matches!(&ty, Type::Var(v) if v == var) {
        return Ok(());
    }
    if occurs_in(var, &ty) {
        return Err(UnifyError::OccursCheck {
            var: var.clone(),
            ty,
        });
    }
    subst.insert(var.clone(), ty);
    Ok(())
}

fn unify_member(union: &UnionType, ty: &Type, subst: &mut Substitution) -> Result<(), ()> {
    for tag in &union.tags {
        if let Tag::Type(member) = tag {
            let mut trial = subst.clone();
            if unify_in_place(member, ty, &mut trial).is_ok() {
                *subst = trial;
                return Ok(());
            }
        }
    }
    Err(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(id: usize) -> Type {
        Type::Var(TypeVar::new(id))
    }

    fn empty() -> Substitution {
        Substitution::empty()
    }

    #[test]
    fn test_unify_identical_primitives() {
        for ty in [Type::Number, Type::String, Type::Boolean, Type::Unit] {
            assert_eq!(unify(&ty, &ty, &empty()), Ok(Substitution::empty()));
        }
    }

    #[test]
    fn test_unify_var_with_concrete() {
        let v = TypeVar::new(0);
        let result = unify(&Type::Var(v.clone()), &Type::Number, &empty());
        assert_eq!(result, Ok(Substitution::singleton(v, Type::Number)));
    }

    #[test]
    fn test_unify_concrete_with_var() {
        let v = TypeVar::new(0);
        let result = unify(&Type::Number, &Type::Var(v.clone()), &empty());
        assert_eq!(result, Ok(Substitution::singleton(v, Type::Number)));
    }

    #[test]
    fn test_unify_same_var() {
        assert_eq!(unify(&var(0), &var(0), &empty()), Ok(Substitution::empty()));
    }

    #[test]
    fn test_unify_respects_existing_bindings() {
        let subst = Substitution::singleton(TypeVar::new(0), Type::String);
        let result = unify(&var(0), &Type::Number, &subst);
        assert!(matches!(result, Err(UnifyError::Mismatch { .. })));

        let result = unify(&var(0), &Type::String, &subst).unwrap();
        assert_eq!(result, subst);
    }

    #[test]
    fn test_unify_occurs_check_direct() {
        let ty = Type::func(var(0), Type::Number);
        let result = unify(&var(0), &ty, &empty());
        assert!(matches!(result, Err(UnifyError::OccursCheck { .. })));
    }

    #[test]
    fn test_unify_occurs_check_through_substitution() {
        // 't1 is already 't0 -> number, so 't0 ~ 't1 would be infinite
        let subst = Substitution::singleton(TypeVar::new(1), Type::func(var(0), Type::Number));
        let result = unify(&var(0), &var(1), &subst);
        assert!(matches!(result, Err(UnifyError::OccursCheck { .. })));
    }

    #[test]
    fn test_unify_occurs_check_in_type_argument() {
        let ty = Type::adt("List", vec![var(0)]);
        let result = unify(&var(0), &ty, &empty());
        assert!(matches!(result, Err(UnifyError::OccursCheck { .. })));
    }

    #[test]
    fn test_unify_function_binds_result() {
        // (number) -> T ~ (number) -> string binds T = string
        let t = TypeVar::with_name(0, "T".to_string());
        let t1 = Type::func(Type::Number, Type::Var(t.clone()));
        let t2 = Type::func(Type::Number, Type::String);
        let result = unify(&t1, &t2, &empty()).unwrap();
        assert_eq!(result.apply(&Type::Var(t)), Type::String);
        assert_eq!(result.apply(&t1), result.apply(&t2));
    }

    #[test]
    fn test_unify_threads_substitution() {
        // 't0 -> 't0 ~ number -> 't1
        let t1 = Type::func(var(0), var(0));
        let t2 = Type::func(Type::Number, var(1));
        let result = unify(&t1, &t2, &empty()).unwrap();
        assert_eq!(result.apply(&var(1)), Type::Number);
    }

    #[test]
    fn test_unify_mismatch_concrete() {
        let result = unify(&Type::Number, &Type::String, &empty());
        assert_eq!(
            result,
            Err(UnifyError::Mismatch {
                expected: Type::Number,
                found: Type::String
            })
        );
    }

    #[test]
    fn test_unify_mismatch_shape() {
        let result = unify(&Type::Number, &Type::func(Type::Number, Type::Number), &empty());
        assert!(matches!(result, Err(UnifyError::Mismatch { .. })));
    }

    #[test]
    fn test_unify_parametrized_pairwise() {
        let t1 = Type::adt("Option", vec![var(0)]);
        let t2 = Type::adt("Option", vec![Type::Number]);
        let result = unify(&t1, &t2, &empty()).unwrap();
        assert_eq!(result.apply(&var(0)), Type::Number);
    }

    #[test]
    fn test_unify_different_names_never_unify() {
        let t1 = Type::adt("Option", vec![Type::Number]);
        let t2 = Type::adt("Maybe", vec![Type::Number]);
        assert!(unify(&t1, &t2, &empty()).is_err());

        let g1 = Type::Generic {
            name: "Handle".into(),
            args: vec![],
        };
        let g2 = Type::adt("Handle", vec![]);
        assert!(unify(&g1, &g2, &empty()).is_err());
    }

    #[test]
    fn test_unify_unions_require_equal_sets() {
        let a = Type::Union(UnionType::new(
            None,
            vec![Tag::Str("a".into()), Tag::Str("b".into())],
        ));
        let b = Type::Union(UnionType::new(
            None,
            vec![Tag::Str("b".into()), Tag::Str("a".into())],
        ));
        let c = Type::Union(UnionType::new(None, vec![Tag::Str("a".into())]));
        assert!(unify(&a, &b, &empty()).is_ok());
        assert!(unify(&a, &c, &empty()).is_err());
        assert!(unify(&c, &a, &empty()).is_err());
    }

    #[test]
    fn test_unify_member_of_union() {
        let union = Type::Union(UnionType::new(
            None,
            vec![
                Tag::Type(Type::adt("Option", vec![Type::Number])),
                Tag::Str("none".into()),
            ],
        ));
        let value = Type::adt("Option", vec![var(0)]);
        let result = unify(&union, &value, &empty()).unwrap();
        assert_eq!(result.apply(&var(0)), Type::Number);
    }

    #[test]
    fn test_unify_literal_union_rejects_whole_primitive() {
        let status = Type::Union(UnionType::new(
            Some("Status".into()),
            vec![Tag::Str("loading".into()), Tag::Str("done".into())],
        ));
        assert!(unify(&status, &Type::String, &empty()).is_err());
        assert!(unify(&Type::String, &status, &empty()).is_err());
    }

    #[test]
    fn test_unify_var_with_union() {
        let status = Type::Union(UnionType::new(None, vec![Tag::Num(1.0), Tag::Num(2.0)]));
        let result = unify(&var(0), &status, &empty()).unwrap();
        assert_eq!(result.apply(&var(0)), status);
    }

    #[test]
    fn test_occurs_check_helper() {
        let v = TypeVar::new(0);
        assert!(occurs_in(&v, &Type::Var(v.clone())));
        assert!(!occurs_in(&v, &var(1)));
        assert!(!occurs_in(&v, &Type::Number));
        assert!(occurs_in(
            &v,
            &Type::func(Type::func(Type::Var(v.clone()), Type::Number), Type::String)
        ));
    }
}
