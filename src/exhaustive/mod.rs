//! # Exhaustiveness and Redundancy
//!
//! Runs over a fully typed module and checks every `match`, outer matches
//! before the matches nested in them, in source order.
//!
//! The scrutinee type decides the domain of cases:
//!
//! ```text
//! Option<T>                 Some | None
//! "a" | "b" | 2             "a" | "b" | 2
//! boolean                   true | false
//! unit                      ()
//! number, string, 'T, ...   infinite, needs a catch-all
//! ```
//!
//! Arms are processed in order against the set of still-uncovered cases. A
//! constructor arm only covers its constructor when all of its field patterns
//! are irrefutable; refutable field patterns leave the constructor uncovered.

use crate::ast::Module;
use crate::ast::expression::{Block, Expression};
use crate::ast::pattern::{LiteralPattern, Match, Pattern};
use crate::ast::statement::{FunctionDecl, Statement};
use crate::types::{Tag, Type, TypeError, TypeTable};

/// One shape a scrutinee can take.
#[derive(Debug, Clone, PartialEq)]
enum Case {
    Constructor(String),
    Literal(Tag),
    Unit,
}

impl Case {
    fn name(&self) -> String {
        match self {
            Case::Constructor(name) => name.clone(),
            Case::Literal(tag) => tag.pretty(),
            Case::Unit => "()".to_string(),
        }
    }
}

/// All cases of a scrutinee type, or `None` when they cannot be enumerated.
fn domain(ty: &Type, types: &TypeTable) -> Option<Vec<Case>> {
    match ty {
        Type::Adt { name, .. } => types.adt(name).map(|adt| {
            adt.constructors
                .iter()
                .map(|c| Case::Constructor(c.name.clone()))
                .collect()
        }),
        Type::Boolean => Some(vec![
            Case::Literal(Tag::Bool(true)),
            Case::Literal(Tag::Bool(false)),
        ]),
        Type::Unit => Some(vec![Case::Unit]),
        Type::Union(union) => {
            let mut cases = Vec::new();
            for tag in &union.tags {
                match tag {
                    Tag::Type(member) => {
                        for case in domain(member, types)? {
                            if !cases.contains(&case) {
                                cases.push(case);
                            }
                        }
                    }
                    literal => cases.push(Case::Literal(literal.clone())),
                }
            }
            Some(cases)
        }
        _ => None,
    }
}

/// What an arm's top-level pattern matches.
enum Coverage {
    /// Wildcards and variables.
    Everything,
    /// A single case; `covers` is false when sub-patterns can still fail.
    Case { case: Case, covers: bool },
}

fn coverage(pattern: &Pattern<Type>) -> Coverage {
    match pattern {
        Pattern::Wildcard(_) | Pattern::Ident(_) => Coverage::Everything,
        Pattern::Unit(_) => Coverage::Case {
            case: Case::Unit,
            covers: true,
        },
        Pattern::Literal(literal) => {
            let tag = match literal {
                LiteralPattern::Number(n) => Tag::Num(n.value),
                LiteralPattern::String(s) => Tag::Str(s.value.clone()),
                LiteralPattern::Boolean(b) => Tag::Bool(b.value),
            };
            Coverage::Case {
                case: Case::Literal(tag),
                covers: true,
            }
        }
        Pattern::Constructor(ctor) => Coverage::Case {
            case: Case::Constructor(ctor.name.clone()),
            covers: ctor.args.iter().all(Pattern::is_irrefutable),
        },
    }
}

/// Check a single `match`.
pub fn check_match(m: &Match<Type>, types: &TypeTable) -> Result<(), TypeError> {
    let domain = domain(m.scrutinee.info(), types);
    let finite = domain.is_some();
    let mut uncovered = domain.unwrap_or_default();
    let mut covered: Vec<Case> = Vec::new();
    let mut catch_all = false;

    for (index, arm) in m.arms.iter().enumerate() {
        let redundant = || TypeError::RedundantPattern {
            arm: index,
            span: arm.position.clone(),
        };
        if catch_all {
            return Err(redundant());
        }

        match coverage(&arm.pattern) {
            Coverage::Everything => {
                if finite && uncovered.is_empty() {
                    return Err(redundant());
                }
                catch_all = true;
                uncovered.clear();
            }
            Coverage::Case { case, covers } => {
                if covered.contains(&case) || (finite && !uncovered.contains(&case)) {
                    return Err(redundant());
                }
                if covers {
                    uncovered.retain(|c| c != &case);
                    covered.push(case);
                }
            }
        }
    }

    if catch_all {
        return Ok(());
    }
    let missing: Vec<String> = if finite {
        uncovered.iter().map(Case::name).collect()
    } else {
        vec!["_".to_string()]
    };
    if missing.is_empty() {
        Ok(())
    } else {
        log::debug!("non-exhaustive match, missing {:?}", missing);
        Err(TypeError::NonExhaustiveMatch {
            missing,
            span: m.position.clone(),
        })
    }
}

/// Check every `match` in a typed module.
pub fn check_module(module: &Module<Type>, types: &TypeTable) -> Result<(), TypeError> {
    let checker = Checker { types };
    for stmt in module.statements() {
        checker.statement(stmt)?;
    }
    Ok(())
}

struct Checker<'a> {
    types: &'a TypeTable,
}

impl Checker<'_> {
    fn statement(&self, stmt: &Statement<Type>) -> Result<(), TypeError> {
        match stmt {
            Statement::Let(binding) => self.expression(&binding.value),
            Statement::Function(decl) => self.function(decl),
            Statement::RecGroup(group) => group.functions.iter().try_for_each(|f| self.function(f)),
            Statement::Assignment(assign) => self.expression(&assign.value),
            Statement::Expression(expr) => self.expression(expr),
            Statement::TypeDecl(_) | Statement::Import(_) | Statement::ForeignImport(_) => Ok(()),
        }
    }

    fn function(&self, decl: &FunctionDecl<Type>) -> Result<(), TypeError> {
        self.block(&decl.body)
    }

    fn block(&self, block: &Block<Type>) -> Result<(), TypeError> {
        for stmt in &block.statements {
            self.statement(stmt)?;
        }
        match &block.result {
            Some(result) => self.expression(result),
            None => Ok(()),
        }
    }

    fn expression(&self, expr: &Expression<Type>) -> Result<(), TypeError> {
        match expr {
            Expression::Match(m) => {
                check_match(m, self.types)?;
                self.expression(&m.scrutinee)?;
                m.arms.iter().try_for_each(|arm| self.expression(&arm.body))
            }
            Expression::FunctionCall(call) => {
                self.expression(&call.func)?;
                call.args.iter().try_for_each(|arg| self.expression(arg))
            }
            Expression::Lambda(lambda) => self.expression(&lambda.body),
            Expression::BinaryOp(binop) => {
                self.expression(&binop.left)?;
                self.expression(&binop.right)
            }
            Expression::UnaryOp(unary) => self.expression(&unary.operand),
            Expression::IfThenElse(ite) => {
                self.expression(&ite.condition)?;
                self.expression(&ite.then_expr)?;
                match &ite.else_expr {
                    Some(else_expr) => self.expression(else_expr),
                    None => Ok(()),
                }
            }
            Expression::Block(block) => self.block(block),
            Expression::Unit(_)
            | Expression::Ident(_)
            | Expression::Number(_)
            | Expression::String(_)
            | Expression::Boolean(_)
            | Expression::Qualified(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::types::{ErrorKind, Infer};

    const OPTION: &str = "type Option<T> = Some(T) | None;";

    fn check(source: &str) -> Result<(), TypeError> {
        let module = parse_source(source).expect("parse failed");
        let checked = Infer::new()
            .check_module("Main", &module)
            .expect("type check failed");
        check_module(&checked.module, &checked.types)
    }

    #[test]
    fn test_missing_constructor() {
        let err = check(&format!(
            "{OPTION} fn get(o: Option<number>) -> number {{ match o {{ Some(x) => x }} }}"
        ))
        .unwrap_err();
        match err {
            TypeError::NonExhaustiveMatch { missing, .. } => assert_eq!(missing, vec!["None"]),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_wildcard_completes_match() {
        check(&format!(
            "{OPTION} fn get(o: Option<number>) -> number {{ match o {{ Some(x) => x, _ => 0 }} }}"
        ))
        .unwrap();
    }

    #[test]
    fn test_all_constructors_cover() {
        check(&format!(
            "{OPTION} fn get(o: Option<number>) -> number {{ match o {{ Some(x) => x, None => 0 }} }}"
        ))
        .unwrap();
    }

    #[test]
    fn test_arm_after_wildcard_is_redundant() {
        let err = check(&format!(
            "{OPTION} fn get(o: Option<number>) -> number {{ match o {{ _ => 0, Some(x) => x }} }}"
        ))
        .unwrap_err();
        assert!(matches!(err, TypeError::RedundantPattern { arm: 1, .. }));
    }

    #[test]
    fn test_duplicate_constructor_is_redundant() {
        let err = check(&format!(
            "{OPTION} fn get(o: Option<number>) -> number {{ match o {{ Some(x) => x, None => 0, Some(y) => y }} }}"
        ))
        .unwrap_err();
        assert!(matches!(err, TypeError::RedundantPattern { arm: 2, .. }));
    }

    #[test]
    fn test_refutable_field_does_not_cover() {
        let err = check(&format!(
            "{OPTION} fn get(o: Option<number>) -> number {{ match o {{ Some(1) => 1, None => 0 }} }}"
        ))
        .unwrap_err();
        match err {
            TypeError::NonExhaustiveMatch { missing, .. } => assert_eq!(missing, vec!["Some"]),
            other => panic!("unexpected error: {}", other),
        }

        check(&format!(
            "{OPTION} fn get(o: Option<number>) -> number {{ match o {{ Some(1) => 1, Some(n) => n, None => 0 }} }}"
        ))
        .unwrap();
    }

    #[test]
    fn test_literal_union_domain() {
        let source = r#"
            type Status = "loading" | "done";
            fn show(s: Status) -> number { match s { "loading" => 1 } }
        "#;
        match check(source).unwrap_err() {
            TypeError::NonExhaustiveMatch { missing, .. } => assert_eq!(missing, vec!["\"done\""]),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_boolean_domain() {
        check("fn f(b: boolean) -> number { match b { true => 1, false => 0 } }").unwrap();
        let err = check("fn f(b: boolean) -> number { match b { true => 1 } }").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonExhaustiveMatch);
    }

    #[test]
    fn test_infinite_domain_needs_catch_all() {
        match check("fn f(n: number) -> number { match n { 1 => 1, 2 => 2 } }").unwrap_err() {
            TypeError::NonExhaustiveMatch { missing, .. } => assert_eq!(missing, vec!["_"]),
            other => panic!("unexpected error: {}", other),
        }
        check("fn f(n: number) -> number { match n { 1 => 1, n => n } }").unwrap();
    }

    #[test]
    fn test_duplicate_literal_is_redundant() {
        let err = check("fn f(n: number) -> number { match n { 1 => 1, 1 => 2, _ => 0 } }").unwrap_err();
        assert!(matches!(err, TypeError::RedundantPattern { arm: 1, .. }));
    }

    #[test]
    fn test_nested_match_is_checked() {
        let err = check(&format!(
            "{OPTION} fn f(o: Option<boolean>) -> number {{ match o {{ Some(b) => match b {{ true => 1 }}, None => 0 }} }}"
        ))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonExhaustiveMatch);
    }
}
