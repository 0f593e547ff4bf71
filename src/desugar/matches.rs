//! Pattern matching - `match` to `if` chains
//!
//! Each arm becomes a condition over the scrutinee plus the locals its
//! pattern binds. Constructed values are tables tagged with their
//! constructor name and holding their fields at positions `1..n`:
//!
//! ```text
//! match o { Some(x) => x, None => 0 }
//!
//! if o.tag == "Some" then
//!   local x = o[1]
//!   ...
//! else
//!   ...
//! end
//! ```
//!
//! Matches are exhaustive once checked, so the first catch-all arm, or the
//! last arm, becomes the `else` branch.

use crate::ast::pattern::{LiteralPattern, Match, Pattern};
use crate::lua::{BinOp, Expr, Stat, mangle};
use crate::types::Type;

use super::{LocalKind, Lowerer, Sink};

/// Tests and binds of one arm.
#[derive(Debug, Default)]
struct ArmPlan {
    conditions: Vec<Expr>,
    binds: Vec<(String, Expr)>,
}

/// Collect what `pattern` requires of `subject`. When `guarded`, the
/// subject may be a non-table value, so constructor tests check its type
/// first.
fn pattern_plan(pattern: &Pattern<Type>, subject: Expr, guarded: bool, plan: &mut ArmPlan) {
    match pattern {
        Pattern::Wildcard(_) | Pattern::Unit(_) => {}
        Pattern::Ident(ident) => plan.binds.push((ident.value.clone(), subject)),
        Pattern::Literal(literal) => {
            let value = match literal {
                LiteralPattern::Number(n) => Expr::Number(n.value),
                LiteralPattern::String(s) => Expr::string(s.value.clone()),
                LiteralPattern::Boolean(b) => Expr::Bool(b.value),
            };
            plan.conditions.push(Expr::binary(BinOp::Eq, subject, value));
        }
        Pattern::Constructor(ctor) => {
            if guarded {
                plan.conditions.push(Expr::binary(
                    BinOp::Eq,
                    Expr::call(Expr::name("type"), vec![subject.clone()]),
                    Expr::string("table"),
                ));
            }
            plan.conditions.push(Expr::binary(
                BinOp::Eq,
                Expr::field(subject.clone(), "tag"),
                Expr::string(ctor.name.clone()),
            ));
            for (i, arg) in ctor.args.iter().enumerate() {
                let field = Expr::index(subject.clone(), Expr::Number((i + 1) as f64));
                pattern_plan(arg, field, may_be_scalar(arg.info()), plan);
            }
        }
    }
}

fn may_be_scalar(ty: &Type) -> bool {
    matches!(ty, Type::Union(_))
}

fn conjoin(conditions: Vec<Expr>) -> Option<Expr> {
    conditions
        .into_iter()
        .reduce(|acc, condition| Expr::binary(BinOp::And, acc, condition))
}

impl Lowerer<'_> {
    pub(super) fn lower_match(&mut self, m: &Match<Type>, sink: Sink, out: &mut Vec<Stat>) {
        let subject = match self.lower_expr(&m.scrutinee, out) {
            name @ Expr::Name(_) => name,
            other => {
                let temp = self.temp();
                out.push(Stat::local(temp.clone(), other));
                Expr::name(temp)
            }
        };
        let guarded = may_be_scalar(m.scrutinee.info());

        let mut branches = Vec::new();
        let mut else_body = None;
        let last = m.arms.len().saturating_sub(1);
        for (index, arm) in m.arms.iter().enumerate() {
            let mut plan = ArmPlan::default();
            pattern_plan(&arm.pattern, subject.clone(), guarded, &mut plan);

            self.push_scope();
            let mut body: Vec<Stat> = plan
                .binds
                .iter()
                .map(|(name, value)| Stat::local(mangle(name), value.clone()))
                .collect();
            for (name, _) in &plan.binds {
                self.declare(name, LocalKind::Value);
            }
            body.extend(self.lower_branch(&arm.body, sink.clone()));
            self.pop_scope();

            let condition = conjoin(plan.conditions);
            match condition {
                Some(condition) if index < last => branches.push((condition, body)),
                _ if branches.is_empty() => {
                    // the first arm matches everything left
                    if sink == Sink::Return {
                        out.extend(body);
                    } else {
                        out.push(Stat::Do(body));
                    }
                    return;
                }
                _ => {
                    else_body = Some(body);
                    break;
                }
            }
        }

        out.push(Stat::If {
            branches,
            else_body: else_body.filter(|body| !body.is_empty()),
        });
    }
}
