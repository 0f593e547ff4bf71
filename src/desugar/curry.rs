//! Currying - Functions and call sites
//!
//! Every function value is curried: a function of `n` parameters is `n`
//! nested single-argument closures. When call flattening is on, a named
//! function with two or more parameters also gets a direct entry
//! `_direct_name` taking all arguments at once, and call sites that supply
//! enough arguments call it without building intermediate closures.
//!
//! ```text
//! fn add(a, b) { a + b }      local _direct_add, add
//!                             function _direct_add(a, b) return a + b end
//!                             function add(a) return function(b) return _direct_add(a, b) end end
//!
//! add(1, 2)   add(1)(2)       _direct_add(1, 2)
//! add(1)                      add(1)
//! ```

use crate::ast::expression::{Expression, FunctionCall, Lambda};
use crate::ast::statement::FunctionDecl;
use crate::lua::{Expr, Stat, mangle};
use crate::types::Type;

use super::{LocalKind, Lowerer, Sink, tagged};

/// A call argument; `None` is the implicit unit of an empty argument group.
type Arg<'e> = Option<&'e Expression<Type>>;

enum Body<'e> {
    Block(&'e crate::ast::expression::Block<Type>),
    Expr(&'e Expression<Type>),
}

struct FunctionPlan<'e> {
    name: String,
    source_name: &'e str,
    params: Vec<String>,
    source_params: Vec<&'e str>,
    body: Body<'e>,
    direct: Option<String>,
}

/// What is known about the head of a call spine.
enum Callee {
    Known { arity: usize, direct: String },
    Constructor { name: String, fields: usize },
    Foreign { path: String, arity: usize },
    Other,
}

/// Split `params` off into nested closures: `(a, b, c) -> body` becomes
/// `a -> return function(b) return function(c) body end end`.
pub(crate) fn curried_parts(params: &[String], body: Vec<Stat>) -> (Vec<String>, Vec<Stat>) {
    match params {
        [] | [_] => (params.to_vec(), body),
        [first, rest @ ..] => {
            let (inner_params, inner_body) = curried_parts(rest, body);
            (
                vec![first.clone()],
                vec![Stat::Return(vec![Expr::function(inner_params, inner_body)])],
            )
        }
    }
}

/// A foreign binding used as a value. Multi-argument Lua functions are
/// wrapped in a curried adapter.
pub(crate) fn foreign_value(path: &str, arity: Option<usize>) -> Expr {
    match arity {
        Some(n) if n >= 2 => {
            let params: Vec<String> = (1..=n).map(|i| format!("_{}", i)).collect();
            let args = params.iter().map(|p| Expr::name(p.clone())).collect();
            let body = vec![Stat::Return(vec![Expr::call(Expr::path(path), args)])];
            let (params, body) = curried_parts(&params, body);
            Expr::function(params, body)
        }
        _ => Expr::path(path),
    }
}

fn is_unit_arg(arg: &Arg) -> bool {
    matches!(arg, None | Some(Expression::Unit(_)))
}

/// Drop trailing unit arguments from a native call.
fn trim_units(mut values: Vec<Expr>, args: &[Arg]) -> Vec<Expr> {
    let mut len = args.len();
    while len > 0 && is_unit_arg(&args[len - 1]) {
        len -= 1;
    }
    values.truncate(len);
    values
}

/// Head of a call chain and all of its arguments in application order.
fn spine(call: &FunctionCall<Type>) -> (&Expression<Type>, Vec<Arg<'_>>) {
    let mut groups = vec![&call.args];
    let mut current = call;
    let head = loop {
        match current.func.as_ref() {
            Expression::FunctionCall(inner) => {
                groups.push(&inner.args);
                current = inner;
            }
            head => break head,
        }
    };

    let args = groups
        .into_iter()
        .rev()
        .flat_map(|group| {
            if group.is_empty() {
                vec![None]
            } else {
                group.iter().map(Some).collect()
            }
        })
        .collect();
    (head, args)
}

impl Lowerer<'_> {
    fn plan<'e>(&self, name: &'e str, params: Vec<&'e str>, body: Body<'e>) -> FunctionPlan<'e> {
        let lua_name = mangle(name);
        let direct = (self.options.flatten_calls && params.len() >= 2)
            .then(|| format!("_direct_{}", lua_name));
        FunctionPlan {
            name: lua_name,
            source_name: name,
            params: params.iter().map(|p| mangle(p)).collect(),
            source_params: params,
            body,
            direct,
        }
    }

    fn register(&mut self, plan: &FunctionPlan) {
        let kind = match &plan.direct {
            Some(direct) => LocalKind::Known {
                arity: plan.params.len(),
                direct: direct.clone(),
            },
            None => LocalKind::Value,
        };
        self.declare(plan.source_name, kind);
    }

    fn lower_body(&mut self, plan: &FunctionPlan) -> Vec<Stat> {
        self.push_scope();
        for param in &plan.source_params {
            self.declare(param, LocalKind::Value);
        }
        let mut body = Vec::new();
        match plan.body {
            Body::Block(block) => self.lower_block_into(block, Sink::Return, &mut body),
            Body::Expr(expr) => self.lower_to(expr, Sink::Return, &mut body),
        }
        self.pop_scope();
        body
    }

    /// The curried entry of a function with a direct entry.
    fn wrapper(plan: &FunctionPlan, direct: &str) -> (Vec<String>, Vec<Stat>) {
        let args = plan.params.iter().map(|p| Expr::name(p.clone())).collect();
        let body = vec![Stat::Return(vec![Expr::call(Expr::name(direct), args)])];
        curried_parts(&plan.params, body)
    }

    /// Emit a group of functions that may refer to themselves and each other.
    fn emit_recursive(&mut self, plans: Vec<FunctionPlan>, out: &mut Vec<Stat>) {
        for plan in &plans {
            self.register(plan);
        }

        if let [plan] = plans.as_slice() {
            if plan.direct.is_none() {
                let body = self.lower_body(plan);
                let (params, body) = curried_parts(&plan.params, body);
                out.push(Stat::LocalFunction {
                    name: plan.name.clone(),
                    params,
                    body,
                });
                return;
            }
        }

        let names = plans
            .iter()
            .flat_map(|plan| plan.direct.iter().cloned().chain([plan.name.clone()]))
            .collect();
        out.push(Stat::declare(names));

        for plan in &plans {
            let body = self.lower_body(plan);
            match &plan.direct {
                Some(direct) => {
                    out.push(Stat::Function {
                        name: direct.clone(),
                        params: plan.params.clone(),
                        body,
                    });
                    let (params, body) = Self::wrapper(plan, direct);
                    out.push(Stat::Function {
                        name: plan.name.clone(),
                        params,
                        body,
                    });
                }
                None => {
                    let (params, body) = curried_parts(&plan.params, body);
                    out.push(Stat::Function {
                        name: plan.name.clone(),
                        params,
                        body,
                    });
                }
            }
        }
    }

    /// `fn` declarations and `rec { ... }` groups.
    pub(super) fn lower_functions(&mut self, decls: &[FunctionDecl<Type>], out: &mut Vec<Stat>) {
        let plans = decls
            .iter()
            .map(|decl| {
                let params = decl.params.iter().map(|p| p.name.value.as_str()).collect();
                self.plan(&decl.name.value, params, Body::Block(&decl.body))
            })
            .collect();
        self.emit_recursive(plans, out);
    }

    /// `let f = (a, b) -> ...` gets the same treatment as a declared function.
    /// Without `rec` the body cannot see the new binding.
    pub(super) fn lower_let_function(
        &mut self,
        name: &str,
        lambda: &Lambda<Type>,
        recursive: bool,
        out: &mut Vec<Stat>,
    ) {
        let params = lambda.params.iter().map(|p| p.name.value.as_str()).collect();
        let plan = self.plan(name, params, Body::Expr(&lambda.body));
        if recursive {
            self.emit_recursive(vec![plan], out);
            return;
        }

        // `local name = function` keeps a shadowed outer `name` visible in the body.
        let body = self.lower_body(&plan);
        match &plan.direct {
            Some(direct) => {
                out.push(Stat::local(
                    direct.clone(),
                    Expr::function(plan.params.clone(), body),
                ));
                let (params, body) = Self::wrapper(&plan, direct);
                out.push(Stat::local(plan.name.clone(), Expr::function(params, body)));
            }
            None => {
                let (params, body) = curried_parts(&plan.params, body);
                out.push(Stat::local(plan.name.clone(), Expr::function(params, body)));
            }
        }
        self.register(&plan);
    }

    pub(super) fn lower_lambda(&mut self, lambda: &Lambda<Type>) -> Expr {
        let params: Vec<String> = lambda.params.iter().map(|p| mangle(&p.name.value)).collect();
        self.push_scope();
        for param in &lambda.params {
            self.declare(&param.name.value, LocalKind::Value);
        }
        let body = self.lower_branch(&lambda.body, Sink::Return);
        self.pop_scope();
        let (params, body) = curried_parts(&params, body);
        Expr::function(params, body)
    }

    fn callee(&self, head: &Expression<Type>) -> Callee {
        let constructor = |key: &str| {
            self.types.constructor(key).map(|(_, ctor)| Callee::Constructor {
                name: ctor.name.clone(),
                fields: ctor.fields.len(),
            })
        };
        match head {
            Expression::Ident(ident) => {
                if let Some(ctor) = constructor(&ident.value) {
                    return ctor;
                }
                match self.lookup(&ident.value) {
                    Some(LocalKind::Known { arity, direct }) => Callee::Known {
                        arity: *arity,
                        direct: direct.clone(),
                    },
                    Some(LocalKind::Foreign {
                        path,
                        arity: Some(arity),
                    }) => Callee::Foreign {
                        path: path.clone(),
                        arity: *arity,
                    },
                    _ => Callee::Other,
                }
            }
            Expression::Qualified(q) => {
                constructor(&format!("{}.{}", q.module, q.name)).unwrap_or(Callee::Other)
            }
            _ => Callee::Other,
        }
    }

    pub(super) fn lower_call(&mut self, call: &FunctionCall<Type>, out: &mut Vec<Stat>) -> Expr {
        let (head, args) = spine(call);
        match self.callee(head) {
            Callee::Known { arity, direct } if args.len() >= arity => {
                log::trace!("flattened call to {} with {} argument(s)", direct, arity);
                let values = self.lower_operands(&args[..arity], out);
                let call = Expr::call(Expr::name(direct), trim_units(values, &args[..arity]));
                self.apply(call, &args[arity..], out)
            }
            Callee::Constructor { name, fields } if fields > 0 && args.len() >= fields => {
                let values = self.lower_operands(&args[..fields], out);
                self.apply(tagged(&name, values), &args[fields..], out)
            }
            Callee::Foreign { path, arity } if args.len() >= arity.max(1) => {
                let taken = arity.max(1);
                log::trace!("native call to {} with {} argument(s)", path, arity);
                let values = self.lower_operands(&args[..taken], out);
                let call = Expr::call(Expr::path(&path), trim_units(values, &args[..taken]));
                self.apply(call, &args[taken..], out)
            }
            callee => {
                if let Callee::Known { direct, .. } = callee {
                    log::trace!("chained call, {} is partially applied", direct);
                }
                let head = self.lower_expr(head, out);
                self.apply(head, &args, out)
            }
        }
    }

    /// Apply the remaining arguments one at a time.
    fn apply(&mut self, head: Expr, args: &[Arg], out: &mut Vec<Stat>) -> Expr {
        let mut acc = head;
        for arg in args {
            match arg {
                Some(expr) if !is_unit_arg(arg) => {
                    let mut hoisted = Vec::new();
                    let value = self.lower_expr(expr, &mut hoisted);
                    if !hoisted.is_empty() {
                        acc = self.spill(acc, out);
                        out.extend(hoisted);
                    }
                    acc = Expr::call(acc, vec![value]);
                }
                _ => acc = Expr::call(acc, vec![]),
            }
        }
        acc
    }
}
