//! Lowering - Transform the typed tree into a Lua tree
//!
//! This module turns a checked module into a [`Chunk`]:
//! - expression-oriented constructs (`if`, `match`, blocks) → Lua statements
//! - curried functions → nested single-argument closures (see [`curry`])
//! - `match` → constructor-tag tests and field binds (see [`matches`])
//! - the module itself → a `_M` table holding the exported names
//!
//! ## Sinks
//!
//! Lua separates statements from expressions, so every construct that needs
//! statements is lowered towards a [`Sink`]: the place its value goes. A value
//! in tail position is returned directly, an `if` used as an operand assigns a
//! fresh temporary, and a value in statement position is discarded.
//!
//! ## Evaluation order
//!
//! Operands are lowered left to right. When a later operand has to hoist
//! statements, every earlier operand that is not a literal or an immutable
//! name is first spilled into a temporary, so the hoisted statements cannot
//! run before it.

pub mod curry;
pub mod matches;

use std::collections::{HashMap, HashSet};

use crate::ast::expression::{BinOpKind, BinaryOp, Block, Expression, UnaryOpKind};
use crate::ast::statement::{BindingKind, Let, Statement, TypeDecl};
use crate::lua::{BinOp, Chunk, Expr, Stat, TableField, UnOp, mangle};
use crate::types::{CheckedModule, ForeignSignature, Tag, Type, TypeTable};

/// Name of the exported module table in generated code.
const MODULE_TABLE: &str = "_M";
/// Structural equality helper for constructed values.
const EQ_HELPER: &str = "_eq";

#[derive(Debug, Clone, PartialEq)]
pub struct CodegenOptions {
    /// Call known-arity functions through their direct multi-argument entry.
    pub flatten_calls: bool,
    /// Emit a comment header naming the source module.
    pub module_header: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            flatten_calls: true,
            module_header: true,
        }
    }
}

/// What lowering knows about a name in scope.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LocalKind {
    Value,
    Mutable,
    /// A function with a direct entry taking `arity` arguments at once.
    Known { arity: usize, direct: String },
    /// A Lua binding referenced by path.
    Foreign { path: String, arity: Option<usize> },
}

/// Where the value of a lowered construct goes.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Sink {
    Return,
    Assign(String),
    Discard,
}

pub struct Lowerer<'a> {
    options: &'a CodegenOptions,
    types: &'a TypeTable,
    foreign: &'a HashMap<String, ForeignSignature>,
    scopes: Vec<HashMap<String, LocalKind>>,
    /// Lua names of `var` bindings; never treated as stable operands.
    mutable: HashSet<String>,
    temps: usize,
    uses_eq: bool,
}

/// Lower a checked module to a Lua chunk.
pub fn lower_module(checked: &CheckedModule, options: &CodegenOptions) -> Chunk {
    log::debug!("lowering module {}", checked.name);
    let mut lowerer = Lowerer::new(options, &checked.types, &checked.foreign);
    for signature in checked.foreign.values().filter(|s| s.is_global()) {
        lowerer.declare(
            &signature.name,
            LocalKind::Foreign {
                path: signature.path.clone(),
                arity: signature.arity,
            },
        );
    }

    let mut body = vec![Stat::local(MODULE_TABLE, Expr::Table(vec![]))];
    let mut exports = Vec::new();
    for item in &checked.module.items {
        lowerer.lower_statement(&item.statement, &mut body);
        if item.export {
            exports.extend(lowerer.exports(&item.statement));
        }
    }
    body.extend(exports);
    body.push(Stat::Return(vec![Expr::name(MODULE_TABLE)]));

    if lowerer.uses_eq {
        body.insert(0, eq_helper());
    }

    Chunk {
        header: options
            .module_header
            .then(|| format!("Generated by exx from module {}", checked.name)),
        body,
    }
}

impl<'a> Lowerer<'a> {
    pub fn new(
        options: &'a CodegenOptions,
        types: &'a TypeTable,
        foreign: &'a HashMap<String, ForeignSignature>,
    ) -> Self {
        Lowerer {
            options,
            types,
            foreign,
            scopes: vec![HashMap::new()],
            mutable: HashSet::new(),
            temps: 0,
            uses_eq: false,
        }
    }

    // === Scopes ===

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &str, kind: LocalKind) {
        if kind == LocalKind::Mutable {
            self.mutable.insert(mangle(name));
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), kind);
        }
    }

    fn lookup(&self, name: &str) -> Option<&LocalKind> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn temp(&mut self) -> String {
        self.temps += 1;
        format!("_t{}", self.temps)
    }

    /// Whether evaluating `expr` later gives the same value as evaluating it now.
    fn is_stable(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Name(name) => !self.mutable.contains(name),
            Expr::Function { .. } => true,
            other => other.is_literal(),
        }
    }

    /// Move `expr` into a temporary unless it is stable.
    fn spill(&mut self, expr: Expr, out: &mut Vec<Stat>) -> Expr {
        if self.is_stable(&expr) {
            return expr;
        }
        let temp = self.temp();
        out.push(Stat::local(temp.clone(), expr));
        Expr::name(temp)
    }

    // === Statements ===

    fn lower_statement(&mut self, stmt: &Statement<Type>, out: &mut Vec<Stat>) {
        match stmt {
            Statement::Let(binding) => self.lower_let(binding, out),
            Statement::Function(decl) => self.lower_functions(std::slice::from_ref(decl), out),
            Statement::RecGroup(group) => self.lower_functions(&group.functions, out),
            Statement::Assignment(assign) => {
                let target = mangle(&assign.name.value);
                self.lower_to(&assign.value, Sink::Assign(target), out);
            }
            Statement::TypeDecl(decl) => self.lower_type_decl(decl, out),
            Statement::Import(import) => {
                let name = mangle(&import.module);
                out.push(Stat::local(
                    name,
                    Expr::call(Expr::name("require"), vec![Expr::string(import.module.clone())]),
                ));
            }
            Statement::ForeignImport(import) => {
                let path = import.lua_path();
                let arity = self.foreign.get(&path).and_then(|s| s.arity);
                self.declare(import.local_name(), LocalKind::Foreign { path, arity });
            }
            Statement::Expression(expr) => self.lower_to(expr, Sink::Discard, out),
        }
    }

    fn lower_let(&mut self, binding: &Let<Type>, out: &mut Vec<Stat>) {
        let name = &binding.name.value;
        match (binding.kind, binding.value.as_ref()) {
            (BindingKind::Let, Expression::Lambda(lambda)) => {
                self.lower_let_function(name, lambda, false, out)
            }
            (BindingKind::LetRec, Expression::Lambda(lambda)) => {
                self.lower_let_function(name, lambda, true, out)
            }
            (BindingKind::LetRec, value) => {
                self.declare(name, LocalKind::Value);
                out.push(Stat::declare(vec![mangle(name)]));
                self.lower_to(value, Sink::Assign(mangle(name)), out);
            }
            (BindingKind::Let, value) => {
                let value = self.lower_expr(value, out);
                self.declare(name, LocalKind::Value);
                out.push(Stat::local(mangle(name), value));
            }
            (BindingKind::Var, value) => {
                let value = self.lower_expr(value, out);
                self.declare(name, LocalKind::Mutable);
                out.push(Stat::local(mangle(name), value));
            }
        }
    }

    fn lower_type_decl(&mut self, decl: &TypeDecl, out: &mut Vec<Stat>) {
        let Some(adt) = self.types.adt(&decl.name) else {
            return;
        };
        for ctor in adt.constructors.iter().filter(|c| !c.fields.is_empty()) {
            let params: Vec<String> = (1..=ctor.fields.len()).map(|i| format!("_{}", i)).collect();
            let fields = params.iter().map(|p| Expr::name(p.clone())).collect();
            let body = vec![Stat::Return(vec![tagged(&ctor.name, fields)])];
            let (params, body) = curry::curried_parts(&params, body);
            out.push(Stat::LocalFunction {
                name: mangle(&ctor.name),
                params,
                body,
            });
        }
    }

    /// `_M.name = name` for every name an exported item declares.
    fn exports(&self, stmt: &Statement<Type>) -> Vec<Stat> {
        let export = |name: &str, value: Expr| Stat::Assign {
            target: Expr::field(Expr::name(MODULE_TABLE), mangle(name)),
            value,
        };
        match stmt {
            Statement::TypeDecl(decl) => match self.types.adt(&decl.name) {
                Some(adt) => adt
                    .constructors
                    .iter()
                    .map(|ctor| {
                        let value = if ctor.fields.is_empty() {
                            tagged(&ctor.name, vec![])
                        } else {
                            Expr::name(mangle(&ctor.name))
                        };
                        export(&ctor.name, value)
                    })
                    .collect(),
                None => vec![],
            },
            other => other
                .declared_names()
                .into_iter()
                .map(|name| export(name, self.value_of(name)))
                .collect(),
        }
    }

    // === Blocks and sinks ===

    /// Lower statements and result of a block into `out`. The caller owns the
    /// Lua scope.
    fn lower_block_into(&mut self, block: &Block<Type>, sink: Sink, out: &mut Vec<Stat>) {
        for stmt in &block.statements {
            self.lower_statement(stmt, out);
        }
        if let Some(result) = &block.result {
            self.lower_to(result, sink, out);
        }
    }

    /// Lower the body of a branch, arm or function into its own Lua block.
    fn lower_branch(&mut self, expr: &Expression<Type>, sink: Sink) -> Vec<Stat> {
        let mut out = Vec::new();
        self.push_scope();
        match expr {
            Expression::Block(block) => self.lower_block_into(block, sink, &mut out),
            other => self.lower_to(other, sink, &mut out),
        }
        self.pop_scope();
        out
    }

    /// Lower `expr` and deliver its value to `sink`.
    fn lower_to(&mut self, expr: &Expression<Type>, sink: Sink, out: &mut Vec<Stat>) {
        match expr {
            Expression::IfThenElse(ite) => {
                let condition = self.lower_expr(&ite.condition, out);
                let then_body = self.lower_branch(&ite.then_expr, sink.clone());
                let else_body = ite
                    .else_expr
                    .as_ref()
                    .map(|e| self.lower_branch(e, sink))
                    .filter(|body| !body.is_empty());

                let mut branches = vec![(condition, then_body)];
                let else_body = match else_body {
                    // else-if chains
                    Some(mut body) if body.len() == 1 && matches!(body[0], Stat::If { .. }) => {
                        match body.pop() {
                            Some(Stat::If {
                                branches: more,
                                else_body,
                            }) => {
                                branches.extend(more);
                                else_body
                            }
                            other => other.map(|stat| vec![stat]),
                        }
                    }
                    other => other,
                };
                out.push(Stat::If {
                    branches,
                    else_body,
                });
            }
            Expression::Match(m) => self.lower_match(m, sink, out),
            Expression::Block(block) if !block.statements.is_empty() => {
                let body = self.lower_branch(expr, sink.clone());
                if sink == Sink::Return {
                    out.extend(body);
                } else {
                    out.push(Stat::Do(body));
                }
            }
            _ => {
                let value = self.lower_expr(expr, out);
                self.deliver(value, sink, out);
            }
        }
    }

    fn deliver(&mut self, value: Expr, sink: Sink, out: &mut Vec<Stat>) {
        match sink {
            Sink::Return if value == Expr::Nil => {}
            Sink::Return => out.push(Stat::Return(vec![value])),
            Sink::Assign(_) if value == Expr::Nil => {}
            Sink::Assign(target) => out.push(Stat::assign(target, value)),
            Sink::Discard => match value {
                call @ Expr::Call(..) => out.push(Stat::Call(call)),
                value if value.is_literal() || matches!(value, Expr::Name(_) | Expr::Function { .. }) => {}
                value => out.push(Stat::local("_", value)),
            },
        }
    }

    // === Expressions ===

    pub(crate) fn lower_expr(&mut self, expr: &Expression<Type>, out: &mut Vec<Stat>) -> Expr {
        match expr {
            Expression::Unit(_) => Expr::Nil,
            Expression::Number(n) => Expr::Number(n.value),
            Expression::String(s) => Expr::string(s.value.clone()),
            Expression::Boolean(b) => Expr::Bool(b.value),
            Expression::Ident(ident) => self.value_of(&ident.value),
            Expression::Qualified(q) => self.qualified_value(&q.module, &q.name),
            Expression::FunctionCall(call) => self.lower_call(call, out),
            Expression::Lambda(lambda) => self.lower_lambda(lambda),
            Expression::BinaryOp(binop) => self.lower_binop(binop, out),
            Expression::UnaryOp(unary) => {
                let operand = self.lower_expr(&unary.operand, out);
                let op = match unary.op {
                    UnaryOpKind::Not => UnOp::Not,
                    UnaryOpKind::Neg => UnOp::Neg,
                };
                Expr::unary(op, operand)
            }
            Expression::Block(block) if block.statements.is_empty() => match &block.result {
                Some(result) => self.lower_expr(result, out),
                None => Expr::Nil,
            },
            Expression::IfThenElse(_) | Expression::Match(_) | Expression::Block(_) => {
                let temp = self.temp();
                out.push(Stat::declare(vec![temp.clone()]));
                self.lower_to(expr, Sink::Assign(temp.clone()), out);
                Expr::name(temp)
            }
        }
    }

    /// Lower operands left to right, spilling earlier ones when a later one
    /// hoists statements. `None` is an implicit unit.
    fn lower_operands(&mut self, exprs: &[Option<&Expression<Type>>], out: &mut Vec<Stat>) -> Vec<Expr> {
        let mut values: Vec<Expr> = Vec::with_capacity(exprs.len());
        for expr in exprs {
            let Some(expr) = expr else {
                values.push(Expr::Nil);
                continue;
            };
            let mut hoisted = Vec::new();
            let value = self.lower_expr(expr, &mut hoisted);
            if !hoisted.is_empty() {
                for earlier in values.iter_mut() {
                    let taken = std::mem::replace(earlier, Expr::Nil);
                    *earlier = self.spill(taken, out);
                }
                out.extend(hoisted);
            }
            values.push(value);
        }
        values
    }

    fn value_of(&self, name: &str) -> Expr {
        if self.types.is_constructor(name) {
            return self.constructor_value(name, None);
        }
        match self.lookup(name) {
            Some(LocalKind::Foreign { path, arity }) => curry::foreign_value(path, *arity),
            _ => Expr::name(mangle(name)),
        }
    }

    fn qualified_value(&self, module: &str, name: &str) -> Expr {
        let key = format!("{}.{}", module, name);
        if self.types.is_constructor(&key) {
            return self.constructor_value(&key, Some(module));
        }
        Expr::field(Expr::name(mangle(module)), mangle(name))
    }

    /// A constructor used as a value: nullary constructors are built in place,
    /// others refer to their constructor function.
    fn constructor_value(&self, key: &str, module: Option<&str>) -> Expr {
        let Some((_, ctor)) = self.types.constructor(key) else {
            return Expr::name(mangle(key));
        };
        if ctor.fields.is_empty() {
            return tagged(&ctor.name, vec![]);
        }
        match module {
            Some(module) => Expr::field(Expr::name(mangle(module)), mangle(&ctor.name)),
            None => Expr::name(mangle(&ctor.name)),
        }
    }

    fn lower_binop(&mut self, binop: &BinaryOp<Type>, out: &mut Vec<Stat>) -> Expr {
        if matches!(binop.op, BinOpKind::And | BinOpKind::Or) {
            return self.lower_logical(binop, out);
        }

        let mut operands = self
            .lower_operands(&[Some(binop.left.as_ref()), Some(binop.right.as_ref())], out)
            .into_iter();
        let mut left = operands.next().unwrap_or(Expr::Nil);
        let right = operands.next().unwrap_or(Expr::Nil);
        // Lua reads a local operand's register after the right operand runs.
        if matches!(left, Expr::Name(_)) && right.has_call() {
            left = self.spill(left, out);
        }

        if matches!(binop.op, BinOpKind::Eq | BinOpKind::NotEq) && needs_structural_eq(binop.left.info()) {
            self.uses_eq = true;
            let eq = Expr::call(Expr::name(EQ_HELPER), vec![left, right]);
            return match binop.op {
                BinOpKind::NotEq => Expr::unary(UnOp::Not, eq),
                _ => eq,
            };
        }

        let op = match binop.op {
            BinOpKind::Add => BinOp::Add,
            BinOpKind::Sub => BinOp::Sub,
            BinOpKind::Mul => BinOp::Mul,
            BinOpKind::Div => BinOp::Div,
            BinOpKind::Mod => BinOp::Mod,
            BinOpKind::Concat => BinOp::Concat,
            BinOpKind::Eq => BinOp::Eq,
            BinOpKind::NotEq => BinOp::NotEq,
            BinOpKind::Lt => BinOp::Lt,
            BinOpKind::Gt => BinOp::Gt,
            BinOpKind::LtEq => BinOp::LtEq,
            BinOpKind::GtEq => BinOp::GtEq,
            BinOpKind::And => BinOp::And,
            BinOpKind::Or => BinOp::Or,
        };
        Expr::binary(op, left, right)
    }

    /// `&&` and `||` short-circuit: statements hoisted out of the right operand
    /// must only run when the left operand does not decide the result.
    fn lower_logical(&mut self, binop: &BinaryOp<Type>, out: &mut Vec<Stat>) -> Expr {
        let left = self.lower_expr(&binop.left, out);
        let mut hoisted = Vec::new();
        let right = self.lower_expr(&binop.right, &mut hoisted);
        let op = if binop.op == BinOpKind::And {
            BinOp::And
        } else {
            BinOp::Or
        };
        if hoisted.is_empty() {
            return Expr::binary(op, left, right);
        }

        let temp = self.temp();
        out.push(Stat::local(temp.clone(), left));
        let condition = match op {
            BinOp::And => Expr::name(temp.clone()),
            _ => Expr::unary(UnOp::Not, Expr::name(temp.clone())),
        };
        hoisted.push(Stat::assign(temp.clone(), right));
        out.push(Stat::If {
            branches: vec![(condition, hoisted)],
            else_body: None,
        });
        Expr::name(temp)
    }
}

/// `{ tag = "Name", ... }`
pub(crate) fn tagged(name: &str, fields: Vec<Expr>) -> Expr {
    let mut entries = vec![TableField::Named("tag".to_string(), Expr::string(name))];
    entries.extend(fields.into_iter().map(TableField::Positional));
    Expr::Table(entries)
}

/// Values of these types may be tables, which Lua compares by identity.
fn needs_structural_eq(ty: &Type) -> bool {
    match ty {
        Type::Adt { .. } | Type::Generic { .. } | Type::Var(_) => true,
        Type::Union(union) => union.tags.iter().any(|tag| match tag {
            Tag::Type(member) => needs_structural_eq(member),
            _ => false,
        }),
        _ => false,
    }
}

fn eq_helper() -> Stat {
    let a = || Expr::name("a");
    let b = || Expr::name("b");
    let type_of = |e: Expr| Expr::call(Expr::name("type"), vec![e]);
    let return_false = || vec![Stat::Return(vec![Expr::Bool(false)])];
    let when = |condition: Expr, body: Vec<Stat>| Stat::If {
        branches: vec![(condition, body)],
        else_body: None,
    };

    Stat::LocalFunction {
        name: EQ_HELPER.to_string(),
        params: vec!["a".to_string(), "b".to_string()],
        body: vec![
            when(
                Expr::binary(BinOp::Eq, a(), b()),
                vec![Stat::Return(vec![Expr::Bool(true)])],
            ),
            when(
                Expr::binary(
                    BinOp::Or,
                    Expr::binary(BinOp::NotEq, type_of(a()), Expr::string("table")),
                    Expr::binary(BinOp::NotEq, type_of(b()), Expr::string("table")),
                ),
                return_false(),
            ),
            when(
                Expr::binary(
                    BinOp::Or,
                    Expr::binary(
                        BinOp::NotEq,
                        Expr::field(a(), "tag"),
                        Expr::field(b(), "tag"),
                    ),
                    Expr::binary(
                        BinOp::NotEq,
                        Expr::unary(UnOp::Len, a()),
                        Expr::unary(UnOp::Len, b()),
                    ),
                ),
                return_false(),
            ),
            Stat::NumericFor {
                var: "i".to_string(),
                start: Expr::Number(1.0),
                end: Expr::unary(UnOp::Len, a()),
                body: vec![when(
                    Expr::unary(
                        UnOp::Not,
                        Expr::call(
                            Expr::name(EQ_HELPER),
                            vec![
                                Expr::index(a(), Expr::name("i")),
                                Expr::index(b(), Expr::name("i")),
                            ],
                        ),
                    ),
                    return_false(),
                )],
            },
            Stat::Return(vec![Expr::Bool(true)]),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fmt::print_chunk;
    use crate::parser::parse_source;
    use crate::types::{Infer, SignatureTable};
    use pretty_assertions::assert_eq;

    fn lower_with(source: &str, options: &CodegenOptions) -> String {
        let module = parse_source(source).expect("parse failed");
        let checked = Infer::new()
            .with_signatures(SignatureTable::prelude())
            .check_module("Main", &module)
            .expect("type check failed");
        print_chunk(&lower_module(&checked, options))
    }

    fn lower(source: &str) -> String {
        let options = CodegenOptions {
            module_header: false,
            ..Default::default()
        };
        lower_with(source, &options)
    }

    #[test]
    fn test_module_shape() {
        assert_eq!(
            lower("export let answer = 42; let hidden = 1;"),
            "local _M = {}\nlocal answer = 42\nlocal hidden = 1\n_M.answer = answer\nreturn _M\n"
        );
    }

    #[test]
    fn test_header_comment() {
        let lua = lower_with("let x = 1;", &CodegenOptions::default());
        assert!(lua.starts_with("-- Generated by exx from module Main\n"));
    }

    #[test]
    fn test_if_expression_uses_temporary() {
        assert_eq!(
            lower("let b = true; let x = if b { 1 } else { 2 };"),
            "local _M = {}\nlocal b = true\nlocal _t1\nif b then\n  _t1 = 1\nelse\n  _t1 = 2\nend\nlocal x = _t1\nreturn _M\n"
        );
    }

    #[test]
    fn test_else_if_chain_is_flattened() {
        let lua = lower(
            "fn sign(n: number) -> number { if n < 0 { -1 } else if n == 0 { 0 } else { 1 } }",
        );
        assert!(lua.contains("elseif n == 0 then"), "{}", lua);
    }

    #[test]
    fn test_var_and_assignment() {
        assert_eq!(
            lower("var x = 10; x = 20;"),
            "local _M = {}\nlocal x = 10\nx = 20\nreturn _M\n"
        );
    }

    #[test]
    fn test_mutable_left_operand_is_read_before_the_call() {
        let lua = lower(
            "var x = 1; fn bump() -> number { x = 2; 0 } let y = x + bump(); let z = 1 + bump();",
        );
        assert!(lua.contains("local _t1 = x\nlocal y = _t1 + bump()\n"), "{}", lua);
        assert!(lua.contains("local z = 1 + bump()\n"), "{}", lua);
    }

    #[test]
    fn test_reserved_word_is_mangled() {
        let lua = lower("let end = 1; let end_ = 2; let x = end + end_;");
        assert!(lua.contains("local _end = 1"), "{}", lua);
        assert!(lua.contains("local end_ = 2"), "{}", lua);
        assert!(lua.contains("local x = _end + end_"), "{}", lua);
    }

    #[test]
    fn test_structural_equality_helper() {
        let lua = lower(
            "type Option<T> = Some(T) | None; let same = Some(1) == Some(1); let n = 1 == 2;",
        );
        assert!(lua.starts_with("local function _eq(a, b)\n"), "{}", lua);
        assert!(lua.contains("local same = _eq("), "{}", lua);
        assert!(lua.contains("local n = 1 == 2"), "{}", lua);
    }

    #[test]
    fn test_logical_with_hoisted_right_operand() {
        let lua = lower("let a = true; let b = a && (if a { true } else { false });");
        assert!(lua.contains("local _t2 = a\nif _t2 then\n  local _t1\n"), "{}", lua);
    }

    #[test]
    fn test_spill_preserves_order() {
        let lua = lower("var x = 1; let y = x + (if true { x = 2; 0 } else { 0 });");
        assert!(lua.contains("local _t2 = x\nlocal _t1\n"), "{}", lua);
        assert!(lua.contains("local y = _t2 + _t1"), "{}", lua);
    }
}
