//! # Type Inference
//!
//! Hindley-Milner inference over the surface tree. Every node of the input
//! `Module<()>` is rebuilt as a node of `Module<Type>` carrying its type.
//!
//! The engine keeps one substitution for the whole module and extends it
//! in place as constraints are solved. Once a module is done the substitution
//! is applied to every node, so downstream passes only ever see solved types.
//!
//! ## Rules
//!
//! ```text
//! literal            number | string | boolean | unit
//! x                  instantiate(env(x))
//! (x, y) -> e        'a -> 'b -> typeof(e)    (no params: unit -> typeof(e))
//! f(a, b)            f(a)(b), one application step per argument
//! let x = e          generalize(typeof(e))
//! let rec x = e      x : 'a while checking e, generalized afterwards
//! var x = e          monomorphic and mutable
//! ```
//!
//! ## Expected types
//!
//! Where the context already knows the type of an expression (annotations,
//! parameter types at a call, the other side of `==`, branch results) the
//! expression is *checked* against it instead of inferred. This is what lets a
//! string literal inhabit `"loading" | "done"`: a literal is accepted by a union
//! when one of its tags is that literal or one of its type members accepts the
//! literal's primitive type.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use lachs::Span;

use crate::ast::expression::{
    BinOpKind, BinaryOp, Block, Boolean, Expression, FunctionCall, Ident, IfThenElse, Lambda,
    Number, Param, Qualified, StringLiteral, UnaryOp, UnaryOpKind, Unit,
};
use crate::ast::pattern::{
    ConstructorPattern, LiteralPattern, Match, MatchArm, Pattern, Wildcard,
};
use crate::ast::statement::{
    Assignment, BindingKind, ForeignImport, FunctionDecl, Import, Let, RecGroup, Statement,
};
use crate::ast::types::TypeExpr;
use crate::ast::{Item, Module};

use super::env::TypeEnv;
use super::error::TypeError;
use super::foreign::{ForeignSignature, SignatureTable};
use super::interface::ModuleInterface;
use super::subst::Substitution;
use super::table::{TypeTable, qualify};
use super::ty::{Tag, Type, TypeScheme, TypeVar, UnionType};
use super::unify::unify_in_place;

/// A module after inference: typed tree plus everything later passes need.
#[derive(Debug, Clone)]
pub struct CheckedModule {
    pub name: String,
    pub module: Module<Type>,
    /// Declared and imported types.
    pub types: TypeTable,
    pub interface: ModuleInterface,
    /// Foreign bindings visible in the module, keyed by Lua path.
    pub foreign: HashMap<String, ForeignSignature>,
}

/// A function declaration whose body has been inferred but whose generic
/// parameters have not been checked yet.
struct InferredFn {
    decl: FunctionDecl<Type>,
    ty: Type,
    rigid: Vec<(String, TypeVar, Span)>,
}

pub struct Infer {
    next_var: usize,
    subst: Substitution,
    types: TypeTable,
    /// Generic parameters of the enclosing declarations.
    type_scope: HashMap<String, Type>,
    signatures: SignatureTable,
    interfaces: HashMap<String, Arc<ModuleInterface>>,
    imported: HashMap<String, Arc<ModuleInterface>>,
    foreign: HashMap<String, ForeignSignature>,
}

impl Default for Infer {
    fn default() -> Self {
        Self::new()
    }
}

/// Infer the type of a single expression.
///
/// Returns the solved type together with the substitution that solved it.
pub fn infer(env: &TypeEnv, expr: &Expression<()>) -> Result<(Type, Substitution), TypeError> {
    let mut infer = Infer::new();
    // Fresh variables must not collide with variables already free in `env`.
    infer.next_var = env
        .free_type_vars()
        .iter()
        .map(|v| v.id + 1)
        .max()
        .unwrap_or(0);
    let typed = infer.infer_expr(env, expr)?;
    let ty = infer.subst.apply(typed.info());
    Ok((ty, infer.subst))
}

impl Infer {
    pub fn new() -> Self {
        Infer {
            next_var: 0,
            subst: Substitution::empty(),
            types: TypeTable::new(),
            type_scope: HashMap::new(),
            signatures: SignatureTable::new(),
            interfaces: HashMap::new(),
            imported: HashMap::new(),
            foreign: HashMap::new(),
        }
    }

    pub fn with_signatures(mut self, signatures: SignatureTable) -> Self {
        self.signatures = signatures;
        self
    }

    /// Interfaces of the modules this one may import.
    pub fn with_interfaces(mut self, interfaces: HashMap<String, Arc<ModuleInterface>>) -> Self {
        self.interfaces = interfaces;
        self
    }

    fn fresh_var(&mut self) -> TypeVar {
        let id = self.next_var;
        self.next_var += 1;
        TypeVar::new(id)
    }

    fn fresh(&mut self) -> Type {
        Type::Var(self.fresh_var())
    }

    fn instantiate(&mut self, scheme: &TypeScheme) -> Type {
        if scheme.vars.is_empty() {
            return scheme.ty.clone();
        }
        let mapping: HashMap<_, _> = scheme
            .vars
            .iter()
            .map(|v| (v.clone(), self.fresh()))
            .collect();
        scheme.ty.replace_vars(&mapping)
    }

    fn generalize(&self, env: &TypeEnv, ty: &Type) -> TypeScheme {
        let ty = self.subst.apply(ty);
        let free_in_env = env.apply_subst(&self.subst).free_type_vars();
        let vars = ty
            .type_vars()
            .into_iter()
            .filter(|v| !free_in_env.contains(v))
            .collect();
        TypeScheme::polymorphic(vars, ty)
    }

    fn unify(&mut self, expected: &Type, found: &Type, span: &Span) -> Result<(), TypeError> {
        unify_in_place(expected, found, &mut self.subst)
            .map_err(|e| TypeError::from_unify_error(e, span.clone()))
    }

    fn resolve_annotation(&self, annotation: &TypeExpr) -> Result<Type, TypeError> {
        self.types.resolve(annotation, &self.type_scope)
    }

    // === Modules ===

    fn initial_env(&mut self) -> TypeEnv {
        let mut env = TypeEnv::empty();
        for global in self.signatures.globals() {
            env = env.extend(global.name.clone(), global.scheme.clone());
            self.foreign.insert(global.path.clone(), global.clone());
        }
        env
    }

    /// Check a whole module and freeze its interface.
    pub fn check_module(mut self, name: &str, module: &Module<()>) -> Result<CheckedModule, TypeError> {
        log::debug!("checking module {}", name);

        let mut env = self.initial_env();
        let mut items = Vec::with_capacity(module.items.len());
        let mut exported_values = Vec::new();
        let mut exported_types = HashSet::new();

        for item in &module.items {
            let (statement, next) = self.infer_statement(&env, &item.statement)?;
            if item.export {
                match &item.statement {
                    Statement::TypeDecl(decl) => {
                        exported_types.insert(decl.name.clone());
                    }
                    other => exported_values.extend(other.declared_names().into_iter().map(String::from)),
                }
            }
            env = next;
            items.push(Item {
                export: item.export,
                statement,
                position: item.position.clone(),
            });
        }

        let mut typed = Module { items };
        self.finalize_module(&mut typed);

        let interface = self.freeze(name, &env, &exported_values, &exported_types);
        log::debug!(
            "module {} checked, exports {:?}",
            name,
            interface.exported_names()
        );

        Ok(CheckedModule {
            name: name.to_string(),
            module: typed,
            types: self.types,
            interface,
            foreign: self.foreign,
        })
    }

    fn freeze(
        &self,
        name: &str,
        env: &TypeEnv,
        values: &[String],
        types: &HashSet<String>,
    ) -> ModuleInterface {
        let local = self.types.local_type_names();
        let values = values
            .iter()
            .filter_map(|value| {
                let scheme = env.lookup(value)?;
                let ty = qualify(&self.subst.apply(&scheme.ty), name, &local);
                Some((value.clone(), TypeScheme::closed(ty)))
            })
            .collect();

        ModuleInterface {
            name: name.to_string(),
            values,
            types: self.types.export(name, types),
        }
    }

    // === Statements ===

    fn infer_statement(
        &mut self,
        env: &TypeEnv,
        stmt: &Statement<()>,
    ) -> Result<(Statement<Type>, TypeEnv), TypeError> {
        match stmt {
            Statement::Let(binding) => self.infer_let(env, binding),
            Statement::Function(decl) => self.infer_fn_decl(env, decl),
            Statement::RecGroup(group) => self.infer_rec_group(env, group),
            Statement::Assignment(assign) => {
                let assign = self.infer_assignment(env, assign)?;
                Ok((Statement::Assignment(assign), env.clone()))
            }
            Statement::TypeDecl(decl) => {
                self.types.declare(decl)?;
                Ok((Statement::TypeDecl(decl.clone()), env.clone()))
            }
            Statement::Import(import) => {
                self.infer_import(import)?;
                Ok((Statement::Import(import.clone()), env.clone()))
            }
            Statement::ForeignImport(import) => {
                let env = self.infer_foreign(env, import)?;
                Ok((Statement::ForeignImport(import.clone()), env))
            }
            Statement::Expression(expr) => {
                let expr = self.infer_expr(env, expr)?;
                Ok((Statement::Expression(expr), env.clone()))
            }
        }
    }

    fn infer_let(&mut self, env: &TypeEnv, binding: &Let<()>) -> Result<(Statement<Type>, TypeEnv), TypeError> {
        let annotation = binding
            .annotation
            .as_ref()
            .map(|a| self.resolve_annotation(a))
            .transpose()?;
        let name = &binding.name.value;

        let (value, new_env) = match binding.kind {
            BindingKind::Let => {
                let value = match &annotation {
                    Some(ty) => self.check_expr(env, &binding.value, ty)?,
                    None => self.infer_expr(env, &binding.value)?,
                };
                let scheme = self.generalize(env, value.info());
                log::trace!("let {} : {}", name, scheme);
                (value, env.extend(name.clone(), scheme))
            }
            BindingKind::LetRec => {
                let self_ty = match annotation {
                    Some(ty) => ty,
                    None => self.fresh(),
                };
                let inner = env.extend(name.clone(), TypeScheme::monomorphic(self_ty.clone()));
                let value = self.check_expr(&inner, &binding.value, &self_ty)?;
                let scheme = self.generalize(env, &self_ty);
                log::trace!("let rec {} : {}", name, scheme);
                (value, env.extend(name.clone(), scheme))
            }
            BindingKind::Var => {
                let value = match &annotation {
                    Some(ty) => self.check_expr(env, &binding.value, ty)?,
                    None => self.infer_expr(env, &binding.value)?,
                };
                let ty = value.info().clone();
                (value, env.extend_mutable(name.clone(), TypeScheme::monomorphic(ty)))
            }
        };

        let ty = value.info().clone();
        Ok((
            Statement::Let(Let {
                kind: binding.kind,
                name: Ident {
                    value: name.clone(),
                    position: binding.name.position.clone(),
                    info: ty,
                },
                annotation: binding.annotation.clone(),
                value: Box::new(value),
                position: binding.position.clone(),
            }),
            new_env,
        ))
    }

    /// `fn` declarations see themselves but not later declarations.
    fn infer_fn_decl(
        &mut self,
        env: &TypeEnv,
        decl: &FunctionDecl<()>,
    ) -> Result<(Statement<Type>, TypeEnv), TypeError> {
        let self_ty = self.fresh();
        let inner = env.extend(decl.name.value.clone(), TypeScheme::monomorphic(self_ty.clone()));
        let inferred = self.infer_function(&inner, decl)?;
        self.unify(&self_ty, &inferred.ty, &decl.position)?;
        self.check_rigid(&inferred.rigid)?;

        let scheme = self.generalize(env, &inferred.ty);
        log::debug!("fn {} : {}", decl.name.value, scheme);
        Ok((
            Statement::Function(inferred.decl),
            env.extend(decl.name.value.clone(), scheme),
        ))
    }

    /// Functions in a `rec { }` group are monomorphic to each other while their
    /// bodies are checked and generalized together afterwards.
    fn infer_rec_group(
        &mut self,
        env: &TypeEnv,
        group: &RecGroup<()>,
    ) -> Result<(Statement<Type>, TypeEnv), TypeError> {
        let self_tys: Vec<Type> = group.functions.iter().map(|_| self.fresh()).collect();
        let mut inner = env.clone();
        for (func, ty) in group.functions.iter().zip(&self_tys) {
            inner = inner.extend(func.name.value.clone(), TypeScheme::monomorphic(ty.clone()));
        }

        let mut inferred = Vec::with_capacity(group.functions.len());
        for (func, ty) in group.functions.iter().zip(&self_tys) {
            let result = self.infer_function(&inner, func)?;
            self.unify(ty, &result.ty, &func.position)?;
            inferred.push(result);
        }
        for result in &inferred {
            self.check_rigid(&result.rigid)?;
        }

        let mut out = env.clone();
        for (func, ty) in group.functions.iter().zip(&self_tys) {
            let scheme = self.generalize(env, ty);
            log::debug!("rec fn {} : {}", func.name.value, scheme);
            out = out.extend(func.name.value.clone(), scheme);
        }

        Ok((
            Statement::RecGroup(RecGroup {
                functions: inferred.into_iter().map(|r| r.decl).collect(),
                position: group.position.clone(),
            }),
            out,
        ))
    }

    fn infer_function(&mut self, env: &TypeEnv, decl: &FunctionDecl<()>) -> Result<InferredFn, TypeError> {
        let saved_scope = self.type_scope.clone();
        let rigid: Vec<(String, TypeVar, Span)> = decl
            .type_params
            .iter()
            .map(|p| {
                let id = self.fresh_var().id;
                (p.name.clone(), TypeVar::with_name(id, p.name.clone()), p.position.clone())
            })
            .collect();
        for (name, var, _) in &rigid {
            self.type_scope.insert(name.clone(), Type::Var(var.clone()));
        }

        let result = self.infer_function_body(env, decl);
        self.type_scope = saved_scope;

        let (decl, ty) = result?;
        Ok(InferredFn { decl, ty, rigid })
    }

    fn infer_function_body(
        &mut self,
        env: &TypeEnv,
        decl: &FunctionDecl<()>,
    ) -> Result<(FunctionDecl<Type>, Type), TypeError> {
        let params = self.typed_params(&decl.params)?;
        let ret = match &decl.return_type {
            Some(annotation) => self.resolve_annotation(annotation)?,
            None => self.fresh(),
        };

        let mut body_env = TypeEnv::with_parent(env.clone());
        for param in &params {
            body_env = body_env.extend(
                param.name.value.clone(),
                TypeScheme::monomorphic(param.name.info.clone()),
            );
        }
        let body = self.infer_block(&body_env, &decl.body, Some(&ret))?;

        let ty = Type::curried(param_types(&params), ret);
        let decl = FunctionDecl {
            name: Ident {
                value: decl.name.value.clone(),
                position: decl.name.position.clone(),
                info: ty.clone(),
            },
            type_params: decl.type_params.clone(),
            params,
            return_type: decl.return_type.clone(),
            body,
            position: decl.position.clone(),
        };
        Ok((decl, ty))
    }

    /// Explicit generic parameters must stay generic: a parameter solved to a
    /// concrete type, or to the same variable as another parameter, is an error.
    fn check_rigid(&self, rigid: &[(String, TypeVar, Span)]) -> Result<(), TypeError> {
        let mut seen: HashMap<TypeVar, (&String, &TypeVar)> = HashMap::new();
        for (name, var, span) in rigid {
            match self.subst.apply(&Type::Var(var.clone())) {
                Type::Var(solved) => {
                    if let Some((other, other_var)) = seen.insert(solved, (name, var)) {
                        return Err(TypeError::mismatch(
                            Type::Var(other_var.clone()),
                            Type::Var(var.clone()),
                            span.clone(),
                        )
                        .with_context(format!(
                            "generic parameters '{}' and '{}' must stay distinct",
                            other, name
                        )));
                    }
                }
                concrete => {
                    return Err(TypeError::mismatch(Type::Var(var.clone()), concrete, span.clone())
                        .with_context(format!("generic parameter '{}' is fixed to a concrete type", name)));
                }
            }
        }
        Ok(())
    }

    fn typed_params(&mut self, params: &[Param<()>]) -> Result<Vec<Param<Type>>, TypeError> {
        params
            .iter()
            .map(|param| {
                let ty = match &param.annotation {
                    Some(annotation) => self.resolve_annotation(annotation)?,
                    None => self.fresh(),
                };
                Ok(Param {
                    name: Ident {
                        value: param.name.value.clone(),
                        position: param.name.position.clone(),
                        info: ty,
                    },
                    annotation: param.annotation.clone(),
                })
            })
            .collect()
    }

    fn infer_assignment(&mut self, env: &TypeEnv, assign: &Assignment<()>) -> Result<Assignment<Type>, TypeError> {
        let name = &assign.name.value;
        let binding = env
            .lookup_binding(name)
            .cloned()
            .ok_or_else(|| TypeError::unbound("identifier", name.clone(), assign.name.position.clone()))?;
        if !binding.mutable {
            return Err(TypeError::ImmutableAssignment {
                name: name.clone(),
                span: assign.position.clone(),
            });
        }

        let ty = self.instantiate(&binding.scheme);
        let value = self
            .check_expr(env, &assign.value, &ty)
            .map_err(|e| e.with_context(format!("assignment to '{}'", name)))?;

        Ok(Assignment {
            name: Ident {
                value: name.clone(),
                position: assign.name.position.clone(),
                info: ty,
            },
            value: Box::new(value),
            position: assign.position.clone(),
        })
    }

    fn infer_import(&mut self, import: &Import) -> Result<(), TypeError> {
        let interface = self
            .interfaces
            .get(&import.module)
            .cloned()
            .ok_or_else(|| TypeError::unbound("module", import.module.clone(), import.position.clone()))?;
        self.types.import(&interface.types);
        self.imported.insert(import.module.clone(), interface);
        Ok(())
    }

    fn infer_foreign(&mut self, env: &TypeEnv, import: &ForeignImport) -> Result<TypeEnv, TypeError> {
        let signature = match &import.signature {
            Some(signature) => ForeignSignature::resolve(import, signature, &self.types)?,
            None => {
                let known = self.signatures.lookup(&import.lua_path()).cloned().ok_or_else(|| {
                    TypeError::UndeclaredForeignSignature {
                        name: import.lua_path(),
                        span: import.position.clone(),
                    }
                })?;
                ForeignSignature {
                    name: import.local_name().to_string(),
                    ..known
                }
            }
        };

        log::trace!("foreign {} as {} : {}", signature.path, signature.name, signature.scheme);
        let env = env.extend(signature.name.clone(), signature.scheme.clone());
        self.foreign.insert(signature.path.clone(), signature);
        Ok(env)
    }

    // === Expressions ===

    /// Check `expr` against a type the context already knows.
    fn check_expr(&mut self, env: &TypeEnv, expr: &Expression<()>, expected: &Type) -> Result<Expression<Type>, TypeError> {
        let resolved = self.subst.apply(expected);
        match expr {
            Expression::Number(_) | Expression::String(_) | Expression::Boolean(_)
                if matches!(resolved, Type::Union(_)) =>
            {
                if let (Some(tag), Type::Union(union)) = (literal_tag(expr), &resolved) {
                    self.check_literal_member(tag, union, expr.position())?;
                }
                Ok(literal_node(expr, resolved))
            }
            Expression::IfThenElse(ite) => self.infer_if(env, ite, Some(expected)),
            Expression::Match(m) => self.infer_match(env, m, Some(expected)),
            Expression::Block(block) => Ok(Expression::Block(self.infer_block(env, block, Some(expected))?)),
            Expression::Lambda(lambda) => self.infer_lambda(env, lambda, Some(expected)),
            _ => {
                let typed = self.infer_expr(env, expr)?;
                self.unify(expected, typed.info(), expr.position())?;
                Ok(typed)
            }
        }
    }

    /// A literal belongs to a union when the union lists it, or when one of
    /// the union's type members accepts the literal's primitive type.
    fn check_literal_member(&mut self, tag: Tag, union: &UnionType, span: &Span) -> Result<(), TypeError> {
        if union.contains(&tag) {
            return Ok(());
        }
        if let Some(primitive) = tag.literal_type() {
            for member in &union.tags {
                if let Tag::Type(member) = member {
                    let mut trial = self.subst.clone();
                    if unify_in_place(member, &primitive, &mut trial).is_ok() {
                        self.subst = trial;
                        return Ok(());
                    }
                }
            }
        }
        Err(TypeError::mismatch(
            Type::Union(union.clone()),
            Type::Union(UnionType::literal(tag)),
            span.clone(),
        ))
    }

    pub fn infer_expr(&mut self, env: &TypeEnv, expr: &Expression<()>) -> Result<Expression<Type>, TypeError> {
        match expr {
            Expression::Unit(unit) => Ok(Expression::Unit(Unit {
                position: unit.position.clone(),
                info: Type::Unit,
            })),
            Expression::Number(_) => Ok(literal_node(expr, Type::Number)),
            Expression::String(_) => Ok(literal_node(expr, Type::String)),
            Expression::Boolean(_) => Ok(literal_node(expr, Type::Boolean)),
            Expression::Ident(ident) => {
                let ty = self.infer_ident(env, ident)?;
                Ok(Expression::Ident(Ident {
                    value: ident.value.clone(),
                    position: ident.position.clone(),
                    info: ty,
                }))
            }
            Expression::Qualified(q) => self.infer_qualified(q),
            Expression::FunctionCall(call) => self.infer_call(env, call),
            Expression::Lambda(lambda) => self.infer_lambda(env, lambda, None),
            Expression::BinaryOp(binop) => self.infer_binop(env, binop),
            Expression::UnaryOp(unary) => self.infer_unary(env, unary),
            Expression::IfThenElse(ite) => self.infer_if(env, ite, None),
            Expression::Match(m) => self.infer_match(env, m, None),
            Expression::Block(block) => Ok(Expression::Block(self.infer_block(env, block, None)?)),
        }
    }

    fn infer_ident(&mut self, env: &TypeEnv, ident: &Ident<()>) -> Result<Type, TypeError> {
        if let Some(scheme) = self.types.constructor_scheme(&ident.value) {
            return Ok(self.instantiate(&scheme));
        }
        match env.lookup(&ident.value) {
            Some(scheme) => {
                let scheme = scheme.clone();
                Ok(self.instantiate(&scheme))
            }
            None => Err(TypeError::unbound(
                "identifier",
                ident.value.clone(),
                ident.position.clone(),
            )),
        }
    }

    fn infer_qualified(&mut self, q: &Qualified<()>) -> Result<Expression<Type>, TypeError> {
        let interface = self
            .imported
            .get(&q.module)
            .cloned()
            .ok_or_else(|| TypeError::unbound("module", q.module.clone(), q.position.clone()))?;

        let key = format!("{}.{}", q.module, q.name);
        let scheme = match self.types.constructor_scheme(&key) {
            Some(scheme) => scheme,
            None => interface
                .value(&q.name)
                .cloned()
                .ok_or_else(|| TypeError::unbound("identifier", key, q.position.clone()))?,
        };

        let ty = self.instantiate(&scheme);
        Ok(Expression::Qualified(Qualified {
            module: q.module.clone(),
            name: q.name.clone(),
            position: q.position.clone(),
            info: ty,
        }))
    }

    fn infer_lambda(
        &mut self,
        env: &TypeEnv,
        lambda: &Lambda<()>,
        expected: Option<&Type>,
    ) -> Result<Expression<Type>, TypeError> {
        let params = self.typed_params(&lambda.params)?;
        let ret = self.fresh();
        let ty = Type::curried(param_types(&params), ret.clone());
        if let Some(expected) = expected {
            self.unify(expected, &ty, &lambda.position)?;
        }

        let mut body_env = env.clone();
        for param in &params {
            body_env = body_env.extend(
                param.name.value.clone(),
                TypeScheme::monomorphic(param.name.info.clone()),
            );
        }
        let body = self.check_expr(&body_env, &lambda.body, &ret)?;

        Ok(Expression::Lambda(Lambda {
            params,
            body: Box::new(body),
            position: lambda.position.clone(),
            info: ty,
        }))
    }

    /// `f(a, b)` is `f(a)(b)`: each argument consumes one parameter of the
    /// callee's curried type. `f()` passes `unit`.
    fn infer_call(&mut self, env: &TypeEnv, call: &FunctionCall<()>) -> Result<Expression<Type>, TypeError> {
        let func = self.infer_expr(env, &call.func)?;
        let supplied = call.args.len().max(1);
        let mut current = func.info().clone();
        let mut args = Vec::with_capacity(call.args.len());

        for (consumed, arg) in call.args.iter().enumerate() {
            let (param, ret) = self.expect_function(&current, consumed, supplied, call)?;
            args.push(self.check_expr(env, arg, &param)?);
            current = ret;
        }

        if call.args.is_empty() {
            let (param, ret) = self.expect_function(&current, 0, supplied, call)?;
            self.unify(&param, &Type::Unit, &call.position)?;
            current = ret;
        }

        Ok(Expression::FunctionCall(FunctionCall {
            func: Box::new(func),
            args,
            position: call.position.clone(),
            info: current,
        }))
    }

    fn expect_function(
        &mut self,
        ty: &Type,
        consumed: usize,
        supplied: usize,
        call: &FunctionCall<()>,
    ) -> Result<(Type, Type), TypeError> {
        match self.subst.apply(ty) {
            Type::Func(param, ret) => Ok((*param, *ret)),
            Type::Var(_) | Type::Union(_) => {
                let param = self.fresh();
                let ret = self.fresh();
                self.unify(&Type::func(param.clone(), ret.clone()), ty, &call.position)?;
                Ok((param, ret))
            }
            _ => Err(TypeError::ArityMismatch {
                what: self.describe_callee(&call.func),
                expected: consumed,
                found: supplied,
                span: call.position.clone(),
            }),
        }
    }

    fn describe_callee(&self, func: &Expression<()>) -> String {
        match func {
            Expression::Ident(ident) if self.types.is_constructor(&ident.value) => {
                format!("constructor '{}'", ident.value)
            }
            Expression::Ident(ident) => format!("function '{}'", ident.value),
            Expression::Qualified(q) => format!("function '{}.{}'", q.module, q.name),
            _ => "function".to_string(),
        }
    }

    fn infer_binop(&mut self, env: &TypeEnv, binop: &BinaryOp<()>) -> Result<Expression<Type>, TypeError> {
        let context = format!("operand of '{}'", binop.op.symbol());
        let operands = |operand: Type, result: Type| (operand, result);

        let (left, right, ty) = match binop.op {
            BinOpKind::Eq | BinOpKind::NotEq => {
                // A literal on the left is checked against the other side so it
                // can meet a union.
                let (left, right) = if binop.left.is_literal() && !binop.right.is_literal() {
                    let right = self.infer_expr(env, &binop.right)?;
                    let left = self.check_expr(env, &binop.left, right.info())?;
                    (left, right)
                } else {
                    let left = self.infer_expr(env, &binop.left)?;
                    let right = self.check_expr(env, &binop.right, left.info())?;
                    (left, right)
                };
                (left, right, Type::Boolean)
            }
            op => {
                let (operand, result) = match op {
                    BinOpKind::Add | BinOpKind::Sub | BinOpKind::Mul | BinOpKind::Div | BinOpKind::Mod => {
                        operands(Type::Number, Type::Number)
                    }
                    BinOpKind::Concat => operands(Type::String, Type::String),
                    BinOpKind::Lt | BinOpKind::Gt | BinOpKind::LtEq | BinOpKind::GtEq => {
                        operands(Type::Number, Type::Boolean)
                    }
                    _ => operands(Type::Boolean, Type::Boolean),
                };
                let left = self
                    .check_expr(env, &binop.left, &operand)
                    .map_err(|e| e.with_context(context.clone()))?;
                let right = self
                    .check_expr(env, &binop.right, &operand)
                    .map_err(|e| e.with_context(context.clone()))?;
                (left, right, result)
            }
        };

        Ok(Expression::BinaryOp(BinaryOp {
            op: binop.op,
            left: Box::new(left),
            right: Box::new(right),
            position: binop.position.clone(),
            info: ty,
        }))
    }

    fn infer_unary(&mut self, env: &TypeEnv, unary: &UnaryOp<()>) -> Result<Expression<Type>, TypeError> {
        let ty = match unary.op {
            UnaryOpKind::Not => Type::Boolean,
            UnaryOpKind::Neg => Type::Number,
        };
        let operand = self.check_expr(env, &unary.operand, &ty)?;
        Ok(Expression::UnaryOp(UnaryOp {
            op: unary.op,
            operand: Box::new(operand),
            position: unary.position.clone(),
            info: ty,
        }))
    }

    fn infer_if(
        &mut self,
        env: &TypeEnv,
        ite: &IfThenElse<()>,
        expected: Option<&Type>,
    ) -> Result<Expression<Type>, TypeError> {
        let condition = self
            .check_expr(env, &ite.condition, &Type::Boolean)
            .map_err(|e| e.with_context("if condition"))?;

        let (then_expr, else_expr, ty) = match &ite.else_expr {
            None => {
                let then_expr = self
                    .check_expr(env, &ite.then_expr, &Type::Unit)
                    .map_err(|e| e.with_context("if without else must produce unit"))?;
                if let Some(expected) = expected {
                    self.unify(expected, &Type::Unit, &ite.position)?;
                }
                (then_expr, None, Type::Unit)
            }
            Some(else_expr) => {
                let result = match expected {
                    Some(expected) => expected.clone(),
                    None => self.fresh(),
                };
                let then_expr = self.check_expr(env, &ite.then_expr, &result)?;
                let else_expr = self
                    .check_expr(env, else_expr, &result)
                    .map_err(|e| e.with_context("if branches must have the same type"))?;
                (then_expr, Some(Box::new(else_expr)), result)
            }
        };

        Ok(Expression::IfThenElse(IfThenElse {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr,
            position: ite.position.clone(),
            info: ty,
        }))
    }

    fn infer_match(
        &mut self,
        env: &TypeEnv,
        m: &Match<()>,
        expected: Option<&Type>,
    ) -> Result<Expression<Type>, TypeError> {
        let scrutinee = self.infer_expr(env, &m.scrutinee)?;
        let scrutinee_ty = scrutinee.info().clone();
        let result = match expected {
            Some(expected) => expected.clone(),
            None => self.fresh(),
        };

        let mut arms = Vec::with_capacity(m.arms.len());
        for arm in &m.arms {
            let (pattern, arm_env) = self.check_pattern(env.clone(), &arm.pattern, &scrutinee_ty)?;
            let body = self
                .check_expr(&arm_env, &arm.body, &result)
                .map_err(|e| e.with_context("match arms must have the same type"))?;
            arms.push(MatchArm {
                pattern,
                body,
                position: arm.position.clone(),
            });
        }

        Ok(Expression::Match(Box::new(Match {
            scrutinee: Box::new(scrutinee),
            arms,
            position: m.position.clone(),
            info: result,
        })))
    }

    /// Check a pattern against the scrutinee type, returning the typed pattern
    /// and `env` extended with the pattern's bindings.
    fn check_pattern(
        &mut self,
        env: TypeEnv,
        pattern: &Pattern<()>,
        expected: &Type,
    ) -> Result<(Pattern<Type>, TypeEnv), TypeError> {
        match pattern {
            Pattern::Wildcard(w) => Ok((
                Pattern::Wildcard(Wildcard {
                    position: w.position.clone(),
                    info: expected.clone(),
                }),
                env,
            )),
            Pattern::Ident(ident) => {
                let env = env.extend(ident.value.clone(), TypeScheme::monomorphic(expected.clone()));
                Ok((
                    Pattern::Ident(Ident {
                        value: ident.value.clone(),
                        position: ident.position.clone(),
                        info: expected.clone(),
                    }),
                    env,
                ))
            }
            Pattern::Unit(unit) => {
                self.unify(expected, &Type::Unit, &unit.position)?;
                Ok((
                    Pattern::Unit(Unit {
                        position: unit.position.clone(),
                        info: Type::Unit,
                    }),
                    env,
                ))
            }
            Pattern::Literal(literal) => {
                let (tag, primitive) = match literal {
                    LiteralPattern::Number(n) => (Tag::Num(n.value), Type::Number),
                    LiteralPattern::String(s) => (Tag::Str(s.value.clone()), Type::String),
                    LiteralPattern::Boolean(b) => (Tag::Bool(b.value), Type::Boolean),
                };
                let resolved = self.subst.apply(expected);
                let ty = match &resolved {
                    Type::Union(union) => {
                        self.check_literal_member(tag, union, literal.position())?;
                        resolved.clone()
                    }
                    _ => {
                        self.unify(expected, &primitive, literal.position())?;
                        primitive
                    }
                };
                Ok((Pattern::Literal(typed_literal_pattern(literal, ty)), env))
            }
            Pattern::Constructor(ctor) => self.check_constructor_pattern(env, ctor, expected),
        }
    }

    fn check_constructor_pattern(
        &mut self,
        env: TypeEnv,
        pattern: &ConstructorPattern<()>,
        expected: &Type,
    ) -> Result<(Pattern<Type>, TypeEnv), TypeError> {
        let key = match &pattern.module {
            Some(module) => {
                if !self.imported.contains_key(module) {
                    return Err(TypeError::unbound("module", module.clone(), pattern.position.clone()));
                }
                format!("{}.{}", module, pattern.name)
            }
            None => pattern.name.clone(),
        };

        let (adt, ctor) = self
            .types
            .constructor(&key)
            .map(|(adt, ctor)| (adt.clone(), ctor.clone()))
            .ok_or_else(|| TypeError::unbound("constructor", key.clone(), pattern.position.clone()))?;

        if pattern.args.len() != ctor.fields.len() {
            return Err(TypeError::ArityMismatch {
                what: format!("constructor '{}'", key),
                expected: ctor.fields.len(),
                found: pattern.args.len(),
                span: pattern.position.clone(),
            });
        }

        let args: Vec<Type> = adt.params.iter().map(|_| self.fresh()).collect();
        let ty = Type::adt(adt.name.clone(), args.clone());
        self.unify(expected, &ty, &pattern.position)?;

        let mut env = env;
        let mut typed_args = Vec::with_capacity(pattern.args.len());
        for (arg, field) in pattern.args.iter().zip(adt.field_types(&ctor, &args)) {
            let (typed, next) = self.check_pattern(env, arg, &field)?;
            typed_args.push(typed);
            env = next;
        }

        Ok((
            Pattern::Constructor(ConstructorPattern {
                module: pattern.module.clone(),
                name: pattern.name.clone(),
                args: typed_args,
                position: pattern.position.clone(),
                info: ty,
            }),
            env,
        ))
    }

    fn infer_block(
        &mut self,
        env: &TypeEnv,
        block: &Block<()>,
        expected: Option<&Type>,
    ) -> Result<Block<Type>, TypeError> {
        let mut scope = TypeEnv::with_parent(env.clone());
        let mut statements = Vec::with_capacity(block.statements.len());
        for stmt in &block.statements {
            let (stmt, next) = self.infer_statement(&scope, stmt)?;
            statements.push(stmt);
            scope = next;
        }

        let (result, ty) = match &block.result {
            Some(expr) => {
                let expr = match expected {
                    Some(expected) => self.check_expr(&scope, expr, expected)?,
                    None => self.infer_expr(&scope, expr)?,
                };
                let ty = expr.info().clone();
                (Some(Box::new(expr)), ty)
            }
            None => {
                if let Some(expected) = expected {
                    self.unify(expected, &Type::Unit, &block.position)?;
                }
                (None, Type::Unit)
            }
        };

        Ok(Block {
            statements,
            result,
            position: block.position.clone(),
            info: ty,
        })
    }

    // === Final substitution ===

    fn finalize_module(&self, module: &mut Module<Type>) {
        for item in &mut module.items {
            self.finalize_statement(&mut item.statement);
        }
    }

    fn finalize_statement(&self, stmt: &mut Statement<Type>) {
        match stmt {
            Statement::Let(binding) => {
                binding.name.info = self.subst.apply(&binding.name.info);
                self.finalize_expr(&mut binding.value);
            }
            Statement::Function(decl) => self.finalize_function(decl),
            Statement::RecGroup(group) => {
                for decl in &mut group.functions {
                    self.finalize_function(decl);
                }
            }
            Statement::Assignment(assign) => {
                assign.name.info = self.subst.apply(&assign.name.info);
                self.finalize_expr(&mut assign.value);
            }
            Statement::Expression(expr) => self.finalize_expr(expr),
            Statement::TypeDecl(_) | Statement::Import(_) | Statement::ForeignImport(_) => {}
        }
    }

    fn finalize_function(&self, decl: &mut FunctionDecl<Type>) {
        decl.name.info = self.subst.apply(&decl.name.info);
        for param in &mut decl.params {
            param.name.info = self.subst.apply(&param.name.info);
        }
        self.finalize_block(&mut decl.body);
    }

    fn finalize_block(&self, block: &mut Block<Type>) {
        block.info = self.subst.apply(&block.info);
        for stmt in &mut block.statements {
            self.finalize_statement(stmt);
        }
        if let Some(result) = &mut block.result {
            self.finalize_expr(result);
        }
    }

    fn finalize_expr(&self, expr: &mut Expression<Type>) {
        let info = expr.info_mut();
        *info = self.subst.apply(info);

        match expr {
            Expression::FunctionCall(call) => {
                self.finalize_expr(&mut call.func);
                for arg in &mut call.args {
                    self.finalize_expr(arg);
                }
            }
            Expression::Lambda(lambda) => {
                for param in &mut lambda.params {
                    param.name.info = self.subst.apply(&param.name.info);
                }
                self.finalize_expr(&mut lambda.body);
            }
            Expression::BinaryOp(binop) => {
                self.finalize_expr(&mut binop.left);
                self.finalize_expr(&mut binop.right);
            }
            Expression::UnaryOp(unary) => self.finalize_expr(&mut unary.operand),
            Expression::IfThenElse(ite) => {
                self.finalize_expr(&mut ite.condition);
                self.finalize_expr(&mut ite.then_expr);
                if let Some(else_expr) = &mut ite.else_expr {
                    self.finalize_expr(else_expr);
                }
            }
            Expression::Match(m) => {
                self.finalize_expr(&mut m.scrutinee);
                for arm in &mut m.arms {
                    self.finalize_pattern(&mut arm.pattern);
                    self.finalize_expr(&mut arm.body);
                }
            }
            Expression::Block(block) => self.finalize_block(block),
            Expression::Unit(_)
            | Expression::Ident(_)
            | Expression::Number(_)
            | Expression::String(_)
            | Expression::Boolean(_)
            | Expression::Qualified(_) => {}
        }
    }

    fn finalize_pattern(&self, pattern: &mut Pattern<Type>) {
        match pattern {
            Pattern::Wildcard(w) => w.info = self.subst.apply(&w.info),
            Pattern::Ident(ident) => ident.info = self.subst.apply(&ident.info),
            Pattern::Unit(_) => {}
            Pattern::Literal(literal) => match literal {
                LiteralPattern::Number(n) => n.info = self.subst.apply(&n.info),
                LiteralPattern::String(s) => s.info = self.subst.apply(&s.info),
                LiteralPattern::Boolean(b) => b.info = self.subst.apply(&b.info),
            },
            Pattern::Constructor(ctor) => {
                ctor.info = self.subst.apply(&ctor.info);
                for arg in &mut ctor.args {
                    self.finalize_pattern(arg);
                }
            }
        }
    }
}

fn param_types(params: &[Param<Type>]) -> Vec<Type> {
    if params.is_empty() {
        vec![Type::Unit]
    } else {
        params.iter().map(|p| p.name.info.clone()).collect()
    }
}

fn literal_tag(expr: &Expression<()>) -> Option<Tag> {
    match expr {
        Expression::Number(n) => Some(Tag::Num(n.value)),
        Expression::String(s) => Some(Tag::Str(s.value.clone())),
        Expression::Boolean(b) => Some(Tag::Bool(b.value)),
        _ => None,
    }
}

/// Rebuild a literal expression with the given type; other expressions come
/// back as `unit`.
fn literal_node(expr: &Expression<()>, ty: Type) -> Expression<Type> {
    match expr {
        Expression::Number(n) => Expression::Number(Number {
            value: n.value,
            position: n.position.clone(),
            info: ty,
        }),
        Expression::String(s) => Expression::String(StringLiteral {
            value: s.value.clone(),
            position: s.position.clone(),
            info: ty,
        }),
        Expression::Boolean(b) => Expression::Boolean(Boolean {
            value: b.value,
            position: b.position.clone(),
            info: ty,
        }),
        other => Expression::Unit(Unit {
            position: other.position().clone(),
            info: Type::Unit,
        }),
    }
}

fn typed_literal_pattern(literal: &LiteralPattern<()>, ty: Type) -> LiteralPattern<Type> {
    match literal {
        LiteralPattern::Number(n) => LiteralPattern::Number(Number {
            value: n.value,
            position: n.position.clone(),
            info: ty,
        }),
        LiteralPattern::String(s) => LiteralPattern::String(StringLiteral {
            value: s.value.clone(),
            position: s.position.clone(),
            info: ty,
        }),
        LiteralPattern::Boolean(b) => LiteralPattern::Boolean(Boolean {
            value: b.value,
            position: b.position.clone(),
            info: ty,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::error::ErrorKind;

    // Helpers to build untyped expressions
    fn number(value: f64) -> Expression<()> {
        Expression::Number(Number {
            value,
            position: Span::default(),
            info: (),
        })
    }

    fn string(value: &str) -> Expression<()> {
        Expression::String(StringLiteral {
            value: value.to_string(),
            position: Span::default(),
            info: (),
        })
    }

    fn ident(name: &str) -> Ident<()> {
        Ident {
            value: name.to_string(),
            position: Span::default(),
            info: (),
        }
    }

    fn var(name: &str) -> Expression<()> {
        Expression::Ident(ident(name))
    }

    fn lambda(params: &[&str], body: Expression<()>) -> Expression<()> {
        Expression::Lambda(Lambda {
            params: params
                .iter()
                .map(|p| Param {
                    name: ident(p),
                    annotation: None,
                })
                .collect(),
            body: Box::new(body),
            position: Span::default(),
            info: (),
        })
    }

    fn call(func: Expression<()>, args: Vec<Expression<()>>) -> Expression<()> {
        Expression::FunctionCall(FunctionCall {
            func: Box::new(func),
            args,
            position: Span::default(),
            info: (),
        })
    }

    fn add(left: Expression<()>, right: Expression<()>) -> Expression<()> {
        Expression::BinaryOp(BinaryOp {
            op: BinOpKind::Add,
            left: Box::new(left),
            right: Box::new(right),
            position: Span::default(),
            info: (),
        })
    }

    #[test]
    fn test_infer_literals() {
        let env = TypeEnv::empty();
        assert_eq!(infer(&env, &number(1.0)).unwrap().0, Type::Number);
        assert_eq!(infer(&env, &string("a")).unwrap().0, Type::String);
    }

    #[test]
    fn test_infer_unbound_identifier() {
        let err = infer(&TypeEnv::empty(), &var("x")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnboundIdentifier);
    }

    #[test]
    fn test_infer_identity_lambda() {
        let (ty, _) = infer(&TypeEnv::empty(), &lambda(&["x"], var("x"))).unwrap();
        match ty {
            Type::Func(param, ret) => assert_eq!(param, ret),
            other => panic!("expected a function type, got {}", other),
        }
    }

    #[test]
    fn test_multi_param_lambda_is_curried() {
        let (ty, _) = infer(&TypeEnv::empty(), &lambda(&["x", "y"], add(var("x"), var("y")))).unwrap();
        assert_eq!(ty, Type::curried(vec![Type::Number, Type::Number], Type::Number));
    }

    #[test]
    fn test_lambda_without_params_takes_unit() {
        let (ty, _) = infer(&TypeEnv::empty(), &lambda(&[], number(1.0))).unwrap();
        assert_eq!(ty, Type::func(Type::Unit, Type::Number));
    }

    #[test]
    fn test_multi_argument_call_equals_chained_calls() {
        let f = lambda(&["x", "y"], add(var("x"), var("y")));
        let (flat, _) = infer(&TypeEnv::empty(), &call(f.clone(), vec![number(1.0), number(2.0)])).unwrap();
        let (chained, _) = infer(
            &TypeEnv::empty(),
            &call(call(f, vec![number(1.0)]), vec![number(2.0)]),
        )
        .unwrap();
        assert_eq!(flat, Type::Number);
        assert_eq!(chained, Type::Number);
    }

    #[test]
    fn test_partial_application_type() {
        let f = lambda(&["x", "y"], add(var("x"), var("y")));
        let (ty, _) = infer(&TypeEnv::empty(), &call(f, vec![number(1.0)])).unwrap();
        assert_eq!(ty, Type::func(Type::Number, Type::Number));
    }

    #[test]
    fn test_too_many_arguments() {
        let f = lambda(&["x"], add(var("x"), number(1.0)));
        let err = infer(&TypeEnv::empty(), &call(f, vec![number(1.0), number(2.0)])).unwrap_err();
        assert!(matches!(
            err,
            TypeError::ArityMismatch {
                expected: 1,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_argument_mismatch() {
        let f = lambda(&["x"], add(var("x"), number(1.0)));
        let err = infer(&TypeEnv::empty(), &call(f, vec![string("a")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unification);
        assert_eq!(err.types(), vec![&Type::Number, &Type::String]);
    }

    #[test]
    fn test_polymorphic_binding_instantiated_per_use() {
        let t = TypeVar::with_name(0, "T".to_string());
        let env = TypeEnv::empty().extend(
            "id".to_string(),
            TypeScheme::polymorphic(vec![t.clone()], Type::func(Type::Var(t.clone()), Type::Var(t))),
        );
        let (ty1, _) = infer(&env, &call(var("id"), vec![number(1.0)])).unwrap();
        let (ty2, _) = infer(&env, &call(var("id"), vec![string("a")])).unwrap();
        assert_eq!(ty1, Type::Number);
        assert_eq!(ty2, Type::String);
    }

    #[test]
    fn test_fresh_vars_avoid_env_vars() {
        let existing = TypeVar::new(0);
        let env = TypeEnv::empty().extend(
            "x".to_string(),
            TypeScheme::monomorphic(Type::Var(existing.clone())),
        );
        let (ty, subst) = infer(&env, &call(lambda(&["y"], var("y")), vec![var("x")])).unwrap();
        assert_eq!(ty, Type::Var(existing.clone()));
        assert!(subst.get(&existing).is_none());
    }
}
