use lachs::Span;

use super::expression::{Block, Expression, Ident, Param};
use super::types::{TypeAlt, TypeExpr, TypeParam};

#[derive(Debug, Clone)]
pub enum Statement<T> {
    Let(Let<T>),
    Function(FunctionDecl<T>),
    RecGroup(RecGroup<T>),
    Assignment(Assignment<T>),
    TypeDecl(TypeDecl),
    Import(Import),
    ForeignImport(ForeignImport),
    Expression(Expression<T>),
}

impl<T> Statement<T> {
    pub fn position(&self) -> &Span {
        match self {
            Statement::Let(l) => &l.position,
            Statement::Function(f) => &f.position,
            Statement::RecGroup(r) => &r.position,
            Statement::Assignment(a) => &a.position,
            Statement::TypeDecl(t) => &t.position,
            Statement::Import(i) => &i.position,
            Statement::ForeignImport(f) => &f.position,
            Statement::Expression(e) => e.position(),
        }
    }

    /// Value names this statement introduces into scope.
    pub fn declared_names(&self) -> Vec<&str> {
        match self {
            Statement::Let(l) => vec![l.name.value.as_str()],
            Statement::Function(f) => vec![f.name.value.as_str()],
            Statement::RecGroup(r) => r.functions.iter().map(|f| f.name.value.as_str()).collect(),
            Statement::ForeignImport(f) => vec![f.local_name()],
            _ => vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// `let x = ...`
    Let,
    /// `let rec f = ...`
    LetRec,
    /// `var x = ...`
    Var,
}

#[derive(Debug, Clone)]
pub struct Let<T> {
    pub kind: BindingKind,
    pub name: Ident<T>,
    pub annotation: Option<TypeExpr>,
    pub value: Box<Expression<T>>,
    pub position: Span,
}

/// `fn name<T>(x: T, ...) -> R { ... }`
#[derive(Debug, Clone)]
pub struct FunctionDecl<T> {
    pub name: Ident<T>,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param<T>>,
    pub return_type: Option<TypeExpr>,
    pub body: Block<T>,
    pub position: Span,
}

impl<T> FunctionDecl<T> {
    /// Number of arguments the function takes in its curried spine; a function
    /// without parameters still takes `unit`.
    pub fn arity(&self) -> usize {
        self.params.len().max(1)
    }
}

/// `rec { fn a() {..} fn b() {..} }`: functions that may call each other.
#[derive(Debug, Clone)]
pub struct RecGroup<T> {
    pub functions: Vec<FunctionDecl<T>>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct Assignment<T> {
    pub name: Ident<T>,
    pub value: Box<Expression<T>>,
    pub position: Span,
}

/// `type Name<T> = Alt | Alt;` or the opaque `type Name<T>;`
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub params: Vec<TypeParam>,
    /// `None` for opaque declarations.
    pub alternatives: Option<Vec<TypeAlt>>,
    pub position: Span,
}

/// `import Math;`
#[derive(Debug, Clone)]
pub struct Import {
    pub module: String,
    pub position: Span,
}

/// `import foreign string.upper as upper: (string) -> string;`
#[derive(Debug, Clone)]
pub struct ForeignImport {
    /// Dotted path in the target runtime, e.g. `["string", "upper"]`.
    pub path: Vec<String>,
    pub alias: Option<String>,
    pub type_params: Vec<TypeParam>,
    pub signature: Option<TypeExpr>,
    pub position: Span,
}

impl ForeignImport {
    pub fn local_name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.path.last().map(String::as_str).unwrap_or_default(),
        }
    }

    pub fn lua_path(&self) -> String {
        self.path.join(".")
    }
}
