//! # Pattern Matching AST Nodes
//!
//! Patterns appear in the arms of `match` expressions:
//!
//! ```text
//! match opt {
//!     Some(0) => "zero",
//!     Some(n) => "some",
//!     None => "none",
//! }
//! ```
//!
//! - **Wildcard** `_` matches anything without binding.
//! - **Identifier** `n` (lowercase) binds the matched value.
//! - **Literal** `0`, `"on"`, `true` match one value.
//! - **Unit** `()` matches the unit value.
//! - **Constructor** `Some(p)`, `None`, `Shapes.Circle(r)` (uppercase) match one
//!   constructor of an algebraic data type and destructure its fields.

use lachs::Span;

use super::expression::{Boolean, Expression, Ident, Number, StringLiteral, Unit};

#[derive(Debug, Clone)]
pub enum Pattern<T> {
    Wildcard(Wildcard<T>),
    Ident(Ident<T>),
    Literal(LiteralPattern<T>),
    Unit(Unit<T>),
    Constructor(ConstructorPattern<T>),
}

impl<T> Pattern<T> {
    pub fn position(&self) -> &Span {
        match self {
            Pattern::Wildcard(w) => &w.position,
            Pattern::Ident(id) => &id.position,
            Pattern::Literal(lit) => lit.position(),
            Pattern::Unit(u) => &u.position,
            Pattern::Constructor(c) => &c.position,
        }
    }

    pub fn info(&self) -> &T {
        match self {
            Pattern::Wildcard(w) => &w.info,
            Pattern::Ident(id) => &id.info,
            Pattern::Literal(lit) => lit.info(),
            Pattern::Unit(u) => &u.info,
            Pattern::Constructor(c) => &c.info,
        }
    }

    /// A pattern is irrefutable when it matches every value of its type
    /// without inspecting it.
    pub fn is_irrefutable(&self) -> bool {
        matches!(self, Pattern::Wildcard(_) | Pattern::Ident(_) | Pattern::Unit(_))
    }

    /// Variables bound by this pattern, in left-to-right order.
    pub fn bindings(&self) -> Vec<&Ident<T>> {
        match self {
            Pattern::Ident(id) => vec![id],
            Pattern::Constructor(c) => c.args.iter().flat_map(|p| p.bindings()).collect(),
            _ => vec![],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Wildcard<T> {
    pub position: Span,
    pub info: T,
}

#[derive(Debug, Clone)]
pub enum LiteralPattern<T> {
    Number(Number<T>),
    String(StringLiteral<T>),
    Boolean(Boolean<T>),
}

impl<T> LiteralPattern<T> {
    pub fn position(&self) -> &Span {
        match self {
            LiteralPattern::Number(n) => &n.position,
            LiteralPattern::String(s) => &s.position,
            LiteralPattern::Boolean(b) => &b.position,
        }
    }

    pub fn info(&self) -> &T {
        match self {
            LiteralPattern::Number(n) => &n.info,
            LiteralPattern::String(s) => &s.info,
            LiteralPattern::Boolean(b) => &b.info,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConstructorPattern<T> {
    /// Module qualifier for imported constructors.
    pub module: Option<String>,
    pub name: String,
    pub args: Vec<Pattern<T>>,
    pub position: Span,
    pub info: T,
}

#[derive(Debug, Clone)]
pub struct MatchArm<T> {
    pub pattern: Pattern<T>,
    pub body: Expression<T>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct Match<T> {
    pub scrutinee: Box<Expression<T>>,
    pub arms: Vec<MatchArm<T>>,
    pub position: Span,
    pub info: T,
}
