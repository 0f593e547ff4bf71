use lachs::Span;

use super::pattern::Match;
use super::statement::Statement;
use super::types::TypeExpr;

#[derive(Debug, Clone)]
pub enum Expression<T> {
    Unit(Unit<T>),
    Ident(Ident<T>),
    Number(Number<T>),
    String(StringLiteral<T>),
    Boolean(Boolean<T>),
    /// `Module.name`
    Qualified(Qualified<T>),
    FunctionCall(FunctionCall<T>),
    Lambda(Lambda<T>),
    BinaryOp(BinaryOp<T>),
    UnaryOp(UnaryOp<T>),
    IfThenElse(IfThenElse<T>),
    Match(Box<Match<T>>),
    Block(Block<T>),
}

impl<T> Expression<T> {
    pub fn position(&self) -> &Span {
        match self {
            Expression::Unit(u) => &u.position,
            Expression::Ident(i) => &i.position,
            Expression::Number(n) => &n.position,
            Expression::String(s) => &s.position,
            Expression::Boolean(b) => &b.position,
            Expression::Qualified(q) => &q.position,
            Expression::FunctionCall(f) => &f.position,
            Expression::Lambda(l) => &l.position,
            Expression::BinaryOp(b) => &b.position,
            Expression::UnaryOp(u) => &u.position,
            Expression::IfThenElse(i) => &i.position,
            Expression::Match(m) => &m.position,
            Expression::Block(b) => &b.position,
        }
    }

    pub fn info(&self) -> &T {
        match self {
            Expression::Unit(u) => &u.info,
            Expression::Ident(i) => &i.info,
            Expression::Number(n) => &n.info,
            Expression::String(s) => &s.info,
            Expression::Boolean(b) => &b.info,
            Expression::Qualified(q) => &q.info,
            Expression::FunctionCall(f) => &f.info,
            Expression::Lambda(l) => &l.info,
            Expression::BinaryOp(b) => &b.info,
            Expression::UnaryOp(u) => &u.info,
            Expression::IfThenElse(i) => &i.info,
            Expression::Match(m) => &m.info,
            Expression::Block(b) => &b.info,
        }
    }

    pub fn info_mut(&mut self) -> &mut T {
        match self {
            Expression::Unit(u) => &mut u.info,
            Expression::Ident(i) => &mut i.info,
            Expression::Number(n) => &mut n.info,
            Expression::String(s) => &mut s.info,
            Expression::Boolean(b) => &mut b.info,
            Expression::Qualified(q) => &mut q.info,
            Expression::FunctionCall(f) => &mut f.info,
            Expression::Lambda(l) => &mut l.info,
            Expression::BinaryOp(b) => &mut b.info,
            Expression::UnaryOp(u) => &mut u.info,
            Expression::IfThenElse(i) => &mut i.info,
            Expression::Match(m) => &mut m.info,
            Expression::Block(b) => &mut b.info,
        }
    }

    /// Literal expressions are the ones that can inhabit a literal union.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Expression::Number(_) | Expression::String(_) | Expression::Boolean(_)
        )
    }
}

#[derive(Debug, Clone)]
pub struct Unit<T> {
    pub position: Span,
    pub info: T,
}

#[derive(Debug, Clone)]
pub struct Ident<T> {
    pub value: String,
    pub position: Span,
    pub info: T,
}

#[derive(Debug, Clone)]
pub struct Number<T> {
    pub value: f64,
    pub position: Span,
    pub info: T,
}

#[derive(Debug, Clone)]
pub struct StringLiteral<T> {
    pub value: String,
    pub position: Span,
    pub info: T,
}

#[derive(Debug, Clone)]
pub struct Boolean<T> {
    pub value: bool,
    pub position: Span,
    pub info: T,
}

#[derive(Debug, Clone)]
pub struct Qualified<T> {
    pub module: String,
    pub name: String,
    pub position: Span,
    pub info: T,
}

/// `func(arg1, arg2, ...)`. Each call node is one syntactic application; the
/// argument list is curried left to right during inference and lowering.
#[derive(Debug, Clone)]
pub struct FunctionCall<T> {
    pub func: Box<Expression<T>>,
    pub args: Vec<Expression<T>>,
    pub position: Span,
    pub info: T,
}

#[derive(Debug, Clone)]
pub struct Param<T> {
    pub name: Ident<T>,
    pub annotation: Option<TypeExpr>,
}

/// `(x, y) -> body`. A lambda without parameters takes `unit`.
#[derive(Debug, Clone)]
pub struct Lambda<T> {
    pub params: Vec<Param<T>>,
    pub body: Box<Expression<T>>,
    pub position: Span,
    pub info: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Concat,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
}

impl BinOpKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOpKind::Add => "+",
            BinOpKind::Sub => "-",
            BinOpKind::Mul => "*",
            BinOpKind::Div => "/",
            BinOpKind::Mod => "%",
            BinOpKind::Concat => "++",
            BinOpKind::Eq => "==",
            BinOpKind::NotEq => "!=",
            BinOpKind::Lt => "<",
            BinOpKind::Gt => ">",
            BinOpKind::LtEq => "<=",
            BinOpKind::GtEq => ">=",
            BinOpKind::And => "&&",
            BinOpKind::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpKind {
    Not,
    Neg,
}

#[derive(Debug, Clone)]
pub struct BinaryOp<T> {
    pub op: BinOpKind,
    pub left: Box<Expression<T>>,
    pub right: Box<Expression<T>>,
    pub position: Span,
    pub info: T,
}

#[derive(Debug, Clone)]
pub struct UnaryOp<T> {
    pub op: UnaryOpKind,
    pub operand: Box<Expression<T>>,
    pub position: Span,
    pub info: T,
}

/// `if cond { .. } else { .. }`; without an else branch the value is `unit`.
#[derive(Debug, Clone)]
pub struct IfThenElse<T> {
    pub condition: Box<Expression<T>>,
    pub then_expr: Box<Expression<T>>,
    pub else_expr: Option<Box<Expression<T>>>,
    pub position: Span,
    pub info: T,
}

/// `{ stmt; stmt; result }`
#[derive(Debug, Clone)]
pub struct Block<T> {
    pub statements: Vec<Statement<T>>,
    pub result: Option<Box<Expression<T>>>,
    pub position: Span,
    pub info: T,
}
