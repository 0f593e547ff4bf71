//! # Lua Syntax Tree
//!
//! The output of lowering. Only the subset of Lua the code generator emits is
//! modelled: locals, functions, assignments, calls, `if` chains, numeric `for`
//! and `return`. The tree is printed by [`crate::fmt::lua`] and can be run
//! directly by the reference [`crate::interpreter`].

/// One generated Lua file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chunk {
    /// Comment printed above the code.
    pub header: Option<String>,
    pub body: Vec<Stat>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stat {
    /// `local a, b = x, y`; `values` may be empty for a forward declaration.
    Local { names: Vec<String>, values: Vec<Expr> },
    /// `local function name(params) body end`
    LocalFunction {
        name: String,
        params: Vec<String>,
        body: Vec<Stat>,
    },
    /// `function name(params) body end`, assigning to a visible local.
    Function {
        name: String,
        params: Vec<String>,
        body: Vec<Stat>,
    },
    Assign { target: Expr, value: Expr },
    /// A call in statement position. Holds an [`Expr::Call`].
    Call(Expr),
    If {
        branches: Vec<(Expr, Vec<Stat>)>,
        else_body: Option<Vec<Stat>>,
    },
    NumericFor {
        var: String,
        start: Expr,
        end: Expr,
        body: Vec<Stat>,
    },
    Return(Vec<Expr>),
    Do(Vec<Stat>),
}

impl Stat {
    pub fn local(name: impl Into<String>, value: Expr) -> Self {
        Stat::Local {
            names: vec![name.into()],
            values: vec![value],
        }
    }

    pub fn declare(names: Vec<String>) -> Self {
        Stat::Local {
            names,
            values: vec![],
        }
    }

    pub fn assign(name: impl Into<String>, value: Expr) -> Self {
        Stat::Assign {
            target: Expr::name(name),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Name(String),
    /// `object.name`
    Field(Box<Expr>, String),
    /// `object[key]`
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    Function { params: Vec<String>, body: Vec<Stat> },
    Table(Vec<TableField>),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary { op: UnOp, operand: Box<Expr> },
}

impl Expr {
    pub fn name(name: impl Into<String>) -> Self {
        Expr::Name(name.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::String(value.into())
    }

    pub fn call(func: Expr, args: Vec<Expr>) -> Self {
        Expr::Call(Box::new(func), args)
    }

    pub fn field(object: Expr, name: impl Into<String>) -> Self {
        Expr::Field(Box::new(object), name.into())
    }

    pub fn index(object: Expr, key: Expr) -> Self {
        Expr::Index(Box::new(object), Box::new(key))
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn function(params: Vec<String>, body: Vec<Stat>) -> Self {
        Expr::Function { params, body }
    }

    /// Resolve a dotted path such as `string.upper`.
    pub fn path(path: &str) -> Self {
        let mut segments = path.split('.');
        let first = Expr::name(segments.next().unwrap_or_default());
        segments.fold(first, Expr::field)
    }

    /// Whether evaluating the expression calls a function. Function bodies
    /// are not evaluated and do not count.
    pub fn has_call(&self) -> bool {
        match self {
            Expr::Call(..) => true,
            Expr::Field(object, _) => object.has_call(),
            Expr::Index(object, key) => object.has_call() || key.has_call(),
            Expr::Table(fields) => fields.iter().any(|field| match field {
                TableField::Named(_, value) | TableField::Positional(value) => value.has_call(),
            }),
            Expr::Binary { left, right, .. } => left.has_call() || right.has_call(),
            Expr::Unary { operand, .. } => operand.has_call(),
            Expr::Nil
            | Expr::Bool(_)
            | Expr::Number(_)
            | Expr::String(_)
            | Expr::Name(_)
            | Expr::Function { .. } => false,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Expr::Nil | Expr::Bool(_) | Expr::Number(_) | Expr::String(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableField {
    Named(String, Expr),
    Positional(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Concat,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Or => "or",
            BinOp::And => "and",
            BinOp::Eq => "==",
            BinOp::NotEq => "~=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::LtEq => "<=",
            BinOp::GtEq => ">=",
            BinOp::Concat => "..",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        }
    }

    /// Lua operator precedence, higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => 3,
            BinOp::Concat => 4,
            BinOp::Add | BinOp::Sub => 5,
            BinOp::Mul | BinOp::Div | BinOp::Mod => 6,
        }
    }

    pub fn is_right_assoc(&self) -> bool {
        matches!(self, BinOp::Concat)
    }
}

/// Precedence of unary operators.
pub const UNARY_PRECEDENCE: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
    /// `#t`
    Len,
}

impl UnOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnOp::Not => "not ",
            UnOp::Neg => "-",
            UnOp::Len => "#",
        }
    }
}

/// Lua keywords that cannot be used as names.
pub const KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Make an identifier safe to use as a Lua name. Source identifiers start
/// with a letter, so a leading `_` cannot collide with one.
pub fn mangle(name: &str) -> String {
    if KEYWORDS.contains(&name) {
        format!("_{}", name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mangle_keywords() {
        assert_eq!(mangle("end"), "_end");
        assert_eq!(mangle("repeat"), "_repeat");
        assert_eq!(mangle("end_"), "end_");
        assert_eq!(mangle("value"), "value");
    }

    #[test]
    fn test_path() {
        assert_eq!(
            Expr::path("string.upper"),
            Expr::field(Expr::name("string"), "upper")
        );
        assert_eq!(Expr::path("print"), Expr::name("print"));
    }
}
