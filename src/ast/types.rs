use lachs::Span;

/// Surface syntax of a type annotation.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    /// `number`, `Option<T>`, `Math.Shape`
    Named {
        module: Option<String>,
        name: String,
        args: Vec<TypeExpr>,
        position: Span,
    },
    /// `(a, b) -> c`; `() -> c` takes `unit`.
    Function {
        params: Vec<TypeExpr>,
        ret: Box<TypeExpr>,
        position: Span,
    },
}

impl TypeExpr {
    pub fn position(&self) -> &Span {
        match self {
            TypeExpr::Named { position, .. } | TypeExpr::Function { position, .. } => position,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypeParam {
    pub name: String,
    pub position: Span,
}

/// A literal member of a union declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralTag {
    Str(String),
    Num(f64),
    Bool(bool),
}

/// One `|`-separated alternative on the right of `type X = ...`. Whether a bare
/// name is a constructor or a type is only known once declarations are
/// classified.
#[derive(Debug, Clone)]
pub enum TypeAlt {
    /// `Name` or `Name(field, ...)`
    Constructor {
        name: String,
        fields: Vec<TypeExpr>,
        has_parens: bool,
        position: Span,
    },
    Literal {
        value: LiteralTag,
        position: Span,
    },
    Type(TypeExpr),
}

impl TypeAlt {
    pub fn position(&self) -> &Span {
        match self {
            TypeAlt::Constructor { position, .. } | TypeAlt::Literal { position, .. } => position,
            TypeAlt::Type(ty) => ty.position(),
        }
    }
}
