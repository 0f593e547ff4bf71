use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeVar {
    pub id: usize,
    pub name: Option<String>,
}

impl TypeVar {
    pub fn new(id: usize) -> Self {
        Self { id, name: None }
    }

    pub fn with_name(id: usize, name: String) -> Self {
        Self {
            id,
            name: Some(name),
        }
    }
}

impl fmt::Display for TypeVar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "'{}", name),
            None => write!(f, "'t{}", self.id),
        }
    }
}

/// A single member of a union type.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Str(String),
    Num(f64),
    Bool(bool),
    Type(Type),
}

impl Tag {
    pub fn is_literal(&self) -> bool {
        !matches!(self, Tag::Type(_))
    }

    /// The primitive type a literal tag belongs to.
    pub fn literal_type(&self) -> Option<Type> {
        match self {
            Tag::Str(_) => Some(Type::String),
            Tag::Num(_) => Some(Type::Number),
            Tag::Bool(_) => Some(Type::Boolean),
            Tag::Type(_) => None,
        }
    }

    pub fn pretty(&self) -> String {
        match self {
            Tag::Str(s) => format!("{:?}", s),
            Tag::Num(n) => format_number(*n),
            Tag::Bool(b) => b.to_string(),
            Tag::Type(ty) => ty.pretty(),
        }
    }
}

/// A set of tags. Two unions are equal when their tag sets are equal; the
/// declared name is only used for display.
#[derive(Debug, Clone)]
pub struct UnionType {
    pub name: Option<String>,
    pub tags: Vec<Tag>,
}

impl UnionType {
    pub fn new(name: Option<String>, tags: Vec<Tag>) -> Self {
        let mut unique: Vec<Tag> = Vec::with_capacity(tags.len());
        for tag in tags {
            if !unique.contains(&tag) {
                unique.push(tag);
            }
        }
        UnionType { name, tags: unique }
    }

    /// An anonymous union holding exactly one literal, used to report a literal
    /// that does not belong to an expected union.
    pub fn literal(tag: Tag) -> Self {
        UnionType {
            name: None,
            tags: vec![tag],
        }
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    pub fn same_tags(&self, other: &UnionType) -> bool {
        self.tags.len() == other.tags.len() && self.tags.iter().all(|t| other.tags.contains(t))
    }
}

impl PartialEq for UnionType {
    fn eq(&self, other: &Self) -> bool {
        self.same_tags(other)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Number,
    String,
    Boolean,
    Unit,
    Var(TypeVar),
    Func(Box<Type>, Box<Type>),
    /// Opaque parametrized type, e.g. a foreign handle declared with `type Handle<T>;`.
    Generic {
        name: String,
        args: Vec<Type>,
    },
    Union(UnionType),
    /// Reference to an algebraic data type; constructors live in the type table.
    Adt {
        name: String,
        args: Vec<Type>,
    },
}

impl Type {
    pub fn func(t1: Type, t2: Type) -> Self {
        Type::Func(Box::new(t1), Box::new(t2))
    }

    /// Build the curried function type `p1 -> p2 -> ... -> ret`.
    pub fn curried(params: Vec<Type>, ret: Type) -> Self {
        params
            .into_iter()
            .rev()
            .fold(ret, |acc, param| Type::func(param, acc))
    }

    pub fn adt(name: impl Into<String>, args: Vec<Type>) -> Self {
        Type::Adt {
            name: name.into(),
            args,
        }
    }

    /// Number of parameters in the curried spine of a function type.
    pub fn arity(&self) -> usize {
        match self {
            Type::Func(_, ret) => 1 + ret.arity(),
            _ => 0,
        }
    }

    /// Split a function type into its parameter types and final result.
    pub fn uncurry(&self) -> (Vec<&Type>, &Type) {
        let mut params = Vec::new();
        let mut current = self;
        while let Type::Func(param, ret) = current {
            params.push(param.as_ref());
            current = ret;
        }
        (params, current)
    }

    pub fn free_type_vars(&self) -> HashSet<TypeVar> {
        self.type_vars().into_iter().collect()
    }

    /// Free type variables in order of first occurrence.
    pub fn type_vars(&self) -> Vec<TypeVar> {
        let mut vars = Vec::new();
        self.collect_vars(&mut vars);
        vars
    }

    fn collect_vars(&self, vars: &mut Vec<TypeVar>) {
        match self {
            Type::Number | Type::String | Type::Boolean | Type::Unit => {}
            Type::Var(v) => {
                if !vars.contains(v) {
                    vars.push(v.clone());
                }
            }
            Type::Func(t1, t2) => {
                t1.collect_vars(vars);
                t2.collect_vars(vars);
            }
            Type::Generic { args, .. } | Type::Adt { args, .. } => {
                for arg in args {
                    arg.collect_vars(vars);
                }
            }
            Type::Union(union) => {
                for tag in &union.tags {
                    if let Tag::Type(ty) = tag {
                        ty.collect_vars(vars);
                    }
                }
            }
        }
    }

    /// Replace variables in a single pass. Replacement types are not visited
    /// again, so a mapping may safely mention the variables it replaces.
    pub fn replace_vars(&self, mapping: &HashMap<TypeVar, Type>) -> Type {
        match self {
            Type::Number | Type::String | Type::Boolean | Type::Unit => self.clone(),
            Type::Var(v) => mapping.get(v).cloned().unwrap_or_else(|| self.clone()),
            Type::Func(t1, t2) => Type::func(t1.replace_vars(mapping), t2.replace_vars(mapping)),
            Type::Generic { name, args } => Type::Generic {
                name: name.clone(),
                args: args.iter().map(|a| a.replace_vars(mapping)).collect(),
            },
            Type::Adt { name, args } => Type::Adt {
                name: name.clone(),
                args: args.iter().map(|a| a.replace_vars(mapping)).collect(),
            },
            Type::Union(union) => Type::Union(UnionType {
                name: union.name.clone(),
                tags: union
                    .tags
                    .iter()
                    .map(|tag| match tag {
                        Tag::Type(t) => Tag::Type(t.replace_vars(mapping)),
                        literal => literal.clone(),
                    })
                    .collect(),
            }),
        }
    }

    pub fn pretty(&self) -> String {
        match self {
            Type::Number => "number".to_string(),
            Type::String => "string".to_string(),
            Type::Boolean => "boolean".to_string(),
            Type::Unit => "unit".to_string(),
            Type::Var(v) => v.to_string(),
            Type::Func(t1, t2) => {
                let t1_str = if matches!(**t1, Type::Func(_, _) | Type::Union(_)) {
                    format!("({})", t1.pretty())
                } else {
                    t1.pretty()
                };
                format!("{} -> {}", t1_str, t2.pretty())
            }
            Type::Generic { name, args } | Type::Adt { name, args } => {
                if args.is_empty() {
                    name.clone()
                } else {
                    let args: Vec<_> = args.iter().map(Type::pretty).collect();
                    format!("{}<{}>", name, args.join(", "))
                }
            }
            Type::Union(union) => match &union.name {
                Some(name) => name.clone(),
                None => {
                    let tags: Vec<_> = union.tags.iter().map(Tag::pretty).collect();
                    tags.join(" | ")
                }
            },
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.pretty())
    }
}

/// Render a number the way it is written in source: integral values lose the
/// trailing `.0`.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeScheme {
    pub vars: Vec<TypeVar>,
    pub ty: Type,
}

impl TypeScheme {
    pub fn monomorphic(ty: Type) -> Self {
        TypeScheme {
            vars: Vec::new(),
            ty,
        }
    }

    pub fn polymorphic(vars: Vec<TypeVar>, ty: Type) -> Self {
        TypeScheme { vars, ty }
    }

    /// Quantify over every free variable of `ty`.
    pub fn closed(ty: Type) -> Self {
        TypeScheme {
            vars: ty.type_vars(),
            ty,
        }
    }

    pub fn free_type_vars(&self) -> HashSet<TypeVar> {
        self.ty
            .free_type_vars()
            .into_iter()
            .filter(|v| !self.vars.contains(v))
            .collect()
    }
}

impl fmt::Display for TypeScheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.vars.is_empty() {
            write!(f, "{}", self.ty)
        } else {
            let vars: Vec<_> = self.vars.iter().map(TypeVar::to_string).collect();
            write!(f, "forall {}. {}", vars.join(" "), self.ty)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_type_vars_concrete() {
        let ty = Type::func(Type::Number, Type::String);
        assert!(ty.free_type_vars().is_empty());
    }

    #[test]
    fn test_free_type_vars_single() {
        let var = TypeVar::new(0);
        let ty = Type::Var(var.clone());
        let free = ty.free_type_vars();
        assert_eq!(free.len(), 1);
        assert!(free.contains(&var));
    }

    #[test]
    fn test_type_vars_in_order() {
        let a = TypeVar::new(3);
        let b = TypeVar::new(1);
        let ty = Type::func(
            Type::adt("Pair", vec![Type::Var(a.clone()), Type::Var(b.clone())]),
            Type::Var(a.clone()),
        );
        assert_eq!(ty.type_vars(), vec![a, b]);
    }

    #[test]
    fn test_curried_and_arity() {
        let ty = Type::curried(vec![Type::Number, Type::String], Type::Boolean);
        assert_eq!(ty.arity(), 2);
        assert_eq!(ty.pretty(), "number -> string -> boolean");

        let (params, ret) = ty.uncurry();
        assert_eq!(params, vec![&Type::Number, &Type::String]);
        assert_eq!(ret, &Type::Boolean);
    }

    #[test]
    fn test_curried_without_params() {
        assert_eq!(Type::curried(vec![], Type::Number), Type::Number);
    }

    #[test]
    fn test_replace_vars_single_pass() {
        let a = TypeVar::new(0);
        let b = TypeVar::new(1);
        let mapping: HashMap<_, _> = [
            (a.clone(), Type::Var(b.clone())),
            (b.clone(), Type::Var(a.clone())),
        ]
        .into_iter()
        .collect();
        let ty = Type::adt("Pair", vec![Type::Var(a.clone()), Type::Var(b.clone())]);
        assert_eq!(
            ty.replace_vars(&mapping),
            Type::adt("Pair", vec![Type::Var(b), Type::Var(a)])
        );
    }

    #[test]
    fn test_pretty_print_simple() {
        assert_eq!(Type::Number.pretty(), "number");
        assert_eq!(Type::String.pretty(), "string");
        assert_eq!(Type::Unit.pretty(), "unit");
        assert_eq!(Type::Boolean.pretty(), "boolean");
    }

    #[test]
    fn test_pretty_print_var() {
        let var = TypeVar::with_name(0, "T".to_string());
        assert_eq!(Type::Var(var).pretty(), "'T");
        assert_eq!(Type::Var(TypeVar::new(4)).pretty(), "'t4");
    }

    #[test]
    fn test_pretty_print_nested_function() {
        let ty = Type::func(Type::func(Type::Number, Type::Number), Type::String);
        assert_eq!(ty.pretty(), "(number -> number) -> string");
    }

    #[test]
    fn test_pretty_print_parametrized() {
        let ty = Type::adt("Option", vec![Type::Number]);
        assert_eq!(ty.pretty(), "Option<number>");
    }

    #[test]
    fn test_pretty_print_union() {
        let anonymous = Type::Union(UnionType::new(
            None,
            vec![Tag::Str("a".into()), Tag::Num(2.0), Tag::Type(Type::Boolean)],
        ));
        assert_eq!(anonymous.pretty(), r#""a" | 2 | boolean"#);

        let named = Type::Union(UnionType::new(Some("Status".into()), vec![]));
        assert_eq!(named.pretty(), "Status");
    }

    #[test]
    fn test_union_equality_ignores_order_and_name() {
        let a = UnionType::new(
            Some("Status".into()),
            vec![Tag::Str("loading".into()), Tag::Str("done".into())],
        );
        let b = UnionType::new(None, vec![Tag::Str("done".into()), Tag::Str("loading".into())]);
        assert_eq!(Type::Union(a), Type::Union(b));
    }

    #[test]
    fn test_union_tags_are_unique() {
        let union = UnionType::new(None, vec![Tag::Num(1.0), Tag::Num(1.0), Tag::Num(2.0)]);
        assert_eq!(union.tags.len(), 2);
    }

    #[test]
    fn test_union_inequality_on_different_sets() {
        let a = UnionType::new(None, vec![Tag::Str("a".into())]);
        let b = UnionType::new(None, vec![Tag::Str("a".into()), Tag::Str("b".into())]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(1.5), "1.5");
    }

    #[test]
    fn test_scheme_display() {
        let t = TypeVar::with_name(0, "T".to_string());
        let scheme =
            TypeScheme::polymorphic(vec![t.clone()], Type::func(Type::Var(t.clone()), Type::Var(t)));
        assert_eq!(scheme.to_string(), "forall 'T. 'T -> 'T");
    }

    #[test]
    fn test_scheme_free_vars_exclude_quantified() {
        let a = TypeVar::new(0);
        let b = TypeVar::new(1);
        let scheme = TypeScheme::polymorphic(
            vec![a.clone()],
            Type::func(Type::Var(a), Type::Var(b.clone())),
        );
        let free = scheme.free_type_vars();
        assert_eq!(free.len(), 1);
        assert!(free.contains(&b));
    }
}
