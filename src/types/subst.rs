use std::collections::HashMap;

use super::ty::{Tag, Type, TypeScheme, TypeVar, UnionType};

/// Mapping from solved type variables to types.
///
/// Bindings may refer to other bound variables; `apply` follows them until it
/// reaches an unbound variable. The occurs check in unification guarantees this
/// terminates, so applying a substitution twice gives the same result as
/// applying it once.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Substitution(pub HashMap<TypeVar, Type>);

impl Substitution {
    pub fn empty() -> Self {
        Substitution(HashMap::new())
    }

    pub fn singleton(var: TypeVar, ty: Type) -> Self {
        let mut map = HashMap::new();
        map.insert(var, ty);
        Substitution(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, var: &TypeVar) -> Option<&Type> {
        self.0.get(var)
    }

    pub fn apply(&self, ty: &Type) -> Type {
        match ty {
            Type::Number | Type::String | Type::Boolean | Type::Unit => ty.clone(),
            Type::Var(v) => match self.0.get(v) {
                Some(bound) => self.apply(bound),
                None => ty.clone(),
            },
            Type::Func(t1, t2) => Type::func(self.apply(t1), self.apply(t2)),
            Type::Generic { name, args } => Type::Generic {
                name: name.clone(),
                args: args.iter().map(|a| self.apply(a)).collect(),
            },
            Type::Adt { name, args } => Type::Adt {
                name: name.clone(),
                args: args.iter().map(|a| self.apply(a)).collect(),
            },
            Type::Union(union) => Type::Union(UnionType {
                name: union.name.clone(),
                tags: union
                    .tags
                    .iter()
                    .map(|tag| match tag {
                        Tag::Type(t) => Tag::Type(self.apply(t)),
                        literal => literal.clone(),
                    })
                    .collect(),
            }),
        }
    }

    /// Apply to the free part of a scheme, leaving quantified variables alone.
    pub fn apply_scheme(&self, scheme: &TypeScheme) -> TypeScheme {
        if scheme.vars.is_empty() {
            return TypeScheme::monomorphic(self.apply(&scheme.ty));
        }
        let mut restricted = self.clone();
        for var in &scheme.vars {
            restricted.0.remove(var);
        }
        TypeScheme::polymorphic(scheme.vars.clone(), restricted.apply(&scheme.ty))
    }

    /// `self` followed by `other`: applying the result equals applying `self`
    /// and then `other`.
    pub fn compose(&self, other: &Substitution) -> Substitution {
        let mut result = HashMap::new();

        for (var, ty) in &self.0 {
            result.insert(var.clone(), other.apply(&self.apply(ty)));
        }

        for (var, ty) in &other.0 {
            if !result.contains_key(var) {
                result.insert(var.clone(), other.apply(ty));
            }
        }

        Substitution(result)
    }

    pub fn insert(&mut self, var: TypeVar, ty: Type) {
        self.0.insert(var, ty);
    }

    pub fn extend(&mut self, other: Substitution) {
        for (var, ty) in other.0 {
            self.0.insert(var, ty);
        }
    }
}
