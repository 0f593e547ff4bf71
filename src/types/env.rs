use std::collections::{HashMap, HashSet};

use super::subst::Substitution;
use super::ty::{TypeScheme, TypeVar};

/// A name in scope: its scheme and whether it was declared with `var`.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub scheme: TypeScheme,
    pub mutable: bool,
}

impl Binding {
    pub fn immutable(scheme: TypeScheme) -> Self {
        Binding {
            scheme,
            mutable: false,
        }
    }

    pub fn mutable(scheme: TypeScheme) -> Self {
        Binding {
            scheme,
            mutable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeEnv {
    bindings: HashMap<String, Binding>,
    parent: Option<Box<TypeEnv>>,
}

impl TypeEnv {
    pub fn empty() -> Self {
        TypeEnv {
            bindings: HashMap::new(),
            parent: None,
        }
    }

    pub fn with_bindings(bindings: Vec<(String, TypeScheme)>) -> Self {
        TypeEnv {
            bindings: bindings
                .into_iter()
                .map(|(name, scheme)| (name, Binding::immutable(scheme)))
                .collect(),
            parent: None,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&TypeScheme> {
        self.lookup_binding(name).map(|b| &b.scheme)
    }

    pub fn lookup_binding(&self, name: &str) -> Option<&Binding> {
        self.bindings
            .get(name)
            .or_else(|| self.parent.as_ref().and_then(|p| p.lookup_binding(name)))
    }

    /// Bind `name` immutably in the innermost scope, shadowing any outer binding.
    pub fn extend(&self, name: String, scheme: TypeScheme) -> TypeEnv {
        self.extend_binding(name, Binding::immutable(scheme))
    }

    pub fn extend_mutable(&self, name: String, scheme: TypeScheme) -> TypeEnv {
        self.extend_binding(name, Binding::mutable(scheme))
    }

    pub fn extend_binding(&self, name: String, binding: Binding) -> TypeEnv {
        let mut new_bindings = self.bindings.clone();
        new_bindings.insert(name, binding);
        TypeEnv {
            bindings: new_bindings,
            parent: self.parent.clone(),
        }
    }

    /// Open a nested scope.
    pub fn with_parent(parent: TypeEnv) -> Self {
        TypeEnv {
            bindings: HashMap::new(),
            parent: Some(Box::new(parent)),
        }
    }

    /// Names bound in the innermost scope.
    pub fn local_names(&self) -> impl Iterator<Item = &String> {
        self.bindings.keys()
    }

    pub fn free_type_vars(&self) -> HashSet<TypeVar> {
        let mut free = HashSet::new();
        for binding in self.bindings.values() {
            free.extend(binding.scheme.free_type_vars());
        }
        if let Some(parent) = &self.parent {
            free.extend(parent.free_type_vars());
        }
        free
    }

    pub fn apply_subst(&self, subst: &Substitution) -> TypeEnv {
        let bindings = self
            .bindings
            .iter()
            .map(|(name, binding)| {
                (
                    name.clone(),
                    Binding {
                        scheme: subst.apply_scheme(&binding.scheme),
                        mutable: binding.mutable,
                    },
                )
            })
            .collect();

        TypeEnv {
            bindings,
            parent: self.parent.as_ref().map(|p| Box::new(p.apply_subst(subst))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    #[test]
    fn test_empty_env() {
        let env = TypeEnv::empty();
        assert!(env.lookup("x").is_none());
    }

    #[test]
    fn test_with_bindings() {
        let env = TypeEnv::with_bindings(vec![(
            "x".to_string(),
            TypeScheme::monomorphic(Type::Number),
        )]);
        assert_eq!(env.lookup("x").unwrap().ty, Type::Number);
        assert!(!env.lookup_binding("x").unwrap().mutable);
    }

    #[test]
    fn test_extend_shadows() {
        let env = TypeEnv::empty();
        let env = env.extend("x".to_string(), TypeScheme::monomorphic(Type::Number));
        let env = env.extend("x".to_string(), TypeScheme::monomorphic(Type::String));
        assert_eq!(env.lookup("x").unwrap().ty, Type::String);
    }

    #[test]
    fn test_extend_mutable() {
        let env = TypeEnv::empty().extend_mutable("x".to_string(), TypeScheme::monomorphic(Type::Number));
        assert!(env.lookup_binding("x").unwrap().mutable);
    }

    #[test]
    fn test_parent_lookup() {
        let parent = TypeEnv::empty().extend("x".to_string(), TypeScheme::monomorphic(Type::Number));
        let child = TypeEnv::with_parent(parent);
        assert_eq!(child.lookup("x").unwrap().ty, Type::Number);
        assert_eq!(child.local_names().count(), 0);
    }

    #[test]
    fn test_child_shadows_parent() {
        let parent = TypeEnv::empty().extend_mutable("x".to_string(), TypeScheme::monomorphic(Type::Number));
        let child = TypeEnv::with_parent(parent);
        let child = child.extend("x".to_string(), TypeScheme::monomorphic(Type::String));
        let binding = child.lookup_binding("x").unwrap();
        assert_eq!(binding.scheme.ty, Type::String);
        assert!(!binding.mutable);
    }

    #[test]
    fn test_free_type_vars_monomorphic() {
        let var = TypeVar::new(0);
        let env = TypeEnv::with_bindings(vec![(
            "x".to_string(),
            TypeScheme::monomorphic(Type::Var(var.clone())),
        )]);
        let free = env.free_type_vars();
        assert_eq!(free.len(), 1);
        assert!(free.contains(&var));
    }

    #[test]
    fn test_free_type_vars_polymorphic() {
        let var = TypeVar::new(0);
        let env = TypeEnv::with_bindings(vec![(
            "x".to_string(),
            TypeScheme::polymorphic(vec![var.clone()], Type::Var(var)),
        )]);
        assert!(env.free_type_vars().is_empty());
    }

    #[test]
    fn test_apply_subst_keeps_mutability() {
        let var = TypeVar::new(0);
        let env = TypeEnv::empty().extend_mutable(
            "x".to_string(),
            TypeScheme::monomorphic(Type::Var(var.clone())),
        );
        let env = env.apply_subst(&Substitution::singleton(var, Type::Number));
        let binding = env.lookup_binding("x").unwrap();
        assert_eq!(binding.scheme.ty, Type::Number);
        assert!(binding.mutable);
    }
}
