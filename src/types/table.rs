//! # Declared Types
//!
//! A module's `type` declarations are classified once, when they are checked,
//! and stored here:
//!
//! ```text
//! type Option<T> = Some(T) | None;          // ADT: every alternative is constructor-shaped
//! type Id = string;                         // alias: a single known type
//! type Status = "loading" | "done";         // union: anything else
//! type Handle<T>;                           // opaque
//! ```
//!
//! A bare alternative such as `None` is a constructor unless it names a type
//! that is already known (`number`, a declared type, a type parameter). ADT
//! references stay `Type::Adt { name, args }`; the constructor list is looked up
//! here, which keeps recursive types like `List<T>` finite.
//!
//! Types imported from another module are registered under qualified names
//! (`Math.Shape`, `Math.Circle`).

use std::collections::{HashMap, HashSet};

use crate::ast::statement::TypeDecl;
use crate::ast::types::{LiteralTag, TypeAlt, TypeExpr};

use super::error::TypeError;
use super::ty::{Tag, Type, TypeScheme, TypeVar, UnionType};

#[derive(Debug, Clone, PartialEq)]
pub struct Constructor {
    /// Runtime discriminant, always the unqualified name.
    pub name: String,
    /// Key of the owning ADT in the table.
    pub adt: String,
    /// Field types in terms of the ADT's parameters.
    pub fields: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdtDef {
    pub name: String,
    pub params: Vec<TypeVar>,
    pub constructors: Vec<Constructor>,
}

impl AdtDef {
    pub fn constructor(&self, name: &str) -> Option<&Constructor> {
        self.constructors.iter().find(|c| c.name == name)
    }

    pub fn constructor_names(&self) -> Vec<&str> {
        self.constructors.iter().map(|c| c.name.as_str()).collect()
    }

    /// Field types of `ctor` for the instance `Name<args>`.
    pub fn field_types(&self, ctor: &Constructor, args: &[Type]) -> Vec<Type> {
        let mapping: HashMap<_, _> = self.params.iter().cloned().zip(args.iter().cloned()).collect();
        ctor.fields.iter().map(|f| f.replace_vars(&mapping)).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasDef {
    pub params: Vec<TypeVar>,
    pub ty: Type,
}

/// What a type declaration turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Adt,
    Alias,
    Union,
    Opaque,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeTable {
    adts: HashMap<String, AdtDef>,
    aliases: HashMap<String, AliasDef>,
    opaque: HashMap<String, usize>,
    /// Constructor key -> ADT key.
    constructors: HashMap<String, String>,
    next_var: usize,
}

const PRIMITIVES: [&str; 4] = ["number", "string", "boolean", "unit"];

fn primitive(name: &str) -> Option<Type> {
    match name {
        "number" => Some(Type::Number),
        "string" => Some(Type::String),
        "boolean" => Some(Type::Boolean),
        "unit" => Some(Type::Unit),
        _ => None,
    }
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adt(&self, name: &str) -> Option<&AdtDef> {
        self.adts.get(name)
    }

    /// Look up a constructor by key (`Some`, or `Math.Circle` for imports).
    pub fn constructor(&self, key: &str) -> Option<(&AdtDef, &Constructor)> {
        let adt = self.adts.get(self.constructors.get(key)?)?;
        let name = key.rsplit('.').next().unwrap_or(key);
        adt.constructor(name).map(|ctor| (adt, ctor))
    }

    pub fn is_constructor(&self, key: &str) -> bool {
        self.constructors.contains_key(key)
    }

    /// `forall params. field1 -> ... -> Name<params>`; nullary constructors
    /// are plain values of the ADT type.
    pub fn constructor_scheme(&self, key: &str) -> Option<TypeScheme> {
        let (adt, ctor) = self.constructor(key)?;
        let result = Type::adt(
            adt.name.clone(),
            adt.params.iter().cloned().map(Type::Var).collect(),
        );
        Some(TypeScheme::polymorphic(
            adt.params.clone(),
            Type::curried(ctor.fields.clone(), result),
        ))
    }

    fn is_known_type(&self, name: &str, scope: &HashMap<String, Type>) -> bool {
        PRIMITIVES.contains(&name)
            || scope.contains_key(name)
            || self.adts.contains_key(name)
            || self.aliases.contains_key(name)
            || self.opaque.contains_key(name)
    }

    fn fresh_param(&mut self, name: &str) -> TypeVar {
        let var = TypeVar::with_name(self.next_var, name.to_string());
        self.next_var += 1;
        var
    }

    /// Classify and register a `type` declaration.
    pub fn declare(&mut self, decl: &TypeDecl) -> Result<DeclKind, TypeError> {
        let params: Vec<TypeVar> = decl.params.iter().map(|p| self.fresh_param(&p.name)).collect();
        let scope: HashMap<String, Type> = decl
            .params
            .iter()
            .zip(&params)
            .map(|(p, v)| (p.name.clone(), Type::Var(v.clone())))
            .collect();

        let Some(alternatives) = &decl.alternatives else {
            self.opaque.insert(decl.name.clone(), params.len());
            log::trace!("declared opaque type {}", decl.name);
            return Ok(DeclKind::Opaque);
        };

        if self.is_adt_shaped(&decl.name, alternatives, &scope) {
            self.declare_adt(decl, params, alternatives, &scope)?;
            return Ok(DeclKind::Adt);
        }

        match alternatives.as_slice() {
            [single] if !matches!(single, TypeAlt::Literal { .. }) => {
                let ty = self.resolve_alt(single, &scope)?;
                self.aliases.insert(decl.name.clone(), AliasDef { params, ty });
                log::trace!("declared alias {}", decl.name);
                return Ok(DeclKind::Alias);
            }
            _ => {}
        }

        let tags = alternatives
            .iter()
            .map(|alt| match alt {
                TypeAlt::Literal { value, .. } => Ok(match value {
                    LiteralTag::Str(s) => Tag::Str(s.clone()),
                    LiteralTag::Num(n) => Tag::Num(*n),
                    LiteralTag::Bool(b) => Tag::Bool(*b),
                }),
                alt => self.resolve_alt(alt, &scope).map(Tag::Type),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let union = Type::Union(UnionType::new(Some(decl.name.clone()), tags));
        self.aliases.insert(decl.name.clone(), AliasDef { params, ty: union });
        log::trace!("declared union {}", decl.name);
        Ok(DeclKind::Union)
    }

    fn is_adt_shaped(&self, name: &str, alternatives: &[TypeAlt], scope: &HashMap<String, Type>) -> bool {
        alternatives.iter().all(|alt| match alt {
            TypeAlt::Constructor {
                name: ctor,
                has_parens,
                ..
            } => *has_parens || (ctor != name && !self.is_known_type(ctor, scope)),
            _ => false,
        })
    }

    fn declare_adt(
        &mut self,
        decl: &TypeDecl,
        params: Vec<TypeVar>,
        alternatives: &[TypeAlt],
        scope: &HashMap<String, Type>,
    ) -> Result<(), TypeError> {
        // Registered before the fields are resolved so they may refer to it.
        self.adts.insert(
            decl.name.clone(),
            AdtDef {
                name: decl.name.clone(),
                params: params.clone(),
                constructors: vec![],
            },
        );

        let mut constructors = Vec::with_capacity(alternatives.len());
        for alt in alternatives {
            if let TypeAlt::Constructor { name, fields, .. } = alt {
                let fields = fields
                    .iter()
                    .map(|f| self.resolve(f, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                constructors.push(Constructor {
                    name: name.clone(),
                    adt: decl.name.clone(),
                    fields,
                });
            }
        }

        for ctor in &constructors {
            self.constructors.insert(ctor.name.clone(), decl.name.clone());
        }
        log::trace!(
            "declared ADT {} with constructors {:?}",
            decl.name,
            constructors.iter().map(|c| &c.name).collect::<Vec<_>>()
        );
        self.adts.insert(
            decl.name.clone(),
            AdtDef {
                name: decl.name.clone(),
                params,
                constructors,
            },
        );
        Ok(())
    }

    fn resolve_alt(&self, alt: &TypeAlt, scope: &HashMap<String, Type>) -> Result<Type, TypeError> {
        match alt {
            TypeAlt::Type(expr) => self.resolve(expr, scope),
            TypeAlt::Constructor {
                name,
                has_parens: false,
                position,
                ..
            } => self.resolve(
                &TypeExpr::Named {
                    module: None,
                    name: name.clone(),
                    args: vec![],
                    position: position.clone(),
                },
                scope,
            ),
            TypeAlt::Constructor { name, position, .. } => {
                Err(TypeError::unbound("type", name.clone(), position.clone()))
            }
            TypeAlt::Literal { position, .. } => {
                Err(TypeError::unbound("type", "literal", position.clone()))
            }
        }
    }

    /// Turn a surface annotation into a type. `scope` holds the type
    /// parameters visible at the annotation.
    pub fn resolve(&self, expr: &TypeExpr, scope: &HashMap<String, Type>) -> Result<Type, TypeError> {
        match expr {
            TypeExpr::Function { params, ret, .. } => {
                let ret = self.resolve(ret, scope)?;
                let params = if params.is_empty() {
                    vec![Type::Unit]
                } else {
                    params
                        .iter()
                        .map(|p| self.resolve(p, scope))
                        .collect::<Result<Vec<_>, _>>()?
                };
                Ok(Type::curried(params, ret))
            }
            TypeExpr::Named {
                module,
                name,
                args,
                position,
            } => {
                let args = args
                    .iter()
                    .map(|a| self.resolve(a, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                let key = match module {
                    Some(module) => format!("{}.{}", module, name),
                    None => {
                        if let Some(ty) = scope.get(name).cloned().or_else(|| primitive(name)) {
                            check_arity(name, 0, args.len(), position)?;
                            return Ok(ty);
                        }
                        name.clone()
                    }
                };

                if let Some(adt) = self.adts.get(&key) {
                    check_arity(&key, adt.params.len(), args.len(), position)?;
                    return Ok(Type::adt(key, args));
                }
                if let Some(alias) = self.aliases.get(&key) {
                    check_arity(&key, alias.params.len(), args.len(), position)?;
                    let mapping = alias.params.iter().cloned().zip(args).collect();
                    return Ok(alias.ty.replace_vars(&mapping));
                }
                if let Some(arity) = self.opaque.get(&key) {
                    check_arity(&key, *arity, args.len(), position)?;
                    return Ok(Type::Generic { name: key, args });
                }
                Err(TypeError::unbound("type", key, position.clone()))
            }
        }
    }

    /// Register the exported types of another module.
    pub fn import(&mut self, types: &TypeTable) {
        self.adts
            .extend(types.adts.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.aliases
            .extend(types.aliases.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.opaque
            .extend(types.opaque.iter().map(|(k, v)| (k.clone(), *v)));
        self.constructors
            .extend(types.constructors.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Names of the types declared by this module itself, as opposed to
    /// imported ones.
    pub fn local_type_names(&self) -> HashSet<String> {
        self.adts
            .keys()
            .chain(self.aliases.keys())
            .chain(self.opaque.keys())
            .filter(|name| !name.contains('.'))
            .cloned()
            .collect()
    }

    /// The part of this table an importer sees: the `exported` local types,
    /// renamed to `module.Name`.
    pub fn export(&self, module: &str, exported: &HashSet<String>) -> TypeTable {
        let local = self.local_type_names();
        let qualify_key = |name: &str| format!("{}.{}", module, name);
        let mut table = TypeTable::new();

        for (name, adt) in self.adts.iter().filter(|(n, _)| exported.contains(*n)) {
            let key = qualify_key(name);
            let constructors = adt
                .constructors
                .iter()
                .map(|c| Constructor {
                    name: c.name.clone(),
                    adt: key.clone(),
                    fields: c.fields.iter().map(|f| qualify(f, module, &local)).collect(),
                })
                .collect::<Vec<_>>();
            for ctor in &constructors {
                table.constructors.insert(qualify_key(&ctor.name), key.clone());
            }
            table.adts.insert(
                key.clone(),
                AdtDef {
                    name: key,
                    params: adt.params.clone(),
                    constructors,
                },
            );
        }

        for (name, alias) in self.aliases.iter().filter(|(n, _)| exported.contains(*n)) {
            table.aliases.insert(
                qualify_key(name),
                AliasDef {
                    params: alias.params.clone(),
                    ty: qualify(&alias.ty, module, &local),
                },
            );
        }

        for (name, arity) in self.opaque.iter().filter(|(n, _)| exported.contains(*n)) {
            table.opaque.insert(qualify_key(name), *arity);
        }

        table
    }
}

fn check_arity(name: &str, expected: usize, found: usize, position: &lachs::Span) -> Result<(), TypeError> {
    if expected == found {
        Ok(())
    } else {
        Err(TypeError::ArityMismatch {
            what: format!("type {}", name),
            expected,
            found,
            span: position.clone(),
        })
    }
}

/// Rename references to the module's own types to their qualified names.
pub fn qualify(ty: &Type, module: &str, local: &HashSet<String>) -> Type {
    let rename = |name: &String| {
        if local.contains(name) {
            format!("{}.{}", module, name)
        } else {
            name.clone()
        }
    };
    match ty {
        Type::Number | Type::String | Type::Boolean | Type::Unit | Type::Var(_) => ty.clone(),
        Type::Func(t1, t2) => Type::func(qualify(t1, module, local), qualify(t2, module, local)),
        Type::Generic { name, args } => Type::Generic {
            name: rename(name),
            args: args.iter().map(|a| qualify(a, module, local)).collect(),
        },
        Type::Adt { name, args } => Type::Adt {
            name: rename(name),
            args: args.iter().map(|a| qualify(a, module, local)).collect(),
        },
        Type::Union(union) => Type::Union(UnionType {
            name: union.name.as_ref().map(rename),
            tags: union
                .tags
                .iter()
                .map(|tag| match tag {
                    Tag::Type(t) => Tag::Type(qualify(t, module, local)),
                    literal => literal.clone(),
                })
                .collect(),
        }),
    }
}
