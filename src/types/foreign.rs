//! Signatures of bindings that live in the Lua runtime.
//!
//! Foreign code is never inspected; its declared type is taken on trust. A
//! signature comes either from the import itself
//! (`import foreign string.upper as upper: (string) -> string;`) or from a
//! [`SignatureTable`] built from signature source text:
//!
//! ```text
//! print: (string) -> unit;
//! tostring<T>: (T) -> string;
//! string.rep as repeat: (string, number) -> string;
//! ```
//!
//! Entries whose path is a single undotted name are Lua globals and are in scope
//! in every module without an import.

use std::collections::HashMap;

use crate::ast::statement::ForeignImport;
use crate::ast::types::TypeExpr;
use crate::parser::{self, ParseError, ParseState};
use crate::lexer::{Token, strip_comments};

use super::error::TypeError;
use super::table::TypeTable;
use super::ty::{Type, TypeScheme, TypeVar};

const PRELUDE: &str = "
print: (string) -> unit;
tostring<T>: (T) -> string;
error<T>: (string) -> T;
";

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignSignature {
    /// Dotted Lua path, e.g. `string.upper`.
    pub path: String,
    /// Name the binding is known by in exx code.
    pub name: String,
    pub scheme: TypeScheme,
    /// Number of arguments the Lua function takes natively, from the
    /// signature's parameter list. `None` for values that are not declared
    /// with a function signature.
    pub arity: Option<usize>,
}

impl ForeignSignature {
    /// Resolve the signature of a foreign import against the declared types.
    pub fn resolve(import: &ForeignImport, signature: &TypeExpr, types: &TypeTable) -> Result<Self, TypeError> {
        let scope: HashMap<String, Type> = import
            .type_params
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), Type::Var(TypeVar::with_name(i, p.name.clone()))))
            .collect();
        let ty = types.resolve(signature, &scope)?;
        let arity = match signature {
            TypeExpr::Function { params, .. } => Some(params.len()),
            TypeExpr::Named { .. } => None,
        };

        Ok(ForeignSignature {
            path: import.lua_path(),
            name: import.local_name().to_string(),
            scheme: TypeScheme::closed(ty),
            arity,
        })
    }

    pub fn is_global(&self) -> bool {
        !self.path.contains('.') && self.path == self.name
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("lexing failed: {0}")]
    Lex(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Foreign signatures keyed by Lua path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignatureTable {
    entries: HashMap<String, ForeignSignature>,
}

impl SignatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `print`, `tostring` and `error`.
    pub fn try_prelude() -> Result<Self, SignatureError> {
        Self::parse(PRELUDE)
    }

    /// [`SignatureTable::try_prelude`] for infallible defaults. A failure is
    /// logged and leaves the table empty.
    pub fn prelude() -> Self {
        Self::try_prelude().unwrap_or_else(|err| {
            log::error!("built-in foreign signatures are invalid: {}", err);
            Self::default()
        })
    }

    pub fn parse(source: &str) -> Result<Self, SignatureError> {
        let tokens = Token::lex(&strip_comments(source)).map_err(|e| SignatureError::Lex(e.to_string()))?;
        let mut state = ParseState::new(tokens);
        let entries = parser::parse_signatures(&mut state)?;

        let types = TypeTable::new();
        let mut table = SignatureTable::new();
        for entry in &entries {
            let Some(signature) = &entry.signature else {
                return Err(TypeError::UndeclaredForeignSignature {
                    name: entry.lua_path(),
                    span: entry.position.clone(),
                }
                .into());
            };
            table.insert(ForeignSignature::resolve(entry, signature, &types)?);
        }
        Ok(table)
    }

    pub fn insert(&mut self, signature: ForeignSignature) {
        self.entries.insert(signature.path.clone(), signature);
    }

    pub fn extend(&mut self, other: SignatureTable) {
        self.entries.extend(other.entries);
    }

    pub fn lookup(&self, path: &str) -> Option<&ForeignSignature> {
        self.entries.get(path)
    }

    /// Entries that are in scope without an import.
    pub fn globals(&self) -> impl Iterator<Item = &ForeignSignature> {
        self.entries.values().filter(|s| s.is_global())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_parses() {
        let prelude = SignatureTable::try_prelude();
        assert!(prelude.is_ok(), "{:?}", prelude.err());
    }

    #[test]
    fn test_prelude_entries() {
        let prelude = SignatureTable::prelude();
        assert_eq!(prelude.len(), 3);

        let print = prelude.lookup("print").unwrap();
        assert_eq!(print.scheme.ty, Type::func(Type::String, Type::Unit));
        assert_eq!(print.arity, Some(1));
        assert!(print.is_global());

        let tostring = prelude.lookup("tostring").unwrap();
        assert_eq!(tostring.scheme.to_string(), "forall 'T. 'T -> string");
    }

    #[test]
    fn test_parse_dotted_entry_with_alias() {
        let table = SignatureTable::parse("string.rep as repeat: (string, number) -> string;").unwrap();
        let rep = table.lookup("string.rep").unwrap();
        assert_eq!(rep.name, "repeat");
        assert_eq!(rep.arity, Some(2));
        assert!(!rep.is_global());
        assert_eq!(table.globals().count(), 0);
    }

    #[test]
    fn test_value_signature_has_no_arity() {
        let table = SignatureTable::parse("math.pi as pi: number;").unwrap();
        assert_eq!(table.lookup("math.pi").unwrap().arity, None);
    }

    #[test]
    fn test_entry_without_type_is_rejected() {
        let err = SignatureTable::parse("os.time;").unwrap_err();
        assert!(matches!(
            err,
            SignatureError::Type(TypeError::UndeclaredForeignSignature { .. })
        ));
    }

    #[test]
    fn test_unknown_type_parameter_is_rejected() {
        let err = SignatureTable::parse("id: (T) -> T;").unwrap_err();
        assert!(matches!(
            err,
            SignatureError::Type(TypeError::UnboundIdentifier { .. })
        ));
    }
}
