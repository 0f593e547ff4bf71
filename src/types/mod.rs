//! Type model, unification and inference.

pub mod env;
pub mod error;
pub mod foreign;
pub mod infer;
pub mod interface;
pub mod subst;
pub mod table;
pub mod ty;
pub mod unify;

pub use env::{Binding, TypeEnv};
pub use error::{ErrorKind, TypeError};
pub use foreign::{ForeignSignature, SignatureError, SignatureTable};
pub use infer::{CheckedModule, Infer, infer};
pub use interface::ModuleInterface;
pub use subst::Substitution;
pub use table::{AdtDef, Constructor, TypeTable};
pub use ty::{Tag, Type, TypeScheme, TypeVar, UnionType};
pub use unify::{UnifyError, unify};
