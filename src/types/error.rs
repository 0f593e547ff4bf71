//! # Type Error Definitions
//!
//! Errors raised while checking a module. Every error is detected at the node
//! where the violation first becomes observable and carries that node's span:
//!
//! - a name is used but never bound (`UnboundIdentifier`)
//! - two types cannot be made equal (`Unification`)
//! - a type would contain itself (`RecursiveType`)
//! - an immutable binding is assigned to (`ImmutableAssignment`)
//! - a constructor, type or call gets the wrong number of arguments (`ArityMismatch`)
//! - a `match` misses cases or has unreachable arms (`NonExhaustiveMatch`, `RedundantPattern`)
//! - a foreign import has no signature (`UndeclaredForeignSignature`)
//!
//! ## Error Reporting
//!
//! The `Display` implementation is a one-line message. [`TypeError::render`]
//! adds the source snippet when the span carries source text.

use lachs::Span;
use thiserror::Error;

use super::ty::{Type, TypeVar};
use super::unify::UnifyError;

/// Discriminant of a [`TypeError`], for drivers that dispatch on the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnboundIdentifier,
    Unification,
    RecursiveType,
    ImmutableAssignment,
    ArityMismatch,
    NonExhaustiveMatch,
    RedundantPattern,
    UndeclaredForeignSignature,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::UnboundIdentifier => "UnboundIdentifierError",
            ErrorKind::Unification => "UnificationError",
            ErrorKind::RecursiveType => "RecursiveTypeError",
            ErrorKind::ImmutableAssignment => "ImmutableAssignmentError",
            ErrorKind::ArityMismatch => "ArityMismatchError",
            ErrorKind::NonExhaustiveMatch => "NonExhaustiveMatchError",
            ErrorKind::RedundantPattern => "RedundantPatternError",
            ErrorKind::UndeclaredForeignSignature => "UndeclaredForeignSignatureError",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    /// Reference to a value, type, constructor or module that is not in scope.
    #[error("unbound {what}: {name}")]
    UnboundIdentifier {
        what: &'static str,
        name: String,
        span: Span,
    },

    /// Two types that must be equal are not.
    #[error("type mismatch: expected {expected}, found {found}{}", .context.as_ref().map(|c| format!(" ({})", c)).unwrap_or_default())]
    Unification {
        expected: Type,
        found: Type,
        span: Span,
        context: Option<String>,
    },

    /// Occurs check failure, e.g. `'t0 = 't0 -> number`.
    #[error("cannot construct infinite type: {var} = {ty}")]
    RecursiveType { var: TypeVar, ty: Type, span: Span },

    #[error("cannot assign to immutable binding '{name}'")]
    ImmutableAssignment { name: String, span: Span },

    #[error("{what} expects {expected} argument(s), but {found} were given")]
    ArityMismatch {
        what: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("non-exhaustive match: missing {}", .missing.join(", "))]
    NonExhaustiveMatch { missing: Vec<String>, span: Span },

    #[error("unreachable pattern in match arm {}", .arm + 1)]
    RedundantPattern { arm: usize, span: Span },

    #[error("foreign import '{name}' has no type signature")]
    UndeclaredForeignSignature { name: String, span: Span },
}

impl TypeError {
    pub fn unbound(what: &'static str, name: impl Into<String>, span: Span) -> Self {
        TypeError::UnboundIdentifier {
            what,
            name: name.into(),
            span,
        }
    }

    pub fn mismatch(expected: Type, found: Type, span: Span) -> Self {
        TypeError::Unification {
            expected,
            found,
            span,
            context: None,
        }
    }

    /// Add context to this error (only affects `Unification`).
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        if let TypeError::Unification { context: ctx, .. } = &mut self {
            *ctx = Some(context.into());
        }
        self
    }

    /// Attach a source span to a unification failure.
    pub fn from_unify_error(err: UnifyError, span: Span) -> Self {
        match err {
            UnifyError::Mismatch { expected, found } => TypeError::mismatch(expected, found, span),
            UnifyError::OccursCheck { var, ty } => TypeError::RecursiveType { var, ty, span },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TypeError::UnboundIdentifier { .. } => ErrorKind::UnboundIdentifier,
            TypeError::Unification { .. } => ErrorKind::Unification,
            TypeError::RecursiveType { .. } => ErrorKind::RecursiveType,
            TypeError::ImmutableAssignment { .. } => ErrorKind::ImmutableAssignment,
            TypeError::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            TypeError::NonExhaustiveMatch { .. } => ErrorKind::NonExhaustiveMatch,
            TypeError::RedundantPattern { .. } => ErrorKind::RedundantPattern,
            TypeError::UndeclaredForeignSignature { .. } => ErrorKind::UndeclaredForeignSignature,
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            TypeError::UnboundIdentifier { span, .. }
            | TypeError::Unification { span, .. }
            | TypeError::RecursiveType { span, .. }
            | TypeError::ImmutableAssignment { span, .. }
            | TypeError::ArityMismatch { span, .. }
            | TypeError::NonExhaustiveMatch { span, .. }
            | TypeError::RedundantPattern { span, .. }
            | TypeError::UndeclaredForeignSignature { span, .. } => span,
        }
    }

    /// The offending types, if the error is about types.
    pub fn types(&self) -> Vec<&Type> {
        match self {
            TypeError::Unification {
                expected, found, ..
            } => vec![expected, found],
            TypeError::RecursiveType { ty, .. } => vec![ty],
            _ => vec![],
        }
    }

    /// Full diagnostic: the message with a source snippet when available.
    pub fn render(&self) -> String {
        let msg = format!("{}: {}", self.kind(), self);
        let span = self.span();
        if span.source.is_empty() {
            format!("Type error: {}", msg)
        } else {
            span.to_string(&msg)
        }
    }
}
