use crate::parser::SourceError;
use crate::types::{SignatureError, TypeError};

/// Anything that stops a module from compiling.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error("invalid foreign signatures: {0}")]
    Signature(#[from] SignatureError),
}

impl CompileError {
    /// The diagnostic with a source snippet where one is available.
    pub fn render(&self) -> String {
        match self {
            CompileError::Type(err) => err.render(),
            other => other.to_string(),
        }
    }

    pub fn as_type_error(&self) -> Option<&TypeError> {
        match self {
            CompileError::Type(err) => Some(err),
            _ => None,
        }
    }
}
