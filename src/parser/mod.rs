//! Combinator-based recursive descent parser.
//!
//! [`parse`] turns a token stream into an untyped [`Module`], collecting one
//! error per malformed top-level item.

mod combinators;
mod grammar;
mod state;

pub use grammar::{parse, parse_signatures};
pub use state::{ParseError, ParseResult, ParseState};

use crate::ast::Module;
use crate::lexer::{Token, strip_comments};

/// Errors from turning source text into a module.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("lexing failed: {0}")]
    Lex(String),
    #[error("{}", .0.first().map(ToString::to_string).unwrap_or_default())]
    Parse(Vec<ParseError>),
}

/// Lex and parse a complete source file.
pub fn parse_source(source: &str) -> Result<Module<()>, SourceError> {
    let tokens = Token::lex(&strip_comments(source)).map_err(|e| SourceError::Lex(e.to_string()))?;
    let mut state = ParseState::new(tokens);
    match parse(&mut state) {
        (Some(module), errors) if errors.is_empty() => Ok(module),
        (_, errors) => Err(SourceError::Parse(errors)),
    }
}
