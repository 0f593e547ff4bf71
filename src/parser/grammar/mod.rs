//! Grammar for exx source files
//!
//! Parsing rules are organized by category:
//! - `literal`: identifiers, numbers, strings, booleans, unit
//! - `types`: type annotations and type parameter lists
//! - `pattern`: match arm patterns
//! - `expression`: lambdas, calls, operators, `if`, `match`, blocks
//! - `statement`: declarations, assignments, expression statements

mod expression;
mod literal;
mod pattern;
mod statement;
mod types;

use crate::ast::statement::{ForeignImport, Statement};
use crate::ast::{Item, Module};
use crate::lexer::Token;

use super::combinators::{BoxedParser, expect_export};
use super::state::{ParseError, ParseState, Parser};

use statement::{Parsed, foreign_signature, statement};

/// item := ["export"] statement
fn item() -> BoxedParser<Item<()>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let export = match state.peek() {
            Some(Token::Export(_)) => Some(expect_export().parse(state)?.pos()),
            _ => None,
        };

        let stmt = match statement().parse(state)? {
            Parsed::Statement(stmt) => stmt,
            Parsed::Trailing(expr) => {
                let err = state.error_here("expected ';' after expression");
                state.record_error(err.clone());
                return Err(ParseError {
                    position: err.position.or_else(|| Some(expr.position().clone())),
                    ..err
                });
            }
        };

        if export.is_some() && !exportable(&stmt) {
            let err = ParseError::new("only declarations can be exported").at(stmt.position().clone());
            state.record_error(err.clone());
            return Err(err);
        }

        let position = match &export {
            Some(start) => start.merge(stmt.position()),
            None => stmt.position().clone(),
        };

        Ok(Item {
            export: export.is_some(),
            statement: stmt,
            position,
        })
    })
}

fn exportable(stmt: &Statement<()>) -> bool {
    matches!(
        stmt,
        Statement::Let(_)
            | Statement::Function(_)
            | Statement::RecGroup(_)
            | Statement::TypeDecl(_)
            | Statement::ForeignImport(_)
    )
}

fn starts_item(token: &Token) -> bool {
    matches!(
        token,
        Token::Export(_)
            | Token::Let(_)
            | Token::Var(_)
            | Token::Fn(_)
            | Token::Rec(_)
            | Token::Type(_)
            | Token::Import(_)
    )
}

/// Skip tokens until something that looks like the start of a new top-level
/// item, tracking brace depth so nested declarations are skipped over.
fn skip_to_next_item(state: &mut ParseState) {
    // Skip current token first to make progress
    state.advance();

    let mut depth = 0usize;
    while let Some(tok) = state.peek() {
        match tok {
            Token::LBrace(_) => depth += 1,
            Token::RBrace(_) => depth = depth.saturating_sub(1),
            tok if depth == 0 && starts_item(tok) => break,
            _ => {}
        }
        state.advance();
    }
}

/// module := item*
/// With error recovery: if an item fails to parse, skip to the next one
pub fn module() -> BoxedParser<Module<()>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut items = Vec::new();

        while state.has_next() {
            let pos = state.position();
            state.reset_furthest();
            match item().parse(state) {
                Ok(item) => items.push(item),
                Err(err) => {
                    let furthest = state.get_furthest_error().cloned().unwrap_or(err);
                    state.collect_error(furthest);
                    state.restore(pos);
                    skip_to_next_item(state);
                }
            }
        }

        Ok(Module { items })
    })
}

/// Parse a complete module from the token stream.
/// Returns the parsed module along with every collected error; the module is
/// only meaningful when the error list is empty.
pub fn parse(state: &mut ParseState) -> (Option<Module<()>>, Vec<ParseError>) {
    let result = module().parse(state);

    let module = match result {
        Ok(module) => Some(module),
        Err(err) => {
            state.collect_error(err);
            None
        }
    };

    let errors = state.take_errors();
    (module, errors)
}

/// Parse a foreign signature table: a sequence of
/// `path ["as" name] ["<" T,* ">"] ":" type ";"` entries.
pub fn parse_signatures(state: &mut ParseState) -> Result<Vec<ForeignImport>, ParseError> {
    let mut entries = Vec::new();
    while state.has_next() {
        state.reset_furthest();
        match foreign_signature().parse(state) {
            Ok(entry) => entries.push(entry),
            Err(err) => return Err(state.get_furthest_error().cloned().unwrap_or(err)),
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::expression::Expression;

    fn parse_source(source: &str) -> (Option<Module<()>>, Vec<ParseError>) {
        let tokens = Token::lex(source).expect("lexing failed");
        let mut state = ParseState::new(tokens);
        parse(&mut state)
    }

    #[test]
    fn test_parse_empty_module() {
        let (module, errors) = parse_source("");
        assert!(errors.is_empty());
        assert!(module.unwrap().items.is_empty());
    }

    #[test]
    fn test_parse_export_flag() {
        let (module, errors) = parse_source("export let x = 1; let y = 2;");
        assert!(errors.is_empty(), "{:?}", errors);
        let module = module.unwrap();
        assert!(module.items[0].export);
        assert!(!module.items[1].export);
    }

    #[test]
    fn test_trailing_expression_needs_semicolon() {
        let (_, errors) = parse_source("let x = 1; x");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_recovery_continues_after_error() {
        let (module, errors) = parse_source("let = 1; let y = 2;");
        assert_eq!(errors.len(), 1);
        let module = module.unwrap();
        assert_eq!(module.items.len(), 1);
        assert_eq!(module.items[0].statement.declared_names(), vec!["y"]);
    }

    #[test]
    fn test_parse_signature_entries() {
        let tokens = Token::lex("print: (string) -> unit; string.upper as upper: (string) -> string;")
            .expect("lexing failed");
        let mut state = ParseState::new(tokens);
        let entries = parse_signatures(&mut state).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].local_name(), "print");
        assert_eq!(entries[1].lua_path(), "string.upper");
        assert_eq!(entries[1].local_name(), "upper");
    }

    #[test]
    fn test_block_like_statement_without_semicolon() {
        let (module, errors) = parse_source("if true { 1; } let y = 2;");
        assert!(errors.is_empty(), "{:?}", errors);
        let module = module.unwrap();
        assert!(matches!(
            module.items[0].statement,
            Statement::Expression(Expression::IfThenElse(_))
        ));
    }
}
