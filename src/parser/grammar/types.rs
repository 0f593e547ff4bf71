//! Type annotation parsers

use crate::ast::types::{TypeExpr, TypeParam};
use crate::lexer::Token;

use crate::parser::combinators::{
    BoxedParser, angled, expect_colon, expect_dot, expect_thin_arrow, optional, parenthesized,
};
use crate::parser::state::{ParseError, ParseState, Parser};

use super::literal::ident;

/// type_param := IDENT
pub fn type_param() -> BoxedParser<TypeParam> {
    ident() >> |id| TypeParam {
        name: id.value,
        position: id.position,
    }
}

/// type_params := ["<" type_param,* ">"]
pub fn type_params() -> BoxedParser<Vec<TypeParam>> {
    optional(angled(type_param())) >> |params| params.unwrap_or_default()
}

/// annotation := [":" type_expr]
pub fn annotation() -> BoxedParser<Option<TypeExpr>> {
    optional(expect_colon() * type_expr())
}

/// named_type := IDENT ["." IDENT] ["<" type_expr,* ">"]
fn named_type() -> BoxedParser<TypeExpr> {
    BoxedParser::new(move |state: &mut ParseState| {
        let first = ident().parse(state)?;
        let (module, name, mut position) =
            match optional(expect_dot() * ident()).parse(state)? {
                Some(second) => {
                    let position = first.position.merge(&second.position);
                    (Some(first.value), second.value, position)
                }
                None => (None, first.value, first.position),
            };

        let args = match state.peek() {
            Some(Token::LessThan(_)) => {
                let args = angled(type_expr()).parse(state)?;
                position = position.merge(&state.last_span());
                args
            }
            _ => vec![],
        };

        Ok(TypeExpr::Named {
            module,
            name,
            args,
            position,
        })
    })
}

/// function_type := "(" type_expr,* ")" "->" type_expr
/// A single parenthesized type without an arrow is just grouping.
fn parenthesized_type() -> BoxedParser<TypeExpr> {
    BoxedParser::new(move |state: &mut ParseState| {
        let start = state.peek().map(Token::pos).unwrap_or_default();
        let mut params = parenthesized(type_expr()).parse(state)?;

        if optional(expect_thin_arrow()).parse(state)?.is_some() {
            let ret = type_expr().parse(state)?;
            let position = start.merge(ret.position());
            return Ok(TypeExpr::Function {
                params,
                ret: Box::new(ret),
                position,
            });
        }

        match params.len() {
            1 => Ok(params.remove(0)),
            _ => {
                let err = state.error_here("expected '->' after parameter types");
                state.record_error(err.clone());
                Err(err)
            }
        }
    })
}

/// type_expr := function_type | named_type
pub fn type_expr() -> BoxedParser<TypeExpr> {
    BoxedParser::new(move |state: &mut ParseState| match state.peek() {
        Some(Token::LParen(_)) => parenthesized_type().parse(state),
        Some(Token::Ident(_)) => named_type().parse(state),
        Some(tok) => {
            let err = ParseError::new("unexpected token")
                .expected("type")
                .found(tok.describe())
                .at(tok.pos());
            state.record_error(err.clone());
            Err(err)
        }
        None => Err(ParseError::new("unexpected end of input").expected("type")),
    })
}
