//! Pattern parsers

use crate::ast::expression::{Ident, Number, Unit};
use crate::ast::pattern::{ConstructorPattern, LiteralPattern, Pattern, Wildcard};
use crate::lexer::Token;

use crate::parser::combinators::{
    BoxedParser, expect_dot, expect_lparen, expect_minus, expect_rparen, expect_underscore,
    optional, parenthesized,
};
use crate::parser::state::{ParseState, Parser};

use super::literal::{boolean, ident, number, starts_uppercase, string_literal};

/// wildcard := "_"
fn wildcard() -> BoxedParser<Pattern<()>> {
    expect_underscore()
        >> |tok| {
            Pattern::Wildcard(Wildcard {
                position: tok.pos(),
                info: (),
            })
        }
}

/// literal := NUMBER | "-" NUMBER | STRING | "true" | "false"
fn literal_pattern() -> BoxedParser<Pattern<()>> {
    let num = number() >> |n| Pattern::Literal(LiteralPattern::Number(n));
    let negative = (expect_minus() + number())
        >> |(minus, n)| {
            Pattern::Literal(LiteralPattern::Number(Number {
                value: -n.value,
                position: minus.pos().merge(&n.position),
                info: (),
            }))
        };
    let string = string_literal() >> |s| Pattern::Literal(LiteralPattern::String(s));
    let boolean = boolean() >> |b| Pattern::Literal(LiteralPattern::Boolean(b));
    num | negative | string | boolean
}

/// unit := "(" ")"
fn unit_pattern() -> BoxedParser<Pattern<()>> {
    (expect_lparen() + expect_rparen())
        >> |(l, r)| {
            Pattern::Unit(Unit {
                position: l.pos().merge(&r.pos()),
                info: (),
            })
        }
}

/// named := IDENT
///        | CTOR ["(" pattern,* ")"]
///        | MODULE "." CTOR ["(" pattern,* ")"]
fn named_pattern() -> BoxedParser<Pattern<()>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let first: Ident<()> = ident().parse(state)?;

        let (module, name, mut position) =
            match optional(expect_dot() * ident()).parse(state)? {
                Some(ctor) => (
                    Some(first.value),
                    ctor.value,
                    first.position.merge(&ctor.position),
                ),
                None if !starts_uppercase(&first.value) => return Ok(Pattern::Ident(first)),
                None => (None, first.value, first.position),
            };

        let args = match state.peek() {
            Some(Token::LParen(_)) => {
                let args = parenthesized(pattern()).parse(state)?;
                position = position.merge(&state.last_span());
                args
            }
            _ => vec![],
        };

        Ok(Pattern::Constructor(ConstructorPattern {
            module,
            name,
            args,
            position,
            info: (),
        }))
    })
}

/// pattern := wildcard | literal | unit | named
pub fn pattern() -> BoxedParser<Pattern<()>> {
    BoxedParser::new(move |state: &mut ParseState| {
        (wildcard() | literal_pattern() | unit_pattern() | named_pattern())
            .label("pattern")
            .parse(state)
    })
}
