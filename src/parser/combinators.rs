use std::ops::{Add, BitOr, Mul, Shr, Sub};
use std::rc::Rc;

use crate::lexer::Token;

use super::state::{ParseError, ParseResult, ParseState, Parser};

type ParserFn<T> = Rc<dyn Fn(&mut ParseState) -> ParseResult<T>>;

/// Type-erased, cheaply clonable parser. Grammar rules are functions returning
/// one of these so they can refer to each other recursively.
pub struct BoxedParser<T> {
    parser: ParserFn<T>,
}

impl<T> Clone for BoxedParser<T> {
    fn clone(&self) -> Self {
        BoxedParser {
            parser: Rc::clone(&self.parser),
        }
    }
}

impl<T> Parser<T> for BoxedParser<T> {
    fn parse(&self, state: &mut ParseState) -> ParseResult<T> {
        (self.parser)(state)
    }
}

/// Run `parser`; on failure rewind to where it started. The error stays
/// recorded in `state` for reporting.
fn attempt<T>(parser: &impl Parser<T>, state: &mut ParseState) -> Option<T> {
    let start = state.position();
    match parser.parse(state) {
        Ok(value) => Some(value),
        Err(_) => {
            state.restore(start);
            None
        }
    }
}

fn fail<T>(state: &mut ParseState, err: ParseError) -> ParseResult<T> {
    state.record_error(err.clone());
    Err(err)
}

impl<T: 'static> BoxedParser<T> {
    pub fn new<P: Parser<T> + 'static>(parser: P) -> Self {
        BoxedParser {
            parser: Rc::new(move |state| parser.parse(state)),
        }
    }

    /// `self` then `other`, keeping both results.
    pub fn seq<U: 'static>(self, other: BoxedParser<U>) -> BoxedParser<(T, U)> {
        BoxedParser::new(move |state: &mut ParseState| Ok((self.parse(state)?, other.parse(state)?)))
    }

    /// `self` then `other`, keeping the result of `self`.
    pub fn skip<U: 'static>(self, other: BoxedParser<U>) -> BoxedParser<T> {
        BoxedParser::new(move |state: &mut ParseState| {
            let kept = self.parse(state)?;
            other.parse(state)?;
            Ok(kept)
        })
    }

    /// `self` then `other`, keeping the result of `other`.
    pub fn skip_left<U: 'static>(self, other: BoxedParser<U>) -> BoxedParser<U> {
        BoxedParser::new(move |state: &mut ParseState| {
            self.parse(state)?;
            other.parse(state)
        })
    }

    pub fn map<U: 'static, F: Fn(T) -> U + 'static>(self, f: F) -> BoxedParser<U> {
        BoxedParser::new(move |state: &mut ParseState| self.parse(state).map(&f))
    }

    /// Ordered choice with backtracking.
    pub fn or(self, other: BoxedParser<T>) -> BoxedParser<T> {
        BoxedParser::new(move |state: &mut ParseState| match attempt(&self, state) {
            Some(value) => Ok(value),
            None => other.parse(state),
        })
    }

    /// Report failures as "expected `name`" instead of the innermost token.
    pub fn label(self, name: &'static str) -> BoxedParser<T> {
        BoxedParser::new(move |state: &mut ParseState| {
            self.parse(state).or_else(|mut err| {
                err.expected = vec![name.to_string()];
                fail(state, err)
            })
        })
    }
}

// `a + b` pairs, `a - b` keeps a, `a * b` keeps b, `a | b` chooses, `a >> f` maps.

impl<T: 'static, U: 'static> Add<BoxedParser<U>> for BoxedParser<T> {
    type Output = BoxedParser<(T, U)>;

    fn add(self, rhs: BoxedParser<U>) -> Self::Output {
        self.seq(rhs)
    }
}

impl<T: 'static, U: 'static> Sub<BoxedParser<U>> for BoxedParser<T> {
    type Output = BoxedParser<T>;

    fn sub(self, rhs: BoxedParser<U>) -> Self::Output {
        self.skip(rhs)
    }
}

impl<T: 'static, U: 'static> Mul<BoxedParser<U>> for BoxedParser<T> {
    type Output = BoxedParser<U>;

    fn mul(self, rhs: BoxedParser<U>) -> Self::Output {
        self.skip_left(rhs)
    }
}

impl<T: 'static> BitOr<BoxedParser<T>> for BoxedParser<T> {
    type Output = BoxedParser<T>;

    fn bitor(self, rhs: BoxedParser<T>) -> Self::Output {
        self.or(rhs)
    }
}

impl<T: 'static, U: 'static, F: Fn(T) -> U + 'static> Shr<F> for BoxedParser<T> {
    type Output = BoxedParser<U>;

    fn shr(self, f: F) -> Self::Output {
        self.map(f)
    }
}

// === Terminals ===

/// A single token satisfying `predicate`.
fn terminal<F: Fn(&Token) -> bool + 'static>(predicate: F, expected: &'static str) -> BoxedParser<Token> {
    BoxedParser::new(move |state: &mut ParseState| {
        let err = match state.peek() {
            Some(tok) if predicate(tok) => {
                if let Some(tok) = state.advance() {
                    return Ok(tok);
                }
                ParseError::new("unexpected end of input").expected(expected)
            }
            Some(tok) => ParseError::new("unexpected token")
                .expected(expected)
                .found(tok.describe())
                .at(tok.pos()),
            None => ParseError::new("unexpected end of input").expected(expected),
        };
        fail(state, err)
    })
}

macro_rules! terminals {
    ($($name:ident => $variant:ident, $shown:literal;)*) => {
        $(
            pub fn $name() -> BoxedParser<Token> {
                terminal(|t| matches!(t, Token::$variant(_)), $shown)
            }
        )*
    };
}

terminals! {
    expect_let => Let, "'let'";
    expect_var => Var, "'var'";
    expect_rec => Rec, "'rec'";
    expect_fn => Fn, "'fn'";
    expect_type => Type, "'type'";
    expect_import => Import, "'import'";
    expect_foreign => Foreign, "'foreign'";
    expect_export => Export, "'export'";
    expect_as => As, "'as'";
    expect_if => If, "'if'";
    expect_else => Else, "'else'";
    expect_match => Match, "'match'";
    expect_underscore => Underscore, "'_'";
    expect_thin_arrow => ThinArrow, "'->'";
    expect_fat_arrow => FatArrow, "'=>'";
    expect_equals => Equals, "'='";
    expect_less_than => LessThan, "'<'";
    expect_greater_than => GreaterThan, "'>'";
    expect_minus => Minus, "'-'";
    expect_pipe => Pipe, "'|'";
    expect_colon => Colon, "':'";
    expect_semicolon => Semicolon, "';'";
    expect_comma => Comma, "','";
    expect_dot => Dot, "'.'";
    expect_lparen => LParen, "'('";
    expect_rparen => RParen, "')'";
    expect_lbrace => LBrace, "'{'";
    expect_rbrace => RBrace, "'}'";
}

// === Repetition ===

pub fn many<T: 'static>(parser: BoxedParser<T>) -> BoxedParser<Vec<T>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut items = Vec::new();
        while let Some(item) = attempt(&parser, state) {
            items.push(item);
        }
        Ok(items)
    })
}

pub fn optional<T: 'static>(parser: BoxedParser<T>) -> BoxedParser<Option<T>> {
    BoxedParser::new(move |state: &mut ParseState| Ok(attempt(&parser, state)))
}

/// Zero or more items separated by commas, with an optional trailing comma.
pub fn comma_separated<T: 'static>(parser: BoxedParser<T>) -> BoxedParser<Vec<T>> {
    let comma = expect_comma();
    BoxedParser::new(move |state: &mut ParseState| {
        let mut items = Vec::new();
        while let Some(item) = attempt(&parser, state) {
            items.push(item);
            if attempt(&comma, state).is_none() {
                break;
            }
        }
        Ok(items)
    })
}

/// `( item, ... )`
pub fn parenthesized<T: 'static>(parser: BoxedParser<T>) -> BoxedParser<Vec<T>> {
    expect_lparen() * comma_separated(parser) - expect_rparen()
}

/// `< item, ... >`
pub fn angled<T: 'static>(parser: BoxedParser<T>) -> BoxedParser<Vec<T>> {
    expect_less_than() * comma_separated(parser) - expect_greater_than()
}
