//! Expression parsers

use crate::ast::expression::{
    BinOpKind, BinaryOp, Block, Expression, FunctionCall, IfThenElse, Lambda, Param, Qualified,
    UnaryOp, UnaryOpKind, Unit,
};
use crate::ast::pattern::{Match, MatchArm};
use crate::lexer::Token;

use crate::parser::combinators::{
    BoxedParser, comma_separated, expect_comma, expect_else, expect_fat_arrow, expect_if,
    expect_lbrace, expect_lparen, expect_match, expect_rbrace, expect_rparen, expect_thin_arrow,
    optional, parenthesized,
};
use crate::parser::state::{ParseError, ParseState, Parser};

use super::literal::{boolean, ident, number, string_literal};
use super::pattern::pattern;
use super::statement::block_body;
use super::types::annotation;

/// literal := NUMBER | STRING | "true" | "false"
fn literal_expression() -> BoxedParser<Expression<()>> {
    let num = number() >> Expression::Number;
    let string = string_literal() >> Expression::String;
    let boolean = boolean() >> Expression::Boolean;
    num | string | boolean
}

/// param := IDENT [":" type]
pub fn param() -> BoxedParser<Param<()>> {
    (ident() + annotation()) >> |(name, annotation)| Param { name, annotation }
}

/// lambda := "(" param,* ")" "->" expression
pub fn lambda() -> BoxedParser<Expression<()>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let start = state.peek().map(Token::pos).unwrap_or_default();
        let params = parenthesized(param()).parse(state)?;
        expect_thin_arrow().parse(state)?;
        let body = expression().parse(state)?;
        let position = start.merge(body.position());
        Ok(Expression::Lambda(Lambda {
            params,
            body: Box::new(body),
            position,
            info: (),
        }))
    })
}

/// block := "{" statement* [expression] "}"
pub fn block() -> BoxedParser<Block<()>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let start = expect_lbrace().parse(state)?.pos();
        let (statements, result) = block_body().parse(state)?;
        let end = expect_rbrace().parse(state)?.pos();
        Ok(Block {
            statements,
            result: result.map(Box::new),
            position: start.merge(&end),
            info: (),
        })
    })
}

/// if := "if" expression block ["else" (if | block)]
pub fn if_then_else() -> BoxedParser<Expression<()>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let start = expect_if().parse(state)?.pos();
        let condition = expression().parse(state)?;
        let then_block = block().parse(state)?;
        let mut end = then_block.position.clone();

        let else_expr = match optional(expect_else()).parse(state)? {
            Some(_) => {
                let else_expr = match state.peek() {
                    Some(Token::If(_)) => if_then_else().parse(state)?,
                    _ => Expression::Block(block().parse(state)?),
                };
                end = else_expr.position().clone();
                Some(Box::new(else_expr))
            }
            None => None,
        };

        Ok(Expression::IfThenElse(IfThenElse {
            condition: Box::new(condition),
            then_expr: Box::new(Expression::Block(then_block)),
            else_expr,
            position: start.merge(&end),
            info: (),
        }))
    })
}

/// match_arm := pattern "=>" expression
fn match_arm() -> BoxedParser<MatchArm<()>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let pattern = pattern().parse(state)?;
        expect_fat_arrow().parse(state)?;
        let body = expression().parse(state)?;
        let position = pattern.position().merge(body.position());
        Ok(MatchArm {
            pattern,
            body,
            position,
        })
    })
}

/// match := "match" expression "{" (match_arm [","])+ "}"
pub fn match_expr() -> BoxedParser<Expression<()>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let start = expect_match().parse(state)?.pos();
        let scrutinee = expression().parse(state)?;
        expect_lbrace().parse(state)?;

        let mut arms = Vec::new();
        while !matches!(state.peek(), Some(Token::RBrace(_)) | None) {
            arms.push(match_arm().parse(state)?);
            optional(expect_comma()).parse(state)?;
        }

        let end = expect_rbrace().parse(state)?.pos();
        if arms.is_empty() {
            let err = ParseError::new("match expression must have at least one arm")
                .at(start.merge(&end));
            state.record_error(err.clone());
            return Err(err);
        }

        Ok(Expression::Match(Box::new(Match {
            scrutinee: Box::new(scrutinee),
            arms,
            position: start.merge(&end),
            info: (),
        })))
    })
}

/// primary := literal | "(" ")" | "(" expression ")" | block | IDENT
fn primary_expr() -> BoxedParser<Expression<()>> {
    BoxedParser::new(move |state: &mut ParseState| match state.peek() {
        Some(Token::LParen(_)) => {
            let start = expect_lparen().parse(state)?.pos();
            if let Some(end) = optional(expect_rparen()).parse(state)? {
                return Ok(Expression::Unit(Unit {
                    position: start.merge(&end.pos()),
                    info: (),
                }));
            }
            let expr = expression().parse(state)?;
            expect_rparen().parse(state)?;
            Ok(expr)
        }
        Some(Token::LBrace(_)) => Ok(Expression::Block(block().parse(state)?)),
        Some(Token::Ident(_)) => Ok(Expression::Ident(ident().parse(state)?)),
        _ => literal_expression().label("expression").parse(state),
    })
}

/// postfix := primary ("(" expression,* ")" | "." IDENT)*
fn postfix_expr() -> BoxedParser<Expression<()>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut expr = primary_expr().parse(state)?;

        loop {
            match state.peek() {
                Some(Token::LParen(_)) => {
                    expect_lparen().parse(state)?;
                    let args = comma_separated(expression()).parse(state)?;
                    let end = expect_rparen().parse(state)?.pos();
                    let position = expr.position().merge(&end);
                    expr = Expression::FunctionCall(FunctionCall {
                        func: Box::new(expr),
                        args,
                        position,
                        info: (),
                    });
                }
                Some(Token::Dot(_)) => {
                    let Expression::Ident(module) = expr else {
                        let err = state.error_here("only modules support '.' access");
                        state.record_error(err.clone());
                        return Err(err);
                    };
                    state.advance();
                    let name = ident().parse(state)?;
                    expr = Expression::Qualified(Qualified {
                        module: module.value,
                        name: name.value,
                        position: module.position.merge(&name.position),
                        info: (),
                    });
                }
                _ => break,
            }
        }

        Ok(expr)
    })
}

/// unary := ("-" | "!") unary | postfix
fn unary_expr() -> BoxedParser<Expression<()>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let op = match state.peek() {
            Some(Token::Minus(_)) => UnaryOpKind::Neg,
            Some(Token::Bang(_)) => UnaryOpKind::Not,
            _ => return postfix_expr().parse(state),
        };
        let start = state.advance().map(|t| t.pos()).unwrap_or_default();
        let operand = unary_expr().parse(state)?;
        let position = start.merge(operand.position());
        Ok(Expression::UnaryOp(UnaryOp {
            op,
            operand: Box::new(operand),
            position,
            info: (),
        }))
    })
}

/// One left-associative precedence level: `next (op next)*`.
fn binary_level(
    next: fn() -> BoxedParser<Expression<()>>,
    operator: fn(&Token) -> Option<BinOpKind>,
) -> BoxedParser<Expression<()>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut left = next().parse(state)?;

        while let Some(op) = state.peek().and_then(operator) {
            state.advance();
            let right = next().parse(state)?;
            let position = left.position().merge(right.position());
            left = Expression::BinaryOp(BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                position,
                info: (),
            });
        }

        Ok(left)
    })
}

/// multiplicative := unary (("*" | "/" | "%") unary)*
fn multiplicative_expr() -> BoxedParser<Expression<()>> {
    binary_level(unary_expr, |tok| match tok {
        Token::Star(_) => Some(BinOpKind::Mul),
        Token::Slash(_) => Some(BinOpKind::Div),
        Token::Percent(_) => Some(BinOpKind::Mod),
        _ => None,
    })
}

/// additive := multiplicative (("+" | "-") multiplicative)*
fn additive_expr() -> BoxedParser<Expression<()>> {
    binary_level(multiplicative_expr, |tok| match tok {
        Token::Plus(_) => Some(BinOpKind::Add),
        Token::Minus(_) => Some(BinOpKind::Sub),
        _ => None,
    })
}

/// concat := additive ("++" additive)*
fn concat_expr() -> BoxedParser<Expression<()>> {
    binary_level(additive_expr, |tok| match tok {
        Token::Concat(_) => Some(BinOpKind::Concat),
        _ => None,
    })
}

/// comparison := concat (("<" | "<=" | ">" | ">=") concat)*
fn comparison_expr() -> BoxedParser<Expression<()>> {
    binary_level(concat_expr, |tok| match tok {
        Token::LessThan(_) => Some(BinOpKind::Lt),
        Token::LessEquals(_) => Some(BinOpKind::LtEq),
        Token::GreaterThan(_) => Some(BinOpKind::Gt),
        Token::GreaterEquals(_) => Some(BinOpKind::GtEq),
        _ => None,
    })
}

/// equality := comparison (("==" | "!=") comparison)*
fn equality_expr() -> BoxedParser<Expression<()>> {
    binary_level(comparison_expr, |tok| match tok {
        Token::DoubleEquals(_) => Some(BinOpKind::Eq),
        Token::NotEquals(_) => Some(BinOpKind::NotEq),
        _ => None,
    })
}

/// logical_and := equality ("&&" equality)*
fn logical_and_expr() -> BoxedParser<Expression<()>> {
    binary_level(equality_expr, |tok| match tok {
        Token::LogicalAnd(_) => Some(BinOpKind::And),
        _ => None,
    })
}

/// logical_or := logical_and ("||" logical_and)*
fn logical_or_expr() -> BoxedParser<Expression<()>> {
    binary_level(logical_and_expr, |tok| match tok {
        Token::LogicalOr(_) => Some(BinOpKind::Or),
        _ => None,
    })
}

/// expression := lambda | if | match | logical_or
pub fn expression() -> BoxedParser<Expression<()>> {
    BoxedParser::new(move |state: &mut ParseState| match state.peek() {
        Some(Token::If(_)) => if_then_else().parse(state),
        Some(Token::Match(_)) => match_expr().parse(state),
        Some(Token::LParen(_)) => {
            let pos = state.position();
            if let Ok(expr) = lambda().parse(state) {
                return Ok(expr);
            }
            state.restore(pos);
            logical_or_expr().parse(state)
        }
        _ => logical_or_expr().parse(state),
    })
}
