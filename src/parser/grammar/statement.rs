//! Statement and declaration parsers

use crate::ast::expression::Expression;
use crate::ast::statement::{
    Assignment, BindingKind, ForeignImport, FunctionDecl, Import, Let, RecGroup, Statement,
    TypeDecl,
};
use crate::ast::types::{LiteralTag, TypeAlt};
use crate::lexer::Token;

use crate::parser::combinators::{
    BoxedParser, expect_as, expect_dot, expect_equals, expect_fn, expect_foreign, expect_import,
    expect_lbrace, expect_let, expect_pipe, expect_rbrace, expect_rec, expect_semicolon,
    expect_thin_arrow, expect_type, expect_var, many, optional, parenthesized,
};
use crate::parser::state::{ParseState, Parser};

use super::expression::{block, expression, param};
use super::literal::ident;
use super::types::{annotation, type_expr, type_params};

/// let := "let" ["rec"] IDENT [":" type] "=" expression ";"
///      | "var" IDENT [":" type] "=" expression ";"
pub fn let_decl() -> BoxedParser<Statement<()>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let (start, kind) = match state.peek() {
            Some(Token::Var(_)) => (expect_var().parse(state)?.pos(), BindingKind::Var),
            _ => {
                let start = expect_let().parse(state)?.pos();
                match optional(expect_rec()).parse(state)? {
                    Some(_) => (start, BindingKind::LetRec),
                    None => (start, BindingKind::Let),
                }
            }
        };
        let name = ident().label("binding name").parse(state)?;
        let annotation = annotation().parse(state)?;
        expect_equals().parse(state)?;
        let value = expression().parse(state)?;
        let end = expect_semicolon().parse(state)?.pos();

        Ok(Statement::Let(Let {
            kind,
            name,
            annotation,
            value: Box::new(value),
            position: start.merge(&end),
        }))
    })
}

/// fn := "fn" IDENT ["<" IDENT,* ">"] "(" param,* ")" ["->" type] block
pub fn function_decl() -> BoxedParser<FunctionDecl<()>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let start = expect_fn().parse(state)?.pos();
        let name = ident().label("function name").parse(state)?;
        let type_params = type_params().parse(state)?;
        let params = parenthesized(param()).parse(state)?;
        let return_type = optional(expect_thin_arrow() * type_expr()).parse(state)?;
        let body = block().parse(state)?;
        let position = start.merge(&body.position);

        Ok(FunctionDecl {
            name,
            type_params,
            params,
            return_type,
            body,
            position,
        })
    })
}

/// rec_group := "rec" "{" fn* "}"
pub fn rec_group() -> BoxedParser<Statement<()>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let start = expect_rec().parse(state)?.pos();
        expect_lbrace().parse(state)?;
        let functions = many(function_decl()).parse(state)?;
        let end = expect_rbrace().parse(state)?.pos();
        Ok(Statement::RecGroup(RecGroup {
            functions,
            position: start.merge(&end),
        }))
    })
}

/// alt := STRING | ["-"] NUMBER | "true" | "false"
///      | IDENT "(" type,* ")" | IDENT | type
fn type_alt() -> BoxedParser<TypeAlt> {
    BoxedParser::new(move |state: &mut ParseState| {
        let literal = match state.peek() {
            Some(Token::StringLiteral(_)) => Some(
                super::literal::string_literal()
                    .map(|s| (LiteralTag::Str(s.value), s.position))
                    .parse(state)?,
            ),
            Some(Token::Number(_)) => Some(
                super::literal::number()
                    .map(|n| (LiteralTag::Num(n.value), n.position))
                    .parse(state)?,
            ),
            Some(Token::Minus(_)) => {
                let minus = state.advance().map(|t| t.pos()).unwrap_or_default();
                let n = super::literal::number().parse(state)?;
                Some((LiteralTag::Num(-n.value), minus.merge(&n.position)))
            }
            Some(Token::True(_)) | Some(Token::False(_)) => Some(
                super::literal::boolean()
                    .map(|b| (LiteralTag::Bool(b.value), b.position))
                    .parse(state)?,
            ),
            _ => None,
        };
        if let Some((value, position)) = literal {
            return Ok(TypeAlt::Literal { value, position });
        }

        // A name followed by `<` or `.` is a type reference; anything else
        // named is constructor-shaped.
        let is_constructor = matches!(state.peek(), Some(Token::Ident(_)))
            && !matches!(
                state.peek_at(1),
                Some(Token::LessThan(_)) | Some(Token::Dot(_))
            );
        if !is_constructor {
            return type_expr().map(TypeAlt::Type).parse(state);
        }

        let name = ident().parse(state)?;
        match state.peek() {
            Some(Token::LParen(_)) => {
                let fields = parenthesized(type_expr()).parse(state)?;
                let position = name.position.merge(&state.last_span());
                Ok(TypeAlt::Constructor {
                    name: name.value,
                    fields,
                    has_parens: true,
                    position,
                })
            }
            _ => Ok(TypeAlt::Constructor {
                name: name.value,
                fields: vec![],
                has_parens: false,
                position: name.position,
            }),
        }
    })
}

/// type_decl := "type" IDENT ["<" IDENT,* ">"] ["=" ["|"] alt ("|" alt)*] ";"
pub fn type_decl() -> BoxedParser<Statement<()>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let start = expect_type().parse(state)?.pos();
        let name = ident().label("type name").parse(state)?;
        let params = type_params().parse(state)?;

        let alternatives = match optional(expect_equals()).parse(state)? {
            Some(_) => {
                optional(expect_pipe()).parse(state)?;
                let first = type_alt().parse(state)?;
                let rest = many(expect_pipe() * type_alt()).parse(state)?;
                let mut alternatives = vec![first];
                alternatives.extend(rest);
                Some(alternatives)
            }
            None => None,
        };
        let end = expect_semicolon().parse(state)?.pos();

        Ok(Statement::TypeDecl(TypeDecl {
            name: name.value,
            params,
            alternatives,
            position: start.merge(&end),
        }))
    })
}

/// import := "import" IDENT ";"
///         | "import" "foreign" IDENT ("." IDENT)* ["as" IDENT] ["<" IDENT,* ">"] [":" type] ";"
pub fn import() -> BoxedParser<Statement<()>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let start = expect_import().parse(state)?.pos();

        if optional(expect_foreign()).parse(state)?.is_none() {
            let module = ident().label("module name").parse(state)?;
            let end = expect_semicolon().parse(state)?.pos();
            return Ok(Statement::Import(Import {
                module: module.value,
                position: start.merge(&end),
            }));
        }

        let foreign = foreign_signature().parse(state)?;
        Ok(Statement::ForeignImport(ForeignImport {
            position: start.merge(&foreign.position),
            ..foreign
        }))
    })
}

/// foreign := IDENT ("." IDENT)* ["as" IDENT] ["<" IDENT,* ">"] [":" type] ";"
///
/// Shared by `import foreign` declarations and signature table entries.
pub fn foreign_signature() -> BoxedParser<ForeignImport> {
    BoxedParser::new(move |state: &mut ParseState| {
        let head = ident().label("foreign path").parse(state)?;
        let start = head.position.clone();
        let tail = many(expect_dot() * ident()).parse(state)?;
        let path = std::iter::once(head)
            .chain(tail)
            .map(|id| id.value)
            .collect();
        let alias = optional(expect_as() * ident()).parse(state)?;
        let type_params = type_params().parse(state)?;
        let signature = annotation().parse(state)?;
        let end = expect_semicolon().parse(state)?.pos();

        Ok(ForeignImport {
            path,
            alias: alias.map(|a| a.value),
            type_params,
            signature,
            position: start.merge(&end),
        })
    })
}

/// assignment := IDENT "=" expression ";"
fn assignment() -> BoxedParser<Statement<()>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let name = ident().parse(state)?;
        expect_equals().parse(state)?;
        let value = expression().parse(state)?;
        let end = expect_semicolon().parse(state)?.pos();
        let position = name.position.merge(&end);
        Ok(Statement::Assignment(Assignment {
            name,
            value: Box::new(value),
            position,
        }))
    })
}

fn is_block_like(expr: &Expression<()>) -> bool {
    matches!(
        expr,
        Expression::IfThenElse(_) | Expression::Match(_) | Expression::Block(_)
    )
}

/// A statement inside a block or at the top level, or a trailing expression.
pub enum Parsed {
    Statement(Statement<()>),
    /// Expression not followed by `;`
    Trailing(Expression<()>),
}

/// statement := let | fn | rec_group | type_decl | import | assignment
///            | expression ";" | block_like_expression
pub fn statement() -> BoxedParser<Parsed> {
    BoxedParser::new(move |state: &mut ParseState| match state.peek() {
        Some(Token::Let(_)) | Some(Token::Var(_)) => let_decl().map(Parsed::Statement).parse(state),
        Some(Token::Fn(_)) => function_decl()
            .map(|f| Parsed::Statement(Statement::Function(f)))
            .parse(state),
        Some(Token::Rec(_)) => rec_group().map(Parsed::Statement).parse(state),
        Some(Token::Type(_)) => type_decl().map(Parsed::Statement).parse(state),
        Some(Token::Import(_)) => import().map(Parsed::Statement).parse(state),
        Some(Token::Ident(_)) if matches!(state.peek_at(1), Some(Token::Equals(_))) => {
            assignment().map(Parsed::Statement).parse(state)
        }
        _ => {
            let expr = expression().parse(state)?;
            if optional(expect_semicolon()).parse(state)?.is_some() || is_block_like(&expr) {
                Ok(Parsed::Statement(Statement::Expression(expr)))
            } else {
                Ok(Parsed::Trailing(expr))
            }
        }
    })
}

/// block_body := statement* [expression]
///
/// A block-like expression (`if`, `match`, `{}`) in final position is the
/// block's result rather than a statement.
pub fn block_body() -> BoxedParser<(Vec<Statement<()>>, Option<Expression<()>>)> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut statements = Vec::new();

        while !matches!(state.peek(), Some(Token::RBrace(_)) | None) {
            match statement().parse(state)? {
                Parsed::Statement(stmt) => statements.push(stmt),
                Parsed::Trailing(expr) => {
                    if !matches!(state.peek(), Some(Token::RBrace(_))) {
                        return Err(expect_semicolon().parse(state).err().unwrap_or_else(|| {
                            state.error_here("expected ';'")
                        }));
                    }
                    return Ok((statements, Some(expr)));
                }
            }
        }

        let result = match statements.last() {
            Some(Statement::Expression(expr))
                if is_block_like(expr) && !ended_with_semicolon(state) =>
            {
                match statements.pop() {
                    Some(Statement::Expression(expr)) => Some(expr),
                    _ => None,
                }
            }
            _ => None,
        };

        Ok((statements, result))
    })
}

fn ended_with_semicolon(state: &ParseState) -> bool {
    matches!(state.previous(), Some(Token::Semicolon(_)))
}
