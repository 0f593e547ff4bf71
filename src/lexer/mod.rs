use lachs::Span;

#[lachs::token]
pub enum Token {
    #[terminal("let")]
    Let,
    #[terminal("var")]
    Var,
    #[terminal("rec")]
    Rec,
    #[terminal("fn")]
    Fn,
    #[terminal("type")]
    Type,
    #[terminal("import")]
    Import,
    #[terminal("foreign")]
    Foreign,
    #[terminal("export")]
    Export,
    #[terminal("as")]
    As,
    #[terminal("if")]
    If,
    #[terminal("else")]
    Else,
    #[terminal("match")]
    Match,
    #[terminal("true")]
    True,
    #[terminal("false")]
    False,
    #[literal("[a-zA-Z][a-zA-Z0-9_]*")]
    Ident,
    #[literal(r"[0-9]+(\.[0-9]+)?")]
    Number,
    #[literal(r#""([^"\\]|\\.)*""#)]
    StringLiteral,
    #[terminal("_")]
    Underscore,
    #[terminal("->")]
    ThinArrow,
    #[terminal("=>")]
    FatArrow,
    #[terminal("==")]
    DoubleEquals,
    #[terminal("!=")]
    NotEquals,
    #[terminal("<=")]
    LessEquals,
    #[terminal(">=")]
    GreaterEquals,
    #[terminal("&&")]
    LogicalAnd,
    #[terminal("||")]
    LogicalOr,
    #[terminal("++")]
    Concat,
    #[terminal("=")]
    Equals,
    #[terminal("<")]
    LessThan,
    #[terminal(">")]
    GreaterThan,
    #[terminal("+")]
    Plus,
    #[terminal("-")]
    Minus,
    #[terminal("*")]
    Star,
    #[terminal("/")]
    Slash,
    #[terminal("%")]
    Percent,
    #[terminal("!")]
    Bang,
    #[terminal("|")]
    Pipe,
    #[terminal(":")]
    Colon,
    #[terminal(";")]
    Semicolon,
    #[terminal(",")]
    Comma,
    #[terminal(".")]
    Dot,
    #[terminal("(")]
    LParen,
    #[terminal(")")]
    RParen,
    #[terminal("{")]
    LBrace,
    #[terminal("}")]
    RBrace,
}

impl Token {
    pub fn pos(&self) -> Span {
        match self {
            Token::Let(inner) => inner.position.clone(),
            Token::Var(inner) => inner.position.clone(),
            Token::Rec(inner) => inner.position.clone(),
            Token::Fn(inner) => inner.position.clone(),
            Token::Type(inner) => inner.position.clone(),
            Token::Import(inner) => inner.position.clone(),
            Token::Foreign(inner) => inner.position.clone(),
            Token::Export(inner) => inner.position.clone(),
            Token::As(inner) => inner.position.clone(),
            Token::If(inner) => inner.position.clone(),
            Token::Else(inner) => inner.position.clone(),
            Token::Match(inner) => inner.position.clone(),
            Token::True(inner) => inner.position.clone(),
            Token::False(inner) => inner.position.clone(),
            Token::Ident(inner) => inner.position.clone(),
            Token::Number(inner) => inner.position.clone(),
            Token::StringLiteral(inner) => inner.position.clone(),
            Token::Underscore(inner) => inner.position.clone(),
            Token::ThinArrow(inner) => inner.position.clone(),
            Token::FatArrow(inner) => inner.position.clone(),
            Token::DoubleEquals(inner) => inner.position.clone(),
            Token::NotEquals(inner) => inner.position.clone(),
            Token::LessEquals(inner) => inner.position.clone(),
            Token::GreaterEquals(inner) => inner.position.clone(),
            Token::LogicalAnd(inner) => inner.position.clone(),
            Token::LogicalOr(inner) => inner.position.clone(),
            Token::Concat(inner) => inner.position.clone(),
            Token::Equals(inner) => inner.position.clone(),
            Token::LessThan(inner) => inner.position.clone(),
            Token::GreaterThan(inner) => inner.position.clone(),
            Token::Plus(inner) => inner.position.clone(),
            Token::Minus(inner) => inner.position.clone(),
            Token::Star(inner) => inner.position.clone(),
            Token::Slash(inner) => inner.position.clone(),
            Token::Percent(inner) => inner.position.clone(),
            Token::Bang(inner) => inner.position.clone(),
            Token::Pipe(inner) => inner.position.clone(),
            Token::Colon(inner) => inner.position.clone(),
            Token::Semicolon(inner) => inner.position.clone(),
            Token::Comma(inner) => inner.position.clone(),
            Token::Dot(inner) => inner.position.clone(),
            Token::LParen(inner) => inner.position.clone(),
            Token::RParen(inner) => inner.position.clone(),
            Token::LBrace(inner) => inner.position.clone(),
            Token::RBrace(inner) => inner.position.clone(),
        }
    }

    /// Returns a human-readable description of the token
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(inner) => format!("identifier '{}'", inner.value),
            Token::Number(inner) => format!("number '{}'", inner.value),
            Token::StringLiteral(inner) => format!("string {}", inner.value),
            Token::Let(_) => "'let'".to_string(),
            Token::Var(_) => "'var'".to_string(),
            Token::Rec(_) => "'rec'".to_string(),
            Token::Fn(_) => "'fn'".to_string(),
            Token::Type(_) => "'type'".to_string(),
            Token::Import(_) => "'import'".to_string(),
            Token::Foreign(_) => "'foreign'".to_string(),
            Token::Export(_) => "'export'".to_string(),
            Token::As(_) => "'as'".to_string(),
            Token::If(_) => "'if'".to_string(),
            Token::Else(_) => "'else'".to_string(),
            Token::Match(_) => "'match'".to_string(),
            Token::True(_) => "'true'".to_string(),
            Token::False(_) => "'false'".to_string(),
            Token::Underscore(_) => "'_'".to_string(),
            Token::ThinArrow(_) => "'->'".to_string(),
            Token::FatArrow(_) => "'=>'".to_string(),
            Token::DoubleEquals(_) => "'=='".to_string(),
            Token::NotEquals(_) => "'!='".to_string(),
            Token::LessEquals(_) => "'<='".to_string(),
            Token::GreaterEquals(_) => "'>='".to_string(),
            Token::LogicalAnd(_) => "'&&'".to_string(),
            Token::LogicalOr(_) => "'||'".to_string(),
            Token::Concat(_) => "'++'".to_string(),
            Token::Equals(_) => "'='".to_string(),
            Token::LessThan(_) => "'<'".to_string(),
            Token::GreaterThan(_) => "'>'".to_string(),
            Token::Plus(_) => "'+'".to_string(),
            Token::Minus(_) => "'-'".to_string(),
            Token::Star(_) => "'*'".to_string(),
            Token::Slash(_) => "'/'".to_string(),
            Token::Percent(_) => "'%'".to_string(),
            Token::Bang(_) => "'!'".to_string(),
            Token::Pipe(_) => "'|'".to_string(),
            Token::Colon(_) => "':'".to_string(),
            Token::Semicolon(_) => "';'".to_string(),
            Token::Comma(_) => "','".to_string(),
            Token::Dot(_) => "'.'".to_string(),
            Token::LParen(_) => "'('".to_string(),
            Token::RParen(_) => "')'".to_string(),
            Token::LBrace(_) => "'{'".to_string(),
            Token::RBrace(_) => "'}'".to_string(),
        }
    }
}

/// Blank out `//` line comments.
///
/// Comment bytes are replaced by spaces so spans reported against the stripped
/// text still point at the right place in the original source. Comment markers
/// inside string literals are left alone.
pub fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut in_string = false;
    let mut in_comment = false;

    while let Some(c) = chars.next() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
                out.push('\n');
            } else {
                out.extend(std::iter::repeat_n(' ', c.len_utf8()));
            }
            continue;
        }

        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                chars.next();
                in_comment = true;
                out.push_str("  ");
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_line_comment() {
        let stripped = strip_comments("let x = 1; // the answer\nx");
        assert_eq!(stripped, "let x = 1;              \nx");
    }

    #[test]
    fn test_strip_keeps_string_contents() {
        let stripped = strip_comments(r#"let url = "http://example.com";"#);
        assert_eq!(stripped, r#"let url = "http://example.com";"#);
    }

    #[test]
    fn test_strip_preserves_length() {
        let source = "fn f() { 1 } // trailing\n// whole line\nf()";
        assert_eq!(strip_comments(source).len(), source.len());
    }
}
