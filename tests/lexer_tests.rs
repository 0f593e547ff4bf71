use exx::lexer::{Token, strip_comments};

#[test]
fn lex_keywords() {
    let tokens = Token::lex("let var rec fn type import foreign export as if else match").unwrap();
    assert_eq!(tokens.len(), 12);
    assert!(matches!(tokens[0], Token::Let(_)));
    assert!(matches!(tokens[1], Token::Var(_)));
    assert!(matches!(tokens[2], Token::Rec(_)));
    assert!(matches!(tokens[3], Token::Fn(_)));
    assert!(matches!(tokens[4], Token::Type(_)));
    assert!(matches!(tokens[5], Token::Import(_)));
    assert!(matches!(tokens[6], Token::Foreign(_)));
    assert!(matches!(tokens[7], Token::Export(_)));
    assert!(matches!(tokens[8], Token::As(_)));
    assert!(matches!(tokens[9], Token::If(_)));
    assert!(matches!(tokens[10], Token::Else(_)));
    assert!(matches!(tokens[11], Token::Match(_)));
}

#[test]
fn lex_identifiers() {
    let tokens = Token::lex("foo Bar baz_2").unwrap();
    assert_eq!(tokens.len(), 3);
    assert!(matches!(&tokens[0], Token::Ident(i) if i.value == "foo"));
    assert!(matches!(&tokens[1], Token::Ident(i) if i.value == "Bar"));
    assert!(matches!(&tokens[2], Token::Ident(i) if i.value == "baz_2"));
}

#[test]
fn lex_numbers() {
    let tokens = Token::lex("42 0 3.25").unwrap();
    assert_eq!(tokens.len(), 3);
    assert!(matches!(&tokens[0], Token::Number(n) if n.value == "42"));
    assert!(matches!(&tokens[1], Token::Number(n) if n.value == "0"));
    assert!(matches!(&tokens[2], Token::Number(n) if n.value == "3.25"));
}

#[test]
fn lex_string_literals() {
    let tokens = Token::lex(r#""hello" "say \"hi\"""#).unwrap();
    assert_eq!(tokens.len(), 2);
    assert!(matches!(&tokens[0], Token::StringLiteral(_)));
    assert!(matches!(&tokens[1], Token::StringLiteral(_)));
}

#[test]
fn lex_boolean_literals() {
    let tokens = Token::lex("true false").unwrap();
    assert_eq!(tokens.len(), 2);
    assert!(matches!(tokens[0], Token::True(_)));
    assert!(matches!(tokens[1], Token::False(_)));
}

#[test]
fn lex_arrows() {
    let tokens = Token::lex("-> => - =").unwrap();
    assert_eq!(tokens.len(), 4);
    assert!(matches!(tokens[0], Token::ThinArrow(_)));
    assert!(matches!(tokens[1], Token::FatArrow(_)));
    assert!(matches!(tokens[2], Token::Minus(_)));
    assert!(matches!(tokens[3], Token::Equals(_)));
}

#[test]
fn lex_comparison_operators() {
    let tokens = Token::lex("== != < > <= >=").unwrap();
    assert_eq!(tokens.len(), 6);
    assert!(matches!(tokens[0], Token::DoubleEquals(_)));
    assert!(matches!(tokens[1], Token::NotEquals(_)));
    assert!(matches!(tokens[2], Token::LessThan(_)));
    assert!(matches!(tokens[3], Token::GreaterThan(_)));
    assert!(matches!(tokens[4], Token::LessEquals(_)));
    assert!(matches!(tokens[5], Token::GreaterEquals(_)));
}

#[test]
fn lex_arithmetic_and_concat() {
    let tokens = Token::lex("+ ++ * / %").unwrap();
    assert_eq!(tokens.len(), 5);
    assert!(matches!(tokens[0], Token::Plus(_)));
    assert!(matches!(tokens[1], Token::Concat(_)));
    assert!(matches!(tokens[2], Token::Star(_)));
    assert!(matches!(tokens[3], Token::Slash(_)));
    assert!(matches!(tokens[4], Token::Percent(_)));
}

#[test]
fn lex_logical_operators() {
    let tokens = Token::lex("&& || ! !=").unwrap();
    assert_eq!(tokens.len(), 4);
    assert!(matches!(tokens[0], Token::LogicalAnd(_)));
    assert!(matches!(tokens[1], Token::LogicalOr(_)));
    assert!(matches!(tokens[2], Token::Bang(_)));
    assert!(matches!(tokens[3], Token::NotEquals(_)));
}

#[test]
fn lex_punctuation() {
    let tokens = Token::lex("( ) { } , ; : . | _").unwrap();
    assert_eq!(tokens.len(), 10);
    assert!(matches!(tokens[0], Token::LParen(_)));
    assert!(matches!(tokens[1], Token::RParen(_)));
    assert!(matches!(tokens[2], Token::LBrace(_)));
    assert!(matches!(tokens[3], Token::RBrace(_)));
    assert!(matches!(tokens[4], Token::Comma(_)));
    assert!(matches!(tokens[5], Token::Semicolon(_)));
    assert!(matches!(tokens[6], Token::Colon(_)));
    assert!(matches!(tokens[7], Token::Dot(_)));
    assert!(matches!(tokens[8], Token::Pipe(_)));
    assert!(matches!(tokens[9], Token::Underscore(_)));
}

#[test]
fn lex_function_declaration() {
    let tokens = Token::lex("fn add(a: number) -> number { a }").unwrap();
    assert_eq!(tokens.len(), 11);
    assert!(matches!(tokens[0], Token::Fn(_)));
    assert!(matches!(&tokens[1], Token::Ident(i) if i.value == "add"));
    assert!(matches!(tokens[6], Token::ThinArrow(_)));
    assert!(matches!(tokens[8], Token::LBrace(_)));
}

#[test]
fn comments_are_skipped() {
    let tokens = Token::lex(&strip_comments("let x = 1; // trailing\n// whole line\nx")).unwrap();
    assert_eq!(tokens.len(), 6);
    assert!(matches!(&tokens[5], Token::Ident(i) if i.value == "x"));
}

#[test]
fn comment_markers_inside_strings_are_kept() {
    let stripped = strip_comments(r#"let url = "http://example.com";"#);
    assert_eq!(stripped, r#"let url = "http://example.com";"#);
}

#[test]
fn describe_tokens() {
    let tokens = Token::lex("name 12").unwrap();
    assert_eq!(tokens[0].describe(), "identifier 'name'");
    assert_eq!(tokens[1].describe(), "number '12'");
}
