//! Scanner behaviour over whole inputs

use cd18c::diagnostics::Category;
use cd18c::parser::scanner::Scanner;
use cd18c::parser::token::{Token, TokenKind};
use proptest::prelude::*;

fn tokens(source: &str) -> Vec<Token> {
    Scanner::from_source(source).collect()
}

#[test]
fn test_integer_literal() {
    let toks = tokens("123");
    assert_eq!(toks.len(), 1);
    assert_eq!(toks[0].kind, TokenKind::IntLiteral);
    assert_eq!(toks[0].text(), "123");
}

#[test]
fn test_float_literal() {
    let toks = tokens("123.45");
    assert_eq!(toks.len(), 1);
    assert_eq!(toks[0].kind, TokenKind::FloatLiteral);
    assert_eq!(toks[0].text(), "123.45");
}

#[test]
fn test_trailing_dot_not_consumed() {
    let toks = tokens("123.");
    assert_eq!(toks.len(), 2);
    assert_eq!(toks[0].kind, TokenKind::IntLiteral);
    assert_eq!(toks[0].text(), "123");
    assert_eq!(toks[1].kind, TokenKind::Dot);
    assert_eq!(toks[1].col, 4);
}

#[test]
fn test_unclosed_string_single_error() {
    let mut scanner = Scanner::from_source("print \"abc\nx");
    let kinds: Vec<TokenKind> = scanner.by_ref().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![TokenKind::Print, TokenKind::Undefined, TokenKind::Identifier]
    );

    let error = scanner.next_error().expect("one lexical error");
    assert_eq!(error.category, Category::Lexical);
    assert_eq!(error.line(), 1);
    assert!(scanner.next_error().is_none());
}

#[test]
fn test_eof_repeats() {
    let mut scanner = Scanner::from_source("x");
    assert!(scanner.next_token().is(TokenKind::Identifier));
    assert!(scanner.next_token().is(TokenKind::Eof));
    assert!(scanner.next_token().is(TokenKind::Eof));
    assert!(scanner.at_end());
}

proptest! {
    #[test]
    fn prop_identifier_maximal_munch(name in "[a-zA-Z][a-zA-Z0-9]{0,15}") {
        prop_assume!(TokenKind::keyword(&name).is_none());

        let toks = tokens(&format!("{name} ;"));
        prop_assert_eq!(toks.len(), 2);
        prop_assert_eq!(toks[0].kind, TokenKind::Identifier);
        prop_assert_eq!(toks[0].text(), name.as_str());
        prop_assert_eq!(toks[0].col, 1);
        prop_assert_eq!(toks[1].col, name.len() + 2);
    }

    #[test]
    fn prop_integer_literals_scan_whole(value in 0u32..1_000_000) {
        let text = value.to_string();
        let toks = tokens(&text);
        prop_assert_eq!(toks.len(), 1);
        prop_assert_eq!(toks[0].kind, TokenKind::IntLiteral);
        prop_assert_eq!(toks[0].text(), text.as_str());
    }
}
