//! Scanner for CD18 source text
//!
//! Pulls characters from a buffered reader one line at a time and hands out
//! one [`Token`] per [`Scanner::next_token`] call. Tokens never span lines,
//! so lookahead is bounded by the current line buffer: a character that is
//! peeked but not wanted stays in the buffer for the next call.
//!
//! Lexical errors never stop the scan. The offending text is returned as an
//! [`TokenKind::Undefined`] token and a matching [`Diagnostic`] is queued.

use super::token::{Token, TokenKind};
use crate::diagnostics::Diagnostic;
use std::collections::VecDeque;
use std::io::{self, BufRead, Cursor};

/// Characters that end an invalid character sequence.
const DELIMITERS: &str = "[]()=+-*/%^;:,.<>\"";

pub const DEFAULT_TAB_WIDTH: usize = 4;

pub struct Scanner<R> {
    reader: R,
    buffer: Vec<char>,
    position: usize,
    line: usize,
    col: usize,
    tab_width: usize,
    reached_end: bool,
    errors: VecDeque<Diagnostic>,
    read_error: Option<io::Error>,
}

impl Scanner<Cursor<String>> {
    /// Scan an in-memory source string.
    pub fn from_source(source: &str) -> Self {
        Scanner::new(Cursor::new(source.to_string()))
    }
}

impl<R: BufRead> Scanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            position: 0,
            line: 1,
            col: 1,
            tab_width: DEFAULT_TAB_WIDTH,
            reached_end: false,
            errors: VecDeque::new(),
            read_error: None,
        }
    }

    /// Override how many columns a tab advances.
    pub fn with_tab_width(mut self, tab_width: usize) -> Self {
        self.tab_width = tab_width;
        self
    }

    /// Produce the next token. Once the input is exhausted every call
    /// returns an end-of-file token.
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();

            let Some(ch) = self.peek() else {
                self.reached_end = true;
                return Token::new(TokenKind::Eof, self.line, self.col);
            };

            let (line, col) = (self.line, self.col);

            let token = if ch.is_ascii_alphabetic() {
                self.scan_word(line, col)
            } else if ch.is_ascii_digit() {
                self.scan_number(line, col)
            } else if ch == '"' {
                self.scan_string(line, col)
            } else if ch == '/' && self.peek_at(1) == Some('-') && self.peek_at(2) == Some('-') {
                self.skip_comment();
                continue;
            } else {
                self.scan_symbol(ch, line, col)
            };

            tracing::trace!(kind = ?token.kind, line = token.line, col = token.col, "token");
            return token;
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Remove and return the oldest queued lexical error.
    pub fn next_error(&mut self) -> Option<Diagnostic> {
        self.errors.pop_front()
    }

    /// True once the end of input has been reached.
    pub fn at_end(&self) -> bool {
        self.reached_end
    }

    pub fn line(&self) -> usize {
        self.line
    }

    /// The I/O failure that ended the scan early, if any.
    pub fn take_read_error(&mut self) -> Option<io::Error> {
        self.read_error.take()
    }

    // ===== Character access =====

    /// Make sure the buffer has unread characters, reading the next line if
    /// needed. Returns `false` at end of input or on a read failure.
    fn fill(&mut self) -> bool {
        if self.position < self.buffer.len() {
            return true;
        }
        if self.reached_end || self.read_error.is_some() {
            return false;
        }

        let mut text = String::new();
        match self.reader.read_line(&mut text) {
            Ok(0) => false,
            Ok(_) => {
                self.buffer = text.chars().collect();
                self.position = 0;
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, line = self.line, "read failed");
                self.read_error = Some(err);
                false
            }
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.peek_at(0)
    }

    /// Look `offset` characters ahead without consuming. Lookahead never
    /// crosses into the next line.
    fn peek_at(&mut self, offset: usize) -> Option<char> {
        if !self.fill() {
            return None;
        }
        self.buffer.get(self.position + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        match ch {
            '\n' => {
                self.line += 1;
                self.col = 1;
            }
            '\t' => self.col += self.tab_width,
            _ => self.col += 1,
        }
        Some(ch)
    }

    fn bump_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Skip a `/--` comment up to, not including, the line terminator.
    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.bump();
        }
    }

    // ===== Token classes =====

    fn scan_word(&mut self, line: usize, col: usize) -> Token {
        let mut word = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() {
                word.push(ch);
                self.bump();
            } else {
                break;
            }
        }

        match TokenKind::keyword(&word) {
            Some(kind) => Token::new(kind, line, col),
            None => Token::with_lexeme(TokenKind::Identifier, line, col, word),
        }
    }

    fn scan_number(&mut self, line: usize, col: usize) -> Token {
        let mut digits = String::new();
        self.take_digits(&mut digits);

        // A '.' only belongs to the literal when a digit follows it.
        let is_float = self.peek() == Some('.')
            && self.peek_at(1).is_some_and(|c| c.is_ascii_digit());
        if !is_float {
            return Token::with_lexeme(TokenKind::IntLiteral, line, col, digits);
        }

        self.bump();
        digits.push('.');
        self.take_digits(&mut digits);
        Token::with_lexeme(TokenKind::FloatLiteral, line, col, digits)
    }

    fn take_digits(&mut self, out: &mut String) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                out.push(ch);
                self.bump();
            } else {
                break;
            }
        }
    }

    fn scan_string(&mut self, line: usize, col: usize) -> Token {
        self.bump();
        let mut contents = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.bump();
                    return Token::with_lexeme(TokenKind::StringLiteral, line, col, contents);
                }
                Some('\n') | Some('\r') | None => break,
                Some(ch) => {
                    contents.push(ch);
                    self.bump();
                }
            }
        }

        // The message keeps the opening quote's column; the token sits one before it
        let text = format!("\"{}", contents);
        let at = Token::with_lexeme(TokenKind::Undefined, line, col, text.as_str());
        self.report(&at, format!("unclosed string literal : {}", text));
        Token::with_lexeme(TokenKind::Undefined, line, col.saturating_sub(1), text)
    }

    fn scan_symbol(&mut self, ch: char, line: usize, col: usize) -> Token {
        let single = match ch {
            '%' => Some(TokenKind::Percent),
            '^' => Some(TokenKind::Caret),
            '.' => Some(TokenKind::Dot),
            ',' => Some(TokenKind::Comma),
            '[' => Some(TokenKind::LBracket),
            ']' => Some(TokenKind::RBracket),
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            ':' => Some(TokenKind::Colon),
            ';' => Some(TokenKind::Semicolon),
            _ => None,
        };
        if let Some(kind) = single {
            self.bump();
            return Token::new(kind, line, col);
        }

        // Operators that may take a trailing '='
        let pair = match ch {
            '+' => Some((TokenKind::Plus, TokenKind::PlusAssign)),
            '-' => Some((TokenKind::Minus, TokenKind::MinusAssign)),
            '*' => Some((TokenKind::Star, TokenKind::StarAssign)),
            '/' => Some((TokenKind::Slash, TokenKind::SlashAssign)),
            '<' => Some((TokenKind::Less, TokenKind::LessEqual)),
            '>' => Some((TokenKind::Greater, TokenKind::GreaterEqual)),
            '=' => Some((TokenKind::Assign, TokenKind::EqualEqual)),
            _ => None,
        };
        if let Some((plain, with_eq)) = pair {
            self.bump();
            let kind = if self.bump_if('=') { with_eq } else { plain };
            return Token::new(kind, line, col);
        }

        if ch == '!' && self.peek_at(1) == Some('=') {
            self.bump();
            self.bump();
            return Token::new(TokenKind::NotEqual, line, col);
        }

        self.scan_invalid(line, col)
    }

    /// Collect a run of unrecognised characters into one error token.
    fn scan_invalid(&mut self, line: usize, col: usize) -> Token {
        let mut sequence = String::new();
        if let Some(first) = self.bump() {
            sequence.push(first);
        }

        while let Some(ch) = self.peek() {
            let ends_sequence = DELIMITERS.contains(ch)
                || ch.is_ascii_alphanumeric()
                || ch.is_whitespace()
                || (ch == '!' && self.peek_at(1) == Some('='));
            if ends_sequence {
                break;
            }
            sequence.push(ch);
            self.bump();
        }

        let token = Token::with_lexeme(TokenKind::Undefined, line, col, sequence);
        self.report(&token, format!("invalid character sequence : {}", token.text()));
        token
    }

    fn report(&mut self, token: &Token, description: String) {
        tracing::debug!(line = token.line, col = token.col, %description, "lexical error");
        self.errors.push_back(Diagnostic::lexical(token.clone(), description));
    }
}

impl<R: BufRead> Iterator for Scanner<R> {
    type Item = Token;

    /// Yields tokens up to, not including, end of file.
    fn next(&mut self) -> Option<Token> {
        let token = self.next_token();
        (token.kind != TokenKind::Eof).then_some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::from_source(source).map(|t| t.kind).collect()
    }

    #[test]
    fn test_program_header() {
        let mut scanner = Scanner::from_source("CD18 demo\nconstants n = 10");
        let tokens: Vec<Token> = scanner.by_ref().collect();

        assert!(matches!(tokens[0].kind, TokenKind::Cd18));
        assert!(matches!(tokens[1].kind, TokenKind::Identifier));
        assert_eq!(tokens[1].text(), "demo");
        assert_eq!((tokens[2].line, tokens[2].col), (2, 1));
        assert!(matches!(tokens[2].kind, TokenKind::Constants));
        assert_eq!(tokens[4].kind, TokenKind::Assign);
        assert_eq!(tokens[5].text(), "10");
        assert!(scanner.at_end());
        assert!(!scanner.has_errors());
    }

    #[test]
    fn test_two_character_operators() {
        assert_eq!(
            kinds("+= -= *= /= <= >= == != + - * / < > ="),
            vec![
                TokenKind::PlusAssign,
                TokenKind::MinusAssign,
                TokenKind::StarAssign,
                TokenKind::SlashAssign,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::EqualEqual,
                TokenKind::NotEqual,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Assign,
            ]
        );
    }

    #[test]
    fn test_comment_skipped() {
        let mut scanner = Scanner::from_source("x /-- ignore = me\ny");
        let x = scanner.next_token();
        let y = scanner.next_token();
        assert_eq!(x.text(), "x");
        assert_eq!(y.text(), "y");
        assert_eq!((y.line, y.col), (2, 1));
        assert_eq!(scanner.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_slash_minus_is_not_comment() {
        assert_eq!(
            kinds("a /-b"),
            vec![
                TokenKind::Identifier,
                TokenKind::Slash,
                TokenKind::Minus,
                TokenKind::Identifier
            ]
        );
    }

    #[test]
    fn test_tab_advances_four_columns() {
        let mut scanner = Scanner::from_source("\tx");
        assert_eq!(scanner.next_token().col, 5);

        let mut wide = Scanner::from_source("\tx").with_tab_width(8);
        assert_eq!(wide.next_token().col, 9);
    }

    #[test]
    fn test_invalid_sequence() {
        let mut scanner = Scanner::from_source("a @#$ b");
        let _ = scanner.next_token();
        let bad = scanner.next_token();
        assert_eq!(bad.kind, TokenKind::Undefined);
        assert_eq!(bad.text(), "@#$");
        assert_eq!(scanner.next_token().text(), "b");

        let err = scanner.next_error().expect("lexical error queued");
        assert_eq!(
            err.to_string(),
            "Lexical Error (1, 3): invalid character sequence : @#$"
        );
        assert!(scanner.next_error().is_none());
    }

    #[test]
    fn test_bang_only_valid_before_equals() {
        let mut scanner = Scanner::from_source("a ! b !!= c");
        let tokens: Vec<Token> = scanner.by_ref().collect();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::Undefined,
                TokenKind::Identifier,
                TokenKind::Undefined,
                TokenKind::NotEqual,
                TokenKind::Identifier,
            ]
        );
        assert_eq!(tokens[3].text(), "!");
        assert_eq!(scanner.errors.len(), 2);
    }

    #[test]
    fn test_string_literal() {
        let mut scanner = Scanner::from_source("print \"total: \";");
        let _ = scanner.next_token();
        let s = scanner.next_token();
        assert_eq!(s.kind, TokenKind::StringLiteral);
        assert_eq!(s.text(), "total: ");
        assert_eq!(scanner.next_token().kind, TokenKind::Semicolon);
    }

    #[test]
    fn test_unclosed_string_positions() {
        let mut scanner = Scanner::from_source("\"abc\nprint \"x");
        let first = scanner.next_token();
        assert_eq!((first.kind, first.col), (TokenKind::Undefined, 0));
        let _ = scanner.next_token();
        let second = scanner.next_token();
        assert_eq!((second.line, second.col), (2, 6));

        let errors: Vec<String> =
            std::iter::from_fn(|| scanner.next_error()).map(|e| e.to_string()).collect();
        assert_eq!(
            errors,
            vec![
                "Lexical Error (1, 1): unclosed string literal : \"abc",
                "Lexical Error (2, 7): unclosed string literal : \"x",
            ]
        );
    }

    #[test]
    fn test_carriage_return_is_whitespace() {
        assert_eq!(
            kinds("a\r\nb"),
            vec![TokenKind::Identifier, TokenKind::Identifier]
        );
    }
}
