//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct, the token-cursor helpers every
//! production shares, and the program-level entry point.
//!
//! # Parser Architecture
//!
//! Recursive descent, one method per grammar production:
//! - This module: Parser struct, cursor and recovery helpers, `parse_program`
//! - `declarations`: globals, types, arrays, functions, parameters, locals
//! - `statements`: statement lists and every statement form
//! - `expressions`: boolean, relational and arithmetic precedence levels
//!
//! # Error recovery
//!
//! Productions never return errors. A missing token is reported and parsing
//! continues as if it were present; a token that cannot start what is
//! expected is reported and skipped up to a production-specific set of
//! synchronization tokens, and an [`NodeKind::Undefined`] node stands in for
//! the discarded input. End of file always stops a skip, so every loop makes
//! progress.

use crate::compiler::Compilation;
use crate::config::Config;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::FrontEndError;
use crate::parser::ast::{Node, NodeKind};
use crate::parser::scanner::Scanner;
use crate::parser::token::{Token, TokenKind};
use crate::semantic::fold::Folder;
use crate::semantic::symbols::{
    DataType, SymbolError, SymbolId, SymbolKind, SymbolTable, TableEntry,
};
use std::collections::VecDeque;
use std::io::{BufRead, Cursor};

/// Recursive descent parser for CD18.
///
/// Pulls tokens from the [`Scanner`] on demand through a small lookahead
/// buffer, declares and resolves names in its [`SymbolTable`], folds every
/// completed expression, and queues every problem in its [`Diagnostics`].
pub struct Parser<R> {
    scanner: Scanner<R>,
    lookahead: VecDeque<Token>,
    pub(crate) symbols: SymbolTable,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) config: Config,
    /// Enclosing `if` statements, so `else` ends a statement list
    pub(crate) if_depth: usize,
    /// Enclosing `repeat` statements, so `until` ends a statement list
    pub(crate) repeat_depth: usize,
}

impl Parser<Cursor<String>> {
    pub fn from_source(source: &str) -> Self {
        Parser::new(Cursor::new(source.to_string()), Config::default())
    }
}

impl<R: BufRead> Parser<R> {
    pub fn new(reader: R, config: Config) -> Self {
        let scanner = Scanner::new(reader).with_tab_width(config.tab_width);
        Self {
            scanner,
            lookahead: VecDeque::new(),
            symbols: SymbolTable::new(),
            diagnostics: Diagnostics::new(),
            config,
            if_depth: 0,
            repeat_depth: 0,
        }
    }

    /// Parse a whole program:
    /// `CD18 id globals funcs main slist begin stats end CD18 id`.
    pub fn parse_program(&mut self) -> Node {
        let start = self.peek().clone();
        if !self.match_token(TokenKind::Cd18) {
            self.report_syntax(&start, "Program must begin with CD18.");
        }

        let mut program = Node::new(NodeKind::Program);
        if self.check(TokenKind::Identifier) {
            let name = self.advance();
            program.symbol =
                self.declare(TableEntry::new(SymbolKind::Program, &name, DataType::Void), &name);
            program.token = Some(name);
        } else {
            let found = self.peek().clone();
            self.report_syntax(&found, "Expected identifier.");
            program.token = Some(start);
        }

        let globals = self.parse_globals();
        let functions = self.parse_functions();
        let name = program.symbol.map(|id| self.symbols.entry(id).name.clone());
        let main = self.parse_main(name.as_deref());

        let program = program
            .with_left(globals)
            .with_middle_opt(functions)
            .with_right(main);

        if !self.check(TokenKind::Eof) {
            let extra = self.peek().clone();
            self.report_syntax(&extra, "Expected end of file.");
            while !self.check(TokenKind::Eof) {
                self.advance();
            }
        }

        program
    }

    /// Hand over the run's results, or the read failure that cut it short.
    pub fn finish(mut self, tree: Node) -> Result<Compilation, FrontEndError> {
        self.drain_scanner_errors();
        if let Some(err) = self.scanner.take_read_error() {
            return Err(FrontEndError::Read(err));
        }
        Ok(Compilation {
            tree,
            symbols: self.symbols,
            diagnostics: self.diagnostics,
        })
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    // ===== Token cursor =====

    fn fill(&mut self, n: usize) {
        while self.lookahead.len() <= n {
            let token = self.scanner.next_token();
            self.drain_scanner_errors();
            self.lookahead.push_back(token);
        }
    }

    /// Move lexical errors into the run-wide queue as tokens are pulled, so
    /// the queue stays in detection order.
    fn drain_scanner_errors(&mut self) {
        while let Some(err) = self.scanner.next_error() {
            self.diagnostics.report(err);
        }
    }

    pub(crate) fn peek(&mut self) -> &Token {
        self.peek_nth(0)
    }

    pub(crate) fn peek_nth(&mut self, n: usize) -> &Token {
        self.fill(n);
        &self.lookahead[n]
    }

    pub(crate) fn peek_kind(&mut self) -> TokenKind {
        self.peek().kind
    }

    pub(crate) fn advance(&mut self) -> Token {
        self.fill(0);
        match self.lookahead.pop_front() {
            Some(token) => token,
            None => Token::new(TokenKind::Eof, self.scanner.line(), 1),
        }
    }

    pub(crate) fn check(&mut self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn check_any(&mut self, kinds: &[TokenKind]) -> bool {
        let kind = self.peek_kind();
        kinds.contains(&kind)
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or report `message` at the current token without
    /// consuming it.
    pub(crate) fn expect(&mut self, kind: TokenKind, message: &str) -> bool {
        if self.match_token(kind) {
            return true;
        }
        let found = self.peek().clone();
        self.report_syntax(&found, message);
        false
    }

    /// Discard tokens until one of `sync` (or end of file) is next.
    pub(crate) fn skip_until(&mut self, sync: &[TokenKind]) {
        while !self.check(TokenKind::Eof) && !self.check_any(sync) {
            let skipped = self.advance();
            tracing::trace!(kind = ?skipped.kind, line = skipped.line, "skipped");
        }
    }

    /// Discard the remaining tokens on `line`.
    pub(crate) fn skip_line(&mut self, line: usize) {
        while !self.check(TokenKind::Eof) && self.peek().line == line {
            self.advance();
        }
    }

    // ===== Reporting and semantic helpers =====

    pub(crate) fn report_syntax(&mut self, token: &Token, message: &str) {
        self.diagnostics.report(Diagnostic::syntax(token.clone(), message));
    }

    pub(crate) fn report_semantic(&mut self, token: &Token, message: &str) {
        self.diagnostics.report(Diagnostic::semantic(token.clone(), message));
    }

    /// Add `entry` to the current scope, reporting a redeclaration.
    pub(crate) fn declare(&mut self, entry: TableEntry, at: &Token) -> Option<SymbolId> {
        match self.symbols.add_symbol(entry) {
            Ok(id) => Some(id),
            Err(SymbolError::Duplicate { name, line, col }) => {
                tracing::debug!(%name, line, col, "redeclared");
                self.report_semantic(at, "Identifier already declared.");
                None
            }
        }
    }

    pub(crate) fn fold(&mut self, node: Node) -> Node {
        Folder::new(&self.symbols, &mut self.diagnostics).fold_constants(node)
    }

    /// Fold a value that may stand on its own as `true` or `false`.
    pub(crate) fn fold_value(&mut self, node: Node) -> Node {
        if node.kind.is_bool_literal() {
            node
        } else {
            self.fold(node)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookahead_does_not_consume() {
        let mut parser = Parser::from_source("a b c");
        assert_eq!(parser.peek_nth(2).text(), "c");
        assert_eq!(parser.advance().text(), "a");
        assert_eq!(parser.peek().text(), "b");
    }

    #[test]
    fn test_expect_reports_without_consuming() {
        let mut parser = Parser::from_source("x ;");
        assert!(!parser.expect(TokenKind::Colon, "Missing \":\" after identifier."));
        assert_eq!(parser.peek().text(), "x");
        assert_eq!(parser.diagnostics().len(), 1);
    }

    #[test]
    fn test_skip_stops_at_eof() {
        let mut parser = Parser::from_source("a b c");
        parser.skip_until(&[TokenKind::Semicolon]);
        assert!(parser.check(TokenKind::Eof));
        assert!(parser.advance().is(TokenKind::Eof));
    }

    #[test]
    fn test_skip_line() {
        let mut parser = Parser::from_source("a b\nc");
        parser.skip_line(1);
        assert_eq!(parser.peek().text(), "c");
    }

    #[test]
    fn test_lexical_errors_drained_in_order() {
        let mut parser = Parser::from_source("@ x $");
        while !parser.check(TokenKind::Eof) {
            parser.advance();
        }
        let messages: Vec<String> = parser.diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "Lexical Error (1, 1): invalid character sequence : @",
                "Lexical Error (1, 5): invalid character sequence : $",
            ]
        );
    }
}
