//! Expression parsing implementation
//!
//! Precedence levels, lowest first, each a method consuming left to right:
//!
//! | Level      | Operators                     | Assoc |
//! |------------|-------------------------------|-------|
//! | bool       | `and` `or` `xor`              | left  |
//! | rel        | `not` prefix, one relational  | none  |
//! | expr       | `+` `-`                       | left  |
//! | term       | `*` `/` `%`                   | left  |
//! | factor     | `^`                           | left  |
//! | exponent   | literals, `( bool )`, variables, calls, `not bool` | - |
//!
//! Relations fold both sides as soon as they are built; when both reduce to
//! numeric literals the relation itself becomes `true` or `false`.

use crate::parser::ast::{Node, NodeKind};
use crate::parser::parse::Parser;
use crate::parser::token::{Token, TokenKind};
use crate::semantic::fold::{compare, literal_value};
use std::io::BufRead;

/// Where an operand that cannot start an expression stops being skipped.
const OPERAND_SYNC: &[TokenKind] = &[
    TokenKind::Comma,
    TokenKind::Types,
    TokenKind::Arrays,
    TokenKind::Function,
    TokenKind::Main,
    TokenKind::RBracket,
    TokenKind::Semicolon,
    TokenKind::RParen,
    TokenKind::End,
    TokenKind::Until,
    TokenKind::Else,
];

impl<R: BufRead> Parser<R> {
    /// `rel {and|or|xor rel}`
    pub(crate) fn parse_bool(&mut self) -> Node {
        let mut left = self.parse_rel();

        while self.check_any(&[TokenKind::And, TokenKind::Or, TokenKind::Xor]) {
            let op = self.advance();
            let logop = match op.kind {
                TokenKind::And => NodeKind::And,
                TokenKind::Or => NodeKind::Or,
                _ => NodeKind::Xor,
            };
            let right = self.parse_rel();
            left = Node::new(NodeKind::Bool)
                .with_left(left)
                .with_middle(Node::leaf(logop, op))
                .with_right(right);
        }

        left
    }

    /// `not rel | expr [relop expr]`
    fn parse_rel(&mut self) -> Node {
        if self.check(TokenKind::Not) {
            let op = self.advance();
            let operand = self.parse_rel();
            return Node::leaf(NodeKind::Not, op).with_left(operand);
        }

        let left = self.parse_folded_expr();

        let kind = match self.peek_kind() {
            TokenKind::EqualEqual => NodeKind::Equal,
            TokenKind::NotEqual => NodeKind::NotEqual,
            TokenKind::Greater => NodeKind::Greater,
            TokenKind::GreaterEqual => NodeKind::GreaterEqual,
            TokenKind::Less => NodeKind::Less,
            TokenKind::LessEqual => NodeKind::LessEqual,
            _ => return left,
        };
        let op = self.advance();
        let right = self.parse_folded_expr();

        if let (Ok(a), Ok(b)) = (literal_value(&left), literal_value(&right)) {
            if let Some(result) = compare(kind, a, b) {
                let at = left.first_token().cloned().unwrap_or(op);
                let (node_kind, token_kind) = if result {
                    (NodeKind::True, TokenKind::True)
                } else {
                    (NodeKind::False, TokenKind::False)
                };
                tracing::debug!(relation = %kind, result, "relation folded");
                return Node::leaf(node_kind, Token::new(token_kind, at.line, at.col));
            }
        }

        Node::binary(kind, op, left, right)
    }

    fn parse_folded_expr(&mut self) -> Node {
        let expr = self.parse_expr();
        self.fold_value(expr)
    }

    /// `term {+|- term}`
    pub(crate) fn parse_expr(&mut self) -> Node {
        let mut left = self.parse_term();

        loop {
            let kind = match self.peek_kind() {
                TokenKind::Plus => NodeKind::Add,
                TokenKind::Minus => NodeKind::Sub,
                _ => break,
            };
            let op = self.advance();
            let right = self.parse_term();
            left = Node::binary(kind, op, left, right);
        }

        left
    }

    /// `factor {*|/|% factor}`
    fn parse_term(&mut self) -> Node {
        let mut left = self.parse_factor();

        loop {
            let kind = match self.peek_kind() {
                TokenKind::Star => NodeKind::Mul,
                TokenKind::Slash => NodeKind::Div,
                TokenKind::Percent => NodeKind::Mod,
                _ => break,
            };
            let op = self.advance();
            let right = self.parse_factor();
            left = Node::binary(kind, op, left, right);
        }

        left
    }

    /// `exponent {^ exponent}`
    fn parse_factor(&mut self) -> Node {
        let mut left = self.parse_exponent();

        while self.check(TokenKind::Caret) {
            let op = self.advance();
            let right = self.parse_exponent();
            left = Node::binary(NodeKind::Pow, op, left, right);
        }

        left
    }

    fn parse_exponent(&mut self) -> Node {
        match self.peek_kind() {
            TokenKind::IntLiteral => Node::leaf(NodeKind::IntLit, self.advance()),
            TokenKind::FloatLiteral => Node::leaf(NodeKind::FloatLit, self.advance()),
            TokenKind::True => Node::leaf(NodeKind::True, self.advance()),
            TokenKind::False => Node::leaf(NodeKind::False, self.advance()),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_bool();
                self.expect(TokenKind::RParen, "Missing \")\" in expression.");
                inner
            }
            TokenKind::Not => {
                let op = self.advance();
                let operand = self.parse_bool();
                Node::leaf(NodeKind::Not, op).with_left(operand)
            }
            TokenKind::Identifier => {
                let name = self.advance();
                if !self.check(TokenKind::LParen) {
                    return self.parse_variable(name);
                }
                if !self.is_function(&name) {
                    self.report_semantic(&name, "Function not defined.");
                }
                self.parse_call(NodeKind::FnCall, name)
            }
            _ => {
                let found = self.peek().clone();
                self.report_syntax(&found, "Expected operand or expression.");
                while !self.check(TokenKind::Eof)
                    && !self.check_any(OPERAND_SYNC)
                    && self.peek().line == found.line
                {
                    self.advance();
                }
                Node::undefined(found)
            }
        }
    }

    /// `id` or `id [ expr ] . id`, once `id` is consumed.
    pub(crate) fn parse_variable(&mut self, name: Token) -> Node {
        let symbol = self.symbols.lookup(name.text());
        if symbol.is_none() {
            self.report_semantic(&name, "Undeclared identifier.");
        }

        if !self.match_token(TokenKind::LBracket) {
            return Node::leaf(NodeKind::SimpleVar, name).with_symbol(symbol);
        }

        let index = self.parse_expr();
        let index = self.fold(index);
        self.expect(TokenKind::RBracket, "Missing \"]\" after array index.");
        self.expect(TokenKind::Dot, "Missing \".\" after array index.");

        let field = if self.check(TokenKind::Identifier) {
            let field_name = self.advance();
            let field_symbol = symbol
                .and_then(|array| self.symbols.element_record(array))
                .and_then(|record| {
                    let found = self.symbols.field(record, field_name.text());
                    if found.is_none() {
                        self.report_semantic(&field_name, "Field not defined in record type.");
                    }
                    found
                });
            Node::leaf(NodeKind::SimpleVar, field_name).with_symbol(field_symbol)
        } else {
            let found = self.peek().clone();
            self.report_syntax(&found, "Expected identifier.");
            Node::undefined(found)
        };

        Node::leaf(NodeKind::ArrayVar, name)
            .with_symbol(symbol)
            .with_left(index)
            .with_right(field)
    }

    /// Can the current token begin an expression?
    pub(crate) fn starts_expression(&mut self) -> bool {
        self.check_any(&[
            TokenKind::IntLiteral,
            TokenKind::FloatLiteral,
            TokenKind::True,
            TokenKind::False,
            TokenKind::LParen,
            TokenKind::Identifier,
            TokenKind::Not,
        ])
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::{Node, NodeKind};
    use crate::parser::parse::Parser;

    fn expr(source: &str) -> (Node, Vec<String>) {
        let mut parser = Parser::from_source(source);
        let node = parser.parse_bool();
        let messages = parser.diagnostics().iter().map(|d| d.to_string()).collect();
        (node, messages)
    }

    #[test]
    fn test_precedence_folds() {
        let (node, messages) = expr("2 + 3 * 4");
        assert!(messages.is_empty());
        assert_eq!(node.kind, NodeKind::IntLit);
        assert_eq!(node.text(), "14");
    }

    #[test]
    fn test_left_associative_subtraction() {
        let (node, _) = expr("10 - 4 - 3");
        assert_eq!(node.text(), "3");
        let (node, _) = expr("2 ^ 3 ^ 2");
        assert_eq!(node.text(), "64");
    }

    #[test]
    fn test_parentheses() {
        let (node, _) = expr("(2 + 3) * 4");
        assert_eq!(node.text(), "20");
    }

    #[test]
    fn test_relation_folds_to_boolean() {
        let (node, _) = expr("1 + 1 == 2");
        assert_eq!(node.kind, NodeKind::True);
        let (node, _) = expr("2.5 < 1");
        assert_eq!(node.kind, NodeKind::False);
        let (node, _) = expr("3 != 3.0");
        assert_eq!(node.kind, NodeKind::False);
    }

    #[test]
    fn test_boolean_chain() {
        let (node, messages) = expr("1 < 2 and not 3 > 4 or true");
        assert!(messages.is_empty());
        assert_eq!(node.kind, NodeKind::Bool);
        assert_eq!(node.middle().map(|m| m.kind), Some(NodeKind::Or));
        let inner = node.left().expect("left-nested bool");
        assert_eq!(inner.kind, NodeKind::Bool);
        assert_eq!(inner.right().map(|r| r.kind), Some(NodeKind::Not));
    }

    #[test]
    fn test_missing_operand() {
        let (node, messages) = expr("* 3, 4");
        assert_eq!(node.kind, NodeKind::Undefined);
        assert_eq!(messages, vec!["Syntax Error (1, 1): Expected operand or expression."]);
    }

    #[test]
    fn test_divide_by_zero_in_expression() {
        let (node, messages) = expr("1 / 0");
        assert_eq!(node.kind, NodeKind::Div);
        assert_eq!(messages, vec!["Semantic Error (1, 5): Divide by zero error."]);
    }

    #[test]
    fn test_boolean_in_arithmetic() {
        let (_, messages) = expr("true + 1");
        assert_eq!(
            messages,
            vec!["Semantic Error (1, 1): Illegal boolean in numeric expression."]
        );
    }

    #[test]
    fn test_undeclared_function_in_expression() {
        let (node, messages) = expr("g(1)");
        assert_eq!(node.kind, NodeKind::FnCall);
        assert!(node.symbol.is_none());
        assert_eq!(messages, vec!["Semantic Error (1, 1): Function not defined."]);
    }
}
