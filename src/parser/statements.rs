//! Statement parsing implementation
//!
//! This module handles statement lists and every statement form:
//!
//! ```text
//! stat ::= repeat ( [asgnlist] ) stats until bool ;
//!        | var asgnop bool ;          | id ( [elist] ) ;
//!        | input vlist ;             | print prlist ;   | printline prlist ;
//!        | return [expr] ;
//!        | for ( [asgnlist] ; bool ) stats end
//!        | if ( bool ) stats [else stats] end
//! ```
//!
//! Only plain `=` assignments are type checked. `+=`, `-=`, `*=` and `/=`
//! build their nodes and forget the target's known value, nothing more.

use crate::parser::ast::{Node, NodeKind};
use crate::parser::parse::Parser;
use crate::parser::token::{Token, TokenKind};
use crate::semantic::symbols::{DataType, SymbolKind};
use std::io::BufRead;

const MISSING_SEMICOLON: &str = "Missing \";\" after statement.";

/// Tokens that close a block no matter how deeply statements are nested.
const BLOCK_END: &[TokenKind] = &[
    TokenKind::End,
    TokenKind::Function,
    TokenKind::Main,
    TokenKind::Cd18,
    TokenKind::Eof,
];

impl<R: BufRead> Parser<R> {
    /// Parse statements up to the next block terminator and chain them into
    /// a right-nested list.
    pub(crate) fn parse_statements(&mut self) -> Node {
        let mut items = Vec::new();
        while !self.at_block_end() {
            items.push(self.parse_statement());
        }

        match Node::chain(NodeKind::Statements, items) {
            Some(list) => list,
            None => {
                let found = self.peek().clone();
                self.report_syntax(&found, "Expected statement.");
                Node::undefined(found)
            }
        }
    }

    fn at_block_end(&mut self) -> bool {
        let kind = self.peek_kind();
        BLOCK_END.contains(&kind)
            || (kind == TokenKind::Else && self.if_depth > 0)
            || (kind == TokenKind::Until && self.repeat_depth > 0)
    }

    /// Parse a single statement
    pub(crate) fn parse_statement(&mut self) -> Node {
        match self.peek_kind() {
            TokenKind::Repeat => self.parse_repeat(),
            TokenKind::Identifier => self.parse_identifier_statement(),
            TokenKind::Input => self.parse_input(),
            TokenKind::Print => self.parse_print(NodeKind::Print),
            TokenKind::PrintLine => self.parse_print(NodeKind::PrintLine),
            TokenKind::Return => self.parse_return(),
            TokenKind::For => self.parse_for(),
            TokenKind::If => self.parse_if(),
            TokenKind::Else => {
                let keyword = self.advance();
                self.report_syntax(&keyword, "Else without if statement.");
                self.skip_until(&[TokenKind::Semicolon, TokenKind::End, TokenKind::Until]);
                self.match_token(TokenKind::Semicolon);
                Node::undefined(keyword)
            }
            _ => {
                let found = self.peek().clone();
                self.report_syntax(&found, "Invalid start of statement.");
                self.skip_line(found.line);
                Node::undefined(found)
            }
        }
    }

    /// Consume the `;` ending a statement. A missing one is reported once and
    /// nothing is skipped, so the next statement still parses.
    fn end_statement(&mut self) {
        self.expect(TokenKind::Semicolon, MISSING_SEMICOLON);
    }

    // ===== Identifier-led statements =====

    fn parse_identifier_statement(&mut self) -> Node {
        let name = self.advance();

        if self.check(TokenKind::LParen) {
            return self.parse_call_statement(name);
        }

        let statement = self.parse_assignment(name);
        if statement.kind != NodeKind::Undefined {
            self.end_statement();
        }
        statement
    }

    fn parse_call_statement(&mut self, name: Token) -> Node {
        if !self.is_function(&name) {
            self.report_semantic(&name, "Function not defined.");
            self.skip_line(name.line);
            return Node::undefined(name);
        }

        let call = self.parse_call(NodeKind::Call, name);
        self.end_statement();
        call
    }

    /// Declared in the global scope as a function.
    pub(crate) fn is_function(&self, name: &Token) -> bool {
        self.symbols.has_global_id(name.text())
            && self
                .symbols
                .lookup_global(name.text())
                .is_some_and(|id| self.symbols.entry(id).kind == SymbolKind::Function)
    }

    /// `id ( [elist] )` once `id` is consumed.
    pub(crate) fn parse_call(&mut self, kind: NodeKind, name: Token) -> Node {
        self.advance(); // '('
        let args = if self.check(TokenKind::RParen) {
            None
        } else {
            self.parse_expr_list()
        };
        self.expect(TokenKind::RParen, "Missing \")\" in argument list.");

        let symbol = self
            .symbols
            .lookup_global(name.text())
            .filter(|&id| self.symbols.entry(id).kind == SymbolKind::Function);

        if let Some(id) = symbol {
            let given = args.as_ref().map_or(0, |a| a.items(NodeKind::ExprList).len());
            if given != self.symbols.entry(id).param_types.len() {
                self.report_semantic(&name, "Incorrect number of arguments.");
            }
        }

        Node::leaf(kind, name).with_symbol(symbol).with_left_opt(args)
    }

    fn parse_expr_list(&mut self) -> Option<Node> {
        let mut items = Vec::new();
        loop {
            items.push(self.parse_bool());

            if self.match_token(TokenKind::Comma) {
                continue;
            }
            if self.starts_expression() {
                let found = self.peek().clone();
                self.report_syntax(&found, "Arguments not separated with \",\".");
                continue;
            }
            break;
        }
        Node::chain(NodeKind::ExprList, items)
    }

    /// `var asgnop bool` once the variable's identifier is consumed. Returns
    /// an undefined node, with the rest of the line skipped, when no
    /// assignment operator follows the variable.
    fn parse_assignment(&mut self, name: Token) -> Node {
        let target = self.parse_variable(name);

        let op = self.peek().clone();
        let kind = match op.kind {
            TokenKind::Assign => NodeKind::Assign,
            TokenKind::PlusAssign => NodeKind::PlusAssign,
            TokenKind::MinusAssign => NodeKind::MinusAssign,
            TokenKind::StarAssign => NodeKind::StarAssign,
            TokenKind::SlashAssign => NodeKind::SlashAssign,
            _ => {
                self.report_syntax(&op, "Invalid character following identifier.");
                let line = target.first_token().map_or(op.line, |t| t.line);
                self.skip_line(line);
                return Node::undefined(op);
            }
        };
        self.advance();

        let value = self.parse_bool();
        let value = if kind == NodeKind::Assign {
            self.check_assignment(&target, value, &op)
        } else {
            if let Some(id) = target.symbol.filter(|_| target.kind == NodeKind::SimpleVar) {
                self.symbols.clear_value(id);
            }
            value
        };

        Node::leaf(kind, op).with_left(target).with_right(value)
    }

    /// Fold the right side of `=`, check it against the target's type and
    /// record the value the target now holds. Only an integer literal is
    /// promoted for a real target; any other integer expression mismatches.
    fn check_assignment(&mut self, target: &Node, value: Node, op: &Token) -> Node {
        let mut value = self.fold_value(value);

        let target_type = self.type_of(target);
        let value_type = self.type_of(&value);

        let matches = match (&target_type, &value_type) {
            (None, _) | (_, None) | (Some(DataType::Unknown), _) | (_, Some(DataType::Unknown)) => true,
            (Some(t), Some(v)) if t == v => true,
            (Some(DataType::Real), _) if value.kind == NodeKind::IntLit => {
                promote_to_real(&mut value);
                true
            }
            _ => false,
        };

        if !matches {
            self.report_semantic(op, "Type mismatch.");
        }

        if let Some(id) = target.symbol.filter(|_| target.kind == NodeKind::SimpleVar) {
            let known = match value.kind {
                NodeKind::IntLit | NodeKind::FloatLit => Some(value.text().to_string()),
                NodeKind::True => Some("true".to_string()),
                NodeKind::False => Some("false".to_string()),
                _ => None,
            };
            match known {
                Some(text) if matches => self.symbols.update_value(id, text),
                _ => self.symbols.clear_value(id),
            }
        }

        value
    }

    /// The static type of an expression, when it can be told without
    /// evaluating anything.
    fn type_of(&self, node: &Node) -> Option<DataType> {
        let symbol_type = |id| Some(self.symbols.entry(id).data_type.clone());
        match node.kind {
            NodeKind::IntLit => Some(DataType::Integer),
            NodeKind::FloatLit => Some(DataType::Real),
            NodeKind::True
            | NodeKind::False
            | NodeKind::Bool
            | NodeKind::Not
            | NodeKind::Equal
            | NodeKind::NotEqual
            | NodeKind::Greater
            | NodeKind::GreaterEqual
            | NodeKind::Less
            | NodeKind::LessEqual => Some(DataType::Boolean),
            NodeKind::SimpleVar | NodeKind::FnCall => node.symbol.and_then(symbol_type),
            NodeKind::ArrayVar => node.right().and_then(|f| f.symbol).and_then(symbol_type),
            kind if kind.is_arithmetic() => {
                let left = self.type_of(node.left()?)?;
                let right = self.type_of(node.right()?)?;
                match (left, right) {
                    (DataType::Unknown, _) | (_, DataType::Unknown) => Some(DataType::Unknown),
                    // `%` and `^` take integers only; the fold reports a real operand
                    (DataType::Real, _) | (_, DataType::Real)
                        if matches!(node.kind, NodeKind::Mod | NodeKind::Pow) =>
                    {
                        None
                    }
                    (DataType::Real, r) if r.is_numeric() => Some(DataType::Real),
                    (l, DataType::Real) if l.is_numeric() => Some(DataType::Real),
                    (DataType::Integer, DataType::Integer) => Some(DataType::Integer),
                    // A non-numeric operand was reported by the fold
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn parse_assign_list(&mut self) -> Option<Node> {
        let mut items = Vec::new();
        while self.check(TokenKind::Identifier) {
            let name = self.advance();
            items.push(self.parse_assignment(name));
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        Node::chain(NodeKind::AssignList, items)
    }

    // ===== Input and output =====

    fn parse_input(&mut self) -> Node {
        let keyword = self.advance();
        let vars = self.parse_var_list();

        // Input overwrites whatever was known
        if let Some(vars) = &vars {
            for var in vars.items(NodeKind::VarList) {
                if let Some(id) = var.symbol.filter(|_| var.kind == NodeKind::SimpleVar) {
                    self.symbols.clear_value(id);
                }
            }
        }

        self.end_statement();
        Node::leaf(NodeKind::Input, keyword).with_left_opt(vars)
    }

    fn parse_var_list(&mut self) -> Option<Node> {
        let mut items = Vec::new();
        loop {
            if !self.check(TokenKind::Identifier) {
                let found = self.peek().clone();
                self.report_syntax(&found, "Expected variable or variable list.");
                self.skip_until(&[TokenKind::Semicolon, TokenKind::End, TokenKind::Until, TokenKind::Else]);
                items.push(Node::undefined(found));
                break;
            }
            let name = self.advance();
            items.push(self.parse_variable(name));

            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        Node::chain(NodeKind::VarList, items)
    }

    fn parse_print(&mut self, kind: NodeKind) -> Node {
        let keyword = self.advance();

        let mut items = Vec::new();
        loop {
            if self.check(TokenKind::StringLiteral) {
                let text = self.advance();
                items.push(Node::leaf(NodeKind::Str, text));
            } else if self.starts_expression() {
                let expr = self.parse_expr();
                items.push(self.fold_value(expr));
            } else {
                let found = self.peek().clone();
                self.report_syntax(&found, "Expected string or expression.");
                self.skip_until(&[TokenKind::Semicolon, TokenKind::End, TokenKind::Until, TokenKind::Else]);
                items.push(Node::undefined(found));
                break;
            }

            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        self.end_statement();
        Node::leaf(kind, keyword).with_left_opt(Node::chain(NodeKind::PrintList, items))
    }

    fn parse_return(&mut self) -> Node {
        let keyword = self.advance();
        let value = if self.starts_expression() {
            let expr = self.parse_expr();
            Some(self.fold_value(expr))
        } else {
            None
        };
        self.end_statement();
        Node::leaf(NodeKind::Return, keyword).with_left_opt(value)
    }

    // ===== Control flow =====

    /// `for ( [asgnlist] ; bool ) stats end`
    fn parse_for(&mut self) -> Node {
        let keyword = self.advance();
        self.expect(TokenKind::LParen, "Missing \"(\" after for statement.");
        let init = self.parse_assign_list();
        self.expect(TokenKind::Semicolon, "Missing \";\" after assignment list.");
        let condition = self.parse_bool();
        self.expect(TokenKind::RParen, "Missing \")\" after boolean expression.");

        let body = self.parse_statements();
        self.expect(TokenKind::End, "Missing end after for statement.");

        Node::leaf(NodeKind::For, keyword)
            .with_left_opt(init)
            .with_middle(condition)
            .with_right(body)
    }

    /// `repeat ( [asgnlist] ) stats until bool ;`
    fn parse_repeat(&mut self) -> Node {
        let keyword = self.advance();
        self.expect(TokenKind::LParen, "Missing \"(\" after repeat statement.");
        let init = self.parse_assign_list();
        self.expect(TokenKind::RParen, "Missing \")\" after assignment list.");

        self.repeat_depth += 1;
        let body = self.parse_statements();
        self.repeat_depth -= 1;

        let condition = if self.match_token(TokenKind::Until) {
            let condition = self.parse_bool();
            self.end_statement();
            condition
        } else {
            let found = self.peek().clone();
            self.report_syntax(&found, "Repeat loop without until.");
            if !self.at_block_end() {
                self.skip_until(&[TokenKind::Semicolon, TokenKind::End]);
                self.match_token(TokenKind::Semicolon);
            }
            Node::undefined(found)
        };

        Node::leaf(NodeKind::Repeat, keyword)
            .with_left_opt(init)
            .with_middle(body)
            .with_right(condition)
    }

    /// `if ( bool ) stats [else stats] end`
    fn parse_if(&mut self) -> Node {
        let keyword = self.advance();
        self.expect(TokenKind::LParen, "Missing \"(\" after if statement.");
        let condition = self.parse_bool();
        self.expect(TokenKind::RParen, "Missing \")\" after boolean expression.");

        self.if_depth += 1;
        let then_branch = self.parse_statements();
        self.if_depth -= 1;

        let node = if self.match_token(TokenKind::Else) {
            let else_branch = self.parse_statements();
            Node::leaf(NodeKind::IfThenElse, keyword)
                .with_left(condition)
                .with_middle(then_branch)
                .with_right(else_branch)
        } else {
            Node::leaf(NodeKind::IfThen, keyword)
                .with_left(condition)
                .with_right(then_branch)
        };

        self.expect(TokenKind::End, "Missing end after if statement.");
        node
    }
}

/// Rewrite an integer literal as the equivalent real literal.
fn promote_to_real(node: &mut Node) {
    node.kind = NodeKind::FloatLit;
    if let Some(token) = node.token.as_mut() {
        let text = format!("{}.0", token.text());
        token.kind = TokenKind::FloatLiteral;
        token.lexeme = Some(text);
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::NodeKind;
    use crate::parser::parse::Parser;

    fn parse_main(decls: &str, body: &str) -> (crate::compiler::Compilation, Vec<String>) {
        let source = format!("CD18 t\nmain {}\nbegin\n{}\nend CD18 t\n", decls, body);
        let mut parser = Parser::from_source(&source);
        let tree = parser.parse_program();
        let compilation = parser.finish(tree).expect("in-memory source");
        let messages = compilation.messages();
        (compilation, messages)
    }

    #[test]
    fn test_if_else_and_loops() {
        let (c, messages) = parse_main(
            "i : integer, done : boolean",
            "for (i = 0; i < 10) i += 1; end\n\
             repeat (done = false) input i; until done;\n\
             if (i > 3) print i; else printline \"small\"; end",
        );
        assert!(messages.is_empty(), "{:?}", messages);
        assert_eq!(c.tree.count(NodeKind::For), 1);
        assert_eq!(c.tree.count(NodeKind::Repeat), 1);
        assert_eq!(c.tree.count(NodeKind::IfThenElse), 1);
        assert_eq!(c.tree.count(NodeKind::PlusAssign), 1);
    }

    #[test]
    fn test_invalid_start_skips_line() {
        let (c, messages) = parse_main("x : integer", "x = 1;\n) x = 2;\nx = 3;");
        assert_eq!(messages, vec!["Syntax Error (5, 1): Invalid start of statement."]);
        assert_eq!(c.tree.count(NodeKind::Assign), 2);
        assert_eq!(c.tree.count(NodeKind::Undefined), 1);
    }

    #[test]
    fn test_else_without_if() {
        let (_, messages) = parse_main("x : integer", "else x = 1;\nx = 2;");
        assert_eq!(messages, vec!["Syntax Error (4, 1): Else without if statement."]);
    }

    #[test]
    fn test_if_takes_enclosing_end() {
        let (_, messages) = parse_main("x : integer", "if (x > 1) x = 2;");
        assert_eq!(messages, vec!["Syntax Error (5, 5): Missing end statement."]);
    }

    #[test]
    fn test_repeat_without_until() {
        let (_, messages) = parse_main("x : integer", "repeat () x = 1;");
        assert_eq!(messages, vec!["Syntax Error (5, 1): Repeat loop without until."]);
    }

    #[test]
    fn test_undeclared_variable() {
        let (_, messages) = parse_main("x : integer", "y = 1;");
        assert_eq!(messages, vec!["Semantic Error (4, 1): Undeclared identifier."]);
    }

    #[test]
    fn test_boolean_assignment() {
        let (c, messages) = parse_main("b : boolean, n : integer", "b = 1 < 2;\nn = true;");
        assert_eq!(messages, vec!["Semantic Error (5, 3): Type mismatch."]);
        let b = c.symbols.get_entry("b");
        assert!(b.is_none(), "locals are not visible once main is closed");
    }

    #[test]
    fn test_arithmetic_assignment_types() {
        let (_, messages) = parse_main(
            "x : integer, n : integer, r : real, b : boolean",
            "input x;\n\
             n = x * 1.5;\n\
             r = x * 2;\n\
             b = x + 1;\n\
             r = x + 2.5;\n\
             n = x - 1;\n\
             r = 3;",
        );
        assert_eq!(
            messages,
            vec![
                "Semantic Error (5, 3): Type mismatch.",
                "Semantic Error (6, 3): Type mismatch.",
                "Semantic Error (7, 3): Type mismatch.",
            ]
        );
    }

    #[test]
    fn test_input_forgets_known_value() {
        let (c, messages) = parse_main("n : integer, m : integer", "n = 4;\ninput n;\nm = n * 2;");
        assert!(messages.is_empty(), "{:?}", messages);
        let assigns: Vec<_> = c
            .tree
            .find(NodeKind::Statements)
            .map(|s| s.items(NodeKind::Statements))
            .unwrap_or_default();
        let last = assigns.last().expect("three statements");
        assert_eq!(last.right().map(|r| r.kind), Some(NodeKind::Mul));
    }

    #[test]
    fn test_boolean_literals_print_and_return() {
        let source = "CD18 t function f() : boolean begin return true; end \
                      main b : boolean begin print true; printline false, 1; b = f(); end CD18 t";
        let mut parser = Parser::from_source(source);
        let tree = parser.parse_program();
        let compilation = parser.finish(tree).expect("in-memory source");
        assert!(compilation.messages().is_empty(), "{:?}", compilation.messages());
        let ret = compilation.tree.find(NodeKind::Return).expect("return");
        assert_eq!(ret.left().map(|v| v.kind), Some(NodeKind::True));
    }

    #[test]
    fn test_call_argument_count() {
        let source = "CD18 t function f(a : integer) : void begin return; end \
                      main x : integer begin f(1, 2); end CD18 t";
        let mut parser = Parser::from_source(source);
        let tree = parser.parse_program();
        let messages = parser.finish(tree).expect("in-memory source").messages();
        assert_eq!(messages, vec!["Semantic Error (1, 80): Incorrect number of arguments."]);
    }
}
