//! Declaration parsing implementation
//!
//! Handles everything outside statement bodies:
//!
//! ```text
//! globals  ::= [constants initlist] [types typelist] [arrays arrdecls]
//! init     ::= id = expr
//! type     ::= id is sdecl {, sdecl} end | id is array [ expr ] of id
//! arrdecl  ::= id : typeid
//! func     ::= function id ( [plist] ) : rtype [dlist] begin stats end
//! param    ::= sdecl | arrdecl | const arrdecl
//! main     ::= main [slist] begin stats end CD18 id
//! ```
//!
//! Declarations are entered into the symbol table as they are parsed, so a
//! later declaration can refer to an earlier one (a constant used as an array
//! size, a record type used as an array element).

use crate::parser::ast::{Node, NodeKind};
use crate::parser::parse::Parser;
use crate::parser::token::{Token, TokenKind};
use crate::semantic::symbols::{DataType, SymbolId, SymbolKind, TableEntry};
use std::io::BufRead;

const CONSTANT_NOT_LITERAL: &str =
    "Constant assignment must be numeric literal or constant expression.";

/// Tokens that can start a global section or what follows the globals.
const GLOBAL_SYNC: &[TokenKind] = &[
    TokenKind::Constants,
    TokenKind::Types,
    TokenKind::Arrays,
    TokenKind::Function,
    TokenKind::Main,
];

fn primitive_type(kind: TokenKind) -> DataType {
    match kind {
        TokenKind::Integer => DataType::Integer,
        TokenKind::Real => DataType::Real,
        TokenKind::Boolean => DataType::Boolean,
        _ => DataType::Unknown,
    }
}

impl<R: BufRead> Parser<R> {
    /// Parse the optional constant, type and array sections.
    pub(crate) fn parse_globals(&mut self) -> Node {
        let mut globals = Node::leaf(NodeKind::Globals, self.peek().clone());

        if self.match_token(TokenKind::Constants) {
            globals.set_left(self.parse_init_list());
        }
        if self.match_token(TokenKind::Types) {
            globals.set_middle(self.parse_type_list());
        }
        if self.match_token(TokenKind::Arrays) {
            globals.set_right(self.parse_array_decls());
        }

        globals
    }

    // ===== Constants =====

    fn parse_init_list(&mut self) -> Option<Node> {
        let mut items = Vec::new();
        loop {
            items.push(self.parse_init());

            if self.match_token(TokenKind::Comma) {
                continue;
            }
            // `n = 1 m = 2`: report the gap and keep going
            if self.check(TokenKind::Identifier) && self.peek_nth(1).is(TokenKind::Assign) {
                let found = self.peek().clone();
                self.report_syntax(&found, "Expected \",\" after initialiser.");
                continue;
            }
            break;
        }
        Node::chain(NodeKind::InitList, items)
    }

    fn parse_init(&mut self) -> Node {
        if !self.check(TokenKind::Identifier) {
            let found = self.peek().clone();
            self.report_syntax(&found, "Expected identifier.");
            self.skip_until(&[TokenKind::Comma, TokenKind::Types, TokenKind::Arrays, TokenKind::Function, TokenKind::Main]);
            return Node::undefined(found);
        }
        let name = self.advance();

        self.expect(TokenKind::Assign, "Expected \"=\" operator.");

        let errors_before = self.diagnostics.len();
        let expr = self.parse_expr();
        let value = self.fold_value(expr);

        let data_type = match value.kind {
            NodeKind::IntLit => DataType::Integer,
            NodeKind::FloatLit => DataType::Real,
            _ => {
                // A fold that already failed has said why
                if self.diagnostics.len() == errors_before {
                    if let Some(at) = value.first_token().cloned() {
                        self.report_semantic(&at, CONSTANT_NOT_LITERAL);
                    }
                }
                DataType::Unknown
            }
        };

        let mut entry = TableEntry::new(SymbolKind::Constant, &name, data_type.clone());
        if data_type.is_numeric() {
            entry = entry.with_value(value.text());
        }
        let symbol = self.declare(entry, &name);

        Node::leaf(NodeKind::Init, name)
            .with_symbol(symbol)
            .with_left(value)
    }

    // ===== Types =====

    fn parse_type_list(&mut self) -> Option<Node> {
        if !self.check(TokenKind::Identifier) {
            let found = self.peek().clone();
            self.report_syntax(&found, "Expected type list identifier.");
            self.skip_until(GLOBAL_SYNC);
            return Some(Node::undefined(found));
        }

        let mut items = Vec::new();
        while self.check(TokenKind::Identifier) {
            items.push(self.parse_type());
        }
        Node::chain(NodeKind::TypeList, items)
    }

    fn parse_type(&mut self) -> Node {
        let name = self.advance();

        if !self.match_token(TokenKind::Is) {
            let found = self.peek().clone();
            self.report_syntax(&found, "Expected is after identifier.");
            if !self.check_any(&[TokenKind::Array, TokenKind::Identifier]) {
                self.skip_until(&[TokenKind::End, TokenKind::Arrays, TokenKind::Function, TokenKind::Main]);
                self.match_token(TokenKind::End);
                return Node::undefined(name);
            }
        }

        if self.match_token(TokenKind::Array) {
            self.parse_array_type(name)
        } else {
            self.parse_record_type(name)
        }
    }

    fn parse_record_type(&mut self, name: Token) -> Node {
        let record = self.declare(
            TableEntry::new(SymbolKind::RecordType, &name, DataType::Named(name.text().to_string())),
            &name,
        );

        let mut items = Vec::new();
        loop {
            items.push(self.parse_field(record));

            if self.match_token(TokenKind::Comma) {
                continue;
            }
            if self.check(TokenKind::Identifier) && self.peek_nth(1).is(TokenKind::Colon) {
                let found = self.peek().clone();
                self.report_syntax(&found, "Expected comma in field declaration list.");
                continue;
            }
            break;
        }

        self.expect(TokenKind::End, "Expected end statement in type definition.");

        Node::leaf(NodeKind::RecordType, name)
            .with_symbol(record)
            .with_left_opt(Node::chain(NodeKind::FieldList, items))
    }

    fn parse_field(&mut self, record: Option<SymbolId>) -> Node {
        if !self.check(TokenKind::Identifier) {
            let found = self.peek().clone();
            self.report_syntax(&found, "Expected identifier.");
            self.skip_until(&[TokenKind::Comma, TokenKind::End, TokenKind::Arrays, TokenKind::Function, TokenKind::Main]);
            return Node::undefined(found);
        }
        let name = self.advance();

        self.expect(TokenKind::Colon, "Missing \":\" after identifier.");

        let data_type = if self.peek_kind().is_primitive_type() {
            primitive_type(self.advance().kind)
        } else {
            let found = self.peek().clone();
            self.report_syntax(&found, "Expected primitive type.");
            self.skip_until(&[TokenKind::Comma, TokenKind::End, TokenKind::Arrays, TokenKind::Function, TokenKind::Main]);
            DataType::Unknown
        };

        let symbol = record.and_then(|record| {
            match self.symbols.add_field(record, TableEntry::new(SymbolKind::Field, &name, data_type)) {
                Ok(id) => Some(id),
                Err(_) => {
                    self.report_semantic(&name, "Identifier already declared.");
                    None
                }
            }
        });

        Node::leaf(NodeKind::SimpleDecl, name).with_symbol(symbol)
    }

    fn parse_array_type(&mut self, name: Token) -> Node {
        self.expect(TokenKind::LBracket, "Missing \"[\" after array.");

        let errors_before = self.diagnostics.len();
        let expr = self.parse_expr();
        let size_expr = self.fold(expr);

        let size = match size_expr.kind {
            NodeKind::IntLit => size_expr.text().parse::<i64>().ok(),
            _ => None,
        };
        if size.is_none() && self.diagnostics.len() == errors_before {
            if let Some(at) = size_expr.first_token().cloned() {
                self.report_semantic(&at, "Array size must be an integer constant.");
            }
        }

        self.expect(TokenKind::RBracket, "Missing \"]\" after array size.");
        self.expect(TokenKind::Of, "Expected of after array size.");

        let element = if self.check(TokenKind::Identifier) {
            let element = self.advance();
            let is_record = self
                .symbols
                .lookup_global(element.text())
                .is_some_and(|id| self.symbols.entry(id).kind == SymbolKind::RecordType);
            if !is_record {
                self.report_semantic(&element, "Undeclared type.");
            }
            Some(element.text().to_string())
        } else {
            let found = self.peek().clone();
            self.report_syntax(&found, "Expected identifier.");
            None
        };

        let symbol = self.declare(
            TableEntry::new(SymbolKind::ArrayType, &name, DataType::Named(name.text().to_string())),
            &name,
        );
        if let (Some(id), Some(element)) = (symbol, element) {
            self.symbols.set_array_type(id, element, size);
        }

        Node::leaf(NodeKind::ArrayType, name)
            .with_symbol(symbol)
            .with_left(size_expr)
    }

    // ===== Arrays =====

    fn parse_array_decls(&mut self) -> Option<Node> {
        let mut items = Vec::new();
        loop {
            items.push(self.parse_array_decl(SymbolKind::Array));

            if self.match_token(TokenKind::Comma) {
                continue;
            }
            if self.check(TokenKind::Identifier) && self.peek_nth(1).is(TokenKind::Colon) {
                let found = self.peek().clone();
                self.report_syntax(&found, "Expected comma in array declaration list.");
                continue;
            }
            break;
        }
        Node::chain(NodeKind::ArrayDeclList, items)
    }

    /// `id : typeid` where `typeid` names an array type.
    fn parse_array_decl(&mut self, kind: SymbolKind) -> Node {
        if !self.check(TokenKind::Identifier) {
            let found = self.peek().clone();
            self.report_syntax(&found, "Expected array identifier.");
            self.skip_until(&[TokenKind::Comma, TokenKind::RParen, TokenKind::Function, TokenKind::Main]);
            return Node::undefined(found);
        }
        let name = self.advance();
        self.expect(TokenKind::Colon, "Missing \":\" after array identifier.");
        self.finish_array_decl(name, kind)
    }

    /// Complete an array declaration once `id :` has been consumed.
    fn finish_array_decl(&mut self, name: Token, kind: SymbolKind) -> Node {
        if !self.check(TokenKind::Identifier) {
            let found = self.peek().clone();
            self.report_syntax(&found, "Expected primitive or array type identifier.");
            return Node::undefined(name);
        }
        let type_name = self.advance();
        self.check_array_type(&type_name);

        let data_type = DataType::Named(type_name.text().to_string());
        let symbol = self.declare(TableEntry::new(kind, &name, data_type), &name);
        Node::leaf(NodeKind::ArrayDecl, name).with_symbol(symbol)
    }

    fn check_array_type(&mut self, type_name: &Token) {
        let is_array_type = self
            .symbols
            .lookup_global(type_name.text())
            .is_some_and(|id| self.symbols.entry(id).kind == SymbolKind::ArrayType);
        if !is_array_type {
            self.report_semantic(type_name, "Undeclared type.");
        }
    }

    // ===== Functions =====

    pub(crate) fn parse_functions(&mut self) -> Option<Node> {
        let mut items = Vec::new();
        while self.check(TokenKind::Function) {
            items.push(self.parse_function());
        }
        Node::chain(NodeKind::Functions, items)
    }

    fn parse_function(&mut self) -> Node {
        let keyword = self.advance();

        if !self.check(TokenKind::Identifier) {
            let found = self.peek().clone();
            self.report_syntax(&found, "Expected function identifier.");
            self.skip_until(&[TokenKind::Function, TokenKind::Main]);
            return Node::undefined(keyword);
        }
        let name = self.advance();
        tracing::debug!(function = name.text(), line = name.line, "parsing function");

        let symbol = self.declare(TableEntry::new(SymbolKind::Function, &name, DataType::Void), &name);
        self.symbols.enter_scope(name.text());

        self.expect(TokenKind::LParen, "Missing \"(\" in parameter list.");
        let params = if self.check_any(&[TokenKind::Identifier, TokenKind::Const]) {
            self.parse_params(symbol)
        } else {
            None
        };
        if !self.expect(TokenKind::RParen, "Missing \")\" in parameter list.") {
            self.skip_until(&[TokenKind::RParen, TokenKind::Colon, TokenKind::Begin, TokenKind::Function, TokenKind::Main]);
            self.match_token(TokenKind::RParen);
        }

        self.expect(TokenKind::Colon, "Missing \":\" after parameter list.");
        let return_type = match self.peek_kind() {
            TokenKind::Void => {
                self.advance();
                DataType::Void
            }
            kind if kind.is_primitive_type() => primitive_type(self.advance().kind),
            _ => {
                let found = self.peek().clone();
                self.report_syntax(&found, "Expected return type.");
                DataType::Unknown
            }
        };
        if let Some(id) = symbol {
            self.symbols.set_type(id, return_type);
        }

        let locals = if self.check(TokenKind::Identifier) {
            self.parse_decl_list(NodeKind::DeclList)
        } else {
            None
        };

        self.expect(TokenKind::Begin, "Missing begin statement.");
        let body = self.parse_statements();
        if !self.match_token(TokenKind::End) {
            let found = self.peek().clone();
            self.report_syntax(&found, "Missing end statement.");
        }

        self.symbols.exit_scope();

        Node::leaf(NodeKind::FunctionDef, name)
            .with_symbol(symbol)
            .with_left_opt(params)
            .with_middle_opt(locals)
            .with_right(body)
    }

    fn parse_params(&mut self, function: Option<SymbolId>) -> Option<Node> {
        let mut items = Vec::new();
        loop {
            items.push(self.parse_param(function));

            if self.match_token(TokenKind::Comma) {
                continue;
            }
            if self.check_any(&[TokenKind::Identifier, TokenKind::Const]) {
                let found = self.peek().clone();
                self.report_syntax(&found, "Parameters not separated with \",\".");
                continue;
            }
            break;
        }
        Node::chain(NodeKind::ParamList, items)
    }

    fn parse_param(&mut self, function: Option<SymbolId>) -> Node {
        let (kind, decl) = if self.match_token(TokenKind::Const) {
            (NodeKind::ConstArrayParam, self.parse_array_decl(SymbolKind::Parameter))
        } else if self.check(TokenKind::Identifier) {
            let name = self.advance();
            self.expect(TokenKind::Colon, "Missing \":\" after identifier.");
            let kind = self.peek_kind();
            if kind.is_primitive_type() {
                self.advance();
                let entry = TableEntry::new(SymbolKind::Parameter, &name, primitive_type(kind));
                let symbol = self.declare(entry, &name);
                (NodeKind::SimpleParam, Node::leaf(NodeKind::SimpleDecl, name).with_symbol(symbol))
            } else if kind == TokenKind::Identifier {
                (NodeKind::ArrayParam, self.finish_array_decl(name, SymbolKind::Parameter))
            } else {
                let found = self.peek().clone();
                self.report_syntax(&found, "Expected const, primitive or array type identifier.");
                self.skip_until(&[TokenKind::Comma, TokenKind::RParen, TokenKind::Colon, TokenKind::Begin]);
                return Node::undefined(name);
            }
        } else {
            let found = self.peek().clone();
            self.report_syntax(&found, "Expected identifier in parameter list.");
            self.skip_until(&[TokenKind::Comma, TokenKind::RParen, TokenKind::Colon, TokenKind::Begin]);
            return Node::undefined(found);
        };

        if let Some(function) = function {
            let data_type = decl
                .symbol
                .map(|id| self.symbols.entry(id).data_type.clone())
                .unwrap_or(DataType::Unknown);
            self.symbols.add_param_type(function, data_type);
        }

        let token = decl.token.clone();
        let mut param = Node::new(kind).with_left(decl);
        param.token = token;
        param
    }

    /// Local declarations: `id : integer|real|boolean|typeid`, comma separated.
    fn parse_decl_list(&mut self, kind: NodeKind) -> Option<Node> {
        let mut items = Vec::new();
        loop {
            items.push(self.parse_decl());

            if self.match_token(TokenKind::Comma) {
                continue;
            }
            if self.check(TokenKind::Identifier) && self.peek_nth(1).is(TokenKind::Colon) {
                let found = self.peek().clone();
                self.report_syntax(&found, "Declarations not separated with \",\".");
                continue;
            }
            break;
        }
        Node::chain(kind, items)
    }

    fn parse_decl(&mut self) -> Node {
        if !self.check(TokenKind::Identifier) {
            let found = self.peek().clone();
            self.report_syntax(&found, "Expected identifier in declaration list.");
            self.skip_until(&[TokenKind::Comma, TokenKind::Begin]);
            return Node::undefined(found);
        }
        let name = self.advance();
        self.expect(TokenKind::Colon, "Missing \":\" in declaration.");

        let kind = self.peek_kind();
        if kind.is_primitive_type() {
            self.advance();
            let entry = TableEntry::new(SymbolKind::Variable, &name, primitive_type(kind));
            let symbol = self.declare(entry, &name);
            Node::leaf(NodeKind::SimpleDecl, name).with_symbol(symbol)
        } else if kind == TokenKind::Identifier {
            self.finish_array_decl(name, SymbolKind::Array)
        } else {
            let found = self.peek().clone();
            self.report_syntax(&found, "Expected primitive type or type identifier.");
            self.skip_until(&[TokenKind::Comma, TokenKind::Begin]);
            Node::undefined(name)
        }
    }

    // ===== Main =====

    /// `main [slist] begin stats end CD18 id`
    pub(crate) fn parse_main(&mut self, program_name: Option<&str>) -> Node {
        let start = self.peek().clone();
        if !self.match_token(TokenKind::Main) {
            self.report_syntax(&start, "Expected main.");
            self.skip_until(&[TokenKind::Main, TokenKind::Begin]);
            self.match_token(TokenKind::Main);
        }

        self.symbols.enter_scope("main");
        let decls = if self.check(TokenKind::Identifier) {
            self.parse_decl_list(NodeKind::MainDeclList)
        } else {
            None
        };

        self.expect(TokenKind::Begin, "Missing begin statement.");
        let body = self.parse_statements();
        if !self.match_token(TokenKind::End) {
            let found = self.peek().clone();
            self.report_syntax(&found, "Missing end statement.");
        }
        self.symbols.exit_scope();

        if self.expect(TokenKind::Cd18, "Expected CD18 after end of main.") {
            if self.check(TokenKind::Identifier) {
                let closing = self.advance();
                if self.config.verify_program_name && program_name.is_some_and(|n| n != closing.text()) {
                    self.report_semantic(&closing, "Program identifier mismatch.");
                }
            } else {
                let found = self.peek().clone();
                self.report_syntax(&found, "Expected identifier.");
            }
        }

        Node::leaf(NodeKind::Main, start)
            .with_left_opt(decls)
            .with_right(body)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::NodeKind;
    use crate::parser::parse::Parser;
    use crate::semantic::symbols::{DataType, SymbolKind};

    fn parse(source: &str) -> (crate::compiler::Compilation, Vec<String>) {
        let mut parser = Parser::from_source(source);
        let tree = parser.parse_program();
        let compilation = parser.finish(tree).expect("in-memory source");
        let messages = compilation.messages();
        (compilation, messages)
    }

    #[test]
    fn test_constants_fold_into_symbols() {
        let (c, messages) = parse(
            "CD18 p constants n = 2 * 5, half = 0.5 main x : integer begin x = n; end CD18 p",
        );
        assert!(messages.is_empty(), "{:?}", messages);
        let n = c.symbols.lookup("n").expect("n declared");
        assert_eq!(c.symbols.entry(n).value.as_deref(), Some("10"));
        assert_eq!(c.symbols.entry(n).data_type, DataType::Integer);
        assert_eq!(c.symbols.get_entry("half").map(|e| e.data_type.clone()), Some(DataType::Real));
    }

    #[test]
    fn test_constant_must_be_literal() {
        let (_, messages) = parse(
            "CD18 p constants t = true main x : integer begin x = 1; end CD18 p",
        );
        assert_eq!(
            messages,
            vec!["Semantic Error (1, 22): Constant assignment must be numeric literal or constant expression."]
        );
    }

    #[test]
    fn test_types_and_arrays() {
        let (c, messages) = parse(
            "CD18 p constants size = 4 \
             types Point is x : real, y : real end \
                   Points is array [size * 2] of Point \
             arrays pts : Points \
             main i : integer begin pts[1].x = 2; end CD18 p",
        );
        assert!(messages.is_empty(), "{:?}", messages);
        let points = c.symbols.lookup("Points").expect("array type");
        assert_eq!(c.symbols.entry(points).size, Some(8));
        let pts = c.symbols.lookup("pts").expect("array");
        assert!(c.symbols.element_record(pts).is_some());
        assert_eq!(c.tree.count(NodeKind::ArrayVar), 1);
    }

    #[test]
    fn test_undeclared_array_type() {
        let (_, messages) = parse("CD18 p arrays a : Nothing main x : integer begin x = 1; end CD18 p");
        assert_eq!(messages, vec!["Semantic Error (1, 19): Undeclared type."]);
    }

    #[test]
    fn test_function_signature_recorded() {
        let (c, messages) = parse(
            "CD18 p function f(a : integer, b : real) : real \
             begin return a; end \
             main x : real begin x = f(1, 2.0); end CD18 p",
        );
        assert!(messages.is_empty(), "{:?}", messages);
        let f = c.symbols.get_entry("f").expect("function");
        assert_eq!(f.kind, SymbolKind::Function);
        assert_eq!(f.data_type, DataType::Real);
        assert_eq!(f.param_types, vec![DataType::Integer, DataType::Real]);
        assert!(c.tree.find(NodeKind::FunctionDef).is_some());
    }

    #[test]
    fn test_missing_declaration_comma() {
        let (_, messages) = parse("CD18 p main a : integer b : real begin a = 1; end CD18 p");
        assert_eq!(messages, vec!["Syntax Error (1, 25): Declarations not separated with \",\"."]);
    }

    #[test]
    fn test_redeclaration() {
        let (_, messages) = parse("CD18 p main a : integer, a : real begin a = 1; end CD18 p");
        assert_eq!(messages, vec!["Semantic Error (1, 26): Identifier already declared."]);
    }

    #[test]
    fn test_program_name_mismatch() {
        let (_, messages) = parse("CD18 p main a : integer begin a = 1; end CD18 q");
        assert_eq!(messages, vec!["Semantic Error (1, 47): Program identifier mismatch."]);
    }
}
