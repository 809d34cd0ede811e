//! Syntax tree node model
//!
//! Every construct in a CD18 program is represented by the same [`Node`]
//! struct, discriminated by [`NodeKind`] and holding up to three owned
//! children. The meaning of `left`, `middle` and `right` depends on the kind;
//! lists are cons cells whose `left` is one item and whose `right` is the rest.
//!
//! A node's `symbol` is a plain [`SymbolId`] into the run's symbol table, so
//! the tree never owns table entries.

use super::token::Token;
use crate::semantic::symbols::{SymbolId, SymbolTable};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Placeholder substituted wherever recovery discarded input
    Undefined,

    // Program structure
    Program,
    Globals,
    InitList,
    Init,
    Functions,
    Main,
    MainDeclList,

    // Declarations
    TypeList,
    RecordType,
    ArrayType,
    FieldList,
    SimpleDecl,
    ArrayDeclList,
    ArrayDecl,
    FunctionDef,
    ParamList,
    SimpleParam,
    ArrayParam,
    ConstArrayParam,
    DeclList,

    // Statements
    Statements,
    For,
    Repeat,
    AssignList,
    IfThen,
    IfThenElse,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    Input,
    Print,
    PrintLine,
    Call,
    Return,

    // Variables and lists
    VarList,
    SimpleVar,
    ArrayVar,
    ExprList,
    PrintList,

    // Boolean and relational
    Bool,
    Not,
    And,
    Or,
    Xor,
    Equal,
    NotEqual,
    Greater,
    Less,
    LessEqual,
    GreaterEqual,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,

    // Leaves
    IntLit,
    FloatLit,
    True,
    False,
    FnCall,
    Str,
}

impl NodeKind {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            NodeKind::Add
                | NodeKind::Sub
                | NodeKind::Mul
                | NodeKind::Div
                | NodeKind::Mod
                | NodeKind::Pow
        )
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            NodeKind::Equal
                | NodeKind::NotEqual
                | NodeKind::Greater
                | NodeKind::Less
                | NodeKind::LessEqual
                | NodeKind::GreaterEqual
        )
    }

    /// Operators written between their operands, whose token is not the
    /// first one in the source.
    pub fn is_infix(self) -> bool {
        self.is_arithmetic()
            || self.is_relational()
            || matches!(
                self,
                NodeKind::Assign
                    | NodeKind::PlusAssign
                    | NodeKind::MinusAssign
                    | NodeKind::StarAssign
                    | NodeKind::SlashAssign
            )
    }

    pub fn is_numeric_literal(self) -> bool {
        matches!(self, NodeKind::IntLit | NodeKind::FloatLit)
    }

    pub fn is_bool_literal(self) -> bool {
        matches!(self, NodeKind::True | NodeKind::False)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub left: Option<Box<Node>>,
    pub middle: Option<Box<Node>>,
    pub right: Option<Box<Node>>,
    pub symbol: Option<SymbolId>,
    /// Token the node was built from: operator, literal, identifier or keyword
    pub token: Option<Token>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            left: None,
            middle: None,
            right: None,
            symbol: None,
            token: None,
        }
    }

    /// A node anchored at `token` with no children.
    pub fn leaf(kind: NodeKind, token: Token) -> Self {
        Self {
            token: Some(token),
            ..Self::new(kind)
        }
    }

    pub fn undefined(token: Token) -> Self {
        Self::leaf(NodeKind::Undefined, token)
    }

    /// A binary operator node.
    pub fn binary(kind: NodeKind, token: Token, left: Node, right: Node) -> Self {
        Self::leaf(kind, token).with_left(left).with_right(right)
    }

    pub fn with_left(mut self, node: Node) -> Self {
        self.left = Some(Box::new(node));
        self
    }

    pub fn with_middle(mut self, node: Node) -> Self {
        self.middle = Some(Box::new(node));
        self
    }

    pub fn with_right(mut self, node: Node) -> Self {
        self.right = Some(Box::new(node));
        self
    }

    pub fn with_left_opt(mut self, node: Option<Node>) -> Self {
        self.left = node.map(Box::new);
        self
    }

    pub fn with_middle_opt(mut self, node: Option<Node>) -> Self {
        self.middle = node.map(Box::new);
        self
    }

    pub fn with_symbol(mut self, symbol: Option<SymbolId>) -> Self {
        self.symbol = symbol;
        self
    }

    pub fn set_left(&mut self, node: Option<Node>) {
        self.left = node.map(Box::new);
    }

    pub fn set_middle(&mut self, node: Option<Node>) {
        self.middle = node.map(Box::new);
    }

    pub fn set_right(&mut self, node: Option<Node>) {
        self.right = node.map(Box::new);
    }

    pub fn left(&self) -> Option<&Node> {
        self.left.as_deref()
    }

    pub fn middle(&self) -> Option<&Node> {
        self.middle.as_deref()
    }

    pub fn right(&self) -> Option<&Node> {
        self.right.as_deref()
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.middle.is_none() && self.right.is_none()
    }

    /// Literal or identifier text carried by the node's token.
    pub fn text(&self) -> &str {
        self.token.as_ref().map(Token::text).unwrap_or("")
    }

    /// Leftmost token in this subtree, used to anchor diagnostics at the
    /// start of an expression. Array references, calls, `not` and keyword-led
    /// nodes start at their own token; infix operators at their left operand.
    pub fn first_token(&self) -> Option<&Token> {
        let left = || self.left().and_then(Node::first_token);
        let own = if self.kind.is_infix() {
            left().or(self.token.as_ref())
        } else {
            self.token.as_ref().or_else(left)
        };
        own.or_else(|| self.middle().and_then(Node::first_token))
            .or_else(|| self.right().and_then(Node::first_token))
    }

    /// Right-nest `items` into a cons list of `kind`. A single item is
    /// returned as is.
    pub fn chain(kind: NodeKind, items: Vec<Node>) -> Option<Node> {
        let mut iter = items.into_iter().rev();
        let last = iter.next()?;
        Some(iter.fold(last, |rest, item| {
            Node::new(kind).with_left(item).with_right(rest)
        }))
    }

    /// Flatten a cons list of `kind` back into its items.
    pub fn items(&self, kind: NodeKind) -> Vec<&Node> {
        let mut items = Vec::new();
        let mut cursor = Some(self);
        while let Some(node) = cursor {
            if node.kind == kind {
                items.extend(node.left());
                cursor = node.right();
            } else {
                items.push(node);
                cursor = None;
            }
        }
        items
    }

    /// Number of nodes in this subtree.
    pub fn size(&self) -> usize {
        1 + [self.left(), self.middle(), self.right()]
            .into_iter()
            .flatten()
            .map(Node::size)
            .sum::<usize>()
    }

    /// Pre-order search for the first node of `kind`.
    pub fn find(&self, kind: NodeKind) -> Option<&Node> {
        if self.kind == kind {
            return Some(self);
        }
        [self.left(), self.middle(), self.right()]
            .into_iter()
            .flatten()
            .find_map(|child| child.find(kind))
    }

    /// Count nodes of `kind` in this subtree.
    pub fn count(&self, kind: NodeKind) -> usize {
        usize::from(self.kind == kind)
            + [self.left(), self.middle(), self.right()]
                .into_iter()
                .flatten()
                .map(|child| child.count(kind))
                .sum::<usize>()
    }

    /// Indented rendering of the tree, one row per node in pre-order.
    pub fn outline(&self, symbols: &SymbolTable) -> Vec<OutlineRow> {
        let mut rows = Vec::new();
        self.outline_into(symbols, 0, &mut rows);
        rows
    }

    fn outline_into(&self, symbols: &SymbolTable, depth: usize, rows: &mut Vec<OutlineRow>) {
        let mut label = self.kind.to_string();
        if let Some(id) = self.symbol {
            label.push(' ');
            label.push_str(&symbols.entry(id).name);
        } else if !self.text().is_empty() {
            if self.kind == NodeKind::Str {
                label.push_str(&format!(" \"{}\"", self.text()));
            } else {
                label.push(' ');
                label.push_str(self.text());
            }
        }

        rows.push(OutlineRow {
            depth,
            label,
            line: self.token.as_ref().map(|t| t.line),
        });

        for child in [self.left(), self.middle(), self.right()].into_iter().flatten() {
            child.outline_into(symbols, depth + 1, rows);
        }
    }
}

/// One line of a rendered tree outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRow {
    pub depth: usize,
    pub label: String,
    pub line: Option<usize>,
}

impl fmt::Display for OutlineRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:indent$}{}", "", self.label, indent = self.depth * 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::token::TokenKind;

    fn int(text: &str, col: usize) -> Node {
        Node::leaf(
            NodeKind::IntLit,
            Token::with_lexeme(TokenKind::IntLiteral, 1, col, text),
        )
    }

    #[test]
    fn test_chain_and_items() {
        let list = Node::chain(
            NodeKind::ExprList,
            vec![int("1", 1), int("2", 4), int("3", 7)],
        )
        .expect("non-empty list");

        assert_eq!(list.kind, NodeKind::ExprList);
        let items = list.items(NodeKind::ExprList);
        let texts: Vec<&str> = items.iter().map(|n| n.text()).collect();
        assert_eq!(texts, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_single_item_chain_is_unwrapped() {
        let single = Node::chain(NodeKind::ExprList, vec![int("5", 1)]);
        assert!(matches!(single, Some(ref n) if n.kind == NodeKind::IntLit));
        assert!(Node::chain(NodeKind::ExprList, Vec::new()).is_none());
    }

    #[test]
    fn test_first_token_prefers_left_operand() {
        let plus = Token::new(TokenKind::Plus, 1, 3);
        let sum = Node::binary(NodeKind::Add, plus, int("2", 1), int("3", 5));
        assert_eq!(sum.first_token().map(|t| t.col), Some(1));
        assert_eq!(sum.size(), 3);
        assert_eq!(sum.count(NodeKind::IntLit), 2);
    }

    #[test]
    fn test_first_token_of_array_and_call_is_the_name() {
        let name = Token::with_lexeme(TokenKind::Identifier, 1, 3, "a");
        let field = Node::leaf(
            NodeKind::SimpleVar,
            Token::with_lexeme(TokenKind::Identifier, 1, 8, "flag"),
        );
        let element = Node::leaf(NodeKind::ArrayVar, name)
            .with_left(int("3", 5))
            .with_right(field);
        assert_eq!(element.first_token().map(|t| t.col), Some(3));

        let callee = Token::with_lexeme(TokenKind::Identifier, 1, 1, "f");
        let call = Node::leaf(NodeKind::FnCall, callee).with_left(int("7", 3));
        assert_eq!(call.first_token().map(|t| t.col), Some(1));

        let plus = Token::new(TokenKind::Plus, 1, 12);
        let sum = Node::binary(NodeKind::Add, plus, element, int("2", 14));
        assert_eq!(sum.first_token().map(|t| t.col), Some(3));
    }

    #[test]
    fn test_outline_rows() {
        let plus = Token::new(TokenKind::Plus, 1, 3);
        let sum = Node::binary(NodeKind::Add, plus, int("2", 1), int("3", 5));
        let rows = sum.outline(&SymbolTable::new());
        let rendered: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
        assert_eq!(rendered, vec!["Add", "  IntLit 2", "  IntLit 3"]);
    }
}
