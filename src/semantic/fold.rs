//! Constant folding and propagation
//!
//! The parser hands every completed expression to a [`Folder`]. Variable
//! references with a known value are replaced by literals (propagation), and
//! arithmetic subtrees whose operands are all literals collapse into a single
//! literal (folding). Operands that can only be known at run time (a numeric
//! variable without a known value, an array field, a numeric function call)
//! stop folding without complaint. Everything else in a numeric position is
//! a semantic error.
//!
//! Integer arithmetic is 64-bit and wraps on overflow. Real arithmetic is
//! IEEE double precision.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::parser::ast::{Node, NodeKind};
use crate::parser::token::{Token, TokenKind};
use crate::semantic::symbols::{DataType, SymbolId, SymbolTable};
use thiserror::Error;

pub const DIVIDE_BY_ZERO: &str = "Divide by zero error.";
pub const FLOAT_IN_MODULUS: &str = "Illegal float literal in modulus operation.";
pub const FLOAT_IN_EXPONENT: &str = "Illegal float literal in exponent operation.";
pub const NOT_NUMERIC: &str = "Identifier not numeric.";
pub const BOOLEAN_IN_NUMERIC: &str = "Illegal boolean in numeric expression.";
pub const MALFORMED_LITERAL: &str = "Malformed numeric literal.";

/// Why a node could not be read as a number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("node is not a numeric literal")]
    NotLiteral,
    #[error("malformed numeric literal '{0}'")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        self.as_f64() == 0.0
    }

    /// Literal text for the number. Reals always carry a fractional part.
    pub fn render(self) -> String {
        match self {
            Number::Int(n) => n.to_string(),
            Number::Float(f) => render_real(f),
        }
    }
}

pub fn render_real(value: f64) -> String {
    let text = value.to_string();
    if !value.is_finite() || text.contains(['.', 'e', 'E']) {
        text
    } else {
        text + ".0"
    }
}

/// Read an integer or real literal node.
pub fn literal_value(node: &Node) -> Result<Number, LiteralError> {
    let text = node.text();
    match node.kind {
        NodeKind::IntLit => text
            .parse::<i64>()
            .map(Number::Int)
            .map_err(|_| LiteralError::Malformed(text.to_string())),
        NodeKind::FloatLit => text
            .parse::<f64>()
            .map(Number::Float)
            .map_err(|_| LiteralError::Malformed(text.to_string())),
        _ => Err(LiteralError::NotLiteral),
    }
}

/// Build a literal node for `value` anchored at `line`/`col`.
pub fn literal_node(value: Number, line: usize, col: usize) -> Node {
    let (node_kind, token_kind) = match value {
        Number::Int(_) => (NodeKind::IntLit, TokenKind::IntLiteral),
        Number::Float(_) => (NodeKind::FloatLit, TokenKind::FloatLiteral),
    };
    Node::leaf(node_kind, Token::with_lexeme(token_kind, line, col, value.render()))
}

/// Compare two numbers for a relational node kind.
pub fn compare(kind: NodeKind, a: Number, b: Number) -> Option<bool> {
    let (a, b) = (a.as_f64(), b.as_f64());
    let result = match kind {
        NodeKind::Equal => a == b,
        NodeKind::NotEqual => a != b,
        NodeKind::Greater => a > b,
        NodeKind::GreaterEqual => a >= b,
        NodeKind::Less => a < b,
        NodeKind::LessEqual => a <= b,
        _ => return None,
    };
    Some(result)
}

/// How an operand looked after resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Operand {
    Constant(Number),
    /// Numeric, but only known at run time
    Runtime,
    /// An error was already reported inside this operand
    Poisoned,
    NotNumeric,
    Boolean,
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

struct Fault {
    message: &'static str,
    side: Side,
}

impl Fault {
    fn left(message: &'static str) -> Self {
        Self { message, side: Side::Left }
    }

    fn right(message: &'static str) -> Self {
        Self { message, side: Side::Right }
    }
}

pub struct Folder<'a> {
    symbols: &'a SymbolTable,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> Folder<'a> {
    pub fn new(symbols: &'a SymbolTable, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            symbols,
            diagnostics,
        }
    }

    /// Fold `node` as far as its operands allow.
    ///
    /// Terminal nodes and non-arithmetic nodes come back unchanged. An
    /// arithmetic node that cannot be folded comes back with whatever its
    /// operands folded to.
    pub fn fold_constants(&mut self, node: Node) -> Node {
        let node = match node.kind {
            NodeKind::SimpleVar | NodeKind::True | NodeKind::False => self.propagate_constants(node),
            _ => node,
        };

        if node.is_leaf() || !node.kind.is_arithmetic() {
            return node;
        }
        self.fold_binary(node).0
    }

    /// Replace a numeric variable whose value is known by a literal.
    ///
    /// A boolean literal reaching this point is being used as a number and
    /// is reported.
    pub fn propagate_constants(&mut self, node: Node) -> Node {
        match node.kind {
            NodeKind::SimpleVar => self.substitute(node),
            NodeKind::True | NodeKind::False => {
                self.report(&node, BOOLEAN_IN_NUMERIC);
                node
            }
            _ => node,
        }
    }

    fn substitute(&self, node: Node) -> Node {
        let (Some(id), Some(token)) = (node.symbol, node.token.as_ref()) else {
            return node;
        };
        let entry = self.symbols.entry(id);
        let Some(value) = entry.value.as_deref() else {
            return node;
        };

        let (node_kind, token_kind) = match entry.data_type {
            DataType::Integer => (NodeKind::IntLit, TokenKind::IntLiteral),
            DataType::Real => (NodeKind::FloatLit, TokenKind::FloatLiteral),
            _ => return node,
        };

        tracing::trace!(name = %entry.name, value, "propagated");
        Node::leaf(
            node_kind,
            Token::with_lexeme(token_kind, token.line, token.col, value),
        )
    }

    fn resolve(&mut self, node: Node) -> (Node, Operand) {
        match node.kind {
            NodeKind::IntLit | NodeKind::FloatLit => {
                let operand = self.read_literal(&node);
                (node, operand)
            }
            NodeKind::True | NodeKind::False => (node, Operand::Boolean),
            NodeKind::Undefined => (node, Operand::Poisoned),
            NodeKind::SimpleVar => {
                let node = self.substitute(node);
                if node.kind.is_numeric_literal() {
                    let operand = self.read_literal(&node);
                    return (node, operand);
                }
                let operand = self.classify_symbol(node.symbol);
                (node, operand)
            }
            NodeKind::ArrayVar => {
                let field = node.right().and_then(|f| f.symbol);
                let operand = self.classify_symbol(field);
                (node, operand)
            }
            NodeKind::FnCall => {
                let operand = self.classify_symbol(node.symbol);
                (node, operand)
            }
            kind if kind.is_arithmetic() => self.fold_binary(node),
            _ => (node, Operand::NotNumeric),
        }
    }

    fn read_literal(&mut self, node: &Node) -> Operand {
        match literal_value(node) {
            Ok(value) => Operand::Constant(value),
            Err(LiteralError::Malformed(text)) => {
                tracing::debug!(%text, "unreadable literal");
                self.report(node, MALFORMED_LITERAL);
                Operand::Poisoned
            }
            Err(LiteralError::NotLiteral) => Operand::NotNumeric,
        }
    }

    /// Unresolved names were reported when they were parsed.
    fn classify_symbol(&self, symbol: Option<SymbolId>) -> Operand {
        match symbol {
            None => Operand::Poisoned,
            Some(id) if self.symbols.entry(id).data_type.is_numeric() => Operand::Runtime,
            Some(_) => Operand::NotNumeric,
        }
    }

    fn fold_binary(&mut self, node: Node) -> (Node, Operand) {
        let Node {
            kind,
            left,
            middle,
            right,
            symbol,
            token,
        } = node;

        let (left, right) = match (left, right) {
            (Some(left), Some(right)) => (left, right),
            (left, right) => {
                let node = Node {
                    kind,
                    left,
                    middle,
                    right,
                    symbol,
                    token,
                };
                return (node, Operand::Poisoned);
            }
        };

        let (left, left_op) = self.resolve(*left);
        let (right, right_op) = self.resolve(*right);

        let anchor = left
            .first_token()
            .or(token.as_ref())
            .map(|t| (t.line, t.col))
            .unwrap_or((0, 0));

        let node = Node {
            kind,
            left: Some(Box::new(left)),
            middle,
            right: Some(Box::new(right)),
            symbol,
            token,
        };

        if left_op == Operand::Poisoned || right_op == Operand::Poisoned {
            return (node, Operand::Poisoned);
        }

        for (operand, side) in [(left_op, Side::Left), (right_op, Side::Right)] {
            let message = match operand {
                Operand::Boolean => BOOLEAN_IN_NUMERIC,
                Operand::NotNumeric => NOT_NUMERIC,
                _ => continue,
            };
            self.report_side(&node, side, message);
            return (node, Operand::Poisoned);
        }

        let (Operand::Constant(a), Operand::Constant(b)) = (left_op, right_op) else {
            return (node, Operand::Runtime);
        };

        match compute(kind, a, b) {
            Ok(value) => {
                tracing::debug!(op = %kind, result = %value.render(), "folded");
                let (line, col) = anchor;
                (literal_node(value, line, col), Operand::Constant(value))
            }
            Err(fault) => {
                self.report_side(&node, fault.side, fault.message);
                (node, Operand::Poisoned)
            }
        }
    }

    fn report_side(&mut self, node: &Node, side: Side, message: &str) {
        let operand = match side {
            Side::Left => node.left(),
            Side::Right => node.right(),
        };
        match operand {
            Some(operand) => self.report(operand, message),
            None => self.report(node, message),
        }
    }

    fn report(&mut self, node: &Node, message: &str) {
        if let Some(token) = node.first_token() {
            self.diagnostics
                .report(Diagnostic::semantic(token.clone(), message));
        }
    }
}

fn compute(kind: NodeKind, a: Number, b: Number) -> Result<Number, Fault> {
    use Number::{Float, Int};

    let value = match kind {
        NodeKind::Add => match (a, b) {
            (Int(x), Int(y)) => Int(x.wrapping_add(y)),
            _ => Float(a.as_f64() + b.as_f64()),
        },
        NodeKind::Sub => match (a, b) {
            (Int(x), Int(y)) => Int(x.wrapping_sub(y)),
            _ => Float(a.as_f64() - b.as_f64()),
        },
        NodeKind::Mul => match (a, b) {
            (Int(x), Int(y)) => Int(x.wrapping_mul(y)),
            _ => Float(a.as_f64() * b.as_f64()),
        },
        NodeKind::Div => {
            if b.is_zero() {
                return Err(Fault::right(DIVIDE_BY_ZERO));
            }
            match (a, b) {
                (Int(x), Int(y)) => Int(x.wrapping_div(y)),
                _ => Float(a.as_f64() / b.as_f64()),
            }
        }
        NodeKind::Mod => {
            if b.is_zero() {
                return Err(Fault::right(DIVIDE_BY_ZERO));
            }
            match (a, b) {
                (Int(x), Int(y)) => Int(x.wrapping_rem(y)),
                (Float(_), _) => return Err(Fault::left(FLOAT_IN_MODULUS)),
                _ => return Err(Fault::right(FLOAT_IN_MODULUS)),
            }
        }
        NodeKind::Pow => match (a, b) {
            (Int(base), Int(exp)) => Int(int_pow(base, exp)?),
            (Float(_), _) => return Err(Fault::left(FLOAT_IN_EXPONENT)),
            _ => return Err(Fault::right(FLOAT_IN_EXPONENT)),
        },
        _ => return Err(Fault::left(NOT_NUMERIC)),
    };
    Ok(value)
}

/// Integer power with truncating semantics for negative exponents.
fn int_pow(base: i64, exp: i64) -> Result<i64, Fault> {
    if exp >= 0 {
        let mut result: i64 = 1;
        let mut square = base;
        let mut remaining = exp as u64;
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = result.wrapping_mul(square);
            }
            square = square.wrapping_mul(square);
            remaining >>= 1;
        }
        return Ok(result);
    }

    match base {
        0 => Err(Fault::right(DIVIDE_BY_ZERO)),
        1 => Ok(1),
        -1 => Ok(if exp % 2 == 0 { 1 } else { -1 }),
        _ => Ok(0),
    }
}
