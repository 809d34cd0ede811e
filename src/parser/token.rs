//! Token definitions shared by the scanner and the parser.

use std::fmt;

/// Every token kind the scanner can produce.
///
/// The set is closed: one entry per keyword and per operator or punctuation
/// symbol, plus the literal classes, end of file and `Undefined` (the
/// placeholder handed out for lexically invalid input).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    Cd18,
    Constants,
    Types,
    Is,
    Arrays,
    Main,
    Begin,
    End,
    Array,
    Of,
    Function,
    Void,
    Const,
    Integer,
    Real,
    Boolean,
    For,
    Repeat,
    Until,
    If,
    Else,
    Input,
    Print,
    PrintLine,
    Return,
    Not,
    And,
    Or,
    Xor,
    True,
    False,

    // Punctuation
    LBracket,  // [
    RBracket,  // ]
    LParen,    // (
    RParen,    // )
    Semicolon, // ;
    Comma,     // ,
    Colon,     // :
    Dot,       // .

    // Operators
    Assign,       // =
    Less,         // <
    Greater,      // >
    NotEqual,     // !=
    EqualEqual,   // ==
    LessEqual,    // <=
    GreaterEqual, // >=
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Percent,      // %
    Caret,        // ^
    PlusAssign,   // +=
    MinusAssign,  // -=
    StarAssign,   // *=
    SlashAssign,  // /=

    // Literals and identifiers
    Identifier,
    IntLiteral,
    FloatLiteral,
    StringLiteral,

    Eof,
    Undefined,
}

impl TokenKind {
    /// Map identifier text onto a keyword, if it is one.
    pub fn keyword(text: &str) -> Option<TokenKind> {
        let kind = match text {
            "CD18" => TokenKind::Cd18,
            "constants" => TokenKind::Constants,
            "types" => TokenKind::Types,
            "is" => TokenKind::Is,
            "arrays" => TokenKind::Arrays,
            "main" => TokenKind::Main,
            "begin" => TokenKind::Begin,
            "end" => TokenKind::End,
            "array" => TokenKind::Array,
            "of" => TokenKind::Of,
            "function" => TokenKind::Function,
            "void" => TokenKind::Void,
            "const" => TokenKind::Const,
            "integer" => TokenKind::Integer,
            "real" => TokenKind::Real,
            "boolean" => TokenKind::Boolean,
            "for" => TokenKind::For,
            "repeat" => TokenKind::Repeat,
            "until" => TokenKind::Until,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "input" => TokenKind::Input,
            "print" => TokenKind::Print,
            "printline" => TokenKind::PrintLine,
            "return" => TokenKind::Return,
            "not" => TokenKind::Not,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "xor" => TokenKind::Xor,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => return None,
        };
        Some(kind)
    }

    /// `integer`, `real` or `boolean`.
    pub fn is_primitive_type(self) -> bool {
        matches!(
            self,
            TokenKind::Integer | TokenKind::Real | TokenKind::Boolean
        )
    }

    pub fn is_assign_op(self) -> bool {
        matches!(
            self,
            TokenKind::Assign
                | TokenKind::PlusAssign
                | TokenKind::MinusAssign
                | TokenKind::StarAssign
                | TokenKind::SlashAssign
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Cd18 => "'CD18'",
            TokenKind::Constants => "'constants'",
            TokenKind::Types => "'types'",
            TokenKind::Is => "'is'",
            TokenKind::Arrays => "'arrays'",
            TokenKind::Main => "'main'",
            TokenKind::Begin => "'begin'",
            TokenKind::End => "'end'",
            TokenKind::Array => "'array'",
            TokenKind::Of => "'of'",
            TokenKind::Function => "'function'",
            TokenKind::Void => "'void'",
            TokenKind::Const => "'const'",
            TokenKind::Integer => "'integer'",
            TokenKind::Real => "'real'",
            TokenKind::Boolean => "'boolean'",
            TokenKind::For => "'for'",
            TokenKind::Repeat => "'repeat'",
            TokenKind::Until => "'until'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::Input => "'input'",
            TokenKind::Print => "'print'",
            TokenKind::PrintLine => "'printline'",
            TokenKind::Return => "'return'",
            TokenKind::Not => "'not'",
            TokenKind::And => "'and'",
            TokenKind::Or => "'or'",
            TokenKind::Xor => "'xor'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Dot => "'.'",
            TokenKind::Assign => "'='",
            TokenKind::Less => "'<'",
            TokenKind::Greater => "'>'",
            TokenKind::NotEqual => "'!='",
            TokenKind::EqualEqual => "'=='",
            TokenKind::LessEqual => "'<='",
            TokenKind::GreaterEqual => "'>='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Caret => "'^'",
            TokenKind::PlusAssign => "'+='",
            TokenKind::MinusAssign => "'-='",
            TokenKind::StarAssign => "'*='",
            TokenKind::SlashAssign => "'/='",
            TokenKind::Identifier => "identifier",
            TokenKind::IntLiteral => "integer literal",
            TokenKind::FloatLiteral => "real literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Eof => "end of file",
            TokenKind::Undefined => "undefined token",
        };
        f.write_str(text)
    }
}

/// A classified lexeme with the position of its first character.
///
/// Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
    pub lexeme: Option<String>,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, col: usize) -> Self {
        Self {
            kind,
            line,
            col,
            lexeme: None,
        }
    }

    pub fn with_lexeme(
        kind: TokenKind,
        line: usize,
        col: usize,
        lexeme: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            line,
            col,
            lexeme: Some(lexeme.into()),
        }
    }

    /// Lexeme text, or the empty string for tokens that carry none.
    pub fn text(&self) -> &str {
        self.lexeme.as_deref().unwrap_or("")
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.lexeme) {
            (TokenKind::Identifier, Some(name)) => {
                write!(f, "identifier '{}'", name)
            }
            (TokenKind::StringLiteral, Some(s)) => {
                write!(f, "string literal \"{}\"", s)
            }
            (TokenKind::IntLiteral | TokenKind::FloatLiteral, Some(n)) => {
                write!(f, "{} {}", self.kind, n)
            }
            (TokenKind::Undefined, Some(text)) => write!(f, "'{}'", text),
            _ => write!(f, "{}", self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(TokenKind::keyword("CD18"), Some(TokenKind::Cd18));
        assert_eq!(TokenKind::keyword("printline"), Some(TokenKind::PrintLine));
        assert_eq!(TokenKind::keyword("cd18"), None);
        assert_eq!(TokenKind::keyword("Begin"), None);
        assert_eq!(TokenKind::keyword("counter"), None);
    }

    #[test]
    fn test_display() {
        let tok = Token::with_lexeme(TokenKind::Identifier, 1, 1, "total");
        assert_eq!(tok.to_string(), "identifier 'total'");
        assert_eq!(Token::new(TokenKind::PlusAssign, 2, 3).to_string(), "'+='");
        assert_eq!(Token::new(TokenKind::Eof, 9, 1).to_string(), "end of file");
    }
}
