//! CD18 source code parser
//!
//! This module turns CD18 source text into a syntax tree:
//! - [`scanner`]: tokenization (characters → tokens), pulled on demand
//! - [`token`]: token kinds and positions
//! - [`parse`]: the [`parse::Parser`] and its shared cursor and recovery helpers
//! - [`ast`]: the syntax tree node model
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent, with one precedence level per method for
//! expressions. Parsing, name resolution and constant folding happen in the
//! same pass: every expression is folded as soon as it is complete, and every
//! declaration is entered into the symbol table before the next token is read.

pub mod ast;
mod declarations;
mod expressions;
pub mod parse;
pub mod scanner;
mod statements;
pub mod token;
