//! Semantic support for the parser
//!
//! - [`symbols`]: scoped symbol table the parser declares into and resolves against
//! - [`fold`]: constant propagation and folding applied to every completed expression

pub mod fold;
pub mod symbols;
