//! CD18 compiler front end
//!
//! Turns CD18 source text into a syntax tree, a symbol table and an ordered
//! list of lexical, syntax and semantic diagnostics. Nothing in a malformed
//! program stops a run; only failing to open or read the source does.
//!
//! - [`parser`]: tokens, scanner, tree nodes and the recursive descent parser
//! - [`semantic`]: symbol table and constant folding
//! - [`diagnostics`]: the run-wide error queue
//! - [`compiler`]: one-call entry points over files, strings and readers
//! - [`ui`]: terminal viewer for a finished run
//!
//! ```no_run
//! use cd18c::compiler::FrontEnd;
//!
//! let run = FrontEnd::default().compile_file("prog.cd").expect("readable source");
//! for message in run.messages() {
//!     println!("{message}");
//! }
//! ```

pub mod cli;
pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod parser;
pub mod semantic;
pub mod ui;

pub use compiler::{Compilation, FrontEnd};
pub use config::Config;
pub use error::FrontEndError;
