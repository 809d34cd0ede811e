//! One compilation run: source in, tree plus symbols plus diagnostics out.

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::error::FrontEndError;
use crate::parser::ast::Node;
use crate::parser::parse::Parser;
use crate::semantic::symbols::SymbolTable;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

/// Everything a run produces. The tree is always complete; `diagnostics`
/// being empty is the only success signal.
#[derive(Debug)]
pub struct Compilation {
    pub tree: Node,
    pub symbols: SymbolTable,
    pub diagnostics: Diagnostics,
}

impl Compilation {
    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics rendered in detection order.
    pub fn messages(&self) -> Vec<String> {
        self.diagnostics.iter().map(|d| d.to_string()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FrontEnd {
    config: Config,
}

impl FrontEnd {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compile the file at `path`. Failing to open it is reported before any
    /// scanning starts.
    pub fn compile_file(&self, path: impl AsRef<Path>) -> Result<Compilation, FrontEndError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| FrontEndError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "compiling");
        self.compile_reader(BufReader::new(file))
    }

    pub fn compile_source(&self, source: &str) -> Result<Compilation, FrontEndError> {
        self.compile_reader(Cursor::new(source.to_string()))
    }

    pub fn compile_reader<R: BufRead>(&self, reader: R) -> Result<Compilation, FrontEndError> {
        let mut parser = Parser::new(reader, self.config.clone());
        let tree = parser.parse_program();
        let compilation = parser.finish(tree)?;
        tracing::info!(
            errors = compilation.diagnostics.len(),
            symbols = compilation.symbols.len(),
            "front end finished"
        );
        Ok(compilation)
    }
}
