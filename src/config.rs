//! Front-end settings

use crate::parser::scanner::DEFAULT_TAB_WIDTH;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Columns a tab character advances
    pub tab_width: usize,
    /// Report a semantic error when `end CD18 <name>` names a different program
    pub verify_program_name: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tab_width: DEFAULT_TAB_WIDTH,
            verify_program_name: true,
        }
    }
}
