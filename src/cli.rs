//! Command-line arguments for the `cd18c` binary

use crate::config::Config;
use crate::parser::scanner::DEFAULT_TAB_WIDTH;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use tracing::Level;

/// CD18 compiler front end: scan, parse and check a source file.
#[derive(Parser, Debug)]
#[command(name = "cd18c")]
#[command(version)]
#[command(about = "CD18 compiler front end", long_about = None)]
pub struct Cli {
    /// Source file to compile
    pub file: PathBuf,

    /// Print the syntax tree outline after the diagnostics
    #[arg(long)]
    pub tree: bool,

    /// Browse source, tree and diagnostics in the terminal viewer
    #[arg(long)]
    pub view: bool,

    /// Columns a tab advances when computing error positions
    #[arg(long, value_name = "N", default_value_t = DEFAULT_TAB_WIDTH)]
    pub tab_width: usize,

    /// Do not compare the closing program name with the opening one
    #[arg(long)]
    pub no_name_check: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            tab_width: self.tab_width,
            verify_program_name: !self.no_name_check,
        }
    }

    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["cd18c", "prog.cd"]).expect("parse");
        assert_eq!(cli.file, PathBuf::from("prog.cd"));
        assert!(!cli.tree);
        assert!(!cli.view);
        assert_eq!(cli.config(), Config::default());
        assert_eq!(cli.log_level(), Level::WARN);
    }

    #[test]
    fn test_flags_reach_config() {
        let cli = Cli::try_parse_from(["cd18c", "p.cd", "--tab-width", "8", "--no-name-check"])
            .expect("parse");
        let config = cli.config();
        assert_eq!(config.tab_width, 8);
        assert!(!config.verify_program_name);
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::try_parse_from(["cd18c", "p.cd", "-vv"]).expect("parse");
        assert_eq!(cli.log_level(), Level::DEBUG);
        let cli = Cli::try_parse_from(["cd18c", "p.cd", "-v", "-v", "-v", "-v"]).expect("parse");
        assert_eq!(cli.log_level(), Level::TRACE);
    }

    #[test]
    fn test_file_required() {
        assert!(Cli::try_parse_from(["cd18c"]).is_err());
    }
}
