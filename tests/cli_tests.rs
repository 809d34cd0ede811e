//! Command-line argument parsing

use cd18c::cli::Cli;
use clap::Parser as ClapParser;
use std::path::PathBuf;

#[test]
fn test_file_only() {
    let cli = Cli::try_parse_from(["cd18c", "prog.cd"]).expect("parse");
    assert_eq!(cli.file, PathBuf::from("prog.cd"));
    assert!(!cli.tree);
    assert!(!cli.view);
    assert_eq!(cli.tab_width, 4);
    assert!(cli.config().verify_program_name);
}

#[test]
fn test_all_flags() {
    let cli = Cli::try_parse_from([
        "cd18c",
        "--tree",
        "--view",
        "--tab-width",
        "2",
        "--no-name-check",
        "-vv",
        "prog.cd",
    ])
    .expect("parse");
    assert!(cli.tree);
    assert!(cli.view);
    assert_eq!(cli.config().tab_width, 2);
    assert!(!cli.config().verify_program_name);
    assert_eq!(cli.verbose, 2);
}

#[test]
fn test_bad_tab_width_rejected() {
    assert!(Cli::try_parse_from(["cd18c", "prog.cd", "--tab-width", "wide"]).is_err());
}

#[test]
fn test_unknown_flag_rejected() {
    assert!(Cli::try_parse_from(["cd18c", "prog.cd", "--optimize"]).is_err());
}
