// cd18c: CD18 compiler front end

use std::fs;
use std::io;
use std::process::ExitCode;

use clap::Parser as ClapParser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use cd18c::cli::Cli;
use cd18c::compiler::{Compilation, FrontEnd};
use cd18c::ui::App;

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(io::stderr)
        .init();

    let front_end = FrontEnd::new(cli.config());
    let compilation = match front_end.compile_file(&cli.file) {
        Ok(compilation) => compilation,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };

    for message in compilation.messages() {
        println!("{message}");
    }

    if cli.tree {
        for row in compilation.tree.outline(&compilation.symbols) {
            println!("{row}");
        }
    }

    let success = compilation.is_success();

    if cli.view {
        if let Err(e) = view(&cli, compilation) {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    }

    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn view(cli: &Cli, compilation: Compilation) -> io::Result<()> {
    let source = fs::read_to_string(&cli.file)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(compilation, &source);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}
