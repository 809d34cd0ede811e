use crate::compiler::Compilation;
use crate::diagnostics::Diagnostic;
use crate::parser::ast::OutlineRow;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use rustc_hash::FxHashSet;
use std::io;

/// Which pane has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Tree,
    Diagnostics,
}

impl FocusedPane {
    /// Move focus to the next pane (source -> tree -> diagnostics)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Tree,
            FocusedPane::Tree => FocusedPane::Diagnostics,
            FocusedPane::Diagnostics => FocusedPane::Source,
        }
    }

    /// Move focus to the previous pane
    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Diagnostics,
            FocusedPane::Tree => FocusedPane::Source,
            FocusedPane::Diagnostics => FocusedPane::Tree,
        }
    }
}

/// Viewer state over one finished compilation
pub struct App {
    pub compilation: Compilation,

    /// Source split into lines, tabs left as they are
    pub source: Vec<String>,

    /// Pre-rendered tree outline
    pub outline: Vec<OutlineRow>,

    /// Lines that carry at least one diagnostic
    pub error_lines: FxHashSet<usize>,

    pub focused_pane: FocusedPane,

    /// 1-based source cursor line
    pub cursor_line: usize,
    pub tree_cursor: usize,
    pub selected_diagnostic: usize,

    /// Per-pane scroll offsets
    pub source_scroll: usize,
    pub tree_scroll: usize,
    pub diagnostics_scroll: usize,

    pub should_quit: bool,
    pub status_message: String,
}

impl App {
    pub fn new(compilation: Compilation, source: &str) -> Self {
        let outline = compilation.tree.outline(&compilation.symbols);
        let error_lines = compilation.diagnostics.iter().map(Diagnostic::line).collect();
        let status_message = if compilation.is_success() {
            String::from("Compiled without errors")
        } else {
            format!("{} error(s)", compilation.diagnostics.len())
        };

        App {
            compilation,
            source: source.lines().map(str::to_string).collect(),
            outline,
            error_lines,
            focused_pane: FocusedPane::Source,
            cursor_line: 1,
            tree_cursor: 0,
            selected_diagnostic: 0,
            source_scroll: 0,
            tree_scroll: 0,
            diagnostics_scroll: 0,
            should_quit: false,
            status_message,
        }
    }

    /// Run the viewer until the user quits
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        while !self.should_quit {
            terminal.draw(|f| self.render(f))?;

            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key_event(key);
                }
            }
        }
        Ok(())
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[0]);

        // Left column: Source (top) | Diagnostics (bottom)
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(columns[0]);

        super::panes::render_source_pane(
            frame,
            left_rows[0],
            &self.source,
            self.cursor_line,
            &self.error_lines,
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        let diagnostics: Vec<&Diagnostic> = self.compilation.diagnostics.iter().collect();
        super::panes::render_diagnostics_pane(
            frame,
            left_rows[1],
            &diagnostics,
            self.selected_diagnostic,
            self.focused_pane == FocusedPane::Diagnostics,
            &mut self.diagnostics_scroll,
        );

        super::panes::render_tree_pane(
            frame,
            columns[1],
            &self.outline,
            self.tree_cursor,
            self.cursor_line,
            self.focused_pane == FocusedPane::Tree,
            &mut self.tree_scroll,
        );

        super::panes::render_status_bar(
            frame,
            main_chunks[1],
            &self.status_message,
            self.cursor_line,
            &self.compilation.diagnostics,
        );
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            KeyCode::Up => self.move_cursor(-1),
            KeyCode::Down => self.move_cursor(1),
            KeyCode::PageUp => self.move_cursor(-10),
            KeyCode::PageDown => self.move_cursor(10),
            KeyCode::Enter => self.jump_to_line(),
            _ => {}
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let (cursor, len, base) = match self.focused_pane {
            FocusedPane::Source => (&mut self.cursor_line, self.source.len(), 1),
            FocusedPane::Tree => (&mut self.tree_cursor, self.outline.len(), 0),
            FocusedPane::Diagnostics => (
                &mut self.selected_diagnostic,
                self.compilation.diagnostics.len(),
                0,
            ),
        };
        if len == 0 {
            return;
        }
        let last = base + len - 1;
        *cursor = cursor.saturating_add_signed(delta).clamp(base, last);
    }

    /// Move the source cursor to the line of the selected tree row or
    /// diagnostic.
    fn jump_to_line(&mut self) {
        let line = match self.focused_pane {
            FocusedPane::Source => return,
            FocusedPane::Tree => self.outline.get(self.tree_cursor).and_then(|row| row.line),
            FocusedPane::Diagnostics => self
                .compilation
                .diagnostics
                .iter()
                .nth(self.selected_diagnostic)
                .map(Diagnostic::line),
        };

        match line {
            Some(line) => {
                self.cursor_line = line.clamp(1, self.source.len().max(1));
                self.focused_pane = FocusedPane::Source;
                self.status_message = format!("Line {line}");
            }
            None => self.status_message = String::from("No source line for this entry"),
        }
    }
}
