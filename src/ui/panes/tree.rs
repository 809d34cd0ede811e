//! Syntax tree outline pane

use crate::parser::ast::OutlineRow;
use crate::ui::panes::{inner_height, keep_visible, pane_block};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Render the outline with the row at `cursor` highlighted. Rows whose node
/// sits on `source_line` are drawn in the accent colour.
pub fn render_tree_pane(
    frame: &mut Frame,
    area: Rect,
    rows: &[OutlineRow],
    cursor: usize,
    source_line: usize,
    is_focused: bool,
    scroll: &mut usize,
) {
    let visible_height = inner_height(area.height);
    keep_visible(scroll, cursor, visible_height);

    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .skip(*scroll)
        .take(visible_height)
        .map(|(idx, row)| {
            let (kind, rest) = match row.label.split_once(' ') {
                Some((kind, rest)) => (kind.to_string(), format!(" {rest}")),
                None => (row.label.clone(), String::new()),
            };
            let kind_style = if kind == "Undefined" {
                Style::default().fg(DEFAULT_THEME.error)
            } else if row.line == Some(source_line) {
                Style::default().fg(DEFAULT_THEME.secondary)
            } else {
                Style::default().fg(DEFAULT_THEME.primary)
            };

            let mut line = Line::from(vec![
                Span::raw("  ".repeat(row.depth)),
                Span::styled(kind, kind_style),
                Span::styled(rest, Style::default().fg(DEFAULT_THEME.fg)),
            ]);
            if idx == cursor && is_focused {
                line = line.style(
                    Style::default()
                        .bg(DEFAULT_THEME.current_line_bg)
                        .add_modifier(Modifier::BOLD),
                );
            }
            line
        })
        .collect();

    let title = format!(" Syntax Tree ({} nodes) ", rows.len());
    let paragraph = Paragraph::new(lines).block(pane_block(&title, is_focused));
    frame.render_widget(paragraph, area);
}
