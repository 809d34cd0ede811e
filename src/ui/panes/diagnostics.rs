//! Diagnostics pane: the run's errors in detection order

use crate::diagnostics::{Category, Diagnostic};
use crate::ui::panes::{inner_height, keep_visible, pane_block};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

fn category_style(category: Category) -> Style {
    let colour = match category {
        Category::Lexical => DEFAULT_THEME.warning,
        Category::Syntax => DEFAULT_THEME.error,
        Category::Semantic => DEFAULT_THEME.secondary,
    };
    Style::default().fg(colour).add_modifier(Modifier::BOLD)
}

pub fn render_diagnostics_pane(
    frame: &mut Frame,
    area: Rect,
    diagnostics: &[&Diagnostic],
    selected: usize,
    is_focused: bool,
    scroll: &mut usize,
) {
    let visible_height = inner_height(area.height);
    keep_visible(scroll, selected, visible_height);

    let lines: Vec<Line> = if diagnostics.is_empty() {
        vec![Line::from(Span::styled(
            " No errors",
            Style::default().fg(DEFAULT_THEME.success),
        ))]
    } else {
        diagnostics
            .iter()
            .enumerate()
            .skip(*scroll)
            .take(visible_height)
            .map(|(idx, diagnostic)| {
                let mut line = Line::from(vec![
                    Span::styled(
                        format!("{:<9}", diagnostic.category.to_string()),
                        category_style(diagnostic.category),
                    ),
                    Span::styled(
                        format!("{:>4}:{:<3} ", diagnostic.line(), diagnostic.col()),
                        Style::default().fg(DEFAULT_THEME.comment),
                    ),
                    Span::styled(
                        diagnostic.description.clone(),
                        Style::default().fg(DEFAULT_THEME.fg),
                    ),
                ]);
                if idx == selected && is_focused {
                    line = line.style(Style::default().bg(DEFAULT_THEME.current_line_bg));
                }
                line
            })
            .collect()
    };

    let title = format!(" Diagnostics ({}) ", diagnostics.len());
    let paragraph = Paragraph::new(lines).block(pane_block(&title, is_focused));
    frame.render_widget(paragraph, area);
}
