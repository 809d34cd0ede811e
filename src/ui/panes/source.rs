//! Source pane rendering with CD18 highlighting
//!
//! Highlighting runs a small character tokenizer per line rather than the
//! scanner, so it never reports anything and copes with partial lines.
//! Keywords come from [`TokenKind::keyword`], the same table the scanner uses.

use crate::parser::token::TokenKind;
use crate::ui::panes::{inner_height, keep_visible, pane_block};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use rustc_hash::FxHashSet;

/// Split one source line into styled spans.
pub fn highlight_line(line: &str) -> Line<'static> {
    let mut spans = Vec::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '/' && chars.get(i + 1) == Some(&'-') && chars.get(i + 2) == Some(&'-') {
            let rest: String = chars[i..].iter().collect();
            spans.push(Span::styled(rest, Style::default().fg(DEFAULT_THEME.comment)));
            break;
        }

        if c == '"' {
            let mut end = i + 1;
            while end < chars.len() && chars[end] != '"' {
                end += 1;
            }
            end = (end + 1).min(chars.len());
            let text: String = chars[i..end].iter().collect();
            spans.push(Span::styled(text, Style::default().fg(DEFAULT_THEME.string)));
            i = end;
            continue;
        }

        if c.is_ascii_alphanumeric() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let style = word_style(&word);
            spans.push(Span::styled(word, style));
            continue;
        }

        let style = match c {
            '(' | ')' | '[' | ']' => Style::default().fg(DEFAULT_THEME.primary),
            _ => Style::default().fg(DEFAULT_THEME.fg),
        };
        spans.push(Span::styled(c.to_string(), style));
        i += 1;
    }

    Line::from(spans)
}

fn word_style(word: &str) -> Style {
    if word.starts_with(|c: char| c.is_ascii_digit()) {
        return Style::default().fg(DEFAULT_THEME.number);
    }
    match TokenKind::keyword(word) {
        Some(kind) if kind.is_primitive_type() => Style::default().fg(DEFAULT_THEME.type_name),
        Some(_) => Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD),
        None => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Render the source pane. `cursor_line` is 1-based; lines in `error_lines`
/// get the error background and a marker in the gutter.
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    source: &[String],
    cursor_line: usize,
    error_lines: &FxHashSet<usize>,
    is_focused: bool,
    scroll: &mut usize,
) {
    let visible_height = inner_height(area.height);
    keep_visible(scroll, cursor_line.saturating_sub(1), visible_height);

    let visible_lines: Vec<Line> = source
        .iter()
        .enumerate()
        .skip(*scroll)
        .take(visible_height)
        .map(|(idx, text)| {
            let line_num = idx + 1;
            let has_error = error_lines.contains(&line_num);
            let is_cursor = line_num == cursor_line;

            let marker = if has_error { "!" } else { " " };
            let num_style = if has_error {
                Style::default()
                    .fg(DEFAULT_THEME.error)
                    .add_modifier(Modifier::BOLD)
            } else if is_cursor {
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.comment)
            };

            let mut content = highlight_line(text);
            let background = if is_cursor {
                Some(DEFAULT_THEME.current_line_bg)
            } else if has_error {
                Some(DEFAULT_THEME.error_line_bg)
            } else {
                None
            };
            if let Some(bg) = background {
                for span in &mut content.spans {
                    span.style = span.style.bg(bg);
                }
            }

            let mut spans = vec![Span::styled(format!("{marker}{line_num:4} "), num_style)];
            spans.extend(content.spans);
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(pane_block(" Source ", is_focused));
    frame.render_widget(paragraph, area);
}
