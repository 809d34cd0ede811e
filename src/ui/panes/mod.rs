//! Viewer pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: CD18 source with keyword highlighting, cursor line and error lines
//! - [`tree`]: indented syntax tree outline
//! - [`diagnostics`]: the run's errors in detection order
//! - [`status`]: status bar with error counts and keybindings
//!
//! Each pane exports one `render_*` function. Panes that scroll take the
//! scroll offset by `&mut` and keep their cursor row in view.

pub mod diagnostics;
pub mod source;
pub mod status;
pub mod tree;

pub use diagnostics::render_diagnostics_pane;
pub use source::render_source_pane;
pub use status::render_status_bar;
pub use tree::render_tree_pane;

use crate::ui::theme::DEFAULT_THEME;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders};

/// Visible rows inside a bordered pane of `height` rows.
pub(crate) fn inner_height(height: u16) -> usize {
    height.saturating_sub(2).max(1) as usize
}

/// Adjust `offset` so row `cursor` lies within `visible` rows of it.
pub(crate) fn keep_visible(offset: &mut usize, cursor: usize, visible: usize) {
    if cursor < *offset {
        *offset = cursor;
    } else if cursor >= *offset + visible {
        *offset = cursor + 1 - visible;
    }
}

pub(crate) fn pane_block(title: &str, is_focused: bool) -> Block<'_> {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_visible() {
        let mut offset = 0;
        keep_visible(&mut offset, 3, 5);
        assert_eq!(offset, 0);
        keep_visible(&mut offset, 7, 5);
        assert_eq!(offset, 3);
        keep_visible(&mut offset, 1, 5);
        assert_eq!(offset, 1);
    }

    #[test]
    fn test_inner_height_minimum() {
        assert_eq!(inner_height(0), 1);
        assert_eq!(inner_height(12), 10);
    }
}
