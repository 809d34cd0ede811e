//! Terminal viewer built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! Shows a finished compilation run: the source with its error lines marked,
//! an outline of the syntax tree, and the diagnostic queue.
//!
//! - **[`app`]**: viewer state, keyboard event loop, pane focus
//! - **[`panes`]**: stateless render functions for each visible pane
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! Construct an [`App`] from a [`Compilation`] and its source text, then call
//! [`App::run`] with a terminal.
//!
//! [`Compilation`]: crate::compiler::Compilation
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
