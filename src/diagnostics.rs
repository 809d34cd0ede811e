//! Error records collected during a compilation run
//!
//! Nothing in the front end aborts on malformed input. Every lexical, syntax
//! and semantic problem becomes a [`Diagnostic`] appended to a run-wide
//! [`Diagnostics`] queue, which is drained in detection order.

use crate::parser::token::Token;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use std::fmt;

/// Which stage detected the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Lexical,
    Syntax,
    Semantic,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Lexical => write!(f, "Lexical"),
            Category::Syntax => write!(f, "Syntax"),
            Category::Semantic => write!(f, "Semantic"),
        }
    }
}

/// One reported problem, anchored at the offending token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: Category,
    pub token: Token,
    pub description: String,
}

impl Diagnostic {
    pub fn new(
        category: Category,
        token: Token,
        description: impl Into<String>,
    ) -> Self {
        Self {
            category,
            token,
            description: description.into(),
        }
    }

    pub fn lexical(token: Token, description: impl Into<String>) -> Self {
        Self::new(Category::Lexical, token, description)
    }

    pub fn syntax(token: Token, description: impl Into<String>) -> Self {
        Self::new(Category::Syntax, token, description)
    }

    pub fn semantic(token: Token, description: impl Into<String>) -> Self {
        Self::new(Category::Semantic, token, description)
    }

    pub fn line(&self) -> usize {
        self.token.line
    }

    pub fn col(&self) -> usize {
        self.token.col
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Error ({}, {}): {}",
            self.category, self.token.line, self.token.col, self.description
        )
    }
}

/// FIFO queue of diagnostics for one run.
///
/// A diagnostic identical to one already reported (same category, position
/// and description) is dropped, so re-folding a subtree never reports the
/// same fault twice.
#[derive(Debug, Default)]
pub struct Diagnostics {
    queue: VecDeque<Diagnostic>,
    seen: FxHashSet<(Category, usize, usize, String)>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic. Returns `false` if it duplicated an earlier one.
    pub fn report(&mut self, diagnostic: Diagnostic) -> bool {
        let key = (
            diagnostic.category,
            diagnostic.token.line,
            diagnostic.token.col,
            diagnostic.description.clone(),
        );
        if !self.seen.insert(key) {
            return false;
        }
        tracing::debug!(%diagnostic, "reported");
        self.queue.push_back(diagnostic);
        true
    }

    pub fn has_errors(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Remove and return the oldest diagnostic.
    pub fn next_error(&mut self) -> Option<Diagnostic> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.queue.iter()
    }

    pub fn count(&self, category: Category) -> usize {
        self.queue.iter().filter(|d| d.category == category).count()
    }
}
