//! Quick fixes attached to diagnostics.

use ciyaml_core::range::Range;

/// A single text replacement.
///
/// An empty `new_text` deletes the range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

impl TextEdit {
    pub fn new(range: Range, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }
}

/// A titled set of edits that resolves a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAction {
    pub title: String,
    pub edits: Vec<TextEdit>,
    /// Marks the action editors should apply by default.
    pub is_preferred: bool,
}

impl CodeAction {
    /// Create an action made of a single edit.
    pub fn replace(title: impl Into<String>, range: Range, new_text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            edits: vec![TextEdit::new(range, new_text)],
            is_preferred: false,
        }
    }

    /// Mark the action as preferred.
    pub fn preferred(mut self) -> Self {
        self.is_preferred = true;
        self
    }
}
