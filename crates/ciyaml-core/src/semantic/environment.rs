use indexmap::IndexMap;

use crate::range::{Range, TextAndRange};

/// An `environment:` block.
///
/// Values are kept as written; keys map to the value and its range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    pub range: Range,
    pub variables: IndexMap<String, TextAndRange>,
}

impl Environment {
    /// Returns `true` if no variable is declared.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Iterate over the declared variable names.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }
}
