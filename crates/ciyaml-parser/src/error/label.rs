//! Labeled source ranges for diagnostic messages.

use ciyaml_core::range::Range;

/// A labeled range in the configuration source.
///
/// # Primary vs Secondary Labels
///
/// - **Primary labels** mark the main location of a finding.
/// - **Secondary labels** provide additional context, such as "first defined
///   here" for a duplicate definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    range: Range,
    message: String,
    is_primary: bool,
}

impl Label {
    /// Create a new primary label.
    pub fn primary(range: Range, message: impl Into<String>) -> Self {
        Self {
            range,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a new secondary label.
    pub fn secondary(range: Range, message: impl Into<String>) -> Self {
        Self {
            range,
            message: message.into(),
            is_primary: false,
        }
    }

    /// Get the range this label applies to.
    pub fn range(&self) -> Range {
        self.range
    }

    /// Get the label message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if this is a primary label.
    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Check if this is a secondary label.
    pub fn is_secondary(&self) -> bool {
        !self.is_primary
    }
}
