//! Severity levels for diagnostics.
//!
//! The four levels mirror the editor protocol so diagnostics can be handed
//! to a language client unchanged.

use std::fmt;

/// The severity level of a diagnostic.
///
/// Variants are ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// The configuration will be rejected.
    Error,

    /// The configuration is accepted but likely wrong.
    Warning,

    /// Advisory information, such as an available orb update.
    Information,

    /// A stylistic suggestion.
    Hint,
}

impl Severity {
    /// Returns `true` if this is an error severity.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Returns `true` if this is a warning severity.
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Information => write!(f, "info"),
            Severity::Hint => write!(f, "hint"),
        }
    }
}
