//! The core diagnostic type.
//!
//! A [`Diagnostic`] represents a single finding with a severity, an optional
//! error code, a primary source range, secondary labels, help text and
//! quick fixes.

use std::fmt;

use ciyaml_core::range::Range;

use crate::error::{CodeAction, ErrorCode, Label, Severity};

/// Extra rendering hints for editors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticTag {
    /// Rendered with a strike-through.
    Deprecated,
    /// Rendered faded out.
    Unnecessary,
}

/// A diagnostic message with source location information.
///
/// Diagnostics are cumulative: parsing and validation never stop at the
/// first finding.
///
/// # Example
///
/// ```text
/// error[E200]: Cannot find declaration for job deploy
///   --> .circleci/config.yml:24:9
///    |
/// 24 |       - deploy
///    |         ^^^^^^
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    range: Range,
    labels: Vec<Label>,
    help: Option<String>,
    actions: Vec<CodeAction>,
    tags: Vec<DiagnosticTag>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use ciyaml_core::range::Range;
    /// # use ciyaml_parser::error::{Diagnostic, ErrorCode};
    /// let diag = Diagnostic::error("Executor `base` does not exist")
    ///     .with_code(ErrorCode::E202)
    ///     .with_range(Range::from_coords(3, 4, 3, 18));
    /// assert!(diag.severity().is_error());
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create an informational diagnostic.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Information, message)
    }

    /// Create a hint diagnostic.
    pub fn hint(message: impl Into<String>) -> Self {
        Self::new(Severity::Hint, message)
    }

    /// Get the severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the primary range.
    pub fn range(&self) -> Range {
        self.range
    }

    /// Get all labels attached to this diagnostic.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Get the quick fixes.
    pub fn actions(&self) -> &[CodeAction] {
        &self.actions
    }

    /// Get the rendering tags.
    pub fn tags(&self) -> &[DiagnosticTag] {
        &self.tags
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Set the primary range.
    pub fn with_range(mut self, range: Range) -> Self {
        self.range = range;
        self
    }

    /// Set the primary range and attach a message to it.
    pub fn with_label(mut self, range: Range, message: impl Into<String>) -> Self {
        self.range = range;
        self.labels.push(Label::primary(range, message));
        self
    }

    /// Add a secondary label to this diagnostic.
    pub fn with_secondary_label(mut self, range: Range, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(range, message));
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Attach a quick fix.
    pub fn with_action(mut self, action: CodeAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Attach a rendering tag.
    pub fn with_tag(mut self, tag: DiagnosticTag) -> Self {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// Create a new diagnostic with the given severity and message.
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            range: Range::default(),
            labels: Vec::new(),
            help: None,
            actions: Vec::new(),
            tags: Vec::new(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[E001]: message" or "error: message"
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}
