//! Error adapter for converting ciyaml diagnostics to miette reports.
//!
//! This module provides the bridge between the library's diagnostic and
//! error types and miette's rich diagnostic formatting used in the CLI.
//! Diagnostics carry line/column ranges; they are mapped to byte spans
//! of the analyzed source here.
//!
//! # Multi-Error Support
//!
//! When a [`CiyamlError::Parse`] contains multiple diagnostics, each
//! diagnostic is rendered independently.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, Severity as MietteSeverity, SourceSpan};

use ciyaml::{
    CiyamlError,
    range::{Range, pos_to_index},
};
use ciyaml_parser::error::{Diagnostic, Severity};

use crate::CliError;

/// Adapter for a single ciyaml diagnostic.
pub struct DiagnosticAdapter<'a> {
    diag: &'a Diagnostic,
    src: &'a str,
}

impl<'a> DiagnosticAdapter<'a> {
    /// Create a new diagnostic adapter.
    pub fn new(diag: &'a Diagnostic, src: &'a str) -> Self {
        Self { diag, src }
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diag.message())
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<MietteSeverity> {
        Some(match self.diag.severity() {
            Severity::Error => MietteSeverity::Error,
            Severity::Warning => MietteSeverity::Warning,
            Severity::Information | Severity::Hint => MietteSeverity::Advice,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    /// The explicit labels, or an unlabeled span over the primary range.
    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = self.diag.labels();
        if labels.is_empty() {
            let span = range_to_miette(self.diag.range(), self.src);
            return Some(Box::new(std::iter::once(
                LabeledSpan::new_primary_with_span(None, span),
            )));
        }

        Some(Box::new(labels.iter().map(|label| {
            let span = range_to_miette(label.range(), self.src);
            let message = Some(label.message().to_string());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

/// Adapter for errors without source locations.
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            CliError::Analysis(CiyamlError::Io(_)) => "ciyaml::io",
            CliError::Analysis(CiyamlError::Parse { .. }) => return None,
            CliError::Analysis(CiyamlError::Config(_)) => "ciyaml::config",
            CliError::Analysis(CiyamlError::Registry(_)) => "ciyaml::registry",
            CliError::Output(_) => "ciyaml::output",
            CliError::Findings { .. } => "ciyaml::findings",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        None
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A rich diagnostic with source location information.
    Diagnostic(DiagnosticAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => std::error::Error::source(e),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn severity(&self) -> Option<MietteSeverity> {
        match self {
            Reportable::Diagnostic(d) => d.severity(),
            Reportable::Error(e) => e.severity(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a line/column [`Range`] of `src` to a miette [`SourceSpan`].
///
/// Positions past the end of the source collapse onto its end.
fn range_to_miette(range: Range, src: &str) -> SourceSpan {
    let start = pos_to_index(range.start, src).unwrap_or(src.len());
    let end = pos_to_index(range.end, src).unwrap_or(src.len()).max(start);
    SourceSpan::new(start.into(), end - start)
}

/// Convert a [`CliError`] into a list of reportable errors.
///
/// For a parse failure, this returns one [`Reportable`] for each diagnostic
/// in the error. For other error variants, this returns a single
/// [`Reportable`].
pub fn to_reportables(err: &CliError) -> Vec<Reportable<'_>> {
    match err {
        CliError::Analysis(CiyamlError::Parse {
            err: parse_err,
            src,
        }) => parse_err
            .diagnostics()
            .iter()
            .map(|d| Reportable::Diagnostic(DiagnosticAdapter::new(d, src)))
            .collect(),
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

#[cfg(test)]
mod tests {
    use ciyaml_parser::error::{ErrorCode, ParseError};

    use super::*;

    const SOURCE: &str = "version: 2.1\njobs:\n  build:\n    steps: [checkout]\n";

    #[test]
    fn test_single_diagnostic() {
        let diag = Diagnostic::error("test error")
            .with_code(ErrorCode::E300)
            .with_label(Range::from_coords(0, 0, 0, 7), "here")
            .with_help("try this");
        let parse_err = ParseError::from(diag);
        let err = CliError::from(CiyamlError::new_parse_error(parse_err, SOURCE));

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);

        match &reportables[0] {
            Reportable::Diagnostic(d) => {
                assert_eq!(d.to_string(), "test error");
                assert_eq!(d.code().map(|c| c.to_string()), Some("E300".to_string()));
            }
            Reportable::Error(_) => panic!("Expected Diagnostic"),
        }
    }

    #[test]
    fn test_multiple_diagnostics() {
        let diags = vec![
            Diagnostic::error("first error").with_range(Range::from_coords(0, 0, 0, 7)),
            Diagnostic::error("second error")
                .with_code(ErrorCode::E301)
                .with_range(Range::from_coords(1, 0, 1, 4)),
            Diagnostic::error("third error").with_range(Range::from_coords(2, 2, 2, 7)),
        ];
        let err = CliError::from(CiyamlError::new_parse_error(ParseError::new(diags), SOURCE));

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 3);
        assert_eq!(reportables[0].to_string(), "first error");
        assert_eq!(reportables[1].to_string(), "second error");
        assert_eq!(reportables[2].to_string(), "third error");
    }

    #[test]
    fn test_non_parse_error() {
        let err = CliError::Findings {
            path: "config.yml".to_string(),
            errors: 2,
        };

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 1);
        match &reportables[0] {
            Reportable::Error(e) => {
                assert_eq!(e.to_string(), "2 error(s) found in config.yml");
                assert_eq!(
                    e.code().map(|c| c.to_string()),
                    Some("ciyaml::findings".to_string())
                );
            }
            Reportable::Diagnostic(_) => panic!("Expected Error"),
        }
    }

    #[test]
    fn test_primary_range_becomes_span() {
        let diag = Diagnostic::warning("Job is unused").with_range(Range::from_coords(2, 2, 2, 7));
        let adapter = DiagnosticAdapter::new(&diag, SOURCE);

        let labels: Vec<_> = adapter.labels().expect("primary span").collect();
        assert_eq!(labels.len(), 1);
        assert!(labels[0].primary());
        assert_eq!(labels[0].offset(), 21);
        assert_eq!(labels[0].len(), 5);
        assert_eq!(adapter.severity(), Some(MietteSeverity::Warning));
    }

    #[test]
    fn test_all_labels_returned() {
        let diag = Diagnostic::error("Duplicate job")
            .with_label(Range::from_coords(2, 2, 2, 7), "primary")
            .with_secondary_label(Range::from_coords(1, 0, 1, 4), "secondary");

        let adapter = DiagnosticAdapter::new(&diag, SOURCE);

        let labels: Vec<_> = adapter.labels().expect("labels").collect();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].label(), Some("primary"));
        assert!(labels[0].primary());
        assert_eq!(labels[1].label(), Some("secondary"));
        assert!(!labels[1].primary());
        assert_eq!(labels[1].offset(), 13);
    }

    #[test]
    fn test_out_of_range_positions_are_clamped() {
        let span = range_to_miette(Range::from_coords(40, 0, 41, 3), SOURCE);

        assert_eq!(span.offset(), SOURCE.len());
        assert_eq!(span.len(), 0);
    }
}
