//! Rendering of analysis results for standard output.

use std::fmt;

use miette::GraphicalReportHandler;
use serde::Serialize;

use ciyaml::range::Range;
use ciyaml_parser::error::Diagnostic;

use crate::error_adapter::DiagnosticAdapter;

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    file: &'a str,
    diagnostics: Vec<JsonDiagnostic<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonDiagnostic<'a> {
    severity: String,
    code: Option<&'static str>,
    message: &'a str,
    range: Range,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fixes: Vec<&'a str>,
}

/// Render every diagnostic as an annotated snippet of `source`.
pub fn render_human(source: &str, diagnostics: &[Diagnostic]) -> Result<String, fmt::Error> {
    let reporter = GraphicalReportHandler::new();
    let mut out = String::new();
    for diagnostic in diagnostics {
        reporter.render_report(&mut out, &DiagnosticAdapter::new(diagnostic, source))?;
    }
    Ok(out)
}

/// Render the diagnostics of `file` as a pretty-printed JSON document.
///
/// Ranges are zero-based lines and columns. `fixes` lists the titles of the
/// quick fixes offered for a diagnostic.
pub fn render_json(file: &str, diagnostics: &[Diagnostic]) -> Result<String, serde_json::Error> {
    let report = JsonReport {
        file,
        diagnostics: diagnostics
            .iter()
            .map(|diagnostic| JsonDiagnostic {
                severity: diagnostic.severity().to_string(),
                code: diagnostic.code().map(|code| code.as_str()),
                message: diagnostic.message(),
                range: diagnostic.range(),
                help: diagnostic.help(),
                fixes: diagnostic
                    .actions()
                    .iter()
                    .map(|action| action.title.as_str())
                    .collect(),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&report)
}
