//! ciyaml CLI library
//!
//! This module contains the core CLI logic: it loads the configuration,
//! analyzes one pipeline file and reports the surviving diagnostics.

pub mod error_adapter;

mod args;
mod config;
mod report;

pub use args::{Args, OutputFormat};

use std::io;

use log::info;
use thiserror::Error;

use ciyaml::{Analyzer, CiyamlError};

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Analysis(#[from] CiyamlError),

    #[error("Failed to write report: {0}")]
    Output(#[from] io::Error),

    /// The analysis finished with error-level diagnostics.
    #[error("{errors} error(s) found in {path}")]
    Findings { path: String, errors: usize },
}

/// Run the ciyaml CLI application
///
/// Analyzes the input file and writes its diagnostics to standard output
/// in the requested format.
///
/// # Errors
///
/// Returns `CliError` for:
/// - Configuration loading errors
/// - File I/O errors
/// - Inputs that cannot be analyzed
/// - Any error-level diagnostic left after suppression
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(input_path = args.input, format:? = args.format; "Checking configuration");

    let app_config = config::load_config(args.config.as_ref())?;
    let analyzer = Analyzer::new(app_config)?;
    let analysis = analyzer.analyze_file(&args.input)?;

    let report = match args.format {
        OutputFormat::Human => {
            report::render_human(analysis.document().source(), analysis.diagnostics())
                .map_err(io::Error::other)?
        }
        OutputFormat::Json => {
            report::render_json(&args.input, analysis.diagnostics()).map_err(io::Error::other)?
        }
    };
    if !report.is_empty() {
        println!("{report}");
    }

    let errors = analysis
        .diagnostics()
        .iter()
        .filter(|diagnostic| diagnostic.severity().is_error())
        .count();
    if errors > 0 {
        return Err(CliError::Findings {
            path: args.input.clone(),
            errors,
        });
    }

    info!(diagnostics = analysis.diagnostics().len(); "Configuration checked");
    Ok(())
}
