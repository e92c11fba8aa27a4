//! Error types for analysis operations.
//!
//! Findings in the analyzed configuration are never errors: they are
//! [`Diagnostic`](ciyaml_parser::error::Diagnostic) values. [`CiyamlError`]
//! covers the cases where no analysis result can be produced at all.

use std::io;

use thiserror::Error;

use ciyaml_parser::error::ParseError;

use crate::registry::RegistryError;

/// The main error type for analysis operations.
#[derive(Debug, Error)]
pub enum CiyamlError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source could not be turned into a document.
    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Orb registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl CiyamlError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
