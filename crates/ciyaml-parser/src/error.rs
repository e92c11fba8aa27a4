//! Error and diagnostic system for the configuration parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Primary and secondary labeled ranges
//! - Severity levels matching the editor protocol
//! - Quick-fix code actions
//! - Diagnostic collector for accumulating findings
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single finding with a severity, an optional error code, a primary source
//! range and optional help text. Source problems never abort parsing: they
//! are accumulated on the [`Document`](crate::Document). [`ParseError`] wraps
//! diagnostics for callers that treat error-level findings as a failure.
//!
//! # Example
//!
//! ```
//! # use ciyaml_core::range::Range;
//! # use ciyaml_parser::error::{Diagnostic, ErrorCode};
//! let range = Range::from_coords(4, 2, 4, 9);
//! let original = Range::from_coords(1, 2, 1, 9);
//!
//! let diag = Diagnostic::warning("Job already defined")
//!     .with_code(ErrorCode::E100)
//!     .with_range(range)
//!     .with_secondary_label(original, "first defined here")
//!     .with_help("rename one of the jobs");
//! ```

mod code_action;
mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub use code_action::{CodeAction, TextEdit};
pub use collector::DiagnosticCollector;
pub use diagnostic::{Diagnostic, DiagnosticTag};
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
