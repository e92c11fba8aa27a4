//! # ciyaml Parser
//!
//! Error-tolerant parser for CI pipeline YAML configurations. This crate
//! turns source text into a typed [`Document`]: jobs, commands, executors,
//! workflows, orbs and pipeline parameters, each with the source ranges
//! diagnostics point at.
//!
//! ## Usage
//!
//! ```
//! # use ciyaml_parser::{parse, error::ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//! version: 2.1
//! jobs:
//!   build:
//!     docker:
//!       - image: cimg/base:stable
//!     steps:
//!       - checkout
//! workflows:
//!   main:
//!     jobs: [build]
//! "#;
//!
//!     let document = parse(source)?;
//!     assert!(document.does_job_exist("build"));
//!     Ok(())
//! }
//! ```

pub mod anchors;
pub mod cache;
pub mod cst;
mod document;
pub mod error;
mod parser;
pub mod suppression;
mod syntax;

pub use document::{Document, DocumentKind, LocalOrb};

use error::ParseError;

/// Parse a pipeline configuration.
///
/// The pipeline runs in this order:
///
/// 1. **Tree** - Build the tree-sitter syntax tree
/// 2. **Anchors** - Collect anchors and aliases
/// 3. **Syntax** - Report malformed YAML
/// 4. **Entities** - Build the typed model, section by section
/// 5. **Suppression** - Collect `# cci-ignore` directives
///
/// Malformed input is reported through [`Document::diagnostics`]; the
/// function fails only if the YAML grammar itself is unusable.
pub fn parse(source: &str) -> Result<Document, ParseError> {
    Document::parse(source)
}
