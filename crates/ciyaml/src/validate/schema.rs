//! Document shape against the configured JSON schema.

use log::debug;

use ciyaml_core::range::Range;
use ciyaml_parser::error::{Diagnostic, ErrorCode};

use super::Validator;
use crate::schema::{self, DecodeError};

impl Validator<'_> {
    pub(super) fn validate_schema(&mut self) {
        let Some(validator) = self.schema else {
            return;
        };
        let document = self.document;

        let has_syntax_errors = document
            .diagnostics()
            .iter()
            .any(|diagnostic| diagnostic.code().is_some_and(|code| code.is_syntax()));
        if has_syntax_errors {
            debug!("Schema check skipped on malformed YAML");
            return;
        }

        let instance = match schema::decode(document.source()) {
            Ok(instance) => instance,
            Err(err) => {
                let range = decode_error_range(&err, document.source())
                    .unwrap_or_else(|| document.path_range::<&str>(&[]));
                self.emit(
                    Diagnostic::error(err.message())
                        .with_code(ErrorCode::E006)
                        .with_range(range),
                );
                return;
            }
        };

        for violation in validator.violations(&instance) {
            let range = document.path_range(&violation.path());
            self.emit(
                Diagnostic::error(violation.message)
                    .with_code(ErrorCode::E105)
                    .with_range(range),
            );
        }
    }
}

/// The content of the line the decoder stopped at, indentation excluded.
fn decode_error_range(err: &DecodeError, source: &str) -> Option<Range> {
    let line = err.line()?.checked_sub(1)?;
    let text = source.lines().nth(line)?;
    let start = text.len() - text.trim_start().len();
    let end = text.trim_end().len().max(start);

    Some(Range::from_coords(
        line as u32,
        start as u32,
        line as u32,
        end as u32,
    ))
}
