//! Shell linting of `run` commands.
//!
//! [`ShellcheckLinter`] runs the `shellcheck` executable and reads its
//! `json1` output. Findings use 1-based lines and columns relative to the
//! script passed to [`ShellLinter::lint`].

use std::{
    io::{self, Write},
    path::PathBuf,
    process::{Command, Stdio},
};

use log::{debug, trace};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellLintError {
    #[error("cannot run {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid linter output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Severity reported by the linter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellLevel {
    Error,
    Warning,
    Info,
    Style,
}

/// One finding, positioned in the linted script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellFinding {
    pub line: u32,
    pub end_line: u32,
    pub column: u32,
    pub end_column: u32,
    pub level: ShellLevel,
    pub code: u32,
    pub message: String,
}

/// A linter for shell scripts.
pub trait ShellLinter: Send + Sync {
    /// Lint `script`.
    ///
    /// # Errors
    ///
    /// Returns an error if the linter cannot be run or its output cannot be
    /// read.
    fn lint(&self, script: &str) -> Result<Vec<ShellFinding>, ShellLintError>;
}

/// A linter that never reports anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLinter;

impl ShellLinter for NoopLinter {
    fn lint(&self, _script: &str) -> Result<Vec<ShellFinding>, ShellLintError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
struct ShellcheckOutput {
    comments: Vec<ShellFinding>,
}

/// Runs `shellcheck -s bash -f json1 -`.
#[derive(Debug, Clone)]
pub struct ShellcheckLinter {
    path: PathBuf,
}

impl ShellcheckLinter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ShellLinter for ShellcheckLinter {
    fn lint(&self, script: &str) -> Result<Vec<ShellFinding>, ShellLintError> {
        let spawn_error = |source| ShellLintError::Spawn {
            path: self.path.clone(),
            source,
        };

        let mut child = Command::new(&self.path)
            .args(["-s", "bash", "-f", "json1", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(spawn_error)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(script.as_bytes()).map_err(spawn_error)?;
        }
        let output = child.wait_with_output().map_err(spawn_error)?;
        trace!(status:? = output.status, bytes = output.stdout.len(); "Shellcheck finished");

        parse_output(&output.stdout)
    }
}

/// Parse the `json1` output format. Empty output means no findings.
fn parse_output(stdout: &[u8]) -> Result<Vec<ShellFinding>, ShellLintError> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let output: ShellcheckOutput = serde_json::from_slice(stdout)?;
    debug!(findings = output.comments.len(); "Shellcheck findings");
    Ok(output.comments)
}
