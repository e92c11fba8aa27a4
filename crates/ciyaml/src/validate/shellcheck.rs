//! Shell lint findings of `run` commands, mapped back to the document.

use log::warn;

use ciyaml_core::{
    params,
    range::{Position, Range},
    semantic::Run,
};
use ciyaml_parser::error::{Diagnostic, ErrorCode};

use crate::shell_lint::{ShellFinding, ShellLevel};

use super::Validator;

const SHEBANG: &str = "#!/bin/bash\n";

impl Validator<'_> {
    pub(super) fn lint_run_command(&mut self, run: &Run) {
        if !is_bash(run.shell.as_deref())
            || run.command.is_empty()
            || params::contains_substitution(&run.raw_command)
        {
            return;
        }

        let script = format!("{SHEBANG}{}\n", run.command);
        let findings = match self.linter.lint(&script) {
            Ok(findings) => findings,
            Err(err) => {
                warn!(err:% = err; "Shell lint skipped");
                return;
            }
        };

        let layout = CommandLayout::new(run);
        for finding in findings {
            self.emit(finding_diagnostic(&finding, &layout));
        }
    }
}

fn is_bash(shell: Option<&str>) -> bool {
    match shell {
        None => true,
        Some(shell) => shell == "bash" || shell.starts_with("/bin/bash"),
    }
}

/// Where the lines of a run command sit in the document.
#[derive(Debug)]
struct CommandLayout {
    /// Document line of the command's first line.
    first_line: u32,
    /// Column of the command's first character on its first line.
    first_column: u32,
    /// Column of the first character on the following lines.
    indent: u32,
    /// Folded scalars join lines, so findings only map to the first line.
    is_folded: bool,
}

impl CommandLayout {
    fn new(run: &Run) -> Self {
        let start = run.command_range.start;
        let raw = run.raw_command.as_str();

        if !(raw.starts_with('|') || raw.starts_with('>')) {
            let quoted = raw.starts_with('"') || raw.starts_with('\'');
            return Self {
                first_line: start.line,
                first_column: start.character + u32::from(quoted),
                indent: 0,
                is_folded: false,
            };
        }

        let body: Vec<&str> = raw.lines().skip(1).collect();
        let first_content = body
            .iter()
            .position(|line| !line.trim().is_empty())
            .unwrap_or(0);
        let indent = body
            .iter()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.len() - line.trim_start().len())
            .min()
            .unwrap_or(0);
        let indent = u32::try_from(indent).unwrap_or(u32::MAX);
        let first_content = u32::try_from(first_content).unwrap_or(0);

        Self {
            first_line: start.line + 1 + first_content,
            first_column: indent,
            indent,
            is_folded: raw.starts_with('>'),
        }
    }

    /// Map a 1-based line and column of the linted script.
    fn position(&self, line: u32, column: u32) -> Position {
        // Line 1 is the shebang.
        let offset = line.saturating_sub(2);
        let column = column.saturating_sub(1);

        if self.is_folded || offset == 0 {
            let line_offset = if self.is_folded { 0 } else { offset };
            return Position::new(self.first_line + line_offset, self.first_column + column);
        }
        Position::new(self.first_line + offset, self.indent + column)
    }
}

fn finding_diagnostic(finding: &ShellFinding, layout: &CommandLayout) -> Diagnostic {
    let message = format!("SC{}: {}", finding.code, finding.message);
    let diagnostic = match finding.level {
        ShellLevel::Error => Diagnostic::error(message),
        ShellLevel::Warning => Diagnostic::warning(message),
        ShellLevel::Info => Diagnostic::info(message),
        ShellLevel::Style => Diagnostic::hint(message),
    };

    let start = layout.position(finding.line, finding.column);
    let end = layout.position(finding.end_line, finding.end_column);
    let end = if end < start { start } else { end };

    diagnostic
        .with_code(ErrorCode::E309)
        .with_range(Range::new(start, end))
        .with_help(format!("https://www.shellcheck.net/wiki/SC{}", finding.code))
}
