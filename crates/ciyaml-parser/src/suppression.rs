//! In-band `# cci-ignore` suppression directives.
//!
//! | comment | effect |
//! |---|---|
//! | `# cci-ignore-file` | suppress every diagnostic of the document |
//! | `# cci-ignore` (end of line) | suppress diagnostics starting on that line |
//! | `# cci-ignore-next-line` | suppress diagnostics starting on the next line |
//! | `# cci-ignore-start` / `# cci-ignore-end` | suppress diagnostics starting within the lines, inclusive |
//!
//! A diagnostic is matched by the line its range starts on. Suppression is
//! applied last, and diagnostics about malformed directives are filtered
//! like any other.

use std::{collections::BTreeSet, sync::LazyLock};

use regex::Regex;
use tree_sitter::Node;

use ciyaml_core::range::{Position, Range};

use crate::{
    cst::{node_range, walk_preorder},
    error::{CodeAction, Diagnostic, DiagnosticCollector, ErrorCode, TextEdit},
};

static IGNORE_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#\s*cci-ignore-file\s*$").expect("ignore-file pattern is valid")
});

static IGNORE_INLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\s*cci-ignore\s*$").expect("ignore pattern is valid"));

static IGNORE_NEXT_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#\s*cci-ignore-next-line\s*$").expect("ignore-next-line pattern is valid")
});

static IGNORE_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#\s*cci-ignore-start\s*$").expect("ignore-start pattern is valid")
});

static IGNORE_END_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#\s*cci-ignore-end\s*$").expect("ignore-end pattern is valid")
});

/// An inclusive span of suppressed lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuppressionRange {
    pub start_line: u32,
    pub end_line: u32,
}

impl SuppressionRange {
    pub fn contains_line(&self, line: u32) -> bool {
        self.start_line <= line && line <= self.end_line
    }
}

/// The suppression directives of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppressionInfo {
    pub file_wide: bool,
    pub suppressed_lines: BTreeSet<u32>,
    pub ranges: Vec<SuppressionRange>,
}

impl SuppressionInfo {
    /// Returns `true` if `diagnostic` is hidden by a directive.
    pub fn is_suppressed(&self, diagnostic: &Diagnostic) -> bool {
        if self.file_wide {
            return true;
        }

        let line = diagnostic.range().start.line;
        self.suppressed_lines.contains(&line)
            || self.ranges.iter().any(|range| range.contains_line(line))
    }

    /// Drop the suppressed diagnostics.
    pub fn filter(&self, diagnostics: impl IntoIterator<Item = Diagnostic>) -> Vec<Diagnostic> {
        diagnostics
            .into_iter()
            .filter(|diagnostic| !self.is_suppressed(diagnostic))
            .collect()
    }
}

/// Collect the directives from the comments below `root`.
///
/// Malformed pairings are reported to `diagnostics`: a start while a range
/// is open, an end without a start, and a start never closed.
pub(crate) fn scan(
    root: Node<'_>,
    source: &str,
    diagnostics: &mut DiagnosticCollector,
) -> SuppressionInfo {
    let mut info = SuppressionInfo::default();
    let mut open_start: Option<u32> = None;

    walk_preorder(root, |node| {
        if node.kind() != "comment" {
            return;
        }
        let text = source.get(node.byte_range()).unwrap_or_default();
        let range = node_range(node);
        let line = range.start.line;

        if IGNORE_FILE_RE.is_match(text) {
            info.file_wide = true;
        } else if IGNORE_INLINE_RE.is_match(text) {
            info.suppressed_lines.insert(line);
        } else if IGNORE_NEXT_LINE_RE.is_match(text) {
            info.suppressed_lines.insert(line + 1);
        } else if IGNORE_START_RE.is_match(text) {
            if open_start.is_some() {
                diagnostics.emit(
                    Diagnostic::error(
                        "cci-ignore-start must have a closing cci-ignore-end before trying to open a new ignore-range",
                    )
                    .with_code(ErrorCode::E402)
                    .with_range(range),
                );
            } else {
                open_start = Some(line);
            }
        } else if IGNORE_END_RE.is_match(text) {
            match open_start.take() {
                Some(start_line) => info.ranges.push(SuppressionRange {
                    start_line,
                    end_line: line,
                }),
                None => diagnostics.emit(
                    Diagnostic::error("cci-ignore-end must have an opening cci-ignore-start")
                        .with_code(ErrorCode::E401)
                        .with_range(range),
                ),
            }
        }
    });

    if let Some(start_line) = open_start {
        diagnostics.emit(
            Diagnostic::error("cci-ignore-start is missing a closing cci-ignore-end")
                .with_code(ErrorCode::E400)
                .with_range(Range::from_coords(start_line, 0, start_line, 100)),
        );
    }

    info
}

/// Quick fixes inserting a directive that hides `diagnostic`.
///
/// Every diagnostic gets "Ignore this line". Single-line diagnostics also
/// get an inline `# cci-ignore`, multi-line ones a start/end pair around
/// their lines.
pub fn ignore_actions(diagnostic: &Diagnostic, source: &str) -> Vec<CodeAction> {
    let range = diagnostic.range();
    let indent = line_indent(source, range.start.line);
    let line_start = Position::new(range.start.line, 0);

    let mut actions = vec![CodeAction::replace(
        "Ignore this line",
        Range::new(line_start, line_start),
        format!("{indent}# cci-ignore-next-line\n"),
    )];

    if range.is_single_line() {
        let line_end = Position::new(
            range.start.line,
            line_len(source, range.start.line).max(range.end.character),
        );
        actions.push(CodeAction::replace(
            "Ignore this line (inline)",
            Range::new(line_end, line_end),
            " # cci-ignore",
        ));
    } else {
        let after = Position::new(range.end.line + 1, 0);
        actions.push(CodeAction {
            title: "Ignore this range".to_string(),
            edits: vec![
                TextEdit::new(
                    Range::new(line_start, line_start),
                    format!("{indent}# cci-ignore-start\n"),
                ),
                TextEdit::new(Range::new(after, after), format!("{indent}# cci-ignore-end\n")),
            ],
            is_preferred: false,
        });
    }

    actions
}

fn line_at(source: &str, line: u32) -> &str {
    source.lines().nth(line as usize).unwrap_or_default()
}

fn line_indent(source: &str, line: u32) -> &str {
    let text = line_at(source, line);
    &text[..text.len() - text.trim_start().len()]
}

fn line_len(source: &str, line: u32) -> u32 {
    line_at(source, line).trim_end_matches('\r').len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_source(source: &str) -> (SuppressionInfo, Vec<Diagnostic>) {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_yaml::LANGUAGE.into())
            .expect("grammar loads");
        let tree = parser.parse(source, None).expect("tree expected");
        let mut diagnostics = DiagnosticCollector::new();
        let info = scan(tree.root_node(), source, &mut diagnostics);
        (info, diagnostics.into_diagnostics())
    }

    fn diagnostic_on(line: u32) -> Diagnostic {
        Diagnostic::error("finding").with_range(Range::from_coords(line, 2, line, 8))
    }

    #[test]
    fn test_file_wide() {
        let (info, found) = scan_source("# cci-ignore-file\nversion: 2.1\n");

        assert!(info.file_wide);
        assert!(found.is_empty());
        assert!(info.is_suppressed(&diagnostic_on(1)));
    }

    #[test]
    fn test_inline() {
        let source = "version: 2.1\njobs:\n  test: # cci-ignore\n    docker:\n      - image: foo\n";
        let (info, _) = scan_source(source);

        assert_eq!(info.suppressed_lines, BTreeSet::from([2]));
        assert!(info.is_suppressed(&diagnostic_on(2)));
        assert!(!info.is_suppressed(&diagnostic_on(3)));
    }

    #[test]
    fn test_next_line() {
        let (info, _) = scan_source("jobs:\n  # cci-ignore-next-line\n  test: {}\n");

        assert_eq!(info.suppressed_lines, BTreeSet::from([2]));
    }

    #[test]
    fn test_range_is_inclusive() {
        let source = "a: 1\n# cci-ignore-start\nb: 2\nc: 3\n# cci-ignore-end\nd: 4\n";
        let (info, found) = scan_source(source);

        assert!(found.is_empty());
        assert_eq!(
            info.ranges,
            vec![SuppressionRange {
                start_line: 1,
                end_line: 4
            }]
        );
        assert!(!info.is_suppressed(&diagnostic_on(0)));
        assert!(info.is_suppressed(&diagnostic_on(1)));
        assert!(info.is_suppressed(&diagnostic_on(3)));
        assert!(info.is_suppressed(&diagnostic_on(4)));
        assert!(!info.is_suppressed(&diagnostic_on(5)));
    }

    #[test]
    fn test_unclosed_start() {
        let (info, found) = scan_source("a: 1\n# cci-ignore-start\nb: 2\n");

        assert!(info.ranges.is_empty());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code(), Some(ErrorCode::E400));
        assert_eq!(found[0].range(), Range::from_coords(1, 0, 1, 100));
    }

    #[test]
    fn test_orphan_end() {
        let (_, found) = scan_source("a: 1\n# cci-ignore-end\n");

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code(), Some(ErrorCode::E401));
    }

    #[test]
    fn test_nested_start() {
        let source = "# cci-ignore-start\na: 1\n# cci-ignore-start\n# cci-ignore-end\n";
        let (info, found) = scan_source(source);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code(), Some(ErrorCode::E402));
        assert_eq!(info.ranges.len(), 1);
        assert_eq!(info.ranges[0].start_line, 0);
    }

    #[test]
    fn test_filter() {
        let (info, _) = scan_source("a: 1 # cci-ignore\nb: 2\n");
        let kept = info.filter(vec![diagnostic_on(0), diagnostic_on(1)]);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].range().start.line, 1);
    }

    #[test]
    fn test_ignore_actions_single_line() {
        let source = "jobs:\n  build:\n    docker: []\n";
        let diagnostic = Diagnostic::warning("x").with_range(Range::from_coords(2, 4, 2, 10));
        let actions = ignore_actions(&diagnostic, source);

        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].edits[0].new_text, "    # cci-ignore-next-line\n");
        assert_eq!(actions[1].edits[0].range.start, Position::new(2, 14));
    }

    #[test]
    fn test_ignore_actions_multi_line() {
        let source = "jobs:\n  build:\n    docker: []\n";
        let diagnostic = Diagnostic::warning("x").with_range(Range::from_coords(1, 2, 2, 14));
        let actions = ignore_actions(&diagnostic, source);

        assert_eq!(actions[1].title, "Ignore this range");
        assert_eq!(actions[1].edits[1].range.start, Position::new(3, 0));
    }
}
