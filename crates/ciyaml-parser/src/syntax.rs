//! YAML-level checks that run before the entity parsers.
//!
//! None of these stop parsing: tree-sitter recovers from malformed input and
//! the entity parsers work on whatever structure survived.

use tree_sitter::Node;

use crate::{
    anchors::AnchorTable,
    cst::{Cst, MERGE_KEY, node_range, walk_preorder},
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
};

/// Report syntax errors, missing tokens, unknown aliases and malformed
/// merge keys found in the tree rooted at `root`.
pub(crate) fn check(
    root: Node<'_>,
    cst: &Cst<'_>,
    anchors: &AnchorTable<'_>,
    diagnostics: &mut DiagnosticCollector,
) {
    let mut has_document = false;

    walk_preorder(root, |node| {
        if node.kind() == "document" {
            has_document = true;
        }

        if node.is_error() {
            let nested = node.parent().is_some_and(|parent| parent.is_error());
            if !nested {
                diagnostics.emit(
                    Diagnostic::error("Error! Please fix your yaml file")
                        .with_code(ErrorCode::E001)
                        .with_range(node_range(node)),
                );
            }
        } else if node.is_missing() {
            diagnostics.emit(
                Diagnostic::error(format!("Missing `{}`", node.kind()))
                    .with_code(ErrorCode::E002)
                    .with_range(node_range(node)),
            );
        } else if node.kind() == "block_mapping_pair" || node.kind() == "flow_pair" {
            check_merge_pair(node, cst, diagnostics);
        }
    });

    if !has_document {
        diagnostics.emit(
            Diagnostic::error("Invalid yaml file")
                .with_code(ErrorCode::E003)
                .with_range(node_range(root)),
        );
    }

    for (name, range) in &anchors.unknown_aliases {
        diagnostics.emit(
            Diagnostic::error(format!("unknown anchor '{name}' referenced"))
                .with_code(ErrorCode::E004)
                .with_range(*range),
        );
    }
}

fn check_merge_pair(node: Node<'_>, cst: &Cst<'_>, diagnostics: &mut DiagnosticCollector) {
    let Some(pair) = cst.pair(node) else {
        return;
    };
    if cst.key_text(&pair) != MERGE_KEY {
        return;
    }

    let valid = pair
        .raw_value
        .is_some_and(|value| cst.is_valid_merge_value(value));
    if !valid {
        diagnostics.emit(
            Diagnostic::error("map merge requires map or sequence of maps as the value")
                .with_code(ErrorCode::E005)
                .with_range(pair.value_range().unwrap_or_else(|| pair.range())),
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::{Document, error::ErrorCode};

    fn codes(source: &str) -> Vec<ErrorCode> {
        let document = Document::parse(source).expect("grammar loads");
        document
            .diagnostics()
            .iter()
            .filter_map(|diagnostic| diagnostic.code())
            .collect()
    }

    #[test]
    fn test_valid_yaml_has_no_syntax_findings() {
        let found = codes("version: 2.1\nworkflows:\n  main:\n    jobs: []\n");
        assert!(!found.contains(&ErrorCode::E001));
        assert!(!found.contains(&ErrorCode::E004));
    }

    #[test]
    fn test_unknown_anchor() {
        let found = codes("version: 2.1\njobs:\n  a: *nowhere\n");
        assert!(found.contains(&ErrorCode::E004));
    }

    #[test]
    fn test_invalid_merge_value() {
        let found = codes("version: 2.1\nx:\n  <<: 3\n  a: 1\n");
        assert!(found.contains(&ErrorCode::E005));
    }

    #[test]
    fn test_merge_of_sequence_of_aliases_is_valid() {
        let source = "a: &a\n  x: 1\nb: &b\n  y: 2\nc:\n  <<: [*a, *b]\n";
        assert!(!codes(source).contains(&ErrorCode::E005));
    }

    #[test]
    fn test_broken_yaml_reports_error() {
        let found = codes("version: 2.1\njobs:\n  build:\n    steps: [checkout\n");
        assert!(
            found.contains(&ErrorCode::E001) || found.contains(&ErrorCode::E002),
            "Expected a syntax finding, got {found:?}"
        );
    }

    #[test]
    fn test_empty_source_is_invalid() {
        assert!(codes("").contains(&ErrorCode::E003));
    }
}
