//! Staleness of a referenced orb version.

use semver::Version;

use ciyaml_core::semantic::OrbReference;
use ciyaml_parser::error::{CodeAction, Diagnostic, ErrorCode};

use crate::version::{VersionInfo, is_newer, parse_lenient};

/// Severity of a staleness finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Staleness {
    Warning,
    Info,
}

/// Describe how far `current` is behind the published versions.
///
/// A pre-release major (`0.x`) behind a released one is reported first,
/// then a missing patch, a missing minor and a missing major, in that
/// order. Returns `None` when `current` is the latest version.
fn describe(current: &str, versions: &VersionInfo) -> Option<(String, Staleness)> {
    let major = |text: &str| parse_lenient(text).map(|version: Version| version.major);
    if major(current) == Some(0) && major(&versions.latest).is_some_and(|latest| latest != 0) {
        return Some((
            format!(
                "A production version has been released. Latest: {}",
                versions.latest
            ),
            Staleness::Warning,
        ));
    }

    if versions.latest_patch != current {
        let mut text = format!("A newer patched version exists.\n\nCurrent: {current}\n");
        if versions.latest != versions.latest_minor {
            if versions.latest_minor != versions.latest_patch {
                text.push_str(&format!("Patch:   {}\n", versions.latest_patch));
            }
            text.push_str(&format!("Minor:   {}\n", versions.latest_minor));
        }
        text.push_str(&format!("Latest:  {}\n", versions.latest));
        return Some((text, Staleness::Warning));
    }

    if versions.latest_minor != current {
        let mut text = format!("A newer minor version exists.\n\nCurrent: {current}\n");
        if versions.latest != versions.latest_minor {
            text.push_str(&format!("Minor:   {}\n", versions.latest_minor));
        }
        text.push_str(&format!("Latest:  {}\n", versions.latest));
        return Some((text, Staleness::Info));
    }

    if versions.latest != current {
        let text = format!(
            "A newer major version exists.\n\nCurrent: {current}\nLatest:  {}\n",
            versions.latest
        );
        return Some((text, Staleness::Info));
    }

    None
}

/// The staleness diagnostic of `orb`, pinned at `current`, with one quick
/// fix per newer target version.
pub(super) fn version_diagnostic(
    orb: &OrbReference,
    current: &str,
    versions: &VersionInfo,
) -> Option<Diagnostic> {
    let (message, staleness) = describe(current, versions)?;
    let diagnostic = match staleness {
        Staleness::Warning => Diagnostic::warning(message),
        Staleness::Info => Diagnostic::info(message),
    };
    let mut diagnostic = diagnostic.with_code(ErrorCode::E307).with_range(orb.range);

    let targets = [
        ("Update to last patch", &versions.latest_patch),
        ("Update to last minor", &versions.latest_minor),
        ("Update to last version", &versions.latest),
    ];
    let mut offered: Vec<&str> = Vec::new();
    for (title, target) in targets {
        if !is_newer(current, target) || offered.contains(&target.as_str()) {
            continue;
        }
        offered.push(target);
        diagnostic = diagnostic.with_action(CodeAction::replace(
            format!("{title} ({target})"),
            orb.version_range,
            target.as_str(),
        ));
    }
    Some(diagnostic)
}

#[cfg(test)]
mod tests {
    use ciyaml_core::range::{Position, Range};
    use ciyaml_parser::error::Severity;

    use super::*;

    fn versions(latest: &str, minor: &str, patch: &str) -> VersionInfo {
        VersionInfo {
            latest: latest.to_string(),
            latest_minor: minor.to_string(),
            latest_patch: patch.to_string(),
        }
    }

    fn orb() -> OrbReference {
        OrbReference {
            name: "node".to_string(),
            version_range: Range::new(Position::new(2, 17), Position::new(2, 22)),
            ..OrbReference::default()
        }
    }

    #[test]
    fn test_prerelease_behind_release() {
        let (message, staleness) = describe("0.4.0", &versions("1.2.0", "0.5.0", "0.4.1"))
            .expect("stale");

        assert_eq!(message, "A production version has been released. Latest: 1.2.0");
        assert_eq!(staleness, Staleness::Warning);
    }

    #[test]
    fn test_missing_patch_lists_every_target() {
        let (message, staleness) = describe("1.0.1", &versions("2.1.1", "1.2.4", "1.0.3"))
            .expect("stale");

        assert_eq!(
            message,
            "A newer patched version exists.\n\nCurrent: 1.0.1\nPatch:   1.0.3\nMinor:   1.2.4\nLatest:  2.1.1\n"
        );
        assert_eq!(staleness, Staleness::Warning);
    }

    #[test]
    fn test_missing_minor_and_major() {
        let (minor, staleness) = describe("1.0.3", &versions("1.2.4", "1.2.4", "1.0.3"))
            .expect("stale");
        assert_eq!(minor, "A newer minor version exists.\n\nCurrent: 1.0.3\nLatest:  1.2.4\n");
        assert_eq!(staleness, Staleness::Info);

        let (major, _) = describe("1.2.4", &versions("2.0.0", "1.2.4", "1.2.4")).expect("stale");
        assert_eq!(major, "A newer major version exists.\n\nCurrent: 1.2.4\nLatest:  2.0.0\n");
    }

    #[test]
    fn test_up_to_date() {
        assert!(describe("2.1.1", &versions("2.1.1", "2.1.1", "2.1.1")).is_none());
    }

    #[test]
    fn test_quick_fixes_are_deduplicated() {
        let diagnostic = version_diagnostic(&orb(), "1.0.1", &versions("1.2.4", "1.2.4", "1.0.3"))
            .expect("stale");

        assert_eq!(diagnostic.severity(), Severity::Warning);
        let titles: Vec<&str> = diagnostic
            .actions()
            .iter()
            .map(|action| action.title.as_str())
            .collect();
        assert_eq!(
            titles,
            vec!["Update to last patch (1.0.3)", "Update to last minor (1.2.4)"]
        );
        assert_eq!(diagnostic.actions()[1].edits[0].range, orb().version_range);
        assert_eq!(diagnostic.actions()[1].edits[0].new_text, "1.2.4");
    }
}
