//! Semantic-version bookkeeping for published orb versions.
//!
//! Orb versions may be written partially (`5`, `5.1`), which the
//! [`semver`] crate rejects; [`parse_lenient`] pads the missing components
//! with zeros so they can be compared.

use semver::Version;

/// Parse `major[.minor[.patch]]`, padding missing components with zeros.
///
/// A leading `v` is accepted. Pre-release and build suffixes are kept when
/// the version is complete.
///
/// # Examples
///
/// ```
/// # use ciyaml::version::parse_lenient;
/// assert_eq!(parse_lenient("5").map(|v| v.to_string()).as_deref(), Some("5.0.0"));
/// assert_eq!(parse_lenient("v1.2.3").map(|v| v.to_string()).as_deref(), Some("1.2.3"));
/// assert!(parse_lenient("latest").is_none());
/// ```
pub fn parse_lenient(text: &str) -> Option<Version> {
    let text = text.trim().trim_start_matches('v');
    if let Ok(version) = Version::parse(text) {
        return Some(version);
    }

    let mut parts = text.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |part| part.parse().ok())?;
    let patch = parts.next().map_or(Some(0), |part| part.parse().ok())?;
    if parts.next().is_some() {
        return None;
    }
    Some(Version::new(major, minor, patch))
}

/// Returns `true` if `version` is selected by the possibly partial
/// `requested` version: `5` selects every `5.x.y`, `5.1` every `5.1.y`.
pub fn matches_partial(requested: &str, version: &Version) -> bool {
    let requested = requested.trim().trim_start_matches('v');
    let components: Vec<&str> = requested.split('.').collect();
    let actual = [version.major, version.minor, version.patch];

    if components.len() > 3 {
        return false;
    }
    components
        .iter()
        .zip(actual)
        .all(|(component, value)| component.parse::<u64>().is_ok_and(|parsed| parsed == value))
        && (components.len() < 3 || version.pre.is_empty())
}

/// The newest published versions relative to `current`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    /// Newest version overall.
    pub latest: String,
    /// Newest version sharing the major component of `current`.
    pub latest_minor: String,
    /// Newest version sharing the major and minor components of `current`.
    pub latest_patch: String,
}

impl VersionInfo {
    /// Compute the newest versions among `published`, starting from
    /// `current`. Unparsable entries are ignored.
    ///
    /// Returns `None` if `current` is not a version.
    pub fn compute<S: AsRef<str>>(current: &str, published: &[S]) -> Option<Self> {
        let initial = parse_lenient(current)?;
        let mut latest = initial.clone();
        let mut latest_minor = initial.clone();
        let mut latest_patch = initial.clone();

        for version in published.iter().filter_map(|text| parse_lenient(text.as_ref())) {
            if version > latest {
                latest = version.clone();
            }
            if version.major != initial.major {
                continue;
            }
            if version > latest_minor {
                latest_minor = version.clone();
            }
            if version.minor != initial.minor {
                continue;
            }
            if version > latest_patch {
                latest_patch = version;
            }
        }

        Some(Self {
            latest: latest.to_string(),
            latest_minor: latest_minor.to_string(),
            latest_patch: latest_patch.to_string(),
        })
    }
}

/// The newest entry of `published` selected by `requested`.
///
/// `volatile` and the empty string select the newest version overall.
pub fn resolve<S: AsRef<str>>(requested: &str, published: &[S]) -> Option<String> {
    let select_all = requested.is_empty() || requested == ciyaml_core::semantic::VOLATILE_VERSION;
    published
        .iter()
        .filter_map(|text| parse_lenient(text.as_ref()).map(|version| (text.as_ref(), version)))
        .filter(|(_, version)| select_all || matches_partial(requested, version))
        .max_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(text, _)| text.to_string())
}

/// Returns `true` if `candidate` is strictly newer than `current`.
pub fn is_newer(current: &str, candidate: &str) -> bool {
    match (parse_lenient(current), parse_lenient(candidate)) {
        (Some(current), Some(candidate)) => candidate > current,
        _ => false,
    }
}
