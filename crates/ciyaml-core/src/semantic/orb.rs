use indexmap::IndexMap;

use crate::{
    range::Range,
    semantic::{Command, Executor, Job, Parameter},
};

/// Version used for orbs referenced without `@version`.
pub const VOLATILE_VERSION: &str = "volatile";

/// An entry of the `orbs:` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrbReference {
    /// The local alias the orb is referenced by (`node` in `node/install`).
    pub name: String,
    pub name_range: Range,
    pub range: Range,
    pub url: OrbUrl,
    /// The part after `@`, empty for local orbs and unversioned references.
    pub version_range: Range,
    pub value_range: Range,
}

/// The registry coordinates of an orb.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OrbUrl {
    pub name: String,
    pub version: String,
    pub is_local: bool,
}

impl OrbUrl {
    /// Parse `namespace/name@version`; the version defaults to `volatile`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ciyaml_core::semantic::OrbUrl;
    /// let url = OrbUrl::parse("circleci/node@5.1.0");
    /// assert_eq!(url.name, "circleci/node");
    /// assert_eq!(url.version, "5.1.0");
    /// assert_eq!(OrbUrl::parse("circleci/node").version, "volatile");
    /// ```
    pub fn parse(text: &str) -> Self {
        match text.split_once('@') {
            Some((name, version)) => Self {
                name: name.to_string(),
                version: version.to_string(),
                is_local: false,
            },
            None => Self {
                name: text.to_string(),
                version: VOLATILE_VERSION.to_string(),
                is_local: false,
            },
        }
    }

    /// The cache key, `name@version`.
    pub fn id(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// The resolved contents of an orb.
///
/// Local orbs carry only their entity maps. Remote orbs additionally carry
/// registry metadata and the newest published versions relative to the
/// referenced one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrbInfo {
    pub id: String,
    pub version: String,
    pub source: String,
    pub description: Option<String>,
    pub commands: IndexMap<String, Command>,
    pub jobs: IndexMap<String, Job>,
    pub executors: IndexMap<String, Executor>,
    pub pipeline_parameters: IndexMap<String, Parameter>,
    pub is_local: bool,
    pub latest_version: Option<String>,
    pub latest_minor_version: Option<String>,
    pub latest_patch_version: Option<String>,
}

impl OrbInfo {
    /// Parameters declared by the named orb command or job.
    pub fn entity_parameters(&self, name: &str) -> Option<&IndexMap<String, Parameter>> {
        self.commands
            .get(name)
            .map(|command| &command.parameters)
            .or_else(|| self.jobs.get(name).map(|job| &job.parameters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orb_url_id() {
        let url = OrbUrl::parse("circleci/node@5.1.0");
        assert_eq!(url.id(), "circleci/node@5.1.0");

        let url = OrbUrl::parse("circleci/node");
        assert_eq!(url.id(), "circleci/node@volatile");
    }

    #[test]
    fn test_orb_url_parameterized_version() {
        let url = OrbUrl::parse("circleci/node@<< pipeline.parameters.v >>");
        assert_eq!(url.version, "<< pipeline.parameters.v >>");
    }
}
