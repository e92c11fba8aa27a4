//! Remote orb registry clients.
//!
//! The analyzer never talks to a network itself. Orb sources come from an
//! [`OrbRegistry`] implementation:
//!
//! - [`OfflineRegistry`] - Every lookup reports the registry as unavailable.
//! - [`FileRegistry`] - Orb sources stored as `<dir>/<namespace>/<name>@<version>.yml`.
//! - [`InMemoryRegistry`] - Sources registered programmatically.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use log::{debug, trace};
use thiserror::Error;

use crate::version;

/// Errors reported by an [`OrbRegistry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The orb or the requested version does not exist.
    #[error("could not find orb {0}")]
    NotFound(String),

    /// The registry cannot be reached; the orb may exist.
    #[error("orb registry unavailable: {0}")]
    Unavailable(String),

    /// The published source could not be parsed.
    #[error("invalid source for orb {0}")]
    InvalidSource(String),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The source of one published orb version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrbSource {
    /// `name@version` with the resolved version.
    pub id: String,
    /// The resolved version. Differs from the requested one for partial
    /// and `volatile` references.
    pub version: String,
    pub source: String,
    /// Every published version of the orb.
    pub versions: Vec<String>,
}

/// A source of published orbs.
pub trait OrbRegistry: Send + Sync {
    /// Fetch the source of `name` at `version`.
    ///
    /// `version` may be partial (`5`, `5.1`) or `volatile`, in which case
    /// the newest matching published version is returned.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no published version matches
    /// and [`RegistryError::Unavailable`] if the registry cannot answer.
    fn fetch(&self, name: &str, version: &str) -> Result<OrbSource, RegistryError>;

    /// Returns `true` if any version of `name` is published.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Unavailable`] if the registry cannot answer.
    fn exists(&self, name: &str) -> Result<bool, RegistryError> {
        match self.fetch(name, ciyaml_core::semantic::VOLATILE_VERSION) {
            Ok(_) => Ok(true),
            Err(RegistryError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// A registry that is never reachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRegistry;

impl OrbRegistry for OfflineRegistry {
    fn fetch(&self, name: &str, version: &str) -> Result<OrbSource, RegistryError> {
        trace!(name, version; "Offline registry lookup");
        Err(RegistryError::Unavailable(format!(
            "no registry configured to resolve {name}@{version}"
        )))
    }
}

/// Orb sources read from a directory tree.
///
/// `circleci/node@5.1.0` is read from `<dir>/circleci/node@5.1.0.yml`. The
/// published versions of an orb are the versions found next to it.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    dir: PathBuf,
}

impl FileRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn orb_dir(&self, name: &str) -> Option<(PathBuf, String)> {
        let (namespace, orb) = name.split_once('/')?;
        Some((self.dir.join(namespace), orb.to_string()))
    }

    fn published_versions(&self, dir: &Path, orb: &str) -> Result<Vec<String>, RegistryError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(RegistryError::Io {
                    path: dir.to_path_buf(),
                    source,
                });
            }
        };

        let prefix = format!("{orb}@");
        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| RegistryError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let version = file_name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(".yml"));
            if let Some(version) = version {
                versions.push(version.to_string());
            }
        }
        versions.sort();
        Ok(versions)
    }
}

impl OrbRegistry for FileRegistry {
    fn fetch(&self, name: &str, version: &str) -> Result<OrbSource, RegistryError> {
        let Some((dir, orb)) = self.orb_dir(name) else {
            return Err(RegistryError::NotFound(format!("{name}@{version}")));
        };
        let versions = self.published_versions(&dir, &orb)?;

        let resolved = if versions.iter().any(|published| published == version) {
            version.to_string()
        } else {
            version::resolve(version, &versions)
                .ok_or_else(|| RegistryError::NotFound(format!("{name}@{version}")))?
        };

        let path = dir.join(format!("{orb}@{resolved}.yml"));
        debug!(name, version, resolved = resolved.as_str(), path:? = path; "Reading orb source");
        let source = fs::read_to_string(&path).map_err(|source| RegistryError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(OrbSource {
            id: format!("{name}@{resolved}"),
            version: resolved,
            source,
            versions,
        })
    }
}

/// Orb sources registered in memory.
///
/// # Examples
///
/// ```
/// # use ciyaml::registry::{InMemoryRegistry, OrbRegistry};
/// let registry = InMemoryRegistry::new()
///     .with_orb("acme/tools", "1.0.0", "version: 2.1\n")
///     .with_orb("acme/tools", "1.2.0", "version: 2.1\n");
///
/// let source = registry.fetch("acme/tools", "1").expect("orb is registered");
/// assert_eq!(source.version, "1.2.0");
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    orbs: HashMap<String, Vec<(String, String)>>,
    unavailable: bool,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` as `name@version`.
    pub fn with_orb(
        mut self,
        name: impl Into<String>,
        version: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        self.orbs
            .entry(name.into())
            .or_default()
            .push((version.into(), source.into()));
        self
    }

    /// Make every lookup fail as if the registry were unreachable.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }
}

impl OrbRegistry for InMemoryRegistry {
    fn fetch(&self, name: &str, version: &str) -> Result<OrbSource, RegistryError> {
        if self.unavailable {
            return Err(RegistryError::Unavailable(format!("{name}@{version}")));
        }
        let not_found = || RegistryError::NotFound(format!("{name}@{version}"));
        let published = self.orbs.get(name).ok_or_else(not_found)?;
        let versions: Vec<String> = published.iter().map(|(version, _)| version.clone()).collect();

        let resolved = if versions.iter().any(|published| published == version) {
            version.to_string()
        } else {
            version::resolve(version, &versions).ok_or_else(not_found)?
        };
        let source = published
            .iter()
            .find(|(published, _)| *published == resolved)
            .map(|(_, source)| source.clone())
            .ok_or_else(not_found)?;

        Ok(OrbSource {
            id: format!("{name}@{resolved}"),
            version: resolved,
            source,
            versions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_registry_is_unavailable() {
        let result = OfflineRegistry.fetch("circleci/node", "5.1.0");
        assert!(matches!(result, Err(RegistryError::Unavailable(_))));
        assert!(OfflineRegistry.exists("circleci/node").is_err());
    }

    #[test]
    fn test_in_memory_exact_and_volatile() {
        let registry = InMemoryRegistry::new()
            .with_orb("acme/tools", "1.0.0", "a")
            .with_orb("acme/tools", "2.0.0", "b");

        let exact = registry.fetch("acme/tools", "1.0.0").expect("exact version");
        assert_eq!(exact.source, "a");
        assert_eq!(exact.id, "acme/tools@1.0.0");

        let volatile = registry.fetch("acme/tools", "volatile").expect("volatile");
        assert_eq!(volatile.version, "2.0.0");
        assert_eq!(volatile.versions.len(), 2);
    }

    #[test]
    fn test_in_memory_not_found() {
        let registry = InMemoryRegistry::new().with_orb("acme/tools", "1.0.0", "a");

        assert!(matches!(
            registry.fetch("acme/tools", "3.0.0"),
            Err(RegistryError::NotFound(_))
        ));
        assert!(matches!(registry.exists("acme/other"), Ok(false)));
    }

    #[test]
    fn test_file_registry() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let namespace = dir.path().join("acme");
        fs::create_dir_all(&namespace).expect("Failed to create namespace dir");
        fs::write(namespace.join("tools@1.0.0.yml"), "version: 2.1\n").expect("write");
        fs::write(namespace.join("tools@1.1.0.yml"), "version: 2.1\ndescription: newer\n")
            .expect("write");

        let registry = FileRegistry::new(dir.path());
        let source = registry.fetch("acme/tools", "1").expect("partial version resolves");

        assert_eq!(source.version, "1.1.0");
        assert!(source.source.contains("newer"));
        assert_eq!(source.versions, vec!["1.0.0", "1.1.0"]);
        assert!(matches!(
            registry.fetch("acme/missing", "1.0.0"),
            Err(RegistryError::NotFound(_))
        ));
    }
}
