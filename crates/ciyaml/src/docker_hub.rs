//! Docker Hub clients used for advisory image checks.

use std::collections::HashMap;

use log::trace;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DockerHubError {
    #[error("Docker Hub unavailable: {0}")]
    Unavailable(String),
}

/// Read access to Docker Hub repositories.
pub trait DockerHub: Send + Sync {
    /// Returns `true` if `namespace/name` exists.
    ///
    /// # Errors
    ///
    /// Returns [`DockerHubError::Unavailable`] if the hub cannot answer.
    fn image_exists(&self, namespace: &str, name: &str) -> Result<bool, DockerHubError>;

    /// The tags published for `namespace/name`.
    ///
    /// # Errors
    ///
    /// Returns [`DockerHubError::Unavailable`] if the hub cannot answer.
    fn image_tags(&self, namespace: &str, name: &str) -> Result<Vec<String>, DockerHubError>;

    /// Returns `true` if `namespace/name` publishes `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`DockerHubError::Unavailable`] if the hub cannot answer.
    fn image_has_tag(&self, namespace: &str, name: &str, tag: &str) -> Result<bool, DockerHubError> {
        Ok(self
            .image_tags(namespace, name)?
            .iter()
            .any(|published| published == tag))
    }
}

/// A hub that is never reachable; image checks are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineDockerHub;

impl DockerHub for OfflineDockerHub {
    fn image_exists(&self, namespace: &str, name: &str) -> Result<bool, DockerHubError> {
        trace!(namespace, name; "Offline Docker Hub lookup");
        Err(DockerHubError::Unavailable(format!("{namespace}/{name}")))
    }

    fn image_tags(&self, namespace: &str, name: &str) -> Result<Vec<String>, DockerHubError> {
        Err(DockerHubError::Unavailable(format!("{namespace}/{name}")))
    }
}

/// Repositories and tags registered in memory.
///
/// # Examples
///
/// ```
/// # use ciyaml::docker_hub::{DockerHub, InMemoryDockerHub};
/// let hub = InMemoryDockerHub::new().with_image("cimg", "node", ["20.1", "lts"]);
///
/// assert!(hub.image_exists("cimg", "node").expect("hub answers"));
/// assert!(!hub.image_has_tag("cimg", "node", "18.0").expect("hub answers"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryDockerHub {
    repositories: HashMap<String, Vec<String>>,
}

impl InMemoryDockerHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image<I, S>(mut self, namespace: &str, name: &str, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.repositories
            .entry(format!("{namespace}/{name}"))
            .or_default()
            .extend(tags.into_iter().map(Into::into));
        self
    }
}

impl DockerHub for InMemoryDockerHub {
    fn image_exists(&self, namespace: &str, name: &str) -> Result<bool, DockerHubError> {
        Ok(self.repositories.contains_key(&format!("{namespace}/{name}")))
    }

    fn image_tags(&self, namespace: &str, name: &str) -> Result<Vec<String>, DockerHubError> {
        Ok(self
            .repositories
            .get(&format!("{namespace}/{name}"))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_hub() {
        assert!(OfflineDockerHub.image_exists("library", "node").is_err());
        assert!(OfflineDockerHub.image_has_tag("library", "node", "20").is_err());
    }

    #[test]
    fn test_in_memory_hub() {
        let hub = InMemoryDockerHub::new().with_image("library", "node", ["20", "latest"]);

        assert!(hub.image_exists("library", "node").expect("hub answers"));
        assert!(!hub.image_exists("library", "python").expect("hub answers"));
        assert!(hub.image_has_tag("library", "node", "latest").expect("hub answers"));
        assert!(hub.image_tags("library", "python").expect("hub answers").is_empty());
    }
}
