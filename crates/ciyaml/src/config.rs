//! Configuration types for configuration analysis.
//!
//! This module provides the structures that select which checks run and how
//! the external collaborators are reached. All types implement
//! [`serde::Deserialize`] for loading from external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining every section.
//! - [`ValidationConfig`] - Toggles for optional checks.
//! - [`RegistryConfig`] - Where remote orbs are resolved from.
//! - [`ShellcheckConfig`] - The shell linter executable.
//! - [`ApiConfig`] - Credentials and organization data for API-backed checks.
//! - [`SchemaConfig`] - The JSON schema the document shape is checked against.
//!
//! # Example
//!
//! ```
//! # use ciyaml::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(config.validation().unused());
//! assert!(!config.validation().docker_images());
//! assert!(!config.api().is_logged_in());
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// The default platform host.
pub const DEFAULT_HOST_URL: &str = "https://circleci.com";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Optional checks.
    #[serde(default)]
    validation: ValidationConfig,

    /// Remote orb resolution.
    #[serde(default)]
    registry: RegistryConfig,

    /// Shell linting of `run` steps.
    #[serde(default)]
    shellcheck: ShellcheckConfig,

    /// API-backed checks.
    #[serde(default)]
    api: ApiConfig,

    /// JSON schema check.
    #[serde(default)]
    schema: SchemaConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(
        validation: ValidationConfig,
        registry: RegistryConfig,
        shellcheck: ShellcheckConfig,
        api: ApiConfig,
    ) -> Self {
        Self {
            validation,
            registry,
            shellcheck,
            api,
            schema: SchemaConfig::default(),
        }
    }

    /// Replace the schema section.
    pub fn with_schema(mut self, schema: SchemaConfig) -> Self {
        self.schema = schema;
        self
    }

    pub fn validation(&self) -> &ValidationConfig {
        &self.validation
    }

    pub fn registry(&self) -> &RegistryConfig {
        &self.registry
    }

    pub fn shellcheck(&self) -> &ShellcheckConfig {
        &self.shellcheck
    }

    pub fn api(&self) -> &ApiConfig {
        &self.api
    }

    pub fn schema(&self) -> &SchemaConfig {
        &self.schema
    }

    /// Check the values that cannot be expressed in the types.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        let host_url = self.registry.host_url();
        if !host_url.starts_with("http://") && !host_url.starts_with("https://") {
            return Err(format!("Invalid registry host url: {host_url}"));
        }
        if let Some(orb_dir) = self.registry.orb_dir() {
            if !orb_dir.is_dir() {
                return Err(format!(
                    "Orb directory is not a directory: {}",
                    orb_dir.display()
                ));
            }
        }
        if self.shellcheck.path().as_os_str().is_empty() {
            return Err("Empty shellcheck path".to_string());
        }
        if let Some(path) = self.schema.path() {
            if !path.is_file() {
                return Err(format!("Schema file not found: {}", path.display()));
            }
        }
        Ok(())
    }
}

/// Toggles for checks that are optional or need a collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    /// Look Docker images up on Docker Hub.
    #[serde(default)]
    docker_images: bool,

    /// Lint `run` commands with shellcheck.
    #[serde(default)]
    shell_lint: bool,

    /// Report orbs with newer published versions.
    #[serde(default = "default_true")]
    orb_versions: bool,

    /// Report unused jobs, commands, orbs and anchors.
    #[serde(default = "default_true")]
    unused: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            docker_images: false,
            shell_lint: false,
            orb_versions: true,
            unused: true,
        }
    }
}

impl ValidationConfig {
    /// Creates a new [`ValidationConfig`].
    ///
    /// # Arguments
    ///
    /// * `docker_images` - Look Docker images up on Docker Hub.
    /// * `shell_lint` - Lint `run` commands.
    /// * `orb_versions` - Report stale orb versions.
    /// * `unused` - Report unused definitions.
    pub fn new(docker_images: bool, shell_lint: bool, orb_versions: bool, unused: bool) -> Self {
        Self {
            docker_images,
            shell_lint,
            orb_versions,
            unused,
        }
    }

    pub fn docker_images(&self) -> bool {
        self.docker_images
    }

    pub fn shell_lint(&self) -> bool {
        self.shell_lint
    }

    pub fn orb_versions(&self) -> bool {
        self.orb_versions
    }

    pub fn unused(&self) -> bool {
        self.unused
    }
}

/// Where remote orbs are resolved from.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_host_url")]
    host_url: String,

    #[serde(default)]
    token: Option<String>,

    /// A directory of `<namespace>/<orb>@<version>.yml` orb sources.
    #[serde(default)]
    orb_dir: Option<PathBuf>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            host_url: default_host_url(),
            token: None,
            orb_dir: None,
        }
    }
}

impl RegistryConfig {
    /// Creates a new [`RegistryConfig`].
    pub fn new(host_url: impl Into<String>, token: Option<String>, orb_dir: Option<PathBuf>) -> Self {
        Self {
            host_url: host_url.into(),
            token,
            orb_dir,
        }
    }

    pub fn host_url(&self) -> &str {
        &self.host_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn orb_dir(&self) -> Option<&Path> {
        self.orb_dir.as_deref()
    }

    /// Returns `true` when the default platform host is used.
    pub fn uses_default_host(&self) -> bool {
        self.host_url.trim_end_matches('/') == DEFAULT_HOST_URL
    }
}

/// The shellcheck executable.
#[derive(Debug, Clone, Deserialize)]
pub struct ShellcheckConfig {
    #[serde(default = "default_shellcheck_path")]
    path: PathBuf,
}

impl Default for ShellcheckConfig {
    fn default() -> Self {
        Self {
            path: default_shellcheck_path(),
        }
    }
}

impl ShellcheckConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Credentials and organization data for the API-backed checks.
///
/// Context existence and the `machine: true` deprecation are only reported
/// when a token is configured.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    token: Option<String>,

    #[serde(default)]
    organization: Option<String>,

    /// The contexts known to exist in the organization.
    #[serde(default)]
    contexts: Vec<String>,
}

impl ApiConfig {
    pub fn new(token: Option<String>, organization: Option<String>, contexts: Vec<String>) -> Self {
        Self {
            token,
            organization,
            contexts,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }

    pub fn contexts(&self) -> &[String] {
        &self.contexts
    }

    /// Returns `true` if a non-empty token is configured.
    pub fn is_logged_in(&self) -> bool {
        self.token.as_deref().is_some_and(|token| !token.is_empty())
    }
}

/// The JSON schema the document shape is checked against.
///
/// Without a path the schema check does not run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    path: Option<PathBuf>,
}

impl SchemaConfig {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn default_true() -> bool {
    true
}

fn default_host_url() -> String {
    DEFAULT_HOST_URL.to_string()
}

fn default_shellcheck_path() -> PathBuf {
    PathBuf::from("shellcheck")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert!(config.validation().orb_versions());
        assert!(!config.validation().shell_lint());
        assert_eq!(config.registry().host_url(), DEFAULT_HOST_URL);
        assert!(config.registry().uses_default_host());
        assert_eq!(config.shellcheck().path(), Path::new("shellcheck"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"validation": {"docker_images": true}, "api": {"token": "t", "contexts": ["npm"]}}"#,
        )
        .expect("Failed to deserialize");

        assert!(config.validation().docker_images());
        assert!(config.validation().unused());
        assert!(config.api().is_logged_in());
        assert_eq!(config.api().contexts(), ["npm".to_string()]);
    }

    #[test]
    fn test_invalid_host_url() {
        let config = AppConfig::new(
            ValidationConfig::default(),
            RegistryConfig::new("ftp://example.com", None, None),
            ShellcheckConfig::default(),
            ApiConfig::default(),
        );

        let err = config.validate().expect_err("host url must be rejected");
        assert!(err.contains("ftp://example.com"));
    }

    #[test]
    fn test_schema_section() {
        let config: AppConfig =
            serde_json::from_str(r#"{"schema": {"path": "/nonexistent/schema.json"}}"#)
                .expect("Failed to deserialize");

        assert_eq!(
            config.schema().path(),
            Some(Path::new("/nonexistent/schema.json"))
        );
        let err = config.validate().expect_err("missing schema must be rejected");
        assert!(err.contains("Schema file not found"));

        assert!(AppConfig::default().schema().path().is_none());
    }

    #[test]
    fn test_empty_token_is_not_logged_in() {
        let api = ApiConfig::new(Some(String::new()), None, vec![]);
        assert!(!api.is_logged_in());
    }
}
