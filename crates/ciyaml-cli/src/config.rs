//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use ciyaml::{CiyamlError, config::AppConfig};

/// Path of the project-local configuration, relative to the working directory.
const LOCAL_CONFIG: &str = "ciyaml/config.toml";

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for CiyamlError {
    fn from(err: ConfigError) -> Self {
        CiyamlError::Config(err.to_string())
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (`ciyaml/config.toml`)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed
/// - Config file holds an invalid value
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, CiyamlError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new(LOCAL_CONFIG);
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "ciyaml", "ciyaml") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Load configuration from a TOML file
///
/// # Errors
///
/// Returns error if:
/// - File doesn't exist
/// - File cannot be read
/// - TOML parsing fails
/// - A value is rejected by [`AppConfig::validate`]
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, CiyamlError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate().map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("config.toml");
        fs::write(&path, content).expect("Failed to write config");
        (dir, path)
    }

    #[test]
    fn test_explicit_missing_file() {
        let result = load_config(Some("/nonexistent/ciyaml.toml"));

        match result {
            Err(CiyamlError::Config(message)) => {
                assert!(message.starts_with("Missing configuration file"), "{message}");
            }
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_explicit_file_sections() {
        let (_dir, path) = write_config(
            r#"
[validation]
docker_images = true
unused = false

[registry]
host_url = "https://ci.example.com"

[api]
token = "secret"
contexts = ["deploy"]
"#,
        );

        let config = load_config(Some(&path)).expect("Failed to load config");
        assert!(config.validation().docker_images());
        assert!(!config.validation().unused());
        assert!(config.validation().orb_versions());
        assert_eq!(config.registry().host_url(), "https://ci.example.com");
        assert!(config.api().is_logged_in());
        assert_eq!(config.api().contexts(), ["deploy".to_string()]);
    }

    #[test]
    fn test_invalid_toml() {
        let (_dir, path) = write_config("[validation\nunused = ");

        match load_config(Some(&path)) {
            Err(CiyamlError::Config(message)) => {
                assert!(message.starts_with("Failed to parse TOML"), "{message}");
            }
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_value() {
        let (_dir, path) = write_config("[registry]\nhost_url = \"circleci.com\"\n");

        match load_config(Some(&path)) {
            Err(CiyamlError::Config(message)) => {
                assert!(message.starts_with("Validation error"), "{message}");
            }
            other => panic!("Expected Config error, got {other:?}"),
        }
    }
}
