//! ciyaml - Static analysis for CI pipeline YAML configurations.
//!
//! Parses a configuration into a typed document, resolves the registry orbs
//! it declares, runs the validation passes and applies the suppression
//! directives, producing the diagnostics an editor or a CI check reports.

pub mod config;
pub mod docker_hub;
pub mod registry;
pub mod remote_orb;
pub mod schema;
pub mod shell_lint;
pub mod version;

mod error;
mod validate;

pub use ciyaml_core::{catalog, params, range, semantic};
pub use ciyaml_parser::{Document, cache::Caches, error::Diagnostic};

pub use error::CiyamlError;
pub use validate::find_cycle_nodes;

use std::{fs, path::Path, sync::Arc};

use log::{debug, info, trace};

use ciyaml_core::semantic::{OrbInfo, OrbUrl};

use config::AppConfig;
use docker_hub::{DockerHub, OfflineDockerHub};
use registry::{FileRegistry, OfflineRegistry, OrbRegistry};
use schema::SchemaValidator;
use shell_lint::{NoopLinter, ShellLinter, ShellcheckLinter};
use validate::Validator;

/// The outcome of analyzing one configuration.
#[derive(Debug)]
pub struct Analysis {
    document: Document,
    diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    /// The parsed document, with every diagnostic appended.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The diagnostics left after suppression.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns `true` if an error-level diagnostic survived suppression.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity().is_error())
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Builder for analyzing configurations.
///
/// The analyzer owns the collaborators used to reach external services and
/// the caches shared between analyses, so a long-lived analyzer fetches
/// each orb and Docker repository only once.
///
/// # Examples
///
/// ```
/// use ciyaml::{Analyzer, config::AppConfig};
///
/// let source = "\
/// version: 2.1
/// jobs:
///   build:
///     docker:
///       - image: cimg/base:2024.01
///     steps: [checkout]
/// workflows:
///   main:
///     jobs: [build]
/// ";
///
/// let analyzer = Analyzer::new(AppConfig::default()).expect("valid configuration");
/// let analysis = analyzer.analyze(source).expect("Failed to analyze");
/// assert!(!analysis.has_errors());
/// ```
pub struct Analyzer {
    config: AppConfig,
    caches: Arc<Caches>,
    registry: Box<dyn OrbRegistry>,
    docker_hub: Box<dyn DockerHub>,
    linter: Box<dyn ShellLinter>,
    schema: Option<SchemaValidator>,
}

impl Default for Analyzer {
    /// An analyzer with the default configuration and offline collaborators.
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            caches: Arc::new(Caches::new()),
            registry: Box::new(OfflineRegistry),
            docker_hub: Box::new(OfflineDockerHub),
            linter: Box::new(NoopLinter),
            schema: None,
        }
    }
}

impl Analyzer {
    /// Create an analyzer whose collaborators follow `config`.
    ///
    /// Orbs are read from the configured orb directory when one is set.
    /// `run` steps are linted with shellcheck when shell linting is enabled.
    /// The document shape is checked when a schema path is configured.
    ///
    /// # Errors
    ///
    /// Returns [`CiyamlError::Config`] if `config` holds an invalid value or
    /// the configured schema cannot be loaded.
    pub fn new(config: AppConfig) -> Result<Self, CiyamlError> {
        config.validate().map_err(CiyamlError::Config)?;

        let registry: Box<dyn OrbRegistry> = match config.registry().orb_dir() {
            Some(dir) => Box::new(FileRegistry::new(dir)),
            None => Box::new(OfflineRegistry),
        };
        let linter: Box<dyn ShellLinter> = if config.validation().shell_lint() {
            Box::new(ShellcheckLinter::new(config.shellcheck().path()))
        } else {
            Box::new(NoopLinter)
        };
        let schema = config
            .schema()
            .path()
            .map(SchemaValidator::from_path)
            .transpose()
            .map_err(|err| CiyamlError::Config(err.to_string()))?;

        Ok(Self {
            config,
            registry,
            linter,
            schema,
            ..Self::default()
        })
    }

    pub fn with_registry(mut self, registry: impl OrbRegistry + 'static) -> Self {
        self.registry = Box::new(registry);
        self
    }

    pub fn with_docker_hub(mut self, docker_hub: impl DockerHub + 'static) -> Self {
        self.docker_hub = Box::new(docker_hub);
        self
    }

    pub fn with_shell_linter(mut self, linter: impl ShellLinter + 'static) -> Self {
        self.linter = Box::new(linter);
        self
    }

    /// Check the document shape against `schema`.
    pub fn with_schema(mut self, schema: SchemaValidator) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Share caches with other analyzers.
    pub fn with_caches(mut self, caches: Arc<Caches>) -> Self {
        self.caches = caches;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn caches(&self) -> &Arc<Caches> {
        &self.caches
    }

    /// Analyze a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CiyamlError::Parse`] if no document can be built from
    /// `source`. Problems in the configuration itself are reported as
    /// diagnostics of the returned [`Analysis`].
    pub fn analyze(&self, source: &str) -> Result<Analysis, CiyamlError> {
        info!(bytes = source.len(); "Parsing configuration");
        let mut document =
            Document::parse(source).map_err(|err| CiyamlError::new_parse_error(err, source))?;
        debug!(diagnostics = document.diagnostics().len(); "Configuration parsed");

        let failures =
            remote_orb::resolve_remote_orbs(&document, &self.caches, self.registry.as_ref());

        info!("Validating configuration");
        let found = Validator::new(
            &self.config,
            &document,
            &self.caches,
            self.docker_hub.as_ref(),
            self.linter.as_ref(),
            &failures,
        )
        .with_schema(self.schema.as_ref())
        .run();
        debug!(diagnostics = found.len(); "Validation finished");
        document.extend_diagnostics(found);

        let diagnostics = document.visible_diagnostics();
        info!(
            total = document.diagnostics().len(),
            visible = diagnostics.len();
            "Analysis complete"
        );
        trace!(diagnostics:?; "Visible diagnostics");

        Ok(Analysis {
            document,
            diagnostics,
        })
    }

    /// Read and analyze a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`CiyamlError::Io`] if the file cannot be read, and the
    /// errors of [`Analyzer::analyze`].
    pub fn analyze_file(&self, path: impl AsRef<Path>) -> Result<Analysis, CiyamlError> {
        let path = path.as_ref();
        let source = match self.caches.file(path) {
            Some(cached) => cached,
            None => {
                let content = fs::read_to_string(path)?;
                self.caches.insert_file(path, content)
            }
        };
        self.analyze(&source)
    }

    /// Resolve one orb reference such as `circleci/node@5.1.0` through the
    /// registry, using the shared caches.
    ///
    /// # Errors
    ///
    /// Returns [`CiyamlError::Registry`] if the orb cannot be resolved.
    pub fn resolve_orb(&self, reference: &str) -> Result<Arc<OrbInfo>, CiyamlError> {
        let url = OrbUrl::parse(reference);
        Ok(remote_orb::get_or_fetch_orb(
            &url,
            &self.caches,
            self.registry.as_ref(),
        )?)
    }
}
