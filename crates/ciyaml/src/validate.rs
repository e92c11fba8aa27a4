//! The validation engine.
//!
//! [`Validator`] runs a fixed sequence of passes over a parsed
//! [`Document`]. Passes only read the model and append diagnostics; each
//! lives in its own submodule as an `impl Validator` block:
//!
//! 1. **Anchors** - Anchors without aliases
//! 2. **Workflows** - Job references, requirements, contexts and cycles
//! 3. **Jobs** - Job types, steps, executors, parallelism, retention
//! 4. **Commands** - Steps, and unused commands of local orbs
//! 5. **Orbs** - Unused orbs, resolution failures, stale versions
//! 6. **Executors** - Resource classes, images and Xcode versions
//! 7. **Names** - Names shared between workflows, jobs and commands
//! 8. **Schema and parameter usage** - JSON schema shape, when a schema is
//!    configured, and undefined `<< parameters.x >>` references
//!
//! Local orbs are then validated as documents of their own, falling back
//! to the enclosing document for orb references and pipeline parameters.

mod anchors;
mod commands;
mod cycles;
mod docker;
mod executors;
mod jobs;
mod names;
mod orbs;
mod param_usage;
mod parameters;
mod schema;
mod shellcheck;
mod steps;
mod versions;
mod workflows;

use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, info};

use ciyaml_core::semantic::{OrbInfo, Parameter, Step};
use ciyaml_parser::{
    Document,
    cache::Caches,
    error::{Diagnostic, DiagnosticCollector},
};

use crate::{
    config::AppConfig, docker_hub::DockerHub, remote_orb::OrbFailures, schema::SchemaValidator,
    shell_lint::ShellLinter,
};

pub use cycles::find_cycle_nodes;

/// Runs the validation passes over one document.
pub(crate) struct Validator<'a> {
    config: &'a AppConfig,
    document: &'a Document,
    /// The enclosing document when validating a local orb.
    parent: Option<&'a Document>,
    /// The local orb name when validating a local orb.
    local_orb: Option<&'a str>,
    caches: &'a Caches,
    docker_hub: &'a dyn DockerHub,
    linter: &'a dyn ShellLinter,
    orb_failures: &'a OrbFailures,
    schema: Option<&'a SchemaValidator>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Validator<'a> {
    pub(crate) fn new(
        config: &'a AppConfig,
        document: &'a Document,
        caches: &'a Caches,
        docker_hub: &'a dyn DockerHub,
        linter: &'a dyn ShellLinter,
        orb_failures: &'a OrbFailures,
    ) -> Self {
        Self {
            config,
            document,
            parent: None,
            local_orb: None,
            caches,
            docker_hub,
            linter,
            orb_failures,
            schema: None,
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Check the document shape against `schema` as well.
    pub(crate) fn with_schema(mut self, schema: Option<&'a SchemaValidator>) -> Self {
        self.schema = schema;
        self
    }

    fn for_local_orb(&self, name: &'a str, document: &'a Document) -> Validator<'a> {
        Validator {
            config: self.config,
            document,
            parent: Some(self.document),
            local_orb: Some(name),
            caches: self.caches,
            docker_hub: self.docker_hub,
            linter: self.linter,
            orb_failures: self.orb_failures,
            schema: None,
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Run every pass and return the diagnostics found, unfiltered.
    pub(crate) fn run(mut self) -> Vec<Diagnostic> {
        let document = self.document;
        match self.local_orb {
            Some(name) => debug!(orb = name; "Validating local orb"),
            None => info!(jobs = document.jobs().len(), workflows = document.workflows().len(); "Validating document"),
        }

        if self.is_local_orb() {
            self.validate_jobs();
            self.validate_commands();
            self.validate_executors();
            return self.diagnostics.into_diagnostics();
        }

        self.validate_anchors();
        self.validate_workflows();
        self.validate_jobs();
        self.validate_commands();
        self.validate_orbs();
        self.validate_executors();
        self.validate_names();
        self.validate_schema();
        self.validate_parameter_usage();

        for orb in document.local_orbs().values() {
            let Some(orb_document) = orb.document.as_deref() else {
                continue;
            };
            let found = self.for_local_orb(&orb.name, orb_document).run();
            self.diagnostics.extend(found);
        }

        self.diagnostics.into_diagnostics()
    }

    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.emit(diagnostic);
    }

    fn is_local_orb(&self) -> bool {
        self.local_orb.is_some()
    }

    /// The document itself, then the enclosing document if any.
    fn scopes(&self) -> impl Iterator<Item = &'a Document> + use<'a> {
        std::iter::once(self.document).chain(self.parent)
    }

    fn pipeline_parameters(&self) -> &'a IndexMap<String, Parameter> {
        self.parent.unwrap_or(self.document).pipeline_parameters()
    }

    fn is_orb_reference(&self, name: &str) -> bool {
        self.scopes().any(|document| document.is_orb_reference(name))
    }

    fn is_orb_command(&self, name: &str) -> bool {
        self.scopes()
            .any(|document| document.is_orb_command(self.caches, name))
    }

    fn is_orb_job(&self, name: &str) -> bool {
        self.scopes().any(|document| document.is_orb_job(self.caches, name))
    }

    fn is_orb_executor(&self, name: &str) -> bool {
        self.scopes()
            .any(|document| document.is_orb_executor(self.caches, name))
    }

    fn is_from_unfetchable_orb(&self, name: &str) -> bool {
        self.scopes()
            .any(|document| document.is_from_unfetchable_orb(self.caches, name))
    }

    fn orb_info(&self, orb: &str) -> Option<Arc<OrbInfo>> {
        self.scopes()
            .find_map(|document| document.orb_info(self.caches, orb))
    }

    fn defined_params(&self, name: &str) -> Option<IndexMap<String, Parameter>> {
        self.scopes()
            .find_map(|document| document.defined_params(self.caches, name))
    }

    fn does_executor_exist(&self, name: &str) -> bool {
        self.document.does_executor_exist(name) || self.is_orb_executor(name)
    }
}

/// Returns `true` if `steps`, or any step nested in their parameter
/// values, satisfies `predicate`.
fn any_step(steps: &[Step], mut predicate: impl FnMut(&Step) -> bool) -> bool {
    let mut found = false;
    for step in steps {
        step.walk(&mut |step| found = found || predicate(step));
        if found {
            return true;
        }
    }
    false
}

/// Returns `true` if the step name is `orb/entity` for the given orb.
fn is_step_of_orb(step: &Step, orb: &str) -> bool {
    step.name()
        .split_once('/')
        .is_some_and(|(prefix, _)| prefix == orb)
}

#[cfg(test)]
pub(crate) mod test_support {
    use ciyaml_parser::{Document, cache::Caches, error::Diagnostic};

    use super::Validator;
    use crate::{
        config::AppConfig,
        docker_hub::{DockerHub, OfflineDockerHub},
        remote_orb::OrbFailures,
        schema::SchemaValidator,
        shell_lint::NoopLinter,
    };

    /// Validation diagnostics of `source` with the default configuration
    /// and offline collaborators.
    pub(crate) fn validate(source: &str) -> Vec<Diagnostic> {
        validate_with(source, &AppConfig::default(), &OfflineDockerHub)
    }

    pub(crate) fn validate_with(
        source: &str,
        config: &AppConfig,
        docker_hub: &dyn DockerHub,
    ) -> Vec<Diagnostic> {
        let document = Document::parse(source).expect("Failed to parse");
        let caches = Caches::new();
        let failures = OrbFailures::new();
        Validator::new(config, &document, &caches, docker_hub, &NoopLinter, &failures).run()
    }

    /// Validation diagnostics of `source`, its shape checked against
    /// `schema`.
    pub(crate) fn validate_with_schema(source: &str, schema: &SchemaValidator) -> Vec<Diagnostic> {
        let config = AppConfig::default();
        let document = Document::parse(source).expect("Failed to parse");
        let caches = Caches::new();
        let failures = OrbFailures::new();
        Validator::new(&config, &document, &caches, &OfflineDockerHub, &NoopLinter, &failures)
            .with_schema(Some(schema))
            .run()
    }

    /// Diagnostics whose message contains `needle`.
    pub(crate) fn matching<'d>(diagnostics: &'d [Diagnostic], needle: &str) -> Vec<&'d Diagnostic> {
        diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.message().contains(needle))
            .collect()
    }
}
