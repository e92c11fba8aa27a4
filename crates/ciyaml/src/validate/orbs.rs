use ciyaml_core::{
    params,
    semantic::{OrbReference, Step, VOLATILE_VERSION},
};
use ciyaml_parser::error::{Diagnostic, DiagnosticTag, ErrorCode};

use super::{Validator, any_step, is_step_of_orb, versions::version_diagnostic};
use crate::{registry::RegistryError, version::VersionInfo};

impl Validator<'_> {
    pub(super) fn validate_orbs(&mut self) {
        let document = self.document;
        for orb in document.orbs().values() {
            if self.config.validation().unused() && !self.is_orb_used(&orb.name) {
                self.emit(
                    Diagnostic::warning("Orb is unused")
                        .with_code(ErrorCode::E300)
                        .with_range(orb.name_range)
                        .with_tag(DiagnosticTag::Unnecessary),
                );
            }

            if orb.url.is_local || params::contains_substitution(&orb.url.version) {
                continue;
            }
            if let Some(err) = self.orb_failures.get(&orb.name) {
                self.emit(resolution_failure(orb, err));
                continue;
            }
            if self.config.validation().orb_versions() && orb.url.version != VOLATILE_VERSION {
                self.validate_orb_version(orb);
            }
        }
    }

    /// An orb is used when a step, an executor or a workflow job refers
    /// into it.
    fn is_orb_used(&self, orb: &str) -> bool {
        let document = self.document;
        let in_steps = |steps: &[Step]| any_step(steps, |step| is_step_of_orb(step, orb));

        let in_jobs = document.jobs().values().any(|job| {
            in_steps(&job.steps)
                || job
                    .executor
                    .as_ref()
                    .is_some_and(|executor| document.is_given_orb(&executor.name, orb))
        });
        let in_commands = document
            .commands()
            .values()
            .any(|command| in_steps(&command.steps));
        let in_workflows = document
            .workflows()
            .values()
            .flat_map(|workflow| &workflow.job_refs)
            .any(|job_ref| {
                document.is_given_orb(&job_ref.job_name, orb)
                    || in_steps(&job_ref.pre_steps)
                    || in_steps(&job_ref.post_steps)
            });

        in_jobs || in_commands || in_workflows
    }

    fn validate_orb_version(&mut self, orb: &OrbReference) {
        let Some(info) = self.orb_info(&orb.name) else {
            return;
        };
        let (Some(latest), Some(latest_minor), Some(latest_patch)) = (
            info.latest_version.clone(),
            info.latest_minor_version.clone(),
            info.latest_patch_version.clone(),
        ) else {
            return;
        };

        let versions = VersionInfo {
            latest,
            latest_minor,
            latest_patch,
        };
        if let Some(diagnostic) = version_diagnostic(orb, &info.version, &versions) {
            self.emit(diagnostic);
        }
    }
}

fn resolution_failure(orb: &OrbReference, err: &RegistryError) -> Diagnostic {
    match err {
        RegistryError::NotFound(_) => {
            Diagnostic::error(format!("Cannot find remote orb {}", orb.url.id()))
                .with_code(ErrorCode::E206)
                .with_range(orb.value_range)
        }
        RegistryError::InvalidSource(_) => Diagnostic::error("Orb or version not found")
            .with_code(ErrorCode::E206)
            .with_range(orb.value_range),
        RegistryError::Unavailable(_) | RegistryError::Io { .. } => {
            Diagnostic::warning(format!("Cannot resolve orb {}: {err}", orb.url.id()))
                .with_code(ErrorCode::E312)
                .with_range(orb.value_range)
        }
    }
}

#[cfg(test)]
mod tests {
    use ciyaml_parser::{Document, cache::Caches, error::Diagnostic};

    use crate::{
        config::AppConfig,
        docker_hub::OfflineDockerHub,
        registry::InMemoryRegistry,
        remote_orb::resolve_remote_orbs,
        shell_lint::NoopLinter,
        validate::{
            Validator,
            test_support::{matching, validate},
        },
    };

    const NODE_ORB: &str = "\
version: 2.1
commands:
  install:
    steps:
      - run: echo install
jobs:
  test:
    docker:
      - image: cimg/node:lts
    steps:
      - install
";

    fn validate_with_registry(source: &str, registry: &InMemoryRegistry) -> Vec<Diagnostic> {
        let config = AppConfig::default();
        let document = Document::parse(source).expect("Failed to parse");
        let caches = Caches::new();
        let failures = resolve_remote_orbs(&document, &caches, registry);
        Validator::new(&config, &document, &caches, &OfflineDockerHub, &NoopLinter, &failures).run()
    }

    fn registry() -> InMemoryRegistry {
        InMemoryRegistry::new()
            .with_orb("acme/node", "1.0.0", NODE_ORB)
            .with_orb("acme/node", "1.0.2", NODE_ORB)
            .with_orb("acme/node", "1.1.0", NODE_ORB)
    }

    fn document(orbs: &str, steps: &str) -> String {
        format!(
            "version: 2.1\norbs:\n{orbs}jobs:\n  build:\n    docker:\n      - image: cimg/base:2024.01\n    steps:\n{steps}workflows:\n  main:\n    jobs: [build]\n"
        )
    }

    #[test]
    fn test_unused_orb() {
        let diagnostics = validate(&document(
            "  used:\n    commands:\n      hello:\n        steps: [checkout]\n  idle:\n    commands:\n      hello:\n        steps: [checkout]\n",
            "      - used/hello\n",
        ));
        let unused = matching(&diagnostics, "Orb is unused");

        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].range().start.line, 6);
    }

    #[test]
    fn test_stale_version() {
        let diagnostics = validate_with_registry(
            &document("  node: acme/node@1.0.0\n", "      - node/install\n"),
            &registry(),
        );
        let stale = matching(&diagnostics, "A newer patched version exists.");

        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].actions().len(), 2);
        assert!(matching(&diagnostics, "Orb is unused").is_empty());
    }

    #[test]
    fn test_latest_version_is_quiet() {
        let diagnostics = validate_with_registry(
            &document("  node: acme/node@1.1.0\n", "      - node/install\n"),
            &registry(),
        );

        assert!(matching(&diagnostics, "version exists").is_empty());
    }

    #[test]
    fn test_resolution_failures() {
        let missing = validate_with_registry(
            &document("  node: acme/node@9.9.9\n", "      - node/install\n"),
            &registry(),
        );
        assert_eq!(matching(&missing, "Cannot find remote orb acme/node@9.9.9").len(), 1);
        assert!(matching(&missing, "Cannot find declaration for step").is_empty());

        let offline = validate_with_registry(
            &document("  node: acme/node@1.0.0\n", "      - node/install\n"),
            &registry().unavailable(),
        );
        assert_eq!(matching(&offline, "Cannot resolve orb acme/node@1.0.0").len(), 1);
    }
}
