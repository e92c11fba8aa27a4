//! Resource classes, machine images and Xcode versions of executors.

use ciyaml_core::{
    catalog::{
        LINUX_RESOURCE_CLASSES, MACHINE_FAMILIES, MACOS_APPLE_SILICON_RESOURCE_CLASSES,
        MACOS_INTEL_RESOURCE_CLASSES, WINDOWS_GPU_IMAGES, WINDOWS_GPU_RESOURCE_CLASSES,
        WINDOWS_IMAGES, WINDOWS_RESOURCE_CLASSES, XCODE_APPLE_SILICON_VERSIONS,
        XCODE_INTEL_VERSIONS, is_machine_resource_class, is_self_hosted_runner,
        machine_family_for,
    },
    params,
    range::Range,
    semantic::{Executor, ExecutorKind, MacOsExecutor, MachineExecutor, WindowsExecutor},
};
use ciyaml_parser::error::{Diagnostic, DiagnosticTag, ErrorCode};

use super::Validator;

impl Validator<'_> {
    pub(super) fn validate_executors(&mut self) {
        let document = self.document;
        for executor in document.executors().values() {
            self.validate_executor(executor);
        }
    }

    /// Validate a named executor or the inline executor of a job.
    pub(super) fn validate_executor(&mut self, executor: &Executor) {
        match &executor.kind {
            ExecutorKind::Docker(_) => self.validate_docker_executor(executor),
            ExecutorKind::Machine(machine) => self.validate_machine_executor(executor, machine),
            ExecutorKind::MacOs(macos) => self.validate_macos_executor(executor, macos),
            ExecutorKind::Windows(windows) => self.validate_windows_executor(executor, windows),
            ExecutorKind::Incomplete => {}
        }
    }

    fn validate_macos_executor(&mut self, executor: &Executor, macos: &MacOsExecutor) {
        let xcode = macos.xcode.as_str();
        if params::contains_param(xcode) {
            return;
        }

        let context = format!("Xcode version \"{xcode}\"");
        if XCODE_APPLE_SILICON_VERSIONS.contains(&xcode) {
            self.check_resource_class(
                executor,
                &[MACOS_APPLE_SILICON_RESOURCE_CLASSES],
                &context,
            );
        } else if XCODE_INTEL_VERSIONS.contains(&xcode) {
            self.check_resource_class(executor, &[MACOS_INTEL_RESOURCE_CLASSES], &context);
        } else {
            self.emit(
                Diagnostic::error(format!("Invalid Xcode version {xcode}"))
                    .with_code(ErrorCode::E303)
                    .with_range(macos.xcode_range),
            );
        }
    }

    fn validate_machine_executor(&mut self, executor: &Executor, machine: &MachineExecutor) {
        if machine.is_deprecated {
            if self.config.api().is_logged_in() {
                self.emit(
                    Diagnostic::warning(
                        "Using `machine: true` is deprecated, please instead specify an image to use.",
                    )
                    .with_code(ErrorCode::E104)
                    .with_range(machine.machine_range)
                    .with_tag(DiagnosticTag::Deprecated),
                );
            }
            return;
        }

        let resource_class = executor.resource_class.as_str();
        let image = machine.image.as_str();
        let is_class_param = params::contains_param(resource_class);
        let is_image_param = params::contains_param(image);

        if image.is_empty() {
            if !resource_class.is_empty()
                && !is_self_hosted_runner(resource_class)
                && !is_class_param
                && !is_machine_resource_class(resource_class)
            {
                self.emit(unknown_resource_class(resource_class, executor.resource_class_range));
            }
            return;
        }

        if is_self_hosted_runner(resource_class) {
            self.emit(
                Diagnostic::error(format!(
                    "Extraneous image \"{image}\" for self-hosted runner \"{resource_class}\""
                ))
                .with_code(ErrorCode::E302)
                .with_range(executor.range),
            );
            return;
        }

        let mut is_known_class = false;
        let mut is_known_image = false;
        for family in MACHINE_FAMILIES {
            let has_class = is_class_param || family.resource_classes.contains(&resource_class);
            let has_image = is_image_param || family.images.contains(&image);
            if has_class && has_image {
                return;
            }
            is_known_class |= has_class;
            is_known_image |= has_image;
        }

        if !is_known_class {
            self.emit(unknown_resource_class(resource_class, executor.resource_class_range));
        }
        if !is_known_image {
            self.emit(
                Diagnostic::error(format!("Unknown machine image \"{image}\""))
                    .with_code(ErrorCode::E302)
                    .with_range(machine.image_range),
            );
        }
        if is_known_class && is_known_image {
            let family = machine_family_for(resource_class);
            let mut diagnostic = Diagnostic::error(format!(
                "Machine image \"{image}\" is not available for resource class \"{resource_class}\""
            ))
            .with_code(ErrorCode::E302)
            .with_range(executor.range);
            if let Some(suggestion) = family.images.first() {
                diagnostic = diagnostic.with_help(format!(
                    "Resource class \"{resource_class}\" runs {} images such as `{suggestion}`",
                    family.name
                ));
            }
            self.emit(diagnostic);
        }
    }

    fn validate_windows_executor(&mut self, executor: &Executor, windows: &WindowsExecutor) {
        self.check_resource_class(
            executor,
            &[
                WINDOWS_RESOURCE_CLASSES,
                WINDOWS_GPU_RESOURCE_CLASSES,
                LINUX_RESOURCE_CLASSES,
            ],
            "Windows executor",
        );

        let image = windows.image.as_str();
        if image.is_empty() || params::contains_param(image) {
            return;
        }
        if !WINDOWS_IMAGES.contains(&image) && !WINDOWS_GPU_IMAGES.contains(&image) {
            self.emit(
                Diagnostic::error(format!("Unknown Windows image \"{image}\""))
                    .with_code(ErrorCode::E302)
                    .with_range(windows.image_range),
            );
        }
    }

    /// Report the executor's resource class unless one of `valid` lists it.
    ///
    /// Parameterized values and self-hosted runners are accepted as is.
    pub(super) fn check_resource_class(
        &mut self,
        executor: &Executor,
        valid: &[&[&str]],
        context: &str,
    ) {
        let resource_class = executor.resource_class.as_str();
        if params::contains_param(resource_class) || is_self_hosted_runner(resource_class) {
            return;
        }
        if valid.iter().any(|classes| classes.contains(&resource_class)) {
            return;
        }
        self.emit(
            Diagnostic::error(format!(
                "Invalid resource class \"{resource_class}\" for {context}"
            ))
            .with_code(ErrorCode::E301)
            .with_range(executor.resource_class_range),
        );
    }
}

fn unknown_resource_class(resource_class: &str, range: Range) -> Diagnostic {
    Diagnostic::error(format!("Unknown resource class \"{resource_class}\""))
        .with_code(ErrorCode::E301)
        .with_range(range)
}

#[cfg(test)]
mod tests {
    use ciyaml_parser::error::{DiagnosticTag, ErrorCode};

    use crate::{
        config::{ApiConfig, AppConfig},
        docker_hub::OfflineDockerHub,
        validate::test_support::{matching, validate, validate_with},
    };

    fn with_executor(body: &str) -> String {
        format!(
            "version: 2.1\nexecutors:\n  runner:\n{body}jobs:\n  build:\n    executor: runner\n    steps: [checkout]\nworkflows:\n  main:\n    jobs: [build]\n"
        )
    }

    fn executor_errors(source: &str) -> Vec<String> {
        validate(source)
            .iter()
            .filter(|d| {
                matches!(
                    d.code(),
                    Some(ErrorCode::E301 | ErrorCode::E302 | ErrorCode::E303)
                )
            })
            .map(|d| d.message().to_string())
            .collect()
    }

    #[test]
    fn test_macos_xcode_versions() {
        let valid = with_executor("    macos:\n      xcode: 11.3.1\n    resource_class: large\n");
        assert!(executor_errors(&valid).is_empty());

        let invalid = with_executor("    macos:\n      xcode: \"12.5\"\n    resource_class: large\n");
        let diagnostics = validate(&invalid);
        let errors = matching(&diagnostics, "Invalid Xcode version 12.5");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].range().start.line, 4);
    }

    #[test]
    fn test_macos_resource_class_follows_xcode() {
        let source = with_executor(
            "    macos:\n      xcode: 15.4.0\n    resource_class: macos.x86.medium.gen2\n",
        );

        assert_eq!(
            executor_errors(&source),
            vec!["Invalid resource class \"macos.x86.medium.gen2\" for Xcode version \"15.4.0\""]
        );
    }

    #[test]
    fn test_machine_pairs() {
        let valid = with_executor(
            "    machine:\n      image: ubuntu-2204:current\n    resource_class: arm.medium\n",
        );
        assert!(executor_errors(&valid).is_empty());

        let unknown = with_executor(
            "    machine:\n      image: ubuntu-1404:ancient\n    resource_class: huge\n",
        );
        assert_eq!(
            executor_errors(&unknown),
            vec![
                "Unknown resource class \"huge\"",
                "Unknown machine image \"ubuntu-1404:ancient\""
            ]
        );

        let mismatched = with_executor(
            "    machine:\n      image: ubuntu-2204:current\n    resource_class: windows.medium\n",
        );
        assert_eq!(
            executor_errors(&mismatched),
            vec!["Machine image \"ubuntu-2204:current\" is not available for resource class \"windows.medium\""]
        );
    }

    #[test]
    fn test_self_hosted_machine() {
        let with_image = with_executor(
            "    machine:\n      image: ubuntu-2204:current\n    resource_class: acme/runner\n",
        );
        assert_eq!(
            executor_errors(&with_image),
            vec!["Extraneous image \"ubuntu-2204:current\" for self-hosted runner \"acme/runner\""]
        );

        let without_image = with_executor("    machine: {}\n    resource_class: acme/runner\n");
        assert!(executor_errors(&without_image).is_empty());
    }

    #[test]
    fn test_deprecated_machine_when_logged_in() {
        let source = with_executor("    machine: true\n");
        assert!(matching(&validate(&source), "is deprecated").is_empty());

        let config = AppConfig::new(
            Default::default(),
            Default::default(),
            Default::default(),
            ApiConfig::new(Some("token".to_string()), None, Vec::new()),
        );
        let diagnostics = validate_with(&source, &config, &OfflineDockerHub);
        let deprecated = matching(&diagnostics, "Using `machine: true` is deprecated");
        assert_eq!(deprecated.len(), 1);
        assert!(deprecated[0].tags().contains(&DiagnosticTag::Deprecated));
    }

    #[test]
    fn test_windows_executor() {
        let valid = with_executor(
            "    windows:\n      image: windows-server-2022-gui:current\n    resource_class: windows.medium\n",
        );
        assert!(executor_errors(&valid).is_empty());

        let invalid = with_executor(
            "    windows:\n      image: windows-server-2016:current\n    resource_class: windows.tiny\n",
        );
        assert_eq!(
            executor_errors(&invalid),
            vec![
                "Invalid resource class \"windows.tiny\" for Windows executor",
                "Unknown Windows image \"windows-server-2016:current\""
            ]
        );
    }
}
