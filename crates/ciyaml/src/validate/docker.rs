//! Docker executors: resource class, deprecated namespaces and advisory
//! Docker Hub lookups.

use std::sync::Arc;

use log::warn;

use ciyaml_core::{
    catalog::LINUX_RESOURCE_CLASSES,
    docker_image::DEFAULT_NAMESPACE,
    semantic::{DockerImageSpec, Executor},
};
use ciyaml_parser::error::{CodeAction, Diagnostic, DiagnosticTag, ErrorCode};

use super::Validator;

const DEPRECATED_NAMESPACE: &str = "circleci";

/// Suggested tags offered as quick fixes.
const MAX_TAG_SUGGESTIONS: usize = 3;

impl Validator<'_> {
    pub(super) fn validate_docker_executor(&mut self, executor: &Executor) {
        self.check_resource_class(executor, &[LINUX_RESOURCE_CLASSES], "Docker executor");

        for spec in executor.docker_images() {
            if spec.image.namespace == DEPRECATED_NAMESPACE {
                self.emit(deprecated_namespace(spec));
            }
            if !spec.is_checkable() || spec.image.has_parameterized_tag() {
                continue;
            }

            if self.config.validation().docker_images() {
                self.check_image_on_hub(spec);
            } else if spec.image.tag.is_empty() {
                self.emit(
                    Diagnostic::hint("Missing image tag")
                        .with_code(ErrorCode::E302)
                        .with_range(spec.image_range),
                );
            }
        }
    }

    fn check_image_on_hub(&mut self, spec: &DockerImageSpec) {
        let image = &spec.image;
        let Some(exists) = self.image_exists(&image.namespace, &image.name) else {
            return;
        };
        if !exists {
            self.emit(
                Diagnostic::error(format!("Docker image not found \"{}\"", image.full_path))
                    .with_code(ErrorCode::E304)
                    .with_range(spec.image_range),
            );
            return;
        }

        let Some(tags) = self.image_tags(&image.namespace, &image.name) else {
            return;
        };
        let tag = image.lookup_tag();
        if !tags.iter().any(|published| published == tag) {
            let diagnostic = Diagnostic::error(format!(
                "Docker image \"{}\" has no tag \"{tag}\"",
                image.full_path
            ))
            .with_code(ErrorCode::E304)
            .with_range(spec.image_range);
            self.emit(with_tag_actions(diagnostic, spec, &tags));
        } else if image.tag.is_empty() {
            let diagnostic = Diagnostic::hint("It is recommended to set explicit tags")
                .with_code(ErrorCode::E302)
                .with_range(spec.image_range);
            self.emit(with_tag_actions(diagnostic, spec, &tags));
        }
    }

    /// Cached repository existence; `None` when the hub cannot answer.
    fn image_exists(&self, namespace: &str, name: &str) -> Option<bool> {
        let repository = format!("{namespace}/{name}");
        if let Some(exists) = self.caches.docker_image_exists(&repository) {
            return Some(exists);
        }
        match self.docker_hub.image_exists(namespace, name) {
            Ok(exists) => {
                self.caches.set_docker_image_exists(repository, exists);
                Some(exists)
            }
            Err(err) => {
                warn!(repository = repository.as_str(), err:% = err; "Docker image check skipped");
                None
            }
        }
    }

    /// Cached repository tags; `None` when the hub cannot answer.
    fn image_tags(&self, namespace: &str, name: &str) -> Option<Arc<[String]>> {
        let repository = format!("{namespace}/{name}");
        if let Some(tags) = self.caches.docker_tags(&repository) {
            return Some(tags);
        }
        match self.docker_hub.image_tags(namespace, name) {
            Ok(tags) => {
                self.caches.set_docker_tags(repository.as_str(), tags);
                self.caches.docker_tags(&repository)
            }
            Err(err) => {
                warn!(repository = repository.as_str(), err:% = err; "Docker tag check skipped");
                None
            }
        }
    }
}

fn deprecated_namespace(spec: &DockerImageSpec) -> Diagnostic {
    let replacement = spec
        .image
        .full_path
        .replacen(DEPRECATED_NAMESPACE, "cimg", 1);
    Diagnostic::warning(
        "Docker images from `circleci` namespace are deprecated. Please use its `cimg` namespace's alternative.",
    )
    .with_code(ErrorCode::E313)
    .with_range(spec.image_range)
    .with_tag(DiagnosticTag::Deprecated)
    .with_action(
        CodeAction::replace(
            "Use `cimg` namespace's alternative",
            spec.image_range,
            format!("image: {replacement}"),
        )
        .preferred(),
    )
}

/// Offer the first published tags as replacements.
fn with_tag_actions(mut diagnostic: Diagnostic, spec: &DockerImageSpec, tags: &[String]) -> Diagnostic {
    let image = &spec.image;
    let prefix = if image.namespace == DEFAULT_NAMESPACE
        && !image.full_path.starts_with("library/")
    {
        image.name.clone()
    } else {
        format!("{}/{}", image.namespace, image.name)
    };

    for tag in tags.iter().filter(|tag| !tag.is_empty()).take(MAX_TAG_SUGGESTIONS) {
        diagnostic = diagnostic.with_action(CodeAction::replace(
            format!("Use tag `{tag}`"),
            spec.image_range,
            format!("image: {prefix}:{tag}"),
        ));
    }
    diagnostic
}
