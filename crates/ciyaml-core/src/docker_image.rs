//! Docker image reference decomposition.
//!
//! Image references have the shape `[namespace/]name[:tag]`. The namespace
//! defaults to `library` (the Docker Hub official images) and the tag defaults
//! to the empty string.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::params;

static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9\-_]+/)?([a-z0-9\-_]+)(:(.*))?$").expect("image pattern is valid")
});

static ANCHOR_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^&[a-zA-Z0-9\-_]+\s*").expect("anchor pattern is valid"));

/// The default Docker Hub namespace.
pub const DEFAULT_NAMESPACE: &str = "library";

/// A decomposed Docker image reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DockerImage {
    /// Namespace, `library` when absent.
    pub namespace: String,
    /// Repository name, empty when the reference could not be decomposed.
    pub name: String,
    /// Tag without any `@digest` suffix, empty when absent.
    pub tag: String,
    /// The reference as written, without a leading anchor marker.
    pub full_path: String,
}

impl DockerImage {
    /// Returns `true` if the tag is a parameter substitution.
    pub fn has_parameterized_tag(&self) -> bool {
        params::contains_param(&self.tag)
    }

    /// The tag used for existence lookups.
    ///
    /// An empty tag and a parameterized tag are both looked up as `latest`,
    /// since a substitution can resolve to any published tag.
    pub fn lookup_tag(&self) -> &str {
        if self.tag.is_empty() || self.has_parameterized_tag() {
            "latest"
        } else {
            &self.tag
        }
    }
}

/// Parse a Docker image reference.
///
/// # Examples
///
/// ```
/// # use ciyaml_core::docker_image::parse_docker_image;
/// let image = parse_docker_image("cimg/go:1.22");
/// assert_eq!(image.namespace, "cimg");
/// assert_eq!(image.name, "go");
/// assert_eq!(image.tag, "1.22");
///
/// let image = parse_docker_image("node");
/// assert_eq!(image.namespace, "library");
/// assert_eq!(image.tag, "");
/// ```
pub fn parse_docker_image(value: &str) -> DockerImage {
    let value = ANCHOR_PREFIX_RE.replace(value, "").into_owned();

    let Some(captures) = IMAGE_RE.captures(&value) else {
        return DockerImage {
            namespace: DEFAULT_NAMESPACE.to_string(),
            name: String::new(),
            tag: String::new(),
            full_path: value,
        };
    };

    let namespace = captures
        .get(1)
        .map(|m| m.as_str().trim_end_matches('/'))
        .unwrap_or(DEFAULT_NAMESPACE)
        .to_string();
    let name = captures
        .get(2)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let tag = captures
        .get(4)
        .map(|m| m.as_str().split('@').next().unwrap_or_default().to_string())
        .unwrap_or_default();

    DockerImage {
        namespace,
        name,
        tag,
        full_path: value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_only() {
        let image = parse_docker_image("node");

        assert_eq!(image.namespace, "library");
        assert_eq!(image.name, "node");
        assert_eq!(image.tag, "");
        assert_eq!(image.full_path, "node");
    }

    #[test]
    fn test_parse_trailing_colon() {
        let image = parse_docker_image("node:");

        assert_eq!(image.namespace, "library");
        assert_eq!(image.name, "node");
        assert_eq!(image.tag, "");
        assert_eq!(image.full_path, "node:");
    }

    #[test]
    fn test_parse_name_and_tag() {
        let image = parse_docker_image("node:12");

        assert_eq!(image.namespace, "library");
        assert_eq!(image.name, "node");
        assert_eq!(image.tag, "12");
        assert_eq!(image.full_path, "node:12");
    }

    #[test]
    fn test_parse_namespace_and_tag() {
        let image = parse_docker_image("cimg/go:latest");

        assert_eq!(image.namespace, "cimg");
        assert_eq!(image.name, "go");
        assert_eq!(image.tag, "latest");
        assert_eq!(image.full_path, "cimg/go:latest");
    }

    #[test]
    fn test_parse_namespace_without_tag() {
        let image = parse_docker_image("cimg/go");

        assert_eq!(image.namespace, "cimg");
        assert_eq!(image.name, "go");
        assert_eq!(image.tag, "");
        assert_eq!(image.full_path, "cimg/go");
    }

    #[test]
    fn test_parse_strips_digest() {
        let image = parse_docker_image("cimg/node:20.1@sha256:abcdef");

        assert_eq!(image.tag, "20.1");
        assert_eq!(image.full_path, "cimg/node:20.1@sha256:abcdef");
    }

    #[test]
    fn test_parse_strips_anchor() {
        let image = parse_docker_image("&base cimg/base:stable");

        assert_eq!(image.namespace, "cimg");
        assert_eq!(image.name, "base");
        assert_eq!(image.full_path, "cimg/base:stable");
    }

    #[test]
    fn test_parse_unsupported_reference() {
        let image = parse_docker_image("183081753049.dkr.ecr.us-east-1.amazonaws.com/circleci/ecs:0.1");

        assert_eq!(image.namespace, "library");
        assert_eq!(image.name, "");
        assert_eq!(image.tag, "");
    }

    #[test]
    fn test_parameterized_tag_is_looked_up_as_latest() {
        let image = parse_docker_image("cimg/node:<< parameters.version >>");

        assert!(image.has_parameterized_tag());
        assert_eq!(image.lookup_tag(), "latest");
        assert_eq!(parse_docker_image("cimg/node").lookup_tag(), "latest");
        assert_eq!(parse_docker_image("cimg/node:20.1").lookup_tag(), "20.1");
    }
}
