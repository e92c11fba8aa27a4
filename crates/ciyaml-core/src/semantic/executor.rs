use indexmap::IndexMap;

use crate::{
    docker_image::DockerImage,
    range::Range,
    semantic::{Environment, Parameter},
};

/// A runtime environment, either declared under `executors:` or inline in a
/// job.
///
/// The shared fields live on the struct and the family-specific ones in
/// [`ExecutorKind`]. An executor whose family key (`docker`, `machine`,
/// `macos`, `windows`) was never found has kind [`ExecutorKind::Incomplete`].
#[derive(Debug, Clone, PartialEq)]
pub struct Executor {
    pub name: String,
    pub name_range: Range,
    pub range: Range,
    pub description: Option<String>,
    pub resource_class: String,
    pub resource_class_range: Range,
    pub shell: Option<String>,
    pub working_directory: Option<String>,
    pub environment: Environment,
    pub parameters: IndexMap<String, Parameter>,
    pub parameters_range: Range,
    pub kind: ExecutorKind,
}

/// Family-specific data of an [`Executor`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutorKind {
    Docker(Vec<DockerImageSpec>),
    Machine(MachineExecutor),
    MacOs(MacOsExecutor),
    Windows(WindowsExecutor),
    Incomplete,
}

impl Executor {
    /// Create an incomplete executor carrying only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            name_range: Range::default(),
            range: Range::default(),
            description: None,
            resource_class: String::new(),
            resource_class_range: Range::default(),
            shell: None,
            working_directory: None,
            environment: Environment::default(),
            parameters: IndexMap::new(),
            parameters_range: Range::default(),
            kind: ExecutorKind::Incomplete,
        }
    }

    /// Returns `true` if no executor family key was matched.
    pub fn is_incomplete(&self) -> bool {
        matches!(self.kind, ExecutorKind::Incomplete)
    }

    /// The family keyword, empty for incomplete executors.
    pub fn family(&self) -> &'static str {
        match self.kind {
            ExecutorKind::Docker(_) => "docker",
            ExecutorKind::Machine(_) => "machine",
            ExecutorKind::MacOs(_) => "macos",
            ExecutorKind::Windows(_) => "windows",
            ExecutorKind::Incomplete => "",
        }
    }

    /// The Docker images of a Docker executor.
    pub fn docker_images(&self) -> &[DockerImageSpec] {
        match &self.kind {
            ExecutorKind::Docker(images) => images,
            _ => &[],
        }
    }
}

/// One entry of a `docker:` list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DockerImageSpec {
    pub range: Range,
    pub image: DockerImage,
    pub image_range: Range,
    pub name: Option<String>,
    pub entrypoint: Vec<String>,
    pub command: Vec<String>,
    pub user: Option<String>,
    pub environment: Environment,
    pub auth: Option<DockerAuth>,
    pub aws_auth: Option<AwsAuth>,
}

impl DockerImageSpec {
    /// Returns `true` if the image can be looked up on Docker Hub.
    ///
    /// Images behind credentials and references the image pattern could not
    /// decompose are skipped.
    pub fn is_checkable(&self) -> bool {
        !self.image.name.is_empty() && self.auth.is_none() && self.aws_auth.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DockerAuth {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AwsAuth {
    pub access_key_id: String,
    pub secret_access_key: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachineExecutor {
    pub image: String,
    pub image_range: Range,
    pub docker_layer_caching: bool,
    /// Set for the deprecated `machine: true` form.
    pub is_deprecated: bool,
    pub machine_range: Range,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacOsExecutor {
    pub xcode: String,
    pub xcode_range: Range,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowsExecutor {
    pub image: String,
    pub image_range: Range,
}
