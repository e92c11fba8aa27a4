use indexmap::IndexMap;

use crate::{
    range::{Range, TextAndRange},
    semantic::{Environment, ParameterValue},
};

/// One step of a job or command.
///
/// Built-in step keys get a dedicated variant; anything else is a
/// [`NamedStep`], the invocation of a command, an orb command or a job.
/// `when`/`unless` blocks are flattened into their nested steps by the
/// parser and have no variant of their own.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Named(NamedStep),
    Run(Run),
    Checkout(Checkout),
    SetupRemoteDocker(SetupRemoteDocker),
    SaveCache(SaveCache),
    RestoreCache(RestoreCache),
    StoreArtifacts(StoreArtifacts),
    StoreTestResults(StoreTestResults),
    PersistToWorkspace(PersistToWorkspace),
    AttachWorkspace(AttachWorkspace),
    AddSshKeys(AddSshKeys),
    /// `- steps: << parameters.x >>`, splicing a `steps` parameter.
    Steps(StepsPlaceholder),
}

impl Step {
    /// The range of the whole step.
    pub fn range(&self) -> Range {
        match self {
            Step::Named(step) => step.range,
            Step::Run(step) => step.range,
            Step::Checkout(step) => step.range,
            Step::SetupRemoteDocker(step) => step.range,
            Step::SaveCache(step) => step.range,
            Step::RestoreCache(step) => step.range,
            Step::StoreArtifacts(step) => step.range,
            Step::StoreTestResults(step) => step.range,
            Step::PersistToWorkspace(step) => step.range,
            Step::AttachWorkspace(step) => step.range,
            Step::AddSshKeys(step) => step.range,
            Step::Steps(step) => step.range,
        }
    }

    /// The step's name: the invoked entity for named steps, the built-in
    /// key otherwise.
    pub fn name(&self) -> &str {
        match self {
            Step::Named(step) => &step.name,
            Step::Run(step) => step.name.as_deref().unwrap_or("run"),
            Step::Checkout(_) => "checkout",
            Step::SetupRemoteDocker(_) => "setup_remote_docker",
            Step::SaveCache(_) => "save_cache",
            Step::RestoreCache(_) => "restore_cache",
            Step::StoreArtifacts(_) => "store_artifacts",
            Step::StoreTestResults(_) => "store_test_results",
            Step::PersistToWorkspace(_) => "persist_to_workspace",
            Step::AttachWorkspace(_) => "attach_workspace",
            Step::AddSshKeys(_) => "add_ssh_keys",
            Step::Steps(step) => &step.name,
        }
    }

    /// Visit this step and every step nested in its parameter values.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Step)) {
        f(self);
        if let Step::Named(named) = self {
            for value in named.parameters.values() {
                value.for_each_step(f);
            }
        }
    }
}

/// Invocation of a command, orb command or job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedStep {
    pub name: String,
    pub range: Range,
    pub parameters: IndexMap<String, ParameterValue>,
    pub parameters_range: Range,
}

/// A `run` step. `deploy` steps are parsed into this variant as well.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    pub range: Range,
    pub name: Option<String>,
    /// The command with YAML block markers removed.
    pub command: String,
    /// The command exactly as written.
    pub raw_command: String,
    pub command_range: Range,
    pub shell: Option<String>,
    pub background: bool,
    pub working_directory: Option<String>,
    pub no_output_timeout: Option<String>,
    pub when: Option<TextAndRange>,
    pub environment: Environment,
    pub max_auto_reruns: Option<TextAndRange>,
    pub auto_rerun_delay: Option<TextAndRange>,
    /// Set when the step was written with the deprecated `deploy` key.
    pub is_deploy: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Checkout {
    pub range: Range,
    pub path: String,
}

impl Default for Checkout {
    fn default() -> Self {
        Self {
            range: Range::default(),
            path: ".".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetupRemoteDocker {
    pub range: Range,
    pub docker_layer_caching: bool,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveCache {
    pub range: Range,
    pub name: Option<String>,
    pub key: String,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoreCache {
    pub range: Range,
    pub name: Option<String>,
    pub key: Option<String>,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreArtifacts {
    pub range: Range,
    pub path: String,
    pub destination: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreTestResults {
    pub range: Range,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistToWorkspace {
    pub range: Range,
    pub root: String,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachWorkspace {
    pub range: Range,
    pub at: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddSshKeys {
    pub range: Range,
    pub fingerprints: Vec<String>,
}

/// `- steps: << parameters.name >>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepsPlaceholder {
    pub range: Range,
    /// The referenced parameter name.
    pub name: String,
    pub value: String,
    pub value_range: Range,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::Value;

    #[test]
    fn test_step_names() {
        assert_eq!(Step::Checkout(Checkout::default()).name(), "checkout");
        assert_eq!(Step::Run(Run::default()).name(), "run");

        let named = Step::Named(NamedStep {
            name: "greet".to_string(),
            ..NamedStep::default()
        });
        assert_eq!(named.name(), "greet");
    }

    #[test]
    fn test_checkout_default_path() {
        assert_eq!(Checkout::default().path, ".");
    }

    #[test]
    fn test_walk_visits_nested_steps() {
        let inner = Step::Named(NamedStep {
            name: "inner".to_string(),
            ..NamedStep::default()
        });
        let mut parameters = IndexMap::new();
        parameters.insert(
            "steps".to_string(),
            ParameterValue {
                name: "steps".to_string(),
                value: Value::Steps(vec![inner]),
                value_range: Range::default(),
                range: Range::default(),
            },
        );
        let outer = Step::Named(NamedStep {
            name: "outer".to_string(),
            parameters,
            ..NamedStep::default()
        });

        let mut names = Vec::new();
        outer.walk(&mut |step| names.push(step.name().to_string()));

        assert_eq!(names, vec!["outer", "inner"]);
    }
}
