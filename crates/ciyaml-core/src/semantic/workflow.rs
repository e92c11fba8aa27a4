use indexmap::IndexMap;

use crate::{
    range::{Range, TextAndRange},
    semantic::{ParameterValue, Step},
};

/// A workflow: job references and the dependencies between them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workflow {
    pub name: String,
    pub name_range: Range,
    pub range: Range,
    pub job_refs: Vec<JobRef>,
    pub jobs_range: Range,
    pub has_triggers: bool,
    pub triggers_range: Range,
    /// Maps each step name to the step names that require it.
    pub dependencies: IndexMap<String, Vec<String>>,
}

impl Workflow {
    /// Find a job reference by its step name.
    pub fn job_ref(&self, step_name: &str) -> Option<&JobRef> {
        self.job_refs.iter().find(|job_ref| job_ref.step_name == step_name)
    }
}

/// A job invocation inside a workflow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobRef {
    /// The whole list item.
    pub range: Range,
    /// The invoked job.
    pub job_name: String,
    pub job_name_range: Range,
    /// The name of this invocation, the job name unless `name:` is set.
    pub step_name: String,
    pub step_name_range: Range,
    pub requires: Vec<Requirement>,
    pub requires_range: Range,
    pub contexts: Vec<TextAndRange>,
    pub job_type: Option<TextAndRange>,
    pub parameters: IndexMap<String, ParameterValue>,
    pub pre_steps: Vec<Step>,
    pub pre_steps_range: Range,
    pub post_steps: Vec<Step>,
    pub post_steps_range: Range,
    pub has_matrix: bool,
    pub matrix_parameters: IndexMap<String, ParameterValue>,
    pub max_auto_reruns: Option<TextAndRange>,
    pub serial_group: Option<TextAndRange>,
}

/// An entry of a job reference's `requires` list.
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    pub name: TextAndRange,
    /// Statuses to wait for, `["success"]` by default.
    pub statuses: Vec<TextAndRange>,
    pub status_range: Range,
    /// Set when written as `- job: status` rather than `- job`.
    pub explicit_status: bool,
}

impl Requirement {
    /// A requirement on the `success` status of `name`.
    pub fn on_success(name: TextAndRange) -> Self {
        Self {
            statuses: vec![TextAndRange::new("success", Range::default())],
            name,
            status_range: Range::default(),
            explicit_status: false,
        }
    }
}
