use indexmap::IndexMap;

use crate::{
    range::{Range, TextAndRange},
    semantic::{Environment, Executor, Parameter, ParameterValue, Retention, Step},
};

/// Parallelism value of a job that does not set `parallelism`.
pub const PARALLELISM_UNSET: i64 = -1;

/// A job definition.
///
/// A job selects its runtime either by referencing a named executor
/// ([`Job::executor`]) or by declaring one inline ([`Job::inline_executor`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub name: String,
    pub name_range: Range,
    pub range: Range,
    pub job_type: Option<TextAndRange>,
    pub description: Option<String>,
    pub shell: Option<String>,
    pub working_directory: Option<String>,
    /// [`PARALLELISM_UNSET`] when absent.
    pub parallelism: i64,
    pub parallelism_range: Range,
    pub resource_class: Option<String>,
    pub resource_class_range: Range,
    pub steps: Vec<Step>,
    pub steps_range: Range,
    pub executor: Option<JobExecutorRef>,
    pub inline_executor: Option<Executor>,
    pub parameters: IndexMap<String, Parameter>,
    pub parameters_range: Range,
    pub environment: Environment,
    pub retention: Option<Retention>,
    pub circleci_ip_ranges: bool,
    /// Contexts of the workflow jobs referencing this job.
    pub contexts: Vec<String>,
}

impl Default for Job {
    fn default() -> Self {
        Self {
            name: String::new(),
            name_range: Range::default(),
            range: Range::default(),
            job_type: None,
            description: None,
            shell: None,
            working_directory: None,
            parallelism: PARALLELISM_UNSET,
            parallelism_range: Range::default(),
            resource_class: None,
            resource_class_range: Range::default(),
            steps: Vec::new(),
            steps_range: Range::default(),
            executor: None,
            inline_executor: None,
            parameters: IndexMap::new(),
            parameters_range: Range::default(),
            environment: Environment::default(),
            retention: None,
            circleci_ip_ranges: false,
            contexts: Vec::new(),
        }
    }
}

impl Job {
    /// Returns `true` if `parallelism` was written explicitly.
    pub fn has_parallelism(&self) -> bool {
        self.parallelism != PARALLELISM_UNSET
    }

    /// The job type, `build` when unset.
    pub fn type_name(&self) -> &str {
        self.job_type
            .as_ref()
            .map_or("build", |job_type| job_type.text.as_str())
    }

    /// Returns `true` if the steps contain a `store_test_results` step.
    pub fn stores_test_results(&self) -> bool {
        self.steps.iter().any(|step| step.name() == "store_test_results")
    }
}

/// A job's reference to a named executor.
///
/// Written either as `executor: name` or as
/// `executor: { name: name, param: value }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobExecutorRef {
    pub name: String,
    pub name_range: Range,
    pub range: Range,
    pub parameters: IndexMap<String, ParameterValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::{Checkout, StoreTestResults};

    #[test]
    fn test_default_parallelism_is_unset() {
        let job = Job::default();

        assert_eq!(job.parallelism, PARALLELISM_UNSET);
        assert!(!job.has_parallelism());
        assert_eq!(job.type_name(), "build");
    }

    #[test]
    fn test_stores_test_results() {
        let mut job = Job::default();
        job.steps.push(Step::Checkout(Checkout::default()));
        assert!(!job.stores_test_results());

        job.steps.push(Step::StoreTestResults(StoreTestResults::default()));
        assert!(job.stores_test_results());
    }
}
