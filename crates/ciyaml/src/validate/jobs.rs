use ciyaml_core::{
    catalog::{JOB_TYPES, STEPLESS_JOB_TYPES},
    params,
    semantic::{Job, JobExecutorRef, ParameterType},
};
use ciyaml_parser::error::{Diagnostic, DiagnosticTag, ErrorCode};

use super::{Validator, any_step};

const PARALLELISM_DOCS: &str = "https://circleci.com/docs/parallelism-faster-jobs/";

impl Validator<'_> {
    pub(super) fn validate_jobs(&mut self) {
        let document = self.document;
        for job in document.jobs().values() {
            self.validate_job(job);
        }
    }

    fn validate_job(&mut self, job: &Job) {
        self.validate_job_type(job);
        self.validate_steps(&job.steps, &job.parameters);

        if STEPLESS_JOB_TYPES.contains(&job.type_name()) && !job.steps.is_empty() {
            self.emit(
                Diagnostic::warning(
                    "If job type is approval, no-op or release, then steps will be ignored.",
                )
                .with_code(ErrorCode::E311)
                .with_range(job.steps_range),
            );
        }

        if !self.is_local_orb() && self.config.validation().unused() && !self.is_job_used(&job.name) {
            self.emit(
                Diagnostic::warning("Job is unused")
                    .with_code(ErrorCode::E300)
                    .with_range(job.name_range)
                    .with_tag(DiagnosticTag::Unnecessary),
            );
        }

        if job.name.contains("test") && !job.stores_test_results() {
            self.emit(
                Diagnostic::hint(
                    "You may want to add the `store_test_results` step to visualize the test results in CircleCI",
                )
                .with_range(job.name_range),
            );
        }

        if let Some(executor_ref) = &job.executor {
            self.validate_job_executor(job, executor_ref);
        }

        if job.has_parallelism() && (job.parallelism == 0 || job.parallelism == 1) {
            self.emit(
                Diagnostic::warning(
                    "To benefit from parallelism, you should select a value greater than 1. You can read more about how to leverage parallelism to speed up pipelines in the CircleCI docs.",
                )
                .with_range(job.parallelism_range)
                .with_help(PARALLELISM_DOCS),
            );
        }

        if let Some(retention) = &job.retention {
            if !retention.is_caches_duration_valid() {
                let range = retention
                    .caches
                    .as_ref()
                    .map_or(retention.range, |caches| caches.range);
                self.emit(
                    Diagnostic::error("Retention caches duration must be between 1d and 15d")
                        .with_code(ErrorCode::E310)
                        .with_range(range),
                );
            }
        }

        if let Some(executor) = &job.inline_executor {
            self.validate_executor(executor);
        }
    }

    fn validate_job_type(&mut self, job: &Job) {
        let Some(job_type) = &job.job_type else {
            return;
        };
        if params::contains_substitution(&job_type.text) {
            return;
        }

        if !JOB_TYPES.contains(&job_type.text.as_str()) {
            self.emit(
                Diagnostic::error(format!(
                    "Invalid job type '{}'. Allowed types: {}",
                    job_type.text,
                    JOB_TYPES.join(", ")
                ))
                .with_code(ErrorCode::E305)
                .with_range(job_type.range),
            );
        } else if job_type.text == "build" {
            self.emit(
                Diagnostic::hint(
                    "If no `type:` key is specified, the job will default to `type: build`.",
                )
                .with_range(job_type.range)
                .with_tag(DiagnosticTag::Unnecessary),
            );
        }
    }

    /// A job is used when a workflow references it or another job invokes
    /// it as a step.
    fn is_job_used(&self, name: &str) -> bool {
        let document = self.document;
        let in_steps = document
            .jobs()
            .values()
            .any(|job| any_step(&job.steps, |step| step.name() == name));
        in_steps
            || document
                .workflows()
                .values()
                .flat_map(|workflow| &workflow.job_refs)
                .any(|job_ref| job_ref.job_name == name)
    }

    fn validate_job_executor(&mut self, job: &Job, executor_ref: &JobExecutorRef) {
        let name = executor_ref.name.as_str();

        if params::is_only_param(name) {
            self.validate_executor_parameter(job, executor_ref);
            return;
        }
        if name.is_empty() || params::contains_substitution(name) {
            return;
        }

        let document = self.document;
        match document.executors().get(name) {
            Some(executor) => self.validate_parameter_values(
                &executor_ref.parameters,
                name,
                executor_ref.range,
                &executor.parameters,
                &job.parameters,
            ),
            None => self.validate_executor_reference(job, executor_ref),
        }
    }

    /// `executor: << parameters.x >>` must point at an executor parameter
    /// whose default exists.
    fn validate_executor_parameter(&mut self, job: &Job, executor_ref: &JobExecutorRef) {
        let Some(parameter) = self.referenced_parameter(&executor_ref.name, &job.parameters) else {
            return;
        };
        let ParameterType::Executor { default } = &parameter.kind else {
            return;
        };

        let Some(default) = default.as_deref().filter(|_| parameter.is_optional()) else {
            self.emit(
                Diagnostic::warning(format!(
                    "No default value specified for parameter `{}`.",
                    parameter.name
                ))
                .with_range(executor_ref.range),
            );
            return;
        };

        if self.config.registry().uses_default_host()
            && !self.does_executor_exist(default)
            && !self.is_from_unfetchable_orb(default)
        {
            self.emit(
                Diagnostic::error(format!(
                    "Parameter is used as executor but executor `{default}` does not exist."
                ))
                .with_code(ErrorCode::E202)
                .with_range(executor_ref.range),
            );
        }
    }

    fn validate_executor_reference(&mut self, job: &Job, executor_ref: &JobExecutorRef) {
        let name = executor_ref.name.as_str();
        let range = executor_ref.name_range;

        if self.is_orb_reference(name) {
            let Some((orb, executor)) = name.split_once('/') else {
                return;
            };
            match self.orb_info(orb) {
                Some(info) => match info.executors.get(executor) {
                    Some(definition) => self.validate_parameter_values(
                        &executor_ref.parameters,
                        name,
                        executor_ref.range,
                        &definition.parameters,
                        &job.parameters,
                    ),
                    None => self.emit(
                        Diagnostic::error(format!("Cannot find executor {executor} in orb {orb}"))
                            .with_code(ErrorCode::E202)
                            .with_range(range),
                    ),
                },
                None => {
                    if let Some(err) = self.orb_failures.get(orb) {
                        self.emit(
                            Diagnostic::warning(format!(
                                "Invalid orb or error trying to fetch it: {err}"
                            ))
                            .with_code(ErrorCode::E312)
                            .with_range(range),
                        );
                    }
                }
            }
            return;
        }

        if let Some((orb, _)) = name.split_once('/') {
            if self.scopes().any(|document| document.could_be_orb_reference(name)) {
                self.emit(
                    Diagnostic::error(format!(
                        "Cannot find orb \"{orb}\". Looking for executor named \"{name}\"."
                    ))
                    .with_code(ErrorCode::E206)
                    .with_range(range),
                );
                return;
            }
        }

        self.emit(
            Diagnostic::error(format!("Executor \"{name}\" does not exist"))
                .with_code(ErrorCode::E202)
                .with_range(range),
        );
    }
}
