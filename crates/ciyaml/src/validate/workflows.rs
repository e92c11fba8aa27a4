use ciyaml_core::{
    catalog::REQUIRE_STATUSES,
    params,
    range::TextAndRange,
    semantic::{JobRef, Requirement, Value, Workflow},
};
use ciyaml_parser::error::{Diagnostic, DiagnosticTag, ErrorCode};

use super::{Validator, parameters::Params};

/// The only value `type:` accepts on a workflow job.
const APPROVAL_TYPE: &str = "approval";

/// Context every organization provides.
const ORG_GLOBAL_CONTEXT: &str = "org-global";

impl Validator<'_> {
    pub(super) fn validate_workflows(&mut self) {
        let document = self.document;
        for workflow in document.workflows().values() {
            for job_ref in &workflow.job_refs {
                self.validate_job_ref(workflow, job_ref);
            }
        }
        self.validate_cycles();
    }

    fn validate_job_ref(&mut self, workflow: &Workflow, job_ref: &JobRef) {
        let name = job_ref.job_name.as_str();
        if name.is_empty() || self.is_from_unfetchable_orb(name) {
            return;
        }

        if let Some(job_type) = &job_ref.job_type {
            if job_type.text == APPROVAL_TYPE {
                return;
            }
            self.emit(
                Diagnostic::error("Type can only be \"approval\"")
                    .with_code(ErrorCode::E102)
                    .with_range(job_type.range),
            );
        }

        let exists = self.document.does_job_exist(name) || self.is_orb_job(name);
        if !exists {
            self.emit(
                Diagnostic::error(format!("Cannot find declaration for job {name}"))
                    .with_code(ErrorCode::E200)
                    .with_range(job_ref.job_name_range),
            );
        } else if let Some(defined) = self.defined_params(name) {
            self.validate_job_ref_parameters(job_ref, &defined);
        }

        for requirement in &job_ref.requires {
            self.validate_requirement(workflow, requirement);
        }
        if let Some(reruns) = &job_ref.max_auto_reruns {
            self.validate_job_ref_reruns(reruns);
        }
        for context in &job_ref.contexts {
            self.validate_context(context);
        }

        let no_params = Params::new();
        self.validate_steps(&job_ref.pre_steps, &no_params);
        self.validate_steps(&job_ref.post_steps, &no_params);
    }

    fn validate_job_ref_parameters(&mut self, job_ref: &JobRef, defined: &Params) {
        let entity = job_ref.job_name.as_str();
        let no_params = Params::new();

        self.report_missing_parameters(defined, entity, job_ref.job_name_range, |name| {
            job_ref.parameters.contains_key(name) || job_ref.matrix_parameters.contains_key(name)
        });
        self.validate_assigned_values(&job_ref.parameters, entity, defined, &no_params);

        for (name, value) in &job_ref.matrix_parameters {
            let Some(parameter) = defined.get(name) else {
                self.emit(
                    Diagnostic::error(format!("Parameter {name} is not defined in {entity}"))
                        .with_code(ErrorCode::E203)
                        .with_range(value.range),
                );
                continue;
            };
            match &value.value {
                Value::Enum(items) => {
                    for item in items {
                        self.check_assigned_value(parameter, item, entity, &no_params);
                    }
                }
                Value::Alias(_) => {}
                _ => self.emit(
                    Diagnostic::error(format!("Parameter {name} is not an enum of values"))
                        .with_code(ErrorCode::E205)
                        .with_range(value.value_range),
                ),
            }
        }
    }

    fn validate_requirement(&mut self, workflow: &Workflow, requirement: &Requirement) {
        let name = requirement.name.text.as_str();
        let is_declared = workflow
            .job_refs
            .iter()
            .any(|job_ref| job_ref.step_name == name || job_ref.job_name == name);
        if !is_declared
            && !params::is_partial_matrix_reference(name)
            && !params::contains_substitution(name)
        {
            self.emit(
                Diagnostic::error(format!("Cannot find declaration for job reference {name}"))
                    .with_code(ErrorCode::E209)
                    .with_range(requirement.name.range),
            );
        }

        let mut seen: Vec<&str> = Vec::new();
        for status in &requirement.statuses {
            let text = status.text.as_str();
            if !REQUIRE_STATUSES.contains(&text) && !params::contains_substitution(text) {
                self.emit(
                    Diagnostic::error(format!(
                        "Invalid status \"{text}\". Expected one of: {}",
                        REQUIRE_STATUSES.join(", ")
                    ))
                    .with_code(ErrorCode::E102)
                    .with_range(status.range),
                );
            }
            if seen.contains(&text) {
                self.emit(
                    Diagnostic::hint(format!("Status `{text}` is listed more than once"))
                        .with_range(status.range)
                        .with_tag(DiagnosticTag::Unnecessary),
                );
            }
            seen.push(text);
        }

        let is_default_only = matches!(requirement.statuses.as_slice(), [only] if only.text == "success");
        if requirement.explicit_status && is_default_only {
            self.emit(
                Diagnostic::hint("`success` is the default status and can be omitted")
                    .with_range(requirement.status_range)
                    .with_tag(DiagnosticTag::Unnecessary),
            );
        }
    }

    fn validate_job_ref_reruns(&mut self, reruns: &TextAndRange) {
        if params::contains_substitution(&reruns.text) {
            return;
        }
        let is_valid = reruns
            .text
            .parse::<i64>()
            .is_ok_and(|count| (1..=5).contains(&count));
        if !is_valid {
            self.emit(
                Diagnostic::error("max_auto_reruns must be between 1 and 5")
                    .with_code(ErrorCode::E102)
                    .with_range(reruns.range),
            );
        }
    }

    /// Contexts can only be checked against the organization's list, which
    /// is known once an API token is configured.
    fn validate_context(&mut self, context: &TextAndRange) {
        let api = self.config.api();
        if !api.is_logged_in() {
            return;
        }
        let name = context.text.as_str();
        if name == ORG_GLOBAL_CONTEXT || params::contains_substitution(name) {
            return;
        }
        if !api.contexts().iter().any(|known| known == name) {
            self.emit(
                Diagnostic::error(format!("Context {name} does not exist"))
                    .with_code(ErrorCode::E207)
                    .with_range(context.range),
            );
        }
    }
}
