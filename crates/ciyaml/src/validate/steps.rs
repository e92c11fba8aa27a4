use std::sync::LazyLock;

use regex::Regex;

use ciyaml_core::{
    catalog::RUN_WHEN_KEYWORDS,
    params::{self, ParamScope},
    range::TextAndRange,
    semantic::{NamedStep, Parameter, ParameterType, Run, Step, StepsPlaceholder},
};
use ciyaml_parser::error::{Diagnostic, DiagnosticTag, ErrorCode};

use super::{Validator, parameters::Params};

const MAX_AUTO_RERUNS: i64 = 5;

const MAX_AUTO_RERUN_DELAY_SECS: u64 = 600;

static RERUN_DELAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((10|[1-9])m|([1-9][0-9]*)s)$").expect("rerun delay pattern is valid")
});

impl Validator<'_> {
    /// Validate a list of steps; `usable` holds the parameters of the
    /// enclosing job or command.
    pub(super) fn validate_steps(&mut self, steps: &[Step], usable: &Params) {
        for step in steps {
            match step {
                Step::Run(run) => self.validate_run(run, usable),
                Step::Named(named) => self.validate_named_step(named, usable),
                Step::Steps(placeholder) => self.validate_steps_placeholder(placeholder, usable),
                _ => {}
            }
        }
    }

    fn validate_named_step(&mut self, step: &NamedStep, usable: &Params) {
        let name = step.name.as_str();
        if name.is_empty() || self.is_from_unfetchable_orb(name) {
            return;
        }

        if !self.is_known_command(name) {
            self.emit(
                Diagnostic::error(format!("Cannot find declaration for step {name}"))
                    .with_code(ErrorCode::E201)
                    .with_range(step.range),
            );
            return;
        }

        if name == "store_test_results" {
            self.emit(
                Diagnostic::error("Path must be specified for `store_test_results` step")
                    .with_code(ErrorCode::E103)
                    .with_range(step.range),
            );
            return;
        }

        if self.document.is_built_in(name) {
            return;
        }
        if let Some(defined) = self.defined_params(name) {
            self.validate_parameter_values(&step.parameters, name, step.range, &defined, usable);
        }
    }

    fn validate_steps_placeholder(&mut self, placeholder: &StepsPlaceholder, usable: &Params) {
        let Some(parameter) = self.referenced_parameter(&placeholder.value, usable) else {
            return;
        };

        if !matches!(parameter.kind, ParameterType::Steps { .. }) {
            self.emit(
                Diagnostic::error("Parameter type is not steps")
                    .with_code(ErrorCode::E205)
                    .with_range(placeholder.value_range),
            );
        }
    }

    fn validate_run(&mut self, run: &Run, usable: &Params) {
        if run.is_deploy {
            self.emit(
                Diagnostic::warning("The `deploy` step is deprecated. Please use the `run` job instead.")
                    .with_code(ErrorCode::E104)
                    .with_range(run.range)
                    .with_tag(DiagnosticTag::Deprecated),
            );
        }

        self.validate_auto_rerun(run);
        if let Some(when) = &run.when {
            self.validate_run_when(when, usable);
        }
        if self.config.validation().shell_lint() {
            self.lint_run_command(run);
        }
    }

    fn validate_auto_rerun(&mut self, run: &Run) {
        if run.background {
            if let Some(reruns) = &run.max_auto_reruns {
                self.emit(rerun_error("max_auto_reruns cannot be used on a background step", reruns));
            }
        }

        if let Some(delay) = &run.auto_rerun_delay {
            if run.max_auto_reruns.is_none() {
                self.emit(rerun_error("auto_rerun_delay requires max_auto_reruns to be set", delay));
            }
            if !params::contains_substitution(&delay.text) {
                if let Some(message) = rerun_delay_error(&delay.text) {
                    self.emit(rerun_error(message, delay));
                }
            }
        }

        if let Some(reruns) = &run.max_auto_reruns {
            if !params::contains_substitution(&reruns.text) && !is_valid_rerun_count(&reruns.text) {
                self.emit(rerun_error("max_auto_reruns must be between 1 and 5", reruns));
            }
        }
    }

    fn validate_run_when(&mut self, when: &TextAndRange, usable: &Params) {
        let text = when.text.as_str();
        let value = if params::is_only_param(text) {
            let Some(parameter) = self.referenced_parameter(text, usable) else {
                return;
            };
            if !matches!(
                parameter.kind,
                ParameterType::String { .. } | ParameterType::Enum { .. }
            ) {
                self.emit(
                    Diagnostic::error(format!(
                        "Parameter {} is not a string type parameter, and therefore cannot be used inside the `when` field",
                        parameter.name
                    ))
                    .with_code(ErrorCode::E205)
                    .with_range(when.range),
                );
                return;
            }
            if !parameter.is_optional() {
                return;
            }
            let Some(default) = parameter.default_text() else {
                return;
            };
            default
        } else if params::contains_substitution(text) || params::is_partial_param_reference(text) {
            return;
        } else {
            text.to_string()
        };

        if !RUN_WHEN_KEYWORDS.contains(&value.as_str()) {
            self.emit(
                Diagnostic::error(format!(
                    "Invalid when condition: expected `on_success`, `always`, `on_fail`; got `{value}`"
                ))
                .with_code(ErrorCode::E306)
                .with_range(when.range),
            );
        }
    }

    /// The parameter referenced by a `<< parameters.x >>` or
    /// `<< pipeline.parameters.x >>` value.
    pub(super) fn referenced_parameter<'p>(
        &self,
        text: &str,
        usable: &'p Params,
    ) -> Option<&'p Parameter>
    where
        Self: 'p,
    {
        let reference = params::find_param_references(text).into_iter().next()?;
        match reference.scope {
            ParamScope::Local => usable.get(&reference.name),
            ParamScope::Pipeline => self.pipeline_parameters().get(&reference.name),
        }
    }
}

fn rerun_error(message: impl Into<String>, field: &TextAndRange) -> Diagnostic {
    Diagnostic::error(message)
        .with_code(ErrorCode::E306)
        .with_range(field.range)
}

fn is_valid_rerun_count(text: &str) -> bool {
    text.parse::<i64>()
        .is_ok_and(|count| (1..=MAX_AUTO_RERUNS).contains(&count))
}

/// Why an `auto_rerun_delay` is rejected, if it is.
fn rerun_delay_error(text: &str) -> Option<&'static str> {
    let Some(seconds) = parse_duration(text) else {
        return Some("auto_rerun_delay must be a valid duration");
    };
    if seconds > MAX_AUTO_RERUN_DELAY_SECS {
        return Some("auto_rerun_delay must not exceed 10 minutes");
    }
    if !RERUN_DELAY_RE.is_match(text) {
        return Some("auto_rerun_delay must be written in whole seconds (`30s`) or minutes (`5m`)");
    }
    None
}

/// Parse a duration such as `1h30m` or `45s` into seconds.
fn parse_duration(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let unit = match ch {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return None,
        };
        let amount: u64 = digits.parse().ok()?;
        total = total.checked_add(amount.checked_mul(unit)?)?;
        digits.clear();
    }

    digits.is_empty().then_some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::test_support::{matching, validate};

    fn job_with_steps(steps: &str) -> String {
        format!(
            "version: 2.1\njobs:\n  build:\n    docker:\n      - image: cimg/base:2024.01\n    parameters:\n      cond:\n        type: string\n        default: always\n      flag:\n        type: boolean\n        default: true\n      extra:\n        type: steps\n        default: []\n    steps:\n{steps}workflows:\n  main:\n    jobs: [build]\n"
        )
    }

    #[test]
    fn test_undeclared_step() {
        let diagnostics = validate(&job_with_steps("      - checkout\n      - nope\n"));

        assert_eq!(matching(&diagnostics, "Cannot find declaration for step nope").len(), 1);
        assert!(matching(&diagnostics, "step checkout").is_empty());
    }

    #[test]
    fn test_bare_store_test_results() {
        let diagnostics = validate(&job_with_steps("      - store_test_results\n"));

        assert_eq!(
            matching(&diagnostics, "Path must be specified for `store_test_results` step").len(),
            1
        );
    }

    #[test]
    fn test_deploy_is_deprecated() {
        let diagnostics = validate(&job_with_steps("      - deploy: make deploy\n"));
        let deprecated = matching(&diagnostics, "The `deploy` step is deprecated");

        assert_eq!(deprecated.len(), 1);
        assert!(deprecated[0].tags().contains(&DiagnosticTag::Deprecated));
    }

    #[test]
    fn test_when_condition() {
        let invalid = validate(&job_with_steps(
            "      - run:\n          command: make\n          when: sometimes\n",
        ));
        assert_eq!(matching(&invalid, "Invalid when condition").len(), 1);

        let from_param = validate(&job_with_steps(
            "      - run:\n          command: make\n          when: << parameters.cond >>\n",
        ));
        assert!(matching(&from_param, "Invalid when condition").is_empty());

        let boolean = validate(&job_with_steps(
            "      - run:\n          command: make\n          when: << parameters.flag >>\n",
        ));
        assert_eq!(matching(&boolean, "is not a string type parameter").len(), 1);
    }

    #[test]
    fn test_auto_rerun_rules() {
        let too_many = validate(&job_with_steps(
            "      - run:\n          command: make\n          max_auto_reruns: 6\n",
        ));
        assert_eq!(matching(&too_many, "max_auto_reruns must be between 1 and 5").len(), 1);

        let orphan_delay = validate(&job_with_steps(
            "      - run:\n          command: make\n          auto_rerun_delay: 30s\n",
        ));
        assert_eq!(matching(&orphan_delay, "requires max_auto_reruns").len(), 1);

        let long_delay = validate(&job_with_steps(
            "      - run:\n          command: make\n          max_auto_reruns: 2\n          auto_rerun_delay: 11m\n",
        ));
        assert_eq!(matching(&long_delay, "must not exceed 10 minutes").len(), 1);
    }

    #[test]
    fn test_steps_placeholder_type() {
        let valid = validate(&job_with_steps("      - steps: << parameters.extra >>\n"));
        assert!(matching(&valid, "Parameter type is not steps").is_empty());

        let invalid = validate(&job_with_steps("      - steps: << parameters.cond >>\n"));
        assert_eq!(matching(&invalid, "Parameter type is not steps").len(), 1);
    }

    #[test]
    fn test_rerun_delay_error() {
        assert_eq!(rerun_delay_error("30s"), None);
        assert_eq!(rerun_delay_error("10m"), None);
        assert_eq!(rerun_delay_error("soon"), Some("auto_rerun_delay must be a valid duration"));
        assert_eq!(rerun_delay_error("1h"), Some("auto_rerun_delay must not exceed 10 minutes"));
        assert!(rerun_delay_error("1m30s").is_some());
        assert!(rerun_delay_error("0s").is_some());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1h30m"), Some(5400));
        assert_eq!(parse_duration("45s"), Some(45));
        assert_eq!(parse_duration("45"), None);
        assert_eq!(parse_duration("m"), None);
    }
}
