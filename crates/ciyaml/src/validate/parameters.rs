//! Values assigned to declared parameters at call sites.

use indexmap::IndexMap;

use ciyaml_core::{
    params,
    range::Range,
    semantic::{Parameter, ParameterType, ParameterValue, Value},
};
use ciyaml_parser::error::{Diagnostic, ErrorCode};

use super::Validator;

/// Parameter declarations in scope at a call site.
pub(super) type Params = IndexMap<String, Parameter>;

impl Validator<'_> {
    /// Check the values passed to `entity` against its declared parameters.
    ///
    /// `usable` holds the parameters a `<< parameters.x >>` value can refer
    /// to at the call site.
    pub(super) fn validate_parameter_values(
        &mut self,
        values: &IndexMap<String, ParameterValue>,
        entity: &str,
        entity_range: Range,
        defined: &Params,
        usable: &Params,
    ) {
        self.report_missing_parameters(defined, entity, entity_range, |name| {
            values.contains_key(name)
        });
        self.validate_assigned_values(values, entity, defined, usable);
    }

    /// Report required parameters for which `is_assigned` is false.
    pub(super) fn report_missing_parameters(
        &mut self,
        defined: &Params,
        entity: &str,
        entity_range: Range,
        is_assigned: impl Fn(&str) -> bool,
    ) {
        for (name, parameter) in defined {
            if parameter.is_optional() || is_assigned(name) {
                continue;
            }
            self.emit(
                Diagnostic::error(format!("Parameter {name} is required for {entity}"))
                    .with_code(ErrorCode::E204)
                    .with_range(entity_range),
            );
        }
    }

    pub(super) fn validate_assigned_values(
        &mut self,
        values: &IndexMap<String, ParameterValue>,
        entity: &str,
        defined: &Params,
        usable: &Params,
    ) {
        for (name, value) in values {
            match defined.get(name) {
                Some(parameter) => self.check_assigned_value(parameter, value, entity, usable),
                None => self.emit(
                    Diagnostic::error(format!("Parameter {name} is not defined in {entity}"))
                        .with_code(ErrorCode::E203)
                        .with_range(value.range),
                ),
            }
        }
    }

    /// Check one value, following a `<< parameters.x >>` value to the type
    /// of the parameter it refers to.
    pub(super) fn check_assigned_value(
        &mut self,
        parameter: &Parameter,
        value: &ParameterValue,
        entity: &str,
        usable: &Params,
    ) {
        if value.is_param_reference() {
            self.check_reference_type(parameter, value, entity, usable);
            return;
        }
        if value.value.as_str().is_some_and(params::contains_substitution) {
            return;
        }
        self.check_param_value(parameter, value, entity, usable);
    }

    fn check_reference_type(
        &mut self,
        parameter: &Parameter,
        value: &ParameterValue,
        entity: &str,
        usable: &Params,
    ) {
        // Undefined references are reported by the parameter usage pass.
        let Some(target) = value
            .value
            .as_str()
            .and_then(|text| self.referenced_parameter(text, usable))
        else {
            return;
        };

        if !are_compatible(&parameter.kind, &target.kind) {
            self.emit(type_mismatch(parameter, entity, value.value_range));
        }
    }

    fn check_param_value(
        &mut self,
        parameter: &Parameter,
        value: &ParameterValue,
        entity: &str,
        usable: &Params,
    ) {
        if matches!(value.value, Value::Alias(_)) {
            return;
        }

        match &parameter.kind {
            ParameterType::String { .. } => {
                if !matches!(value.value, Value::String(_)) {
                    self.emit(type_mismatch(parameter, entity, value.value_range));
                }
            }
            ParameterType::Boolean { .. } => {
                if !matches!(value.value, Value::Boolean(_)) {
                    self.emit(type_mismatch(parameter, entity, value.value_range));
                }
            }
            ParameterType::Integer { .. } => {
                if !matches!(value.value, Value::Integer(_)) {
                    self.emit(type_mismatch(parameter, entity, value.value_range));
                }
            }
            ParameterType::EnvVarName { .. } => {
                if !matches!(value.value, Value::String(_) | Value::Integer(_)) {
                    self.emit(type_mismatch(parameter, entity, value.value_range));
                }
            }
            ParameterType::Enum { values, .. } => {
                let Some(text) = value.value.as_text() else {
                    self.emit(type_mismatch(parameter, entity, value.value_range));
                    return;
                };
                if !values.contains(&text) {
                    self.emit(
                        Diagnostic::error(format!(
                            "Parameter {text} is not a valid value for {}. Expected one of: {}",
                            parameter.name,
                            values.join(", ")
                        ))
                        .with_code(ErrorCode::E102)
                        .with_range(value.value_range),
                    );
                }
            }
            ParameterType::Executor { .. } => self.check_executor_value(parameter, value, entity),
            ParameterType::Steps { .. } => self.check_steps_value(parameter, value, entity, usable),
        }
    }

    fn check_executor_value(&mut self, parameter: &Parameter, value: &ParameterValue, entity: &str) {
        match &value.value {
            Value::String(name) => self.check_executor_exists(name, value.value_range),
            Value::Map(fields) => match fields.get("name") {
                Some(name) => {
                    if let Value::String(text) = &name.value {
                        self.check_executor_exists(text, name.value_range);
                    }
                }
                None => self.emit(
                    Diagnostic::error("Missing executor name")
                        .with_code(ErrorCode::E103)
                        .with_range(value.value_range),
                ),
            },
            _ => self.emit(type_mismatch(parameter, entity, value.value_range)),
        }
    }

    fn check_executor_exists(&mut self, name: &str, range: Range) {
        if params::contains_substitution(name)
            || self.is_from_unfetchable_orb(name)
            || self.does_executor_exist(name)
        {
            return;
        }
        self.emit(
            Diagnostic::error(format!("Executor `{name}` does not exist"))
                .with_code(ErrorCode::E202)
                .with_range(range),
        );
    }

    fn check_steps_value(
        &mut self,
        parameter: &Parameter,
        value: &ParameterValue,
        entity: &str,
        usable: &Params,
    ) {
        match &value.value {
            Value::Steps(steps) => self.validate_steps(steps, usable),
            Value::Enum(items) => {
                for item in items {
                    match &item.value {
                        Value::Steps(steps) => self.validate_steps(steps, usable),
                        Value::String(name) if !self.is_known_command(name) => self.emit(
                            Diagnostic::error(format!(
                                "Cannot find a definition for command named {name}"
                            ))
                            .with_code(ErrorCode::E201)
                            .with_range(item.value_range),
                        ),
                        _ => {}
                    }
                }
            }
            _ => self.emit(type_mismatch(parameter, entity, value.value_range)),
        }
    }

    /// Returns `true` if `name` can be invoked as a step.
    pub(super) fn is_known_command(&self, name: &str) -> bool {
        self.document.does_command_exist(name)
            || self.document.does_job_exist(name)
            || self.document.is_built_in(name)
            || self.document.is_alias(name)
            || self.is_orb_command(name)
            || self.is_orb_job(name)
            || self.is_from_unfetchable_orb(name)
    }
}

fn type_mismatch(parameter: &Parameter, entity: &str, range: Range) -> Diagnostic {
    Diagnostic::error(format!(
        "Parameter {} for {entity} must be a {}",
        parameter.name,
        parameter.type_name()
    ))
    .with_code(ErrorCode::E205)
    .with_range(range)
}

/// Whether a value typed as `source` can be passed to a `target` parameter.
///
/// The textual types are interchangeable: an enum or environment variable
/// name is a string at evaluation time.
fn are_compatible(target: &ParameterType, source: &ParameterType) -> bool {
    let is_textual = |kind: &ParameterType| {
        matches!(
            kind,
            ParameterType::String { .. } | ParameterType::Enum { .. } | ParameterType::EnvVarName { .. }
        )
    };

    match (target, source) {
        (ParameterType::Executor { .. }, ParameterType::String { .. }) => true,
        _ if is_textual(target) && is_textual(source) => true,
        _ => target.name() == source.name(),
    }
}
