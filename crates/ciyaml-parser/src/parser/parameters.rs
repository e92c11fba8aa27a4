//! Parameter declarations of commands, jobs, executors and pipelines.

use indexmap::IndexMap;
use tree_sitter::Node;

use ciyaml_core::{
    range::Range,
    scalar::parse_yaml_bool,
    semantic::{Parameter, ParameterType, Step},
};

use crate::{
    cst::{Pair, node_range},
    error::{Diagnostic, ErrorCode},
    parser::{DocumentParser, after_pair_range},
};

impl<'t> DocumentParser<'t> {
    /// Parse a `parameters:` mapping.
    ///
    /// Declarations whose body is not a mapping are skipped.
    pub(crate) fn parse_parameters(&mut self, node: Node<'t>) -> IndexMap<String, Parameter> {
        let mut parameters = IndexMap::new();
        for pair in self.pairs(node) {
            if let Some(parameter) = self.parse_parameter(&pair) {
                parameters.insert(parameter.name.clone(), parameter);
            }
        }
        parameters
    }

    fn parse_parameter(&mut self, pair: &Pair<'t>) -> Option<Parameter> {
        let key = pair.key?;
        let body = pair.value.and_then(|value| self.cst.mapping_of(value))?;
        let name = self.cst.text(key);

        let (type_name, type_range) = match self.cst.find_pair(body, "type") {
            Some(type_pair) => match type_pair.value {
                Some(value) => (self.cst.text(value), type_pair.range()),
                None => (String::new(), after_pair_range(&type_pair)),
            },
            None => (String::new(), Range::default()),
        };

        let kind = match type_name.as_str() {
            "string" => ParameterType::String { default: None },
            "boolean" => ParameterType::Boolean { default: None },
            "integer" => ParameterType::Integer { default: None },
            "enum" => ParameterType::Enum {
                default: None,
                values: Vec::new(),
                values_range: Range::default(),
            },
            "executor" => ParameterType::Executor { default: None },
            "steps" => ParameterType::Steps {
                default: Vec::new(),
            },
            "env_var_name" => ParameterType::EnvVarName { default: None },
            _ => {
                return Some(Parameter {
                    name_range: node_range(key),
                    range: node_range(body),
                    type_range,
                    ..Parameter::new(name, ParameterType::String { default: None })
                });
            }
        };

        let mut parameter = Parameter {
            name_range: node_range(key),
            range: pair.range(),
            type_range,
            ..Parameter::new(name, kind)
        };

        for field in self.pairs(body) {
            match self.cst.key_text(&field).as_str() {
                "description" => parameter.description = field.value.map(|value| self.cst.text(value)),
                "enum" => {
                    if let (ParameterType::Enum { values, values_range, .. }, Some(value)) =
                        (&mut parameter.kind, field.value)
                    {
                        *values = self
                            .cst
                            .text_list(value)
                            .into_iter()
                            .map(|entry| entry.text)
                            .collect();
                        *values_range = node_range(value);
                    }
                }
                "default" => self.parse_default(&mut parameter, &field),
                _ => {}
            }
        }

        if parameter.has_default_outside_enum() {
            self.report_default_outside_enum(&parameter);
        }

        Some(parameter)
    }

    fn parse_default(&mut self, parameter: &mut Parameter, field: &Pair<'t>) {
        let text = self.cst.text_or_empty(field.value);
        let default_range = field.open_range();

        match &mut parameter.kind {
            ParameterType::String { default }
            | ParameterType::Enum { default, .. }
            | ParameterType::Executor { default }
            | ParameterType::EnvVarName { default } => *default = Some(text),
            ParameterType::Boolean { default } => *default = parse_yaml_bool(&text),
            ParameterType::Integer { default } => match text.parse() {
                Ok(value) => *default = Some(value),
                Err(_) => return,
            },
            ParameterType::Steps { default } => {
                let Some(value) = field.value.filter(|value| self.cst.sequence_of(*value).is_some())
                else {
                    return;
                };
                *default = self.parse_steps_default(value);
            }
        }

        parameter.has_default = true;
        parameter.default_range = default_range;
    }

    /// Parse the default of a `steps` parameter, reporting items that
    /// cannot be a step.
    fn parse_steps_default(&mut self, node: Node<'t>) -> Vec<Step> {
        let mut steps = Vec::new();
        for item in self.items(node) {
            let is_step = item.value.is_some_and(|value| {
                self.cst.scalar_of(value).is_some()
                    || self.cst.mapping_of(value).is_some_and(|mapping| {
                        !self.cst.direct_pairs(mapping).is_empty()
                    })
            });
            if !is_step {
                self.diagnostics.emit(
                    Diagnostic::error("Not a valid step")
                        .with_code(ErrorCode::E102)
                        .with_range(item.range()),
                );
                continue;
            }
            steps.extend(self.parse_single_step(&item));
        }
        steps
    }

    fn report_default_outside_enum(&mut self, parameter: &Parameter) {
        let ParameterType::Enum {
            default: Some(default),
            values,
            ..
        } = &parameter.kind
        else {
            return;
        };
        self.diagnostics.emit(
            Diagnostic::error(format!(
                "Default value {default} is not in enum '{}'",
                values.join(", ")
            ))
            .with_code(ErrorCode::E102)
            .with_range(parameter.default_range),
        );
    }
}
