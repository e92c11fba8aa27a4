//! Parameter values written at call sites: step invocations, executor
//! references, workflow jobs and matrices.

use indexmap::IndexMap;
use tree_sitter::Node;

use ciyaml_core::{
    scalar::{is_word_bool, parse_yaml_bool},
    semantic::{ParameterValue, Value},
};

use crate::{
    cst::{Item, Pair, first_child_of_kind, node_range},
    error::{Diagnostic, ErrorCode},
    parser::DocumentParser,
};

impl<'t> DocumentParser<'t> {
    /// Parse every pair of a mapping as a parameter value.
    pub(crate) fn parse_parameter_values(
        &mut self,
        node: Node<'t>,
    ) -> IndexMap<String, ParameterValue> {
        let mut values = IndexMap::new();
        for pair in self.pairs(node) {
            if let Some(value) = self.parse_parameter_value(&pair) {
                values.insert(value.name.clone(), value);
            }
        }
        values
    }

    /// Parse one `name: value` assignment.
    ///
    /// A key without a value is reported and skipped.
    pub(crate) fn parse_parameter_value(&mut self, pair: &Pair<'t>) -> Option<ParameterValue> {
        let key = pair.key?;
        let name = self.cst.text(key);

        let Some(raw_value) = pair.raw_value else {
            self.diagnostics.emit(
                Diagnostic::warning("No value defined for the parameter")
                    .with_code(ErrorCode::E103)
                    .with_range(node_range(key)),
            );
            return None;
        };

        let content = self.cst.content(raw_value)?;
        let value = match content.kind() {
            "plain_scalar" | "block_scalar" => self.simple_value(content)?,
            "block_sequence" | "flow_sequence" => {
                Value::Enum(self.array_values(raw_value, &name))
            }
            "double_quote_scalar" | "single_quote_scalar" => Value::String(self.cst.text(content)),
            "block_mapping" | "flow_mapping" => Value::Map(self.map_values(content)),
            _ => return None,
        };
        let value = match self.cst.alias_of(raw_value) {
            Some(alias) if !matches!(value, Value::Map(_) | Value::Enum(_)) => {
                Value::Alias(self.cst.alias_name(alias))
            }
            _ => value,
        };

        Some(ParameterValue {
            name,
            value,
            value_range: node_range(raw_value),
            range: pair.range(),
        })
    }

    fn map_values(&mut self, mapping: Node<'t>) -> IndexMap<String, ParameterValue> {
        let mut values = IndexMap::new();
        for pair in self.pairs(mapping) {
            if pair.key.is_none() || pair.raw_value.is_none() {
                continue;
            }
            if let Some(value) = self.parse_parameter_value(&pair) {
                values.insert(value.name.clone(), value);
            }
        }
        values
    }

    /// Parse the items of a sequence value.
    ///
    /// Mapping items are steps; anything else is a scalar entry.
    fn array_values(&mut self, node: Node<'t>, name: &str) -> Vec<ParameterValue> {
        let mut values = Vec::new();
        for item in self.items(node) {
            if self.is_step_item(&item) {
                values.push(ParameterValue {
                    name: name.to_string(),
                    value: Value::Steps(self.parse_single_step(&item)),
                    value_range: item.range(),
                    range: item.range(),
                });
                continue;
            }

            let Some(value) = item.value.and_then(|value| self.cst.scalar_of(value)) else {
                continue;
            };
            if let Some(parsed) = self.simple_value(value) {
                values.push(ParameterValue {
                    name: name.to_string(),
                    value: parsed,
                    value_range: item.range(),
                    range: item.range(),
                });
            }
        }
        values
    }

    fn is_step_item(&self, item: &Item<'t>) -> bool {
        item.value
            .filter(|value| value.kind() == "block_node")
            .is_some_and(|value| !self.cst.direct_pairs(value).is_empty())
    }

    /// Classify a scalar node.
    ///
    /// Integers that do not fit an `i64` are dropped.
    pub(crate) fn simple_value(&self, node: Node<'t>) -> Option<Value> {
        match node.kind() {
            "plain_scalar" => {
                let mut cursor = node.walk();
                let inner = node.named_children(&mut cursor).next();
                let text = self.cst.text(node);
                match inner.map(|inner| inner.kind()) {
                    Some("boolean_scalar") => Some(Value::Boolean(text.eq_ignore_ascii_case("true"))),
                    Some("integer_scalar") => text.parse().ok().map(Value::Integer),
                    _ if is_word_bool(&text) => parse_yaml_bool(&text).map(Value::Boolean),
                    _ => Some(Value::String(text)),
                }
            }
            "block_scalar" | "double_quote_scalar" | "single_quote_scalar" => {
                Some(Value::String(self.cst.text(node)))
            }
            _ => first_child_of_kind(node, "plain_scalar").and_then(|inner| self.simple_value(inner)),
        }
    }
}

#[cfg(test)]
mod tests {
    use ciyaml_core::semantic::{Step, Value};

    use crate::Document;

    fn named_step_values(source: &str) -> indexmap::IndexMap<String, ciyaml_core::semantic::ParameterValue> {
        let document = Document::parse(source).expect("grammar loads");
        let job = &document.jobs()["build"];
        match &job.steps[0] {
            Step::Named(step) => step.parameters.clone(),
            other => panic!("Expected named step, got {other:?}"),
        }
    }

    #[test]
    fn test_scalar_classification() {
        let source = "\
jobs:
  build:
    steps:
      - greet:
          text: hello
          flag: true
          word: yes
          count: 3
          quoted: \"7\"
          huge: 99999999999999999999999
";
        let values = named_step_values(source);

        assert_eq!(values["text"].value, Value::String("hello".into()));
        assert_eq!(values["flag"].value, Value::Boolean(true));
        assert_eq!(values["word"].value, Value::Boolean(true));
        assert_eq!(values["count"].value, Value::Integer(3));
        assert_eq!(values["quoted"].value, Value::String("7".into()));
        assert!(!values.contains_key("huge"));
    }

    #[test]
    fn test_sequence_and_map_values() {
        let source = "\
jobs:
  build:
    steps:
      - greet:
          names: [a, b]
          options:
            depth: 1
          steps:
            - run: echo hi
";
        let values = named_step_values(source);

        let Value::Enum(names) = &values["names"].value else {
            panic!("Expected sequence value");
        };
        assert_eq!(names.len(), 2);
        assert!(matches!(values["options"].value, Value::Map(_)));

        let Value::Enum(steps) = &values["steps"].value else {
            panic!("Expected sequence value");
        };
        assert!(matches!(&steps[0].value, Value::Steps(inner) if matches!(inner[0], Step::Run(_))));
    }

    #[test]
    fn test_valueless_parameter_is_reported() {
        let source = "jobs:\n  build:\n    steps:\n      - greet:\n          text:\n          other: 1\n";
        let document = Document::parse(source).expect("grammar loads");

        assert!(
            document
                .diagnostics()
                .iter()
                .any(|d| d.message() == "No value defined for the parameter")
        );
    }

    #[test]
    fn test_alias_value() {
        let source = "\
defaults: &tag latest
jobs:
  build:
    steps:
      - greet:
          tag: *tag
";
        let values = named_step_values(source);
        assert_eq!(values["tag"].value, Value::Alias("tag".into()));
    }
}
