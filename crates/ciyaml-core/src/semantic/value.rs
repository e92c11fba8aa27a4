use indexmap::IndexMap;

use crate::{params, range::Range, semantic::Step};

/// A value supplied for a parameter at a call site.
///
/// Call sites are step invocations, workflow job references, executor
/// references and matrix declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterValue {
    pub name: String,
    pub value: Value,
    pub value_range: Range,
    /// The whole `name: value` pair.
    pub range: Range,
}

/// The shape of a [`ParameterValue`], as classified from the syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Boolean(bool),
    Integer(i64),
    /// A list of values (`[a, b]` or a block sequence of scalars).
    Enum(Vec<ParameterValue>),
    /// A list of step invocations.
    Steps(Vec<Step>),
    Map(IndexMap<String, ParameterValue>),
    /// A `*alias` whose target could not be classified.
    Alias(String),
}

impl Value {
    /// The name used in type-mismatch diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Enum(_) => "enum",
            Value::Steps(_) => "steps",
            Value::Map(_) => "map",
            Value::Alias(_) => "alias",
        }
    }

    /// Return the scalar rendered as text.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::String(text) | Value::Alias(text) => Some(text.clone()),
            Value::Boolean(value) => Some(value.to_string()),
            Value::Integer(value) => Some(value.to_string()),
            Value::Enum(_) | Value::Steps(_) | Value::Map(_) => None,
        }
    }

    /// Returns the string content if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }
}

impl ParameterValue {
    /// Returns `true` if the value is exactly one `<< parameters.x >>`
    /// reference, so its type is that of the referenced parameter.
    pub fn is_param_reference(&self) -> bool {
        self.value.as_str().is_some_and(params::is_only_param)
    }

    /// Visit every step nested in this value.
    pub fn for_each_step<'a>(&'a self, f: &mut dyn FnMut(&'a Step)) {
        match &self.value {
            Value::Steps(steps) => {
                for step in steps {
                    step.walk(f);
                }
            }
            Value::Enum(items) => {
                for item in items {
                    item.for_each_step(f);
                }
            }
            Value::Map(entries) => {
                for entry in entries.values() {
                    entry.for_each_step(f);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_value(text: &str) -> ParameterValue {
        ParameterValue {
            name: "p".to_string(),
            value: Value::String(text.to_string()),
            value_range: Range::default(),
            range: Range::default(),
        }
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Boolean(true).type_name(), "boolean");
        assert_eq!(Value::Enum(vec![]).type_name(), "enum");
        assert_eq!(Value::Map(IndexMap::new()).type_name(), "map");
    }

    #[test]
    fn test_is_param_reference() {
        assert!(string_value("<< parameters.tag >>").is_param_reference());
        assert!(!string_value("v-<< parameters.tag >>").is_param_reference());
        assert!(!string_value("plain").is_param_reference());
    }

    #[test]
    fn test_as_text() {
        assert_eq!(Value::Integer(42).as_text().as_deref(), Some("42"));
        assert_eq!(Value::Boolean(false).as_text().as_deref(), Some("false"));
        assert_eq!(Value::Steps(vec![]).as_text(), None);
    }
}
