use crate::{range::Range, semantic::Step};

/// A declared parameter of a job, command, executor or pipeline.
///
/// The shared fields live on the struct; the type-specific ones live in
/// [`ParameterType`]. A parameter is optional exactly when it declares a
/// default value, whatever its type.
///
/// # Examples
///
/// ```
/// # use ciyaml_core::semantic::{Parameter, ParameterType};
/// let param = Parameter::new("version", ParameterType::String { default: None });
/// assert!(!param.is_optional());
/// assert_eq!(param.type_name(), "string");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub name_range: Range,
    /// The whole `name: {...}` pair.
    pub range: Range,
    pub type_range: Range,
    pub description: Option<String>,
    pub has_default: bool,
    pub default_range: Range,
    pub kind: ParameterType,
}

/// Type-specific data of a [`Parameter`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterType {
    String {
        default: Option<String>,
    },
    Boolean {
        default: Option<bool>,
    },
    Integer {
        default: Option<i64>,
    },
    Enum {
        default: Option<String>,
        values: Vec<String>,
        values_range: Range,
    },
    /// Names an executor.
    Executor {
        default: Option<String>,
    },
    /// A list of steps spliced into the caller.
    Steps {
        default: Vec<Step>,
    },
    /// Names an environment variable.
    EnvVarName {
        default: Option<String>,
    },
}

impl ParameterType {
    /// The type keyword as written in the configuration.
    pub fn name(&self) -> &'static str {
        match self {
            ParameterType::String { .. } => "string",
            ParameterType::Boolean { .. } => "boolean",
            ParameterType::Integer { .. } => "integer",
            ParameterType::Enum { .. } => "enum",
            ParameterType::Executor { .. } => "executor",
            ParameterType::Steps { .. } => "steps",
            ParameterType::EnvVarName { .. } => "env_var_name",
        }
    }
}

impl Parameter {
    /// Create a parameter without ranges, description or default.
    pub fn new(name: impl Into<String>, kind: ParameterType) -> Self {
        Self {
            name: name.into(),
            name_range: Range::default(),
            range: Range::default(),
            type_range: Range::default(),
            description: None,
            has_default: false,
            default_range: Range::default(),
            kind,
        }
    }

    /// A parameter is optional iff it declares a default.
    pub fn is_optional(&self) -> bool {
        self.has_default
    }

    /// The type keyword as written in the configuration.
    pub fn type_name(&self) -> &'static str {
        self.kind.name()
    }

    /// The default rendered as text, for the scalar parameter types.
    pub fn default_text(&self) -> Option<String> {
        match &self.kind {
            ParameterType::String { default }
            | ParameterType::Enum { default, .. }
            | ParameterType::Executor { default }
            | ParameterType::EnvVarName { default } => default.clone(),
            ParameterType::Boolean { default } => default.map(|value| value.to_string()),
            ParameterType::Integer { default } => default.map(|value| value.to_string()),
            ParameterType::Steps { .. } => None,
        }
    }

    /// Returns the allowed values if this is an enum parameter.
    pub fn enum_values(&self) -> Option<&[String]> {
        match &self.kind {
            ParameterType::Enum { values, .. } => Some(values),
            _ => None,
        }
    }

    /// Returns `true` if an enum parameter's default is not among its values.
    pub fn has_default_outside_enum(&self) -> bool {
        match &self.kind {
            ParameterType::Enum {
                default: Some(default),
                values,
                ..
            } => !values.contains(default),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_iff_has_default() {
        let mut param = Parameter::new("flag", ParameterType::Boolean { default: Some(true) });
        assert!(!param.is_optional());

        param.has_default = true;
        assert!(param.is_optional());

        let steps = Parameter {
            has_default: true,
            ..Parameter::new("steps", ParameterType::Steps { default: vec![] })
        };
        assert!(steps.is_optional());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(ParameterType::Integer { default: None }.name(), "integer");
        assert_eq!(ParameterType::EnvVarName { default: None }.name(), "env_var_name");
        assert_eq!(ParameterType::Executor { default: None }.name(), "executor");
    }

    #[test]
    fn test_default_outside_enum() {
        let inside = Parameter::new(
            "os",
            ParameterType::Enum {
                default: Some("linux".to_string()),
                values: vec!["linux".to_string(), "macos".to_string()],
                values_range: Range::default(),
            },
        );
        let outside = Parameter::new(
            "os",
            ParameterType::Enum {
                default: Some("windows".to_string()),
                values: vec!["linux".to_string(), "macos".to_string()],
                values_range: Range::default(),
            },
        );

        assert!(!inside.has_default_outside_enum());
        assert!(outside.has_default_outside_enum());
    }

    #[test]
    fn test_default_text() {
        let param = Parameter::new("count", ParameterType::Integer { default: Some(3) });
        assert_eq!(param.default_text().as_deref(), Some("3"));
    }
}
