//! JSON schema validation of whole configurations.
//!
//! The configuration text is decoded with `serde_yaml`, which follows
//! aliases, merge keys are applied, and the resulting data is checked
//! against a JSON schema. Violations carry the JSON pointer of the failing
//! value so they can be mapped back onto the syntax tree.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use log::{debug, trace};
use serde_json::Value;
use thiserror::Error;

use ciyaml_core::params;

/// Errors raised while loading a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("cannot read schema {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("schema is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON document is not a usable schema.
    #[error("invalid schema: {0}")]
    Invalid(String),
}

/// Errors raised while decoding a configuration into plain data.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl DecodeError {
    /// The one-based line the decoder stopped at, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            DecodeError::Yaml(err) => err.location().map(|location| location.line()),
            DecodeError::Json(_) => None,
        }
    }

    /// The decoder message without its position suffix.
    pub fn message(&self) -> String {
        let message = self.to_string();
        match message.split_once(" at line ") {
            Some((head, _)) => head.to_string(),
            None => message,
        }
    }
}

/// A value that does not match the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer of the failing value, empty for the document itself.
    pub pointer: String,
    pub message: String,
}

impl Violation {
    /// The keys and item indices of [`Violation::pointer`], unescaped.
    pub fn path(&self) -> Vec<String> {
        pointer_segments(&self.pointer)
    }
}

/// A compiled JSON schema.
pub struct SchemaValidator {
    validator: jsonschema::Validator,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator").finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Compile `schema`. The draft is taken from its `$schema` keyword.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Invalid`] if `schema` is not a valid schema.
    pub fn new(schema: &Value) -> Result<Self, SchemaError> {
        let validator =
            jsonschema::validator_for(schema).map_err(|err| SchemaError::Invalid(err.to_string()))?;
        Ok(Self { validator })
    }

    /// Read and compile the schema stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Io`] if the file cannot be read, and
    /// [`SchemaError::Json`] or [`SchemaError::Invalid`] if it does not hold
    /// a schema.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        debug!(path:? = path; "Loading JSON schema");
        let text = fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let schema: Value = serde_json::from_str(&text)?;
        Self::new(&schema)
    }

    /// Every violation of the schema by `instance`.
    ///
    /// `when` keys whose value is a bare parameter reference are exempt: the
    /// reference is only resolved when the pipeline runs.
    pub fn violations(&self, instance: &Value) -> Vec<Violation> {
        let mut exempt = Vec::new();
        parameterized_when_pointers(instance, &mut String::new(), &mut exempt);

        self.validator
            .iter_errors(instance)
            .map(|err| Violation {
                pointer: err.instance_path().to_string(),
                message: err.to_string(),
            })
            .filter(|violation| {
                let is_exempt = exempt.iter().any(|pointer| is_within(&violation.pointer, pointer));
                if is_exempt {
                    trace!(pointer = violation.pointer.as_str(); "Schema violation on parameterized `when` skipped");
                }
                !is_exempt
            })
            .collect()
    }
}

/// Decode YAML text into JSON data with aliases followed and merge keys
/// applied.
///
/// # Errors
///
/// Returns [`DecodeError::Yaml`] if the text cannot be decoded, for example
/// because a mapping repeats a key, and [`DecodeError::Json`] if the data
/// has no JSON representation.
pub fn decode(source: &str) -> Result<Value, DecodeError> {
    let mut value: serde_yaml::Value = serde_yaml::from_str(source)?;
    value.apply_merge()?;
    Ok(serde_json::to_value(value)?)
}

fn parameterized_when_pointers(value: &Value, pointer: &mut String, found: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&key.replace('~', "~0").replace('/', "~1"));
                if key == "when" && child.as_str().is_some_and(params::is_only_param) {
                    found.push(pointer.clone());
                } else {
                    parameterized_when_pointers(child, pointer, found);
                }
                pointer.truncate(len);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&index.to_string());
                parameterized_when_pointers(child, pointer, found);
                pointer.truncate(len);
            }
        }
        _ => {}
    }
}

fn is_within(pointer: &str, ancestor: &str) -> bool {
    pointer
        .strip_prefix(ancestor)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect()
}
