use indexmap::IndexMap;

use crate::{
    range::Range,
    semantic::{Parameter, Step},
};

/// A reusable command: a parameterized sequence of steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Command {
    pub name: String,
    pub name_range: Range,
    pub range: Range,
    pub description: Option<String>,
    pub description_range: Range,
    pub steps: Vec<Step>,
    pub steps_range: Range,
    pub parameters: IndexMap<String, Parameter>,
    pub parameters_range: Range,
    /// Contexts of the workflow jobs whose steps invoke this command.
    pub contexts: Vec<String>,
}
