//! The parameter substitution micro-language.
//!
//! Configuration strings may embed `<< parameters.name >>` (resolved against
//! the enclosing job, command or executor) and `<< pipeline.parameters.name >>`
//! (resolved against the pipeline parameters). Matrix jobs additionally use
//! `<< matrix.name >>`.
//!
//! All functions here are purely textual. Resolution against declared
//! parameters happens in the validation engine.

use std::sync::LazyLock;

use regex::Regex;

const REFERENCE_PATTERN: &str = r"<<\s*(parameters|pipeline\.parameters)\.([A-Za-z0-9_-]*)\s*>>";

static REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(REFERENCE_PATTERN).expect("reference pattern is valid"));

static ONLY_REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{REFERENCE_PATTERN}$")).expect("reference pattern is valid")
});

static PARTIAL_REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<<\s*(parameters|pipeline\.parameters)\.\s*(>>?|$)").expect("partial pattern is valid")
});

static PARTIAL_MATRIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<<\s*matrix\.\s*(>>?|$)").expect("matrix pattern is valid"));

static ANY_SUBSTITUTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<<[^<>]*>>").expect("substitution pattern is valid"));

/// Which parameter namespace a reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamScope {
    /// `<< parameters.x >>`, the enclosing entity's parameters.
    Local,
    /// `<< pipeline.parameters.x >>`, the document's pipeline parameters.
    Pipeline,
}

/// A parameter reference found inside a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamReference {
    /// The referenced parameter name.
    pub name: String,
    /// `parameters.name` or `pipeline.parameters.name`.
    pub full_name: String,
    pub scope: ParamScope,
    /// Byte offset of `<<` within the searched string.
    pub start: usize,
    /// Byte offset just past `>>` within the searched string.
    pub end: usize,
}

/// Returns `true` if `content` consists of exactly one parameter reference.
///
/// # Examples
///
/// ```
/// # use ciyaml_core::params::is_only_param;
/// assert!(is_only_param("<< parameters.version >>"));
/// assert!(is_only_param("<<pipeline.parameters.branch>>"));
/// assert!(!is_only_param("/home/<< parameters.user >>/Downloads"));
/// ```
pub fn is_only_param(content: &str) -> bool {
    ONLY_REFERENCE_RE.is_match(content)
}

/// Returns `true` if `content` contains at least one complete parameter
/// reference.
pub fn contains_param(content: &str) -> bool {
    REFERENCE_RE.is_match(content)
}

/// Returns `true` if `content` contains any `<< ... >>` substitution,
/// including matrix and pipeline value substitutions.
pub fn contains_substitution(content: &str) -> bool {
    ANY_SUBSTITUTION_RE.is_match(content)
}

/// Returns `true` if `content` holds a reference whose name is still missing,
/// such as `<< parameters. >>` or a trailing `<< parameters.` while it is
/// being typed.
pub fn is_partial_param_reference(content: &str) -> bool {
    PARTIAL_REFERENCE_RE.is_match(content)
}

/// Returns `true` if `content` holds a partial `<< matrix. >>` reference.
pub fn is_partial_matrix_reference(content: &str) -> bool {
    PARTIAL_MATRIX_RE.is_match(content)
}

/// Split a reference into its full dotted path and its parameter name.
///
/// # Examples
///
/// ```
/// # use ciyaml_core::params::extract_param_name;
/// let (full, name) = extract_param_name("<< pipeline.parameters.branch >>");
/// assert_eq!(full, "pipeline.parameters.branch");
/// assert_eq!(name, "branch");
/// ```
pub fn extract_param_name(reference: &str) -> (String, String) {
    let full = reference
        .trim_matches('<')
        .trim_matches('>')
        .trim_matches(' ')
        .to_string();
    let name = full.rsplit('.').next().unwrap_or_default().to_string();

    (full, name)
}

/// Find every complete parameter reference in `content`.
pub fn find_param_references(content: &str) -> Vec<ParamReference> {
    REFERENCE_RE
        .captures_iter(content)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let scope = match captures.get(1).map(|m| m.as_str()) {
                Some("parameters") => ParamScope::Local,
                _ => ParamScope::Pipeline,
            };
            let (full_name, name) = extract_param_name(whole.as_str());

            Some(ParamReference {
                name,
                full_name,
                scope,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Return the name of the parameter referenced around byte offset `index`.
///
/// The reference must start before `index` on the same line. When a line
/// holds several references, the last one opened before `index` wins.
pub fn param_name_used_at(content: &str, index: usize) -> Option<ParamReference> {
    let index = index.min(content.len());
    let line_start = content[..index].rfind('\n').map_or(0, |pos| pos + 1);
    let line_end = content[index..]
        .find('\n')
        .map_or(content.len(), |offset| index + offset);
    let line = &content[line_start..line_end];

    find_param_references(line)
        .into_iter()
        .filter(|reference| line_start + reference.start <= index)
        .last()
        .map(|reference| ParamReference {
            start: reference.start + line_start,
            end: reference.end + line_start,
            ..reference
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_only_param() {
        assert!(is_only_param("<< parameters.name >>"));
        assert!(is_only_param("<<parameters.name>>"));
        assert!(is_only_param("<< pipeline.parameters.my-param >>"));
        assert!(!is_only_param("prefix << parameters.name >>"));
        assert!(!is_only_param("<< matrix.name >>"));
        assert!(!is_only_param("plain text"));
        assert!(!is_only_param("<< parameters.a^b >>"));
        assert!(!is_only_param("<< parameters.a[0] >>"));
    }

    #[test]
    fn test_contains_param() {
        assert!(contains_param("echo << parameters.greeting >> world"));
        assert!(!contains_param("echo << matrix.os >>"));
        assert!(contains_substitution("echo << matrix.os >>"));
        assert!(!contains_substitution("echo hello"));
    }

    #[test]
    fn test_partial_references() {
        assert!(is_partial_param_reference("<< parameters."));
        assert!(is_partial_param_reference("<< pipeline.parameters. >>"));
        assert!(is_partial_param_reference("echo << parameters.>"));
        assert!(!is_partial_param_reference("<< parameters.name >>"));
        assert!(!is_partial_param_reference("<< pipeline.parameters.name >>"));
        assert!(!is_partial_param_reference("<< parameters.name"));
        assert!(!is_partial_param_reference("<< pipelineXparameters. >>"));
        assert!(is_partial_matrix_reference("<< matrix. >>"));
        assert!(is_partial_matrix_reference("<< matrix."));
        assert!(!is_partial_matrix_reference("<< matrix.os >>"));
    }

    #[test]
    fn test_extract_param_name() {
        let (full, name) = extract_param_name("<< parameters.version >>");

        assert_eq!(full, "parameters.version");
        assert_eq!(name, "version");
    }

    #[test]
    fn test_find_param_references() {
        let content = "<< parameters.a >>-<< pipeline.parameters.b >>";
        let refs = find_param_references(content);

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].name, "a");
        assert_eq!(refs[0].scope, ParamScope::Local);
        assert_eq!(refs[0].start, 0);
        assert_eq!(refs[0].end, 18);
        assert_eq!(refs[1].name, "b");
        assert_eq!(refs[1].scope, ParamScope::Pipeline);
        assert_eq!(refs[1].full_name, "pipeline.parameters.b");
    }

    #[test]
    fn test_param_name_used_at() {
        let content = "steps:\n  - run: echo << parameters.a >> << parameters.b >>\n";
        let second = content.find("parameters.b").unwrap_or_default();

        let reference = param_name_used_at(content, second).expect("reference expected");
        assert_eq!(reference.name, "b");
        assert_eq!(&content[reference.start..reference.end], "<< parameters.b >>");

        assert!(param_name_used_at(content, 2).is_none());
    }
}
