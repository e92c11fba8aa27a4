//! YAML 1.1 scalar classification.
//!
//! The pipeline format accepts the YAML 1.1 boolean spellings. Literals are
//! matched exactly as written; `True` or `YES` are not booleans.

/// Literals read as `true`.
pub const TRUE_LITERALS: &[&str] = &["true", "yes", "y", "1", "on"];

/// Literals read as `false`.
pub const FALSE_LITERALS: &[&str] = &["false", "no", "n", "0", "off"];

/// Returns `true` if `text` is any YAML 1.1 boolean literal.
///
/// # Examples
///
/// ```
/// # use ciyaml_core::scalar::is_yaml_bool;
/// assert!(is_yaml_bool("yes"));
/// assert!(is_yaml_bool("0"));
/// assert!(!is_yaml_bool("Yes"));
/// ```
pub fn is_yaml_bool(text: &str) -> bool {
    TRUE_LITERALS.contains(&text) || FALSE_LITERALS.contains(&text)
}

/// Read a YAML 1.1 boolean literal.
///
/// Returns `None` when `text` is not one of the accepted spellings.
pub fn parse_yaml_bool(text: &str) -> Option<bool> {
    if TRUE_LITERALS.contains(&text) {
        Some(true)
    } else if FALSE_LITERALS.contains(&text) {
        Some(false)
    } else {
        None
    }
}

/// Returns `true` if `text` is a boolean literal that is not also a number.
///
/// `1` and `0` are classified as integers by the parser, every other literal
/// of the table is a boolean.
pub fn is_word_bool(text: &str) -> bool {
    is_yaml_bool(text) && !text.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_bool_true() {
        for literal in ["true", "yes", "y", "1", "on"] {
            assert_eq!(parse_yaml_bool(literal), Some(true), "{literal}");
        }
    }

    #[test]
    fn test_parse_yaml_bool_false() {
        for literal in ["false", "no", "n", "0", "off"] {
            assert_eq!(parse_yaml_bool(literal), Some(false), "{literal}");
        }
    }

    #[test]
    fn test_parse_yaml_bool_is_case_sensitive() {
        assert_eq!(parse_yaml_bool("True"), None);
        assert_eq!(parse_yaml_bool("OFF"), None);
        assert_eq!(parse_yaml_bool("maybe"), None);
    }

    #[test]
    fn test_is_word_bool() {
        assert!(is_word_bool("on"));
        assert!(is_word_bool("n"));
        assert!(!is_word_bool("1"));
        assert!(!is_word_bool("0"));
        assert!(!is_word_bool("10"));
    }
}
