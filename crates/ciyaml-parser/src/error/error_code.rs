//! Error codes for the diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - YAML syntax errors
//! - `E1xx` - Structural parse findings
//! - `E2xx` - Reference resolution errors
//! - `E3xx` - Domain rules and advisories
//! - `E4xx` - Suppression directive errors

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Syntax Errors (E0xx)
    // =========================================================================
    /// Invalid YAML syntax.
    ///
    /// The syntax tree contains an `ERROR` node.
    E001,

    /// Missing token.
    ///
    /// The YAML grammar recovered by inserting a token that is absent from
    /// the source.
    E002,

    /// Missing document.
    ///
    /// The source does not contain a YAML document.
    E003,

    /// Unknown anchor.
    ///
    /// An alias references an anchor that is never defined.
    E004,

    /// Invalid merge value.
    ///
    /// A `<<` merge key has a value that is neither a mapping, an alias, nor
    /// a sequence of those.
    E005,

    /// YAML decode error.
    ///
    /// The document cannot be decoded into plain data, for example because a
    /// mapping repeats a key.
    E006,

    // =========================================================================
    // Structure Errors (E1xx)
    // =========================================================================
    /// Duplicate definition.
    ///
    /// An entity with this name is already defined in the same section.
    E100,

    /// Empty section.
    ///
    /// A top-level section is present but has no value.
    E101,

    /// Invalid value.
    ///
    /// A value does not have the shape its key expects.
    E102,

    /// Missing value.
    ///
    /// A key is present without a value.
    E103,

    /// Deprecated key.
    ///
    /// The key is still accepted but has been deprecated.
    E104,

    /// Schema violation.
    ///
    /// The document does not match the configured JSON schema.
    E105,

    // =========================================================================
    // Reference Errors (E2xx)
    // =========================================================================
    /// Undefined job.
    ///
    /// A workflow or step references a job that is not defined.
    E200,

    /// Undefined command.
    ///
    /// A step names something that is neither a built-in step, a command,
    /// a job, nor an orb entity.
    E201,

    /// Undefined executor.
    ///
    /// An executor reference does not resolve.
    E202,

    /// Undefined parameter.
    ///
    /// A parameter is used or assigned without being declared.
    E203,

    /// Missing parameter.
    ///
    /// A required parameter is not assigned at a call site.
    E204,

    /// Parameter type mismatch.
    ///
    /// An assigned value does not match the declared parameter type.
    E205,

    /// Undefined orb.
    ///
    /// An orb or an orb entity cannot be resolved.
    E206,

    /// Undefined context.
    ///
    /// A workflow job references a context that does not exist.
    E207,

    /// Dependency cycle.
    ///
    /// A workflow job is part of a `requires` cycle.
    E208,

    /// Undefined requirement.
    ///
    /// A `requires` entry names no job of the workflow.
    E209,

    // =========================================================================
    // Domain Errors (E3xx)
    // =========================================================================
    /// Unused definition.
    ///
    /// A job, command, orb or anchor is never referenced.
    E300,

    /// Invalid resource class.
    ///
    /// The resource class is not available for the executor family.
    E301,

    /// Invalid image.
    ///
    /// The machine or Windows image is not available.
    E302,

    /// Invalid Xcode version.
    ///
    /// The Xcode version is not available.
    E303,

    /// Docker image not found.
    ///
    /// The Docker image or tag does not exist on Docker Hub.
    E304,

    /// Invalid job type.
    ///
    /// The job type is not one of the known types.
    E305,

    /// Invalid run step.
    ///
    /// A `run` step setting is out of range or malformed.
    E306,

    /// Orb update available.
    ///
    /// A newer version of the orb has been published.
    E307,

    /// Name collision.
    ///
    /// The same name is used by several kinds of entities.
    E308,

    /// Shell lint finding.
    ///
    /// The shell linter reported a finding inside a `run` command.
    E309,

    /// Invalid retention.
    ///
    /// A retention duration is out of bounds.
    E310,

    /// Ignored configuration.
    ///
    /// A setting has no effect where it is written.
    E311,

    /// Orb unavailable.
    ///
    /// The orb registry could not be reached.
    E312,

    /// Deprecated image.
    ///
    /// The image comes from a deprecated namespace.
    E313,

    // =========================================================================
    // Suppression Errors (E4xx)
    // =========================================================================
    /// Unclosed ignore range.
    ///
    /// A `cci-ignore-start` has no matching `cci-ignore-end`.
    E400,

    /// Unmatched ignore end.
    ///
    /// A `cci-ignore-end` has no opening `cci-ignore-start`.
    E401,

    /// Nested ignore range.
    ///
    /// A `cci-ignore-start` appears inside an open range.
    E402,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E006 => "E006",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E105 => "E105",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
            ErrorCode::E206 => "E206",
            ErrorCode::E207 => "E207",
            ErrorCode::E208 => "E208",
            ErrorCode::E209 => "E209",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            ErrorCode::E305 => "E305",
            ErrorCode::E306 => "E306",
            ErrorCode::E307 => "E307",
            ErrorCode::E308 => "E308",
            ErrorCode::E309 => "E309",
            ErrorCode::E310 => "E310",
            ErrorCode::E311 => "E311",
            ErrorCode::E312 => "E312",
            ErrorCode::E313 => "E313",
            ErrorCode::E400 => "E400",
            ErrorCode::E401 => "E401",
            ErrorCode::E402 => "E402",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "invalid yaml syntax",
            ErrorCode::E002 => "missing token",
            ErrorCode::E003 => "missing document",
            ErrorCode::E004 => "unknown anchor",
            ErrorCode::E005 => "invalid merge value",
            ErrorCode::E006 => "yaml decode error",
            ErrorCode::E100 => "duplicate definition",
            ErrorCode::E101 => "empty section",
            ErrorCode::E102 => "invalid value",
            ErrorCode::E103 => "missing value",
            ErrorCode::E104 => "deprecated key",
            ErrorCode::E105 => "schema violation",
            ErrorCode::E200 => "undefined job",
            ErrorCode::E201 => "undefined command",
            ErrorCode::E202 => "undefined executor",
            ErrorCode::E203 => "undefined parameter",
            ErrorCode::E204 => "missing parameter",
            ErrorCode::E205 => "parameter type mismatch",
            ErrorCode::E206 => "undefined orb",
            ErrorCode::E207 => "undefined context",
            ErrorCode::E208 => "dependency cycle",
            ErrorCode::E209 => "undefined requirement",
            ErrorCode::E300 => "unused definition",
            ErrorCode::E301 => "invalid resource class",
            ErrorCode::E302 => "invalid image",
            ErrorCode::E303 => "invalid xcode version",
            ErrorCode::E304 => "docker image not found",
            ErrorCode::E305 => "invalid job type",
            ErrorCode::E306 => "invalid run step",
            ErrorCode::E307 => "orb update available",
            ErrorCode::E308 => "name collision",
            ErrorCode::E309 => "shell lint finding",
            ErrorCode::E310 => "invalid retention",
            ErrorCode::E311 => "ignored configuration",
            ErrorCode::E312 => "orb unavailable",
            ErrorCode::E313 => "deprecated image",
            ErrorCode::E400 => "unclosed ignore range",
            ErrorCode::E401 => "unmatched ignore end",
            ErrorCode::E402 => "nested ignore range",
        }
    }

    /// Returns `true` for the codes reported on malformed YAML syntax.
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            ErrorCode::E001
                | ErrorCode::E002
                | ErrorCode::E003
                | ErrorCode::E004
                | ErrorCode::E005
                | ErrorCode::E006
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
