//! Error types for the archive loader
//!
//! Two layers, deliberately separate: [`ArchiveError`] covers container-level
//! problems that are always fatal (missing file, unreadable zip, I/O), while
//! [`DecodeFailure`] covers a single bad line and is handled according to the
//! active error policy.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Archive loader errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("archive not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("archive cannot be read as a zip container: {0}")]
    Corrupt(#[source] zip::result::ZipError),

    #[error("unsupported compression method {method} for member {member}")]
    UnsupportedCompression {
        member: &'static str,
        method: String,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A per-line failure promoted to a terminal error under fail-fast policy.
    #[error("{member}:{line}: {failure}")]
    Decode {
        member: &'static str,
        line: usize,
        #[source]
        failure: DecodeFailure,
    },
}

/// Category of a per-line decode failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Line is not valid UTF-8
    Encoding,
    /// Line is not a syntactically valid JSON value
    Syntax,
    /// Required field missing, wrong value kind, or not a JSON object
    SchemaViolation,
    /// Enumerated field holds a code outside its declared domain
    UnknownEnumValue,
    /// Field not declared by the schema, under the strict unknown-field policy
    UnexpectedField,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Encoding => "invalid UTF-8",
            FailureKind::Syntax => "invalid JSON",
            FailureKind::SchemaViolation => "schema violation",
            FailureKind::UnknownEnumValue => "unknown enum value",
            FailureKind::UnexpectedField => "unexpected field",
        };
        f.write_str(label)
    }
}

/// One categorized decode failure for a single line.
///
/// `field` names the offending field (dotted path for nested values, e.g.
/// `favorite.wish`); `value` carries the offending raw value rendered as
/// text. Either may be absent when the failure is not field-specific
/// (encoding and syntax failures).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    pub kind: FailureKind,
    pub field: Option<String>,
    pub value: Option<String>,
}

impl DecodeFailure {
    pub(crate) fn with_field(kind: FailureKind, field: impl Into<String>) -> Self {
        Self {
            kind,
            field: Some(field.into()),
            value: None,
        }
    }

    pub(crate) fn with_value(
        kind: FailureKind,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field: Some(field.into()),
            value: Some(value.into()),
        }
    }

    pub(crate) fn value_only(kind: FailureKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            value: Some(value.into()),
        }
    }
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(field) = &self.field {
            write!(f, " at field `{field}`")?;
        }
        if let Some(value) = &self.value {
            write!(f, " (value: {value})")?;
        }
        Ok(())
    }
}

impl std::error::Error for DecodeFailure {}

/// A decode failure retained under collect policy, with enough context to
/// locate and fix the source line: member name and zero-based physical line
/// number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFailure {
    pub member: &'static str,
    pub line: usize,
    pub failure: DecodeFailure,
}

impl fmt::Display for RecordedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.member, self.line, self.failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_failure_display_includes_field_and_value() {
        let failure = DecodeFailure::with_value(FailureKind::UnknownEnumValue, "type", "999");
        assert_eq!(
            failure.to_string(),
            "unknown enum value at field `type` (value: 999)"
        );
    }

    #[test]
    fn recorded_failure_display_names_member_and_line() {
        let recorded = RecordedFailure {
            member: "episode.jsonlines",
            line: 7,
            failure: DecodeFailure {
                kind: FailureKind::Syntax,
                field: None,
                value: None,
            },
        };
        assert_eq!(recorded.to_string(), "episode.jsonlines:7: invalid JSON");
    }
}
