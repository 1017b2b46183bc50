//! Unified error model
//!
//! Fatal errors abort the computation for one record; non-fatal kinds only
//! exist as report-level issues and never as `EngineError` values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Unparsable date or time string
    #[error("FORMAT/{field}: {message}")]
    InputFormat { field: &'static str, message: String },

    /// Value outside the supported horizon or coordinate range
    #[error("RANGE/{field}: {message}")]
    InputRange { field: &'static str, message: String },

    /// Required canonical field absent
    #[error("MISSING/{field}: required field is absent")]
    MissingField { field: &'static str },

    /// Token that cannot be normalized to one of the 12 branches
    #[error("SHICHEN/{token}: unrecognized shichen token")]
    UnrecognizedShichenToken { token: String },

    /// Lunar conversion collaborator failed or is unreachable
    #[error("CONVERT/unavailable: {reason}")]
    CollaboratorUnavailable { reason: String },
}

impl EngineError {
    pub fn format(field: &'static str, message: impl Into<String>) -> Self {
        Self::InputFormat { field, message: message.into() }
    }

    pub fn range(field: &'static str, message: impl Into<String>) -> Self {
        Self::InputRange { field, message: message.into() }
    }

    pub fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// The issue kind this error maps to when surfaced in a report
    pub fn issue_kind(&self) -> IssueKind {
        match self {
            Self::InputFormat { .. } => IssueKind::InputFormat,
            Self::InputRange { .. } => IssueKind::InputRange,
            Self::MissingField { .. } => IssueKind::MissingField,
            Self::UnrecognizedShichenToken { .. } => IssueKind::UnrecognizedShichenToken,
            Self::CollaboratorUnavailable { .. } => IssueKind::CollaboratorUnavailable,
        }
    }

    /// The input field the error is attached to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InputFormat { field, .. }
            | Self::InputRange { field, .. }
            | Self::MissingField { field } => Some(field),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Classification of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    InputFormat,
    InputRange,
    MissingField,
    UnrecognizedShichenToken,
    /// Stored derived value disagrees with its recomputation; always paired
    /// with a suggested correction
    DerivedFieldDrift,
    /// Derived values are older than the staleness horizon; no correction
    StaleComputation,
    CollaboratorUnavailable,
}

impl IssueKind {
    /// Fatal kinds make the record invalid and stop further recomputation
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            IssueKind::InputFormat | IssueKind::InputRange | IssueKind::MissingField
        )
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let tag = match self {
            IssueKind::InputFormat => "format",
            IssueKind::InputRange => "range",
            IssueKind::MissingField => "missing",
            IssueKind::UnrecognizedShichenToken => "shichen-token",
            IssueKind::DerivedFieldDrift => "drift",
            IssueKind::StaleComputation => "stale",
            IssueKind::CollaboratorUnavailable => "collaborator",
        };
        write!(f, "{}", tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_tags() {
        let err = EngineError::format("date", "expected YYYY-MM-DD");
        assert_eq!(err.to_string(), "FORMAT/date: expected YYYY-MM-DD");

        let err = EngineError::missing("location");
        assert!(err.to_string().starts_with("MISSING/location"));
    }

    #[test]
    fn test_issue_kind_mapping() {
        let err = EngineError::range("longitude", "out of range");
        assert_eq!(err.issue_kind(), IssueKind::InputRange);
        assert!(err.issue_kind().is_fatal());

        let err = EngineError::CollaboratorUnavailable { reason: "down".into() };
        assert!(!err.issue_kind().is_fatal());
        assert_eq!(err.field(), None);
    }

    #[test]
    fn test_issue_kind_serialization() {
        let json = serde_json::to_string(&IssueKind::DerivedFieldDrift).unwrap();
        assert_eq!(json, "\"derived_field_drift\"");
    }
}
