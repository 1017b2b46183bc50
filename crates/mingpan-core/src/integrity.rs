//! Per-record validation result
//!
//! Ephemeral: produced by one `validate` call, rendered or discarded, never
//! persisted. Only accepted corrections are persisted, by the caller.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IssueKind;

/// A single validation finding, fatal or not depending on its kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// A suggested replacement for one drifted derived field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    /// Stored value, absent when the field was never computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<String>,
    pub new: String,
}

/// Outcome of validating one record.
///
/// `valid` is false only on fatal errors; drift and staleness are warnings.
/// `can_calculate` is false when the canonical inputs are unusable and no
/// recomputation was possible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityResult {
    pub valid: bool,
    pub can_calculate: bool,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
    pub corrections: BTreeMap<String, Correction>,
    pub timestamp: DateTime<Utc>,
}

impl IntegrityResult {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            valid: true,
            can_calculate: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            corrections: BTreeMap::new(),
            timestamp,
        }
    }

    pub fn add_error(&mut self, issue: Issue) {
        self.valid = false;
        self.errors.push(issue);
    }

    pub fn add_warning(&mut self, issue: Issue) {
        self.warnings.push(issue);
    }

    pub fn add_correction(
        &mut self,
        field: impl Into<String>,
        old: Option<String>,
        new: impl Into<String>,
    ) {
        self.corrections.insert(
            field.into(),
            Correction {
                old,
                new: new.into(),
            },
        );
    }

    pub fn has_corrections(&self) -> bool {
        !self.corrections.is_empty()
    }

    /// True when any warning of the given kind was recorded
    pub fn has_warning(&self, kind: IssueKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_flip_valid() {
        let mut result = IntegrityResult::new(Utc::now());
        assert!(result.valid);

        result.add_warning(Issue::new(IssueKind::StaleComputation, "old data"));
        assert!(result.valid);

        result.add_error(Issue::new(IssueKind::MissingField, "no date").with_field("date"));
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_corrections_keyed_by_field() {
        let mut result = IntegrityResult::new(Utc::now());
        result.add_correction("shichen", Some("巳时".into()), "午时");
        result.add_correction("shichen", Some("巳时".into()), "午时");
        assert_eq!(result.corrections.len(), 1);
        assert_eq!(result.corrections["shichen"].new, "午时");
        assert!(result.has_corrections());
    }

    #[test]
    fn test_has_warning_by_kind() {
        let mut result = IntegrityResult::new(Utc::now());
        result.add_warning(Issue::new(IssueKind::DerivedFieldDrift, "drift"));
        assert!(result.has_warning(IssueKind::DerivedFieldDrift));
        assert!(!result.has_warning(IssueKind::StaleComputation));
    }
}
