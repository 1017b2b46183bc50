//! Aggregated batch outcome
//!
//! Ephemeral like `IntegrityResult`: built per batch call, rendered by the
//! report crate, never persisted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::integrity::{Correction, IntegrityResult, Issue};

/// Final status of one record inside a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Validation passed (batch-validate only)
    Valid,
    /// Fatal errors; the record could not be (re)computed
    Invalid,
    /// Corrections or a timestamp refresh were applied (batch-fix only)
    Fixed,
    /// Nothing to change (batch-fix only)
    Unchanged,
    /// Not processed: the batch was cancelled before reaching this record
    Skipped,
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let tag = match self {
            RecordStatus::Valid => "valid",
            RecordStatus::Invalid => "invalid",
            RecordStatus::Fixed => "fixed",
            RecordStatus::Unchanged => "unchanged",
            RecordStatus::Skipped => "skipped",
        };
        write!(f, "{}", tag)
    }
}

/// Per-record detail entry in a batch report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub status: RecordStatus,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
    pub corrections: BTreeMap<String, Correction>,
}

impl RecordOutcome {
    /// Build a detail entry from one record's integrity result
    pub fn from_result(
        index: usize,
        label: Option<String>,
        status: RecordStatus,
        result: IntegrityResult,
    ) -> Self {
        Self {
            index,
            label,
            status,
            errors: result.errors,
            warnings: result.warnings,
            corrections: result.corrections,
        }
    }

    /// Marker entry for a record the batch never reached
    pub fn skipped(index: usize, label: Option<String>) -> Self {
        Self {
            index,
            label,
            status: RecordStatus::Skipped,
            errors: Vec::new(),
            warnings: Vec::new(),
            corrections: BTreeMap::new(),
        }
    }
}

/// Aggregated outcome of a batch validate or batch fix run.
///
/// `valid_count` counts every record that ended usable: `Valid` plus, for
/// fix runs, `Fixed` and `Unchanged`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub fixed_count: usize,
    pub unchanged_count: usize,
    pub skipped_count: usize,
    pub details: Vec<RecordOutcome>,
    pub generated_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn new(total: usize, generated_at: DateTime<Utc>) -> Self {
        Self {
            total,
            valid_count: 0,
            invalid_count: 0,
            fixed_count: 0,
            unchanged_count: 0,
            skipped_count: 0,
            details: Vec::with_capacity(total),
            generated_at,
        }
    }

    /// Append a detail entry, maintaining the aggregate counters
    pub fn push(&mut self, outcome: RecordOutcome) {
        match outcome.status {
            RecordStatus::Valid => self.valid_count += 1,
            RecordStatus::Invalid => self.invalid_count += 1,
            RecordStatus::Fixed => {
                self.fixed_count += 1;
                self.valid_count += 1;
            }
            RecordStatus::Unchanged => {
                self.unchanged_count += 1;
                self.valid_count += 1;
            }
            RecordStatus::Skipped => self.skipped_count += 1,
        }
        self.details.push(outcome);
    }

    /// Total errors across all detail entries
    pub fn error_count(&self) -> usize {
        self.details.iter().map(|d| d.errors.len()).sum()
    }

    /// Total warnings across all detail entries
    pub fn warning_count(&self) -> usize {
        self.details.iter().map(|d| d.warnings.len()).sum()
    }

    /// Total suggested corrections across all detail entries
    pub fn correction_count(&self) -> usize {
        self.details.iter().map(|d| d.corrections.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IssueKind;

    #[test]
    fn test_counters_follow_status() {
        let mut report = BatchReport::new(4, Utc::now());
        let now = Utc::now();

        report.push(RecordOutcome::from_result(
            0,
            None,
            RecordStatus::Valid,
            IntegrityResult::new(now),
        ));
        report.push(RecordOutcome::from_result(
            1,
            None,
            RecordStatus::Fixed,
            IntegrityResult::new(now),
        ));
        report.push(RecordOutcome::from_result(
            2,
            None,
            RecordStatus::Invalid,
            IntegrityResult::new(now),
        ));
        report.push(RecordOutcome::skipped(3, None));

        assert_eq!(report.valid_count, 2); // valid + fixed
        assert_eq!(report.fixed_count, 1);
        assert_eq!(report.invalid_count, 1);
        assert_eq!(report.skipped_count, 1);
        assert_eq!(report.details.len(), 4);
    }

    #[test]
    fn test_fix_run_counters_fold_into_valid() {
        // Fix runs never emit `Valid` directly; `Fixed` and `Unchanged` both
        // count as usable records in the statistics block
        let now = Utc::now();
        let mut report = BatchReport::new(3, now);
        report.push(RecordOutcome::from_result(
            0,
            None,
            RecordStatus::Fixed,
            IntegrityResult::new(now),
        ));
        report.push(RecordOutcome::from_result(
            1,
            None,
            RecordStatus::Unchanged,
            IntegrityResult::new(now),
        ));
        report.push(RecordOutcome::from_result(
            2,
            None,
            RecordStatus::Invalid,
            IntegrityResult::new(now),
        ));

        assert_eq!(report.valid_count, 2);
        assert_eq!(report.fixed_count, 1);
        assert_eq!(report.unchanged_count, 1);
        assert_eq!(report.invalid_count, 1);
        assert_eq!(
            report.valid_count + report.invalid_count + report.skipped_count,
            report.total
        );
    }

    #[test]
    fn test_issue_totals() {
        let now = Utc::now();
        let mut result = IntegrityResult::new(now);
        result.add_warning(Issue::new(IssueKind::DerivedFieldDrift, "drift"));
        result.add_correction("lunar_date", None, "庚午年 腊月初五");

        let mut report = BatchReport::new(1, now);
        report.push(RecordOutcome::from_result(0, None, RecordStatus::Valid, result));

        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.correction_count(), 1);
    }
}
