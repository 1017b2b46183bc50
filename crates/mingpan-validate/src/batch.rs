//! Batch Orchestrator
//!
//! Maps the validator and fixer over record collections. Records are
//! processed independently: one malformed record gets its own `Invalid`
//! detail entry and never disturbs its siblings. Cancellation is
//! cooperative; records the batch never reached are emitted as explicit
//! `Skipped` markers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use mingpan_almanac::LunarConverter;
use mingpan_core::{BatchReport, BirthRecord, RecordOutcome, RecordStatus};

use crate::fixer::AutoFixer;
use crate::validator::Validator;

/// Cooperative cancellation handle, cloneable across threads
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }
}

/// Validate a collection of records and aggregate the outcomes
pub fn batch_validate(records: &[BirthRecord], converter: &dyn LunarConverter) -> BatchReport {
    batch_validate_with(records, converter, Utc::now(), &CancelFlag::new())
}

/// Deterministic, cancellable form of [`batch_validate`]
pub fn batch_validate_with(
    records: &[BirthRecord],
    converter: &dyn LunarConverter,
    now: DateTime<Utc>,
    cancel: &CancelFlag,
) -> BatchReport {
    let validator = Validator::new(converter);
    let mut report = BatchReport::new(records.len(), now);

    for (index, record) in records.iter().enumerate() {
        if cancel.is_cancelled() {
            report.push(RecordOutcome::skipped(index, record.label.clone()));
            continue;
        }

        let result = validator.validate_at(record, now);
        let status = if result.valid {
            RecordStatus::Valid
        } else {
            RecordStatus::Invalid
        };
        debug!(index, %status, "batch validate");
        report.push(RecordOutcome::from_result(
            index,
            record.label.clone(),
            status,
            result,
        ));
    }

    info!(
        total = report.total,
        valid = report.valid_count,
        invalid = report.invalid_count,
        skipped = report.skipped_count,
        "batch validation finished"
    );
    report
}

/// Result of a batch fix: the records to persist, in input order, plus the
/// aggregated report
#[derive(Debug, Clone)]
pub struct BatchFix {
    pub records: Vec<BirthRecord>,
    pub report: BatchReport,
}

/// Fix a collection of records. Skipped and uncomputable records come back
/// unchanged; the caller decides what to persist.
pub fn batch_fix(records: &[BirthRecord], converter: &dyn LunarConverter) -> BatchFix {
    batch_fix_with(records, converter, Utc::now(), &CancelFlag::new())
}

/// Deterministic, cancellable form of [`batch_fix`]
pub fn batch_fix_with(
    records: &[BirthRecord],
    converter: &dyn LunarConverter,
    now: DateTime<Utc>,
    cancel: &CancelFlag,
) -> BatchFix {
    let fixer = AutoFixer::new(converter);
    let mut report = BatchReport::new(records.len(), now);
    let mut fixed_records = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        if cancel.is_cancelled() {
            report.push(RecordOutcome::skipped(index, record.label.clone()));
            fixed_records.push(record.clone());
            continue;
        }

        let outcome = fixer.fix_at(record, now);
        let status = if !outcome.result.can_calculate {
            RecordStatus::Invalid
        } else if outcome.changed {
            RecordStatus::Fixed
        } else {
            RecordStatus::Unchanged
        };
        debug!(index, %status, "batch fix");
        report.push(RecordOutcome::from_result(
            index,
            record.label.clone(),
            status,
            outcome.result,
        ));
        fixed_records.push(outcome.record);
    }

    info!(
        total = report.total,
        fixed = report.fixed_count,
        unchanged = report.unchanged_count,
        invalid = report.invalid_count,
        skipped = report.skipped_count,
        "batch fix finished"
    );
    BatchFix {
        records: fixed_records,
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mingpan_almanac::StaticConverter;
    use mingpan_core::BirthInput;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn good_record() -> BirthRecord {
        BirthRecord::new(BirthInput::new("1990-01-01", "12:30").with_location(116.40, 39.90))
    }

    #[test]
    fn test_cancelled_batch_marks_remaining() {
        let converter = StaticConverter::sample();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let records = vec![good_record(), good_record()];
        let report = batch_validate_with(&records, &converter, fixed_now(), &cancel);
        assert_eq!(report.total, 2);
        assert_eq!(report.skipped_count, 2);
        assert!(report
            .details
            .iter()
            .all(|d| d.status == RecordStatus::Skipped));
    }

    #[test]
    fn test_cancelled_fix_returns_originals() {
        let converter = StaticConverter::sample();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let records = vec![good_record()];
        let fix = batch_fix_with(&records, &converter, fixed_now(), &cancel);
        assert_eq!(fix.records, records);
        assert_eq!(fix.report.skipped_count, 1);
    }

    #[test]
    fn test_fix_then_validate_is_clean() {
        let converter = StaticConverter::sample();
        let records = vec![good_record(), good_record()];

        let fix = batch_fix_with(&records, &converter, fixed_now(), &CancelFlag::new());
        assert_eq!(fix.report.fixed_count, 2);

        let report =
            batch_validate_with(&fix.records, &converter, fixed_now(), &CancelFlag::new());
        assert_eq!(report.valid_count, 2);
        assert_eq!(report.correction_count(), 0);
    }
}
