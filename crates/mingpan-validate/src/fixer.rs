//! Auto-Fixer
//!
//! Applies the validator's corrections by rebuilding the derived fields
//! wholesale from fresh recomputation. Value semantics throughout: the
//! caller's record is never touched, and persisting the returned record is
//! the caller's decision.

use chrono::{DateTime, Utc};
use tracing::debug;

use mingpan_almanac::LunarConverter;
use mingpan_core::{BirthRecord, DerivedFields, IntegrityResult, IssueKind};

use crate::validator::{parse_canonical, recompute, Validator};

/// Result of one fix attempt
#[derive(Debug, Clone)]
pub struct FixOutcome {
    /// The record to persist; equal to the input when nothing changed
    pub record: BirthRecord,
    /// The validation that drove the fix
    pub result: IntegrityResult,
    pub changed: bool,
}

/// Rebuilds drifted records. Fixing is atomic per record: either the full
/// set of derived fields is replaced or the record is returned untouched.
pub struct AutoFixer<'a> {
    converter: &'a dyn LunarConverter,
    validator: Validator<'a>,
}

impl<'a> AutoFixer<'a> {
    pub fn new(converter: &'a dyn LunarConverter) -> Self {
        Self {
            converter,
            validator: Validator::new(converter),
        }
    }

    /// Override the 30-day staleness horizon
    pub fn with_stale_after(mut self, days: i64) -> Self {
        self.validator = Validator::new(self.converter).with_stale_after(days);
        self
    }

    pub fn fix(&self, record: &BirthRecord) -> FixOutcome {
        self.fix_at(record, Utc::now())
    }

    /// Deterministic form. `fix_at(fix_at(r, t).record, t)` yields no
    /// further corrections: the recomputation is a fixed point.
    pub fn fix_at(&self, record: &BirthRecord, now: DateTime<Utc>) -> FixOutcome {
        let result = self.validator.validate_at(record, now);

        if !result.can_calculate {
            return FixOutcome {
                record: record.clone(),
                result,
                changed: false,
            };
        }

        let stale = result.has_warning(IssueKind::StaleComputation);
        if !result.has_corrections() && !stale {
            return FixOutcome {
                record: record.clone(),
                result,
                changed: false,
            };
        }

        // can_calculate held above, so canonical inputs and the engine-owned
        // recomputation cannot fail here; degrade to "unchanged" regardless
        let canonical = match parse_canonical(&record.input) {
            Ok(canonical) => canonical,
            Err(_) => {
                return FixOutcome {
                    record: record.clone(),
                    result,
                    changed: false,
                }
            }
        };
        let recomputed = match recompute(&canonical, self.converter) {
            Ok(recomputed) => recomputed,
            Err(_) => {
                return FixOutcome {
                    record: record.clone(),
                    result,
                    changed: false,
                }
            }
        };

        // The timestamp marks a *successful* recomputation. During a
        // collaborator outage the lunar fields are carried over unverified,
        // so the stored timestamp must keep signalling their age.
        let last_computed_at = if recomputed.conversion.is_some() {
            Some(now)
        } else {
            record.derived.last_computed_at
        };
        let mut derived = DerivedFields {
            true_solar_time: Some(recomputed.true_solar_time),
            shichen: Some(recomputed.shichen_simple),
            lunar_date: None,
            bazi_pillars: None,
            wuxing: None,
            nayin: None,
            last_computed_at,
        };
        match recomputed.conversion {
            Some(conversion) => {
                derived.lunar_date = Some(conversion.lunar_date);
                derived.bazi_pillars = Some(conversion.pillars);
                derived.wuxing = Some(conversion.wuxing);
                derived.nayin = Some(conversion.nayin);
            }
            None => {
                // Collaborator down: previously stored values are preserved
                // for its fields rather than discarded
                derived.lunar_date = record.derived.lunar_date.clone();
                derived.bazi_pillars = record.derived.bazi_pillars.clone();
                derived.wuxing = record.derived.wuxing.clone();
                derived.nayin = record.derived.nayin.clone();
            }
        }

        let changed = derived != record.derived;
        debug!(
            corrections = result.corrections.len(),
            stale, changed, "rebuilt derived fields"
        );
        FixOutcome {
            record: BirthRecord {
                label: record.label.clone(),
                input: record.input.clone(),
                derived,
            },
            result,
            changed,
        }
    }
}
