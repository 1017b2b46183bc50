//! Consistency Validator
//!
//! One source of truth for every error and warning kind the engine emits.
//! Per record: FormatCheck → RangeCheck → Recompute → Diff → Classify →
//! Emit. Fatal input problems short-circuit before recomputation; drift and
//! staleness are warnings, never errors.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use tracing::{debug, warn};

use mingpan_almanac::{shichen, solar, LunarConversion, LunarConverter};
use mingpan_core::{
    fields, BirthInput, BirthRecord, EngineError, IntegrityResult, Issue, IssueKind, Result,
};

/// Derived values older than this trigger a staleness warning
pub const DEFAULT_STALE_AFTER_DAYS: i64 = 30;

/// Canonical inputs after format and range checks
pub(crate) struct Canonical {
    pub date: NaiveDate,
    pub date_str: String,
    pub time_str: String,
    pub longitude: f64,
}

/// Check the canonical input fields, collecting every fatal issue rather
/// than stopping at the first.
pub(crate) fn parse_canonical(input: &BirthInput) -> std::result::Result<Canonical, Vec<Issue>> {
    let mut issues = Vec::new();

    let date = match input.date() {
        None => {
            issues.push(issue_for(&EngineError::missing(fields::DATE)));
            None
        }
        Some(raw) => match solar::parse_date(raw) {
            Ok(parsed) => Some((parsed, raw.to_string())),
            Err(e) => {
                issues.push(issue_for(&e));
                None
            }
        },
    };

    let time = match input.time() {
        None => {
            issues.push(issue_for(&EngineError::missing(fields::TIME)));
            None
        }
        Some(raw) => match solar::parse_time(raw) {
            Ok(_) => Some(raw.to_string()),
            Err(e) => {
                issues.push(issue_for(&e));
                None
            }
        },
    };

    let longitude = match &input.location {
        None => {
            issues.push(issue_for(&EngineError::missing(fields::LOCATION)));
            None
        }
        Some(location) => {
            let mut ok = true;
            if let Err(e) = solar::check_longitude(location.longitude) {
                issues.push(issue_for(&e));
                ok = false;
            }
            if let Err(e) = solar::check_latitude(location.latitude) {
                issues.push(issue_for(&e));
                ok = false;
            }
            ok.then_some(location.longitude)
        }
    };

    match (date, time, longitude) {
        (Some((date, date_str)), Some(time_str), Some(longitude)) if issues.is_empty() => {
            Ok(Canonical {
                date,
                date_str,
                time_str,
                longitude,
            })
        }
        _ => Err(issues),
    }
}

fn issue_for(error: &EngineError) -> Issue {
    let issue = Issue::new(error.issue_kind(), error.to_string());
    match error.field() {
        Some(field) => issue.with_field(field),
        None => issue,
    }
}

/// Freshly recomputed derived values for one record
pub(crate) struct Recomputed {
    pub true_solar_time: String,
    pub shichen_simple: String,
    /// `None` when the collaborator was unavailable
    pub conversion: Option<LunarConversion>,
    pub collaborator_error: Option<EngineError>,
}

/// Recompute every derived quantity from canonical inputs. The solar
/// corrector feeds both the shichen resolver and the lunar collaborator;
/// a collaborator failure degrades instead of propagating.
pub(crate) fn recompute(
    canonical: &Canonical,
    converter: &dyn LunarConverter,
) -> Result<Recomputed> {
    let true_solar_time = solar::true_solar_time(
        &canonical.date_str,
        &canonical.time_str,
        canonical.longitude,
    )?;
    let solar_clock: NaiveTime = solar::parse_time(&true_solar_time)?;
    let resolved = shichen::resolve(solar_clock.hour(), solar_clock.minute())?;

    let (conversion, collaborator_error) =
        match converter.convert(canonical.date, solar_clock) {
            Ok(conversion) => (Some(conversion), None),
            Err(e) => {
                warn!(error = %e, "lunar conversion collaborator unavailable");
                (None, Some(e))
            }
        };

    Ok(Recomputed {
        true_solar_time,
        shichen_simple: resolved.display_simple(),
        conversion,
        collaborator_error,
    })
}

/// Validates one record against fresh recomputation of its derived fields.
///
/// Pure apart from the injected collaborator: `validate_at` with a fixed
/// `now` is fully deterministic, so records may be validated concurrently
/// without locking.
pub struct Validator<'a> {
    converter: &'a dyn LunarConverter,
    stale_after: Duration,
}

impl<'a> Validator<'a> {
    pub fn new(converter: &'a dyn LunarConverter) -> Self {
        Self {
            converter,
            stale_after: Duration::days(DEFAULT_STALE_AFTER_DAYS),
        }
    }

    /// Override the 30-day staleness horizon
    pub fn with_stale_after(mut self, days: i64) -> Self {
        self.stale_after = Duration::days(days);
        self
    }

    pub fn validate(&self, record: &BirthRecord) -> IntegrityResult {
        self.validate_at(record, Utc::now())
    }

    /// Deterministic form: staleness and the result timestamp are computed
    /// against the supplied clock.
    pub fn validate_at(&self, record: &BirthRecord, now: DateTime<Utc>) -> IntegrityResult {
        let mut result = IntegrityResult::new(now);

        // FormatCheck + RangeCheck: fatal, record-local
        let canonical = match parse_canonical(&record.input) {
            Ok(canonical) => canonical,
            Err(issues) => {
                for issue in issues {
                    result.add_error(issue);
                }
                result.can_calculate = false;
                debug!(errors = result.errors.len(), "record failed input checks");
                return result;
            }
        };

        // Stored shichen tokens are checked even before diffing so that a
        // corrupt token is reported as such, not only as drift
        if let Some(token) = record.derived.shichen.as_deref() {
            if let Err(e) = shichen::normalize(token) {
                result.add_warning(
                    Issue::new(IssueKind::UnrecognizedShichenToken, e.to_string())
                        .with_field(fields::SHICHEN),
                );
            }
        }

        // Recompute
        let recomputed = match recompute(&canonical, self.converter) {
            Ok(recomputed) => recomputed,
            Err(e) => {
                // Unreachable after the input checks, but never swallowed
                result.add_error(issue_for(&e));
                result.can_calculate = false;
                return result;
            }
        };

        // Diff: exact equality on canonical display forms
        diff_field(
            &mut result,
            fields::TRUE_SOLAR_TIME,
            record.derived.true_solar_time.as_deref(),
            &recomputed.true_solar_time,
        );
        diff_field(
            &mut result,
            fields::SHICHEN,
            record.derived.shichen.as_deref(),
            &recomputed.shichen_simple,
        );

        match (&recomputed.conversion, &recomputed.collaborator_error) {
            (Some(conversion), _) => {
                diff_field(
                    &mut result,
                    fields::LUNAR_DATE,
                    record.derived.lunar_date.as_deref(),
                    &conversion.lunar_date,
                );
                let stored_pillars = record.derived.bazi_pillars.as_ref().map(|p| p.to_string());
                diff_field(
                    &mut result,
                    fields::BAZI_PILLARS,
                    stored_pillars.as_deref(),
                    &conversion.pillars.to_string(),
                );
                diff_field(
                    &mut result,
                    fields::WUXING,
                    record.derived.wuxing.as_deref(),
                    &conversion.wuxing,
                );
                diff_field(
                    &mut result,
                    fields::NAYIN,
                    record.derived.nayin.as_deref(),
                    &conversion.nayin,
                );
            }
            (None, Some(e)) => {
                // Degrade: stored collaborator fields keep their values and
                // are marked uncertain rather than corrected
                result.add_warning(
                    Issue::new(IssueKind::CollaboratorUnavailable, e.to_string())
                        .with_field(fields::LUNAR_DATE),
                );
            }
            (None, None) => {}
        }

        // Staleness signals "recompute", not "this value is wrong". Derived
        // values without any timestamp are of unknown age and treated alike.
        match record.derived.last_computed_at {
            Some(last) if now - last > self.stale_after => {
                let days = (now - last).num_days();
                result.add_warning(
                    Issue::new(
                        IssueKind::StaleComputation,
                        format!("derived fields last computed {} days ago", days),
                    )
                    .with_field(fields::LAST_COMPUTED_AT),
                );
            }
            None if record.derived.has_values() => {
                result.add_warning(
                    Issue::new(
                        IssueKind::StaleComputation,
                        "derived fields present but computation time never recorded",
                    )
                    .with_field(fields::LAST_COMPUTED_AT),
                );
            }
            _ => {}
        }

        debug!(
            valid = result.valid,
            warnings = result.warnings.len(),
            corrections = result.corrections.len(),
            "record validated"
        );
        result
    }
}

/// Compare one stored derived value against its recomputation; a missing or
/// differing value becomes a drift warning paired with a correction.
fn diff_field(result: &mut IntegrityResult, field: &str, stored: Option<&str>, fresh: &str) {
    match stored {
        None => {
            result.add_warning(
                Issue::new(
                    IssueKind::DerivedFieldDrift,
                    format!("{} missing, recomputed as `{}`", field, fresh),
                )
                .with_field(field),
            );
            result.add_correction(field, None, fresh);
        }
        Some(stored) if stored != fresh => {
            result.add_warning(
                Issue::new(
                    IssueKind::DerivedFieldDrift,
                    format!("{} stored as `{}` but recomputed as `{}`", field, stored, fresh),
                )
                .with_field(field),
            );
            result.add_correction(field, Some(stored.to_string()), fresh);
        }
        Some(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mingpan_almanac::{StaticConverter, UnavailableConverter};
    use mingpan_core::{BaziPillars, BirthInput, DerivedFields};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn beijing_record() -> BirthRecord {
        BirthRecord::new(BirthInput::new("1990-01-01", "12:30").with_location(116.40, 39.90))
    }

    /// A record whose derived fields all match fresh recomputation
    fn consistent_record(converter: &StaticConverter) -> BirthRecord {
        let sample = &converter.conversion;
        beijing_record().with_derived(DerivedFields {
            true_solar_time: Some("12:12".to_string()),
            shichen: Some("午时".to_string()),
            lunar_date: Some(sample.lunar_date.clone()),
            bazi_pillars: Some(sample.pillars.clone()),
            wuxing: Some(sample.wuxing.clone()),
            nayin: Some(sample.nayin.clone()),
            last_computed_at: Some(fixed_now()),
        })
    }

    #[test]
    fn test_consistent_record_is_clean() {
        let converter = StaticConverter::sample();
        let validator = Validator::new(&converter);
        let result = validator.validate_at(&consistent_record(&converter), fixed_now());

        assert!(result.valid);
        assert!(result.can_calculate);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
        assert!(result.corrections.is_empty());
    }

    #[test]
    fn test_missing_inputs_short_circuit() {
        let converter = StaticConverter::sample();
        let validator = Validator::new(&converter);
        let result = validator.validate_at(&BirthRecord::default(), fixed_now());

        assert!(!result.valid);
        assert!(!result.can_calculate);
        // date, time, and location all reported in one pass
        assert_eq!(result.errors.len(), 3);
        assert!(result.corrections.is_empty());
    }

    #[test]
    fn test_out_of_range_longitude_is_fatal() {
        let converter = StaticConverter::sample();
        let validator = Validator::new(&converter);
        let mut record = beijing_record();
        record.input.location = Some(mingpan_core::GeoPoint::new(200.0, 0.0));

        let result = validator.validate_at(&record, fixed_now());
        assert!(!result.valid);
        assert!(!result.can_calculate);
        assert!(result
            .errors
            .iter()
            .any(|e| e.kind == IssueKind::InputRange
                && e.field.as_deref() == Some("longitude")));
    }

    #[test]
    fn test_single_field_drift() {
        let converter = StaticConverter::sample();
        let validator = Validator::new(&converter);
        let mut record = consistent_record(&converter);
        record.derived.lunar_date = Some("庚午年 正月初一".to_string());

        let result = validator.validate_at(&record, fixed_now());
        assert!(result.valid, "drift must stay non-fatal");
        assert_eq!(result.corrections.len(), 1);
        let correction = &result.corrections[fields::LUNAR_DATE];
        assert_eq!(correction.old.as_deref(), Some("庚午年 正月初一"));
        assert_eq!(correction.new, converter.conversion.lunar_date);
        assert_eq!(
            result
                .warnings
                .iter()
                .filter(|w| w.kind == IssueKind::DerivedFieldDrift)
                .count(),
            1
        );
    }

    #[test]
    fn test_empty_derived_fields_all_corrected() {
        let converter = StaticConverter::sample();
        let validator = Validator::new(&converter);
        let result = validator.validate_at(&beijing_record(), fixed_now());

        assert!(result.valid);
        // true_solar_time, shichen, lunar_date, bazi_pillars, wuxing, nayin
        assert_eq!(result.corrections.len(), 6);
        assert_eq!(result.corrections[fields::TRUE_SOLAR_TIME].new, "12:12");
        assert_eq!(result.corrections[fields::SHICHEN].new, "午时");
        // A never-computed record is missing, not stale
        assert!(!result.has_warning(IssueKind::StaleComputation));
    }

    #[test]
    fn test_populated_record_without_timestamp_warns_stale() {
        let converter = StaticConverter::sample();
        let validator = Validator::new(&converter);
        let mut record = consistent_record(&converter);
        record.derived.last_computed_at = None;

        let result = validator.validate_at(&record, fixed_now());
        assert!(result.valid);
        assert!(result.has_warning(IssueKind::StaleComputation));
        assert!(result.corrections.is_empty());
    }

    #[test]
    fn test_stale_record_warns_without_correction() {
        let converter = StaticConverter::sample();
        let validator = Validator::new(&converter);
        let mut record = consistent_record(&converter);
        record.derived.last_computed_at = Some(fixed_now() - Duration::days(31));

        let result = validator.validate_at(&record, fixed_now());
        assert!(result.valid);
        assert!(result.has_warning(IssueKind::StaleComputation));
        assert!(result.corrections.is_empty());
    }

    #[test]
    fn test_stale_horizon_is_configurable() {
        let converter = StaticConverter::sample();
        let validator = Validator::new(&converter).with_stale_after(7);
        let mut record = consistent_record(&converter);
        record.derived.last_computed_at = Some(fixed_now() - Duration::days(10));

        let result = validator.validate_at(&record, fixed_now());
        assert!(result.has_warning(IssueKind::StaleComputation));
    }

    #[test]
    fn test_collaborator_unavailable_degrades() {
        let converter = UnavailableConverter;
        let validator = Validator::new(&converter);
        let mut record = beijing_record();
        record.derived.true_solar_time = Some("12:12".to_string());
        record.derived.shichen = Some("午时".to_string());
        record.derived.lunar_date = Some("己巳年 腊月初五".to_string());

        let result = validator.validate_at(&record, fixed_now());
        assert!(result.valid);
        assert!(result.has_warning(IssueKind::CollaboratorUnavailable));
        // Engine-owned fields still diff; collaborator fields stay untouched
        assert!(!result.corrections.contains_key(fields::LUNAR_DATE));
        assert!(result.corrections.is_empty());
    }

    #[test]
    fn test_corrupt_shichen_token_warns() {
        let converter = StaticConverter::sample();
        let validator = Validator::new(&converter);
        let mut record = consistent_record(&converter);
        record.derived.shichen = Some("甲时".to_string());

        let result = validator.validate_at(&record, fixed_now());
        assert!(result.has_warning(IssueKind::UnrecognizedShichenToken));
        // And it still drifts toward the canonical form
        assert_eq!(result.corrections[fields::SHICHEN].new, "午时");
    }

    #[test]
    fn test_full_shichen_form_drifts_to_simple() {
        let converter = StaticConverter::sample();
        let validator = Validator::new(&converter);
        let mut record = consistent_record(&converter);
        record.derived.shichen = Some("午时初刻".to_string());

        let result = validator.validate_at(&record, fixed_now());
        assert!(!result.has_warning(IssueKind::UnrecognizedShichenToken));
        assert_eq!(result.corrections[fields::SHICHEN].new, "午时");
    }
}
