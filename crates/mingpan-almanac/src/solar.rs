//! Solar-Time Corrector
//!
//! Converts a civil clock time into astronomically-corrected true solar
//! time: a longitude term (4 minutes per degree off the UTC+8 reference
//! meridian, 120°E) plus an analytic equation-of-time approximation.
//!
//! This is the single canonical algorithm for the whole engine; every
//! internal caller, including the lunar-conversion feed, goes through
//! [`true_solar_time`].

use std::f64::consts::TAU;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use mingpan_core::{EngineError, Result};

/// Reference meridian of the civil time zone (UTC+8), degrees east
pub const REFERENCE_MERIDIAN_DEG: f64 = 120.0;

/// Earth rotates 1 degree in 4 minutes
pub const MINUTES_PER_DEGREE: f64 = 4.0;

/// Supported calendar horizon, inclusive
pub const YEAR_MIN: i32 = 1900;
pub const YEAR_MAX: i32 = 2100;

const MINUTES_PER_DAY: f64 = 1440.0;

/// Parse a canonical "YYYY-MM-DD" date and enforce the supported horizon.
/// Out-of-horizon dates are rejected, never clamped.
pub fn parse_date(date: &str) -> Result<NaiveDate> {
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| EngineError::format("date", format!("`{}` is not YYYY-MM-DD: {}", date, e)))?;
    if parsed.year() < YEAR_MIN || parsed.year() > YEAR_MAX {
        return Err(EngineError::range(
            "date",
            format!("`{}` outside supported horizon {}..={}", date, YEAR_MIN, YEAR_MAX),
        ));
    }
    Ok(parsed)
}

/// Parse a canonical 24-hour "HH:MM" time
pub fn parse_time(time: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|e| EngineError::format("time", format!("`{}` is not HH:MM: {}", time, e)))
}

/// Reject longitudes outside [-180, 180]
pub fn check_longitude(longitude: f64) -> Result<()> {
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(EngineError::range(
            "longitude",
            format!("{} outside [-180, 180]", longitude),
        ));
    }
    Ok(())
}

/// Reject latitudes outside [-90, 90]
pub fn check_latitude(latitude: f64) -> Result<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(EngineError::range(
            "latitude",
            format!("{} outside [-90, 90]", latitude),
        ));
    }
    Ok(())
}

/// Equation of time in minutes for a 0-based ordinal day of year.
///
/// Analytic approximation: `9.87 sin 2B − 7.53 cos B − 1.5 sin B` with
/// `B = 2π (N − 81) / 365`. Accurate to well under a minute, which is all
/// a shichen boundary needs.
pub fn equation_of_time_minutes(day_of_year: u32) -> f64 {
    let b = TAU * (day_of_year as f64 - 81.0) / 365.0;
    9.87 * (2.0 * b).sin() - 7.53 * b.cos() - 1.5 * b.sin()
}

/// Total correction in minutes (longitude term + equation of time) applied
/// to a civil time on the given date at the given longitude.
pub fn solar_correction_minutes(date: &str, longitude: f64) -> Result<f64> {
    let date = parse_date(date)?;
    check_longitude(longitude)?;
    let longitude_correction = (longitude - REFERENCE_MERIDIAN_DEG) * MINUTES_PER_DEGREE;
    Ok(longitude_correction + equation_of_time_minutes(date.ordinal0()))
}

/// Convert a civil "HH:MM" on `date` at `longitude` into true solar time.
///
/// The result wraps within the same calendar day: a correction across
/// midnight changes only the minutes-of-day, never the date field. Callers
/// that need the date rolled must handle it themselves; this matches the
/// behavior the stored records were computed with.
pub fn true_solar_time(date: &str, time: &str, longitude: f64) -> Result<String> {
    let civil = parse_time(time)?;
    let correction = solar_correction_minutes(date, longitude)?;

    let civil_minutes = (civil.hour() * 60 + civil.minute()) as f64;
    let wrapped = (civil_minutes + correction).rem_euclid(MINUTES_PER_DAY);
    let minutes = wrapped.floor() as u32;

    Ok(format!("{:02}:{:02}", minutes / 60, minutes % 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_beijing_noon() {
        // 116.40°E is -14.4 min of longitude correction; early January adds
        // a few more minutes of equation-of-time deficit.
        let result = true_solar_time("1990-01-01", "12:30", 116.40).unwrap();
        assert_eq!(result, "12:12");
    }

    #[test]
    fn test_deterministic() {
        let a = true_solar_time("1990-01-01", "12:30", 116.40).unwrap();
        let b = true_solar_time("1990-01-01", "12:30", 116.40).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_reference_meridian_is_eot_only() {
        // At 120°E only the equation of time remains: mid-February it is
        // about -14.5 minutes.
        let result = true_solar_time("2000-02-10", "12:00", 120.0).unwrap();
        assert_eq!(result, "11:45");
    }

    #[test]
    fn test_wraps_before_midnight_without_rolling_date() {
        let result = true_solar_time("2000-02-10", "00:05", 120.0).unwrap();
        assert_eq!(result, "23:50");
    }

    #[test]
    fn test_rejects_malformed_date() {
        let err = true_solar_time("1990/01/01", "12:30", 116.40).unwrap_err();
        assert!(matches!(err, EngineError::InputFormat { field: "date", .. }));
    }

    #[test]
    fn test_rejects_malformed_time() {
        let err = true_solar_time("1990-01-01", "noon", 116.40).unwrap_err();
        assert!(matches!(err, EngineError::InputFormat { field: "time", .. }));
    }

    #[test]
    fn test_rejects_out_of_horizon_date() {
        let err = true_solar_time("1899-12-31", "12:30", 116.40).unwrap_err();
        assert!(matches!(err, EngineError::InputRange { field: "date", .. }));

        let err = true_solar_time("2101-01-01", "12:30", 116.40).unwrap_err();
        assert!(matches!(err, EngineError::InputRange { field: "date", .. }));
    }

    #[test]
    fn test_rejects_out_of_range_longitude() {
        let err = true_solar_time("1990-01-01", "12:30", 200.0).unwrap_err();
        assert!(matches!(err, EngineError::InputRange { field: "longitude", .. }));
    }

    #[test]
    fn test_equation_of_time_bounds() {
        // The equation of time never exceeds ~17 minutes either way
        for day in 0..366 {
            let eot = equation_of_time_minutes(day);
            assert!(eot.abs() < 17.5, "day {} gave {}", day, eot);
        }
    }

    #[test]
    fn test_correction_breakdown() {
        let total = solar_correction_minutes("1990-01-01", 116.40).unwrap();
        let eot = equation_of_time_minutes(0);
        assert!((total - (-14.4 + eot)).abs() < 1e-9);
    }
}
