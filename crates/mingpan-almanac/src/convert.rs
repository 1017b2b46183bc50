//! Lunar Conversion collaborator seam
//!
//! The lunisolar/sexagenary conversion (lunar date, BaZi pillars, wuxing
//! and nayin tags) is delegated to an external calendrical backend. The
//! engine only calls it with the true-solar-time instant and cross-checks
//! its output against stored values; it never reimplements leap-month or
//! solar-term astronomy.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use mingpan_core::{BaziPillars, EngineError, Result};

/// Everything the collaborator derives from one birth instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LunarConversion {
    /// Display string, e.g. "辛丑年 八月初四"
    pub lunar_date: String,
    pub pillars: BaziPillars,
    /// Five-element tags for the four pillars, e.g. "金土 火金 金金 土水"
    pub wuxing: String,
    /// Nayin tags for the four pillars, e.g. "壁上土 山下火 石榴木 平地木"
    pub nayin: String,
}

/// Injected lunar conversion backend.
///
/// Implementations are expected to be local and synchronous; a remote
/// backend must surface failures as
/// [`EngineError::CollaboratorUnavailable`] so the validator can degrade
/// per-field instead of failing the record.
pub trait LunarConverter: Send + Sync {
    fn convert(&self, date: NaiveDate, true_solar: NaiveTime) -> Result<LunarConversion>;
}

/// Converter that returns one fixed answer regardless of input.
///
/// Test double for validator and report tests; also useful to callers
/// exercising the pipeline without a calendrical backend.
#[derive(Debug, Clone)]
pub struct StaticConverter {
    pub conversion: LunarConversion,
}

impl StaticConverter {
    pub fn new(conversion: LunarConversion) -> Self {
        Self { conversion }
    }

    /// A plausible fixed conversion for tests
    pub fn sample() -> Self {
        Self::new(LunarConversion {
            lunar_date: "己巳年 腊月初五".to_string(),
            pillars: BaziPillars::new("己巳", "丙子", "甲戌", "庚午"),
            wuxing: "土火 火水 木土 金火".to_string(),
            nayin: "大林木 涧下水 山头火 路旁土".to_string(),
        })
    }
}

impl LunarConverter for StaticConverter {
    fn convert(&self, _date: NaiveDate, _true_solar: NaiveTime) -> Result<LunarConversion> {
        Ok(self.conversion.clone())
    }
}

/// Converter that always fails, for exercising degraded validation
#[derive(Debug, Clone, Default)]
pub struct UnavailableConverter;

impl LunarConverter for UnavailableConverter {
    fn convert(&self, _date: NaiveDate, _true_solar: NaiveTime) -> Result<LunarConversion> {
        Err(EngineError::CollaboratorUnavailable {
            reason: "no calendrical backend configured".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_converter_ignores_input() {
        let converter = StaticConverter::sample();
        let date = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let a = converter
            .convert(date, NaiveTime::from_hms_opt(12, 12, 0).unwrap())
            .unwrap();
        let b = converter
            .convert(date, NaiveTime::from_hms_opt(3, 0, 0).unwrap())
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.pillars.to_string(), "己巳 丙子 甲戌 庚午");
    }

    #[test]
    fn test_unavailable_converter_degrades() {
        let converter = UnavailableConverter;
        let date = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let err = converter
            .convert(date, NaiveTime::from_hms_opt(12, 0, 0).unwrap())
            .unwrap_err();
        assert!(matches!(err, EngineError::CollaboratorUnavailable { .. }));
    }
}
