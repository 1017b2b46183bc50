//! Data model: BirthInput, DerivedFields, BirthRecord
//!
//! Canonical fields keep the persisted string forms (`"YYYY-MM-DD"`,
//! `"HH:MM"`) so that malformed stored data reaches the validator intact
//! instead of failing at deserialization. All types are immutable values:
//! the fixer builds new records, it never edits in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Field names used as correction-map keys and issue locations
pub mod fields {
    pub const DATE: &str = "date";
    pub const TIME: &str = "time";
    pub const LOCATION: &str = "location";
    pub const TRUE_SOLAR_TIME: &str = "true_solar_time";
    pub const SHICHEN: &str = "shichen";
    pub const LUNAR_DATE: &str = "lunar_date";
    pub const BAZI_PILLARS: &str = "bazi_pillars";
    pub const WUXING: &str = "wuxing";
    pub const NAYIN: &str = "nayin";
    pub const LAST_COMPUTED_AT: &str = "last_computed_at";
}

/// Birth location. Longitude/latitude are validated; the administrative
/// strings are descriptive only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub district: String,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            province: String::new(),
            city: String::new(),
            district: String::new(),
        }
    }

    pub fn with_place(
        mut self,
        province: impl Into<String>,
        city: impl Into<String>,
        district: impl Into<String>,
    ) -> Self {
        self.province = province.into();
        self.city = city.into();
        self.district = district.into();
        self
    }
}

/// Canonical, user-supplied birth data. Immutable once validated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BirthInput {
    /// Calendar date, "YYYY-MM-DD", supported horizon 1900-01-01..2100-12-31
    #[serde(default)]
    pub date: Option<String>,
    /// Wall-clock time, 24-hour "HH:MM"
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

impl BirthInput {
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            time: Some(time.into()),
            location: None,
        }
    }

    pub fn with_location(mut self, longitude: f64, latitude: f64) -> Self {
        self.location = Some(GeoPoint::new(longitude, latitude));
        self
    }

    /// Date string, treating blank as absent
    pub fn date(&self) -> Option<&str> {
        non_blank(self.date.as_deref())
    }

    /// Time string, treating blank as absent
    pub fn time(&self) -> Option<&str> {
        non_blank(self.time.as_deref())
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// The four stem-branch pillars, collaborator-owned display strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaziPillars {
    pub year: String,
    pub month: String,
    pub day: String,
    pub hour: String,
}

impl BaziPillars {
    pub fn new(
        year: impl Into<String>,
        month: impl Into<String>,
        day: impl Into<String>,
        hour: impl Into<String>,
    ) -> Self {
        Self {
            year: year.into(),
            month: month.into(),
            day: day.into(),
            hour: hour.into(),
        }
    }
}

impl std::fmt::Display for BaziPillars {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {} {} {}", self.year, self.month, self.day, self.hour)
    }
}

/// Fields derived from a `BirthInput`, recomputable at any time.
///
/// `true_solar_time` and `shichen` are engine-owned; the rest come from the
/// lunar conversion collaborator and are treated as authoritative unless
/// proven stale.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DerivedFields {
    /// "HH:MM", function of (date, time, longitude)
    #[serde(default)]
    pub true_solar_time: Option<String>,
    /// Simple display form, e.g. "午时"
    #[serde(default)]
    pub shichen: Option<String>,
    /// Collaborator display string, e.g. "辛丑年 八月初四"
    #[serde(default)]
    pub lunar_date: Option<String>,
    #[serde(default)]
    pub bazi_pillars: Option<BaziPillars>,
    /// Five-element tags for the four pillars, e.g. "金土 火金 金金 土水"
    #[serde(default)]
    pub wuxing: Option<String>,
    /// Nayin tags for the four pillars, e.g. "壁上土 山下火 石榴木 平地木"
    #[serde(default)]
    pub nayin: Option<String>,
    /// Timestamp of the last successful recomputation
    #[serde(default)]
    pub last_computed_at: Option<DateTime<Utc>>,
}

impl DerivedFields {
    /// True when any derived value is present, ignoring the timestamp
    pub fn has_values(&self) -> bool {
        self.true_solar_time.is_some()
            || self.shichen.is_some()
            || self.lunar_date.is_some()
            || self.bazi_pillars.is_some()
            || self.wuxing.is_some()
            || self.nayin.is_some()
    }
}

/// One persisted profile record: canonical input plus its derived fields.
/// `label` is the profile nickname, carried through to batch report details.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BirthRecord {
    #[serde(default)]
    pub label: Option<String>,
    pub input: BirthInput,
    #[serde(default)]
    pub derived: DerivedFields,
}

impl BirthRecord {
    pub fn new(input: BirthInput) -> Self {
        Self {
            label: None,
            input,
            derived: DerivedFields::default(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_derived(mut self, derived: DerivedFields) -> Self {
        self.derived = derived;
        self
    }
}
