//! Mingpan Core: data model and error taxonomy
//!
//! Shared types for the birth-data calendrical engine: the canonical
//! birth input, its derived fields, the per-record integrity result,
//! and the aggregated batch report.

pub mod error;
pub mod integrity;
pub mod record;
pub mod report;

pub use error::{EngineError, IssueKind, Result};
pub use integrity::{Correction, IntegrityResult, Issue};
pub use record::{fields, BaziPillars, BirthInput, BirthRecord, DerivedFields, GeoPoint};
pub use report::{BatchReport, RecordOutcome, RecordStatus};

/// Engine version, stamped into rendered reports
pub const ENGINE_VERSION: &str = "1.0.0";
