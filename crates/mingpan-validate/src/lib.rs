//! Mingpan Validate: consistency checking and repair for birth-data records
//!
//! ```text
//! record ──► FormatCheck ──► RangeCheck ──► Recompute ──► Diff ──► Classify ──► IntegrityResult
//!                │                │          (solar time,                            │
//!                └── errors ──────┘           shichen,                               ▼
//!                    short-circuit            lunar conversion)                  Auto-Fixer
//!                                                                                   │
//!                                                                                   ▼
//!                                                                             corrected record
//! ```
//!
//! Fatal input problems (format, range, missing fields) invalidate one
//! record and stop its recomputation; drift, staleness, and collaborator
//! outages are warnings surfaced as structured data. The batch layer maps
//! this pipeline over collections with per-record isolation and cooperative
//! cancellation.

pub mod batch;
pub mod fixer;
pub mod validator;

pub use batch::{batch_fix, batch_fix_with, batch_validate, batch_validate_with, BatchFix, CancelFlag};
pub use fixer::{AutoFixer, FixOutcome};
pub use validator::{Validator, DEFAULT_STALE_AFTER_DAYS};

use mingpan_almanac::LunarConverter;
use mingpan_core::{BirthRecord, IntegrityResult};

/// Validate a single record with the default staleness horizon
pub fn validate(record: &BirthRecord, converter: &dyn LunarConverter) -> IntegrityResult {
    Validator::new(converter).validate(record)
}

/// Fix a single record with the default staleness horizon
pub fn auto_fix(record: &BirthRecord, converter: &dyn LunarConverter) -> FixOutcome {
    AutoFixer::new(converter).fix(record)
}
