//! Mingpan Almanac: the pure calendrical kernel
//!
//! ```text
//! civil time ──► true_solar_time ──► shichen::resolve
//!                      │
//!                      └──────────► LunarConverter::convert
//! ```
//!
//! Everything here is a pure function of its arguments: no clocks, no I/O,
//! no shared state. The lunar/BaZi conversion itself is *not* implemented
//! in this workspace; [`LunarConverter`] is the seam an external
//! calendrical backend plugs into.

pub mod convert;
pub mod shichen;
pub mod solar;

pub use convert::{LunarConversion, LunarConverter, StaticConverter, UnavailableConverter};
pub use shichen::{normalize, resolve, resolve_simple, Branch, Quarter, Shichen};
pub use solar::{equation_of_time_minutes, solar_correction_minutes, true_solar_time};
