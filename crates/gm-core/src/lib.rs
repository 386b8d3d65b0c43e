//! gm-core: shared foundation for the geomechanical results engine.
//!
//! Contains:
//! - units (uom pressure/length types + bar/pascal and hydrostatic helpers)
//! - numeric (value types, the undefined sentinel, guarded division)

pub mod numeric;
pub mod units;

pub use numeric::*;
pub use units::*;
