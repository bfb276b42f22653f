//! Data models for the scheduling service.
//!
//! - `ShiftRecord`: one of the user's own shifts
//! - `CoworkerRecord`: a coworker present during a shift
//! - `ShiftId`: opaque identifier, unique only together with the labor date

pub mod shift;

pub use shift::{CoworkerApiItem, CoworkerRecord, ShiftId, ShiftRecord};
