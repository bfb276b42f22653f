//! postworx - sync a Teamworx work schedule into an iCalendar file.
//!
//! Each shift is enriched with the roster of coworkers on the same shift.
//! Rosters of shifts that have already happened are cached locally and never
//! fetched again; upcoming shifts are always fetched fresh.

pub mod api;
pub mod auth;
pub mod cache;
pub mod calendar;
pub mod config;
pub mod models;
pub mod roster;
pub mod sync;

pub use api::{ApiClient, ApiError};
pub use cache::{CacheKey, ShiftCache};
pub use calendar::{CalendarEvent, ShiftCalendar};
pub use config::{Config, ConfigError};
pub use sync::{
    DateWindow, ResolvedShift, ScheduleSource, ShiftOutcome, SyncOptions, SyncReport, SyncRunner,
};
