//! HTTP client for the Teamworx scheduling service.
//!
//! Authentication is a form post that returns session cookies; schedule and
//! coworker requests replay them. `ApiClient` implements `ScheduleSource`.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
