//! Calendar assembly and `.ics` output.
//!
//! Every run regenerates the whole calendar from the current schedule.

pub mod ics;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::models::ShiftRecord;

/// One shift as a calendar event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub uid: String,
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: String,
    pub location: String,
}

impl CalendarEvent {
    /// Build the event for `shift`, using `roster` as its description.
    pub fn for_shift(shift: &ShiftRecord, roster: &str, tz: Tz, org: &str) -> Result<Self> {
        let (start, end) = shift
            .utc_span(tz)
            .with_context(|| format!("Invalid times for shift {}", shift.shift_id))?;

        Ok(Self {
            uid: event_uid(start),
            summary: format!("{}: {}", shift.position_name, shift.duration_label()),
            start,
            end,
            description: roster.to_string(),
            location: shift.location_display(org),
        })
    }
}

/// UID derived from the start time, so regenerating the calendar keeps
/// event identity stable.
fn event_uid(start: DateTime<Utc>) -> String {
    format!("{}@postworx", start.format("%Y%m%dT%H%M%SZ"))
}

/// Accumulates shift events and serializes them to a single calendar.
pub struct ShiftCalendar {
    org: String,
    tz: Tz,
    events: Vec<CalendarEvent>,
}

impl ShiftCalendar {
    pub fn new(org: impl Into<String>, tz: Tz) -> Self {
        Self {
            org: org.into(),
            tz,
            events: Vec::new(),
        }
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn add_shift(&mut self, shift: &ShiftRecord, roster: &str) -> Result<&CalendarEvent> {
        let event = CalendarEvent::for_shift(shift, roster, self.tz, &self.org)?;
        debug!(uid = %event.uid, summary = %event.summary, "Calendar event added");
        self.events.push(event);
        Ok(&self.events[self.events.len() - 1])
    }

    pub fn to_ics(&self) -> String {
        ics::generate(&self.org, &self.events)
    }

    /// Write `<dir>/<Org>.ics`, creating `dir` if needed. Returns the file path.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

        let path = dir.join(format!("{}.ics", self.org));
        std::fs::write(&path, self.to_ics())
            .with_context(|| format!("Failed to write calendar: {}", path.display()))?;
        Ok(path)
    }
}
