use chrono::{Days, NaiveDate};

/// Inclusive date range around today: `[today - before, today + after]`.
///
/// Used both to request the schedule and as the eviction cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn around(today: NaiveDate, days_before: u32, days_after: u32) -> Self {
        Self {
            start: today
                .checked_sub_days(Days::new(days_before.into()))
                .unwrap_or(NaiveDate::MIN),
            end: today
                .checked_add_days(Days::new(days_after.into()))
                .unwrap_or(NaiveDate::MAX),
        }
    }
}
