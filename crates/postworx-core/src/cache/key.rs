use std::fmt;

use chrono::NaiveDate;

use crate::models::{ShiftId, ShiftRecord};

/// Separator between date and shift id in the on-disk key.
const KEY_SEPARATOR: &str = " - ";

/// Length of an ISO `YYYY-MM-DD` date.
const ISO_DATE_LEN: usize = 10;

/// Identity of a cached shift. Neither half is unique on its own.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey {
    pub labor_date: NaiveDate,
    pub shift_id: ShiftId,
}

impl CacheKey {
    pub fn new(labor_date: NaiveDate, shift_id: ShiftId) -> Self {
        Self {
            labor_date,
            shift_id,
        }
    }

    /// Parse the on-disk form `"<ISO date> - <shift id>"`.
    ///
    /// The date is fixed-width, so everything after the first separator is the
    /// shift id, even if it contains the separator itself.
    pub fn parse(s: &str) -> Option<Self> {
        let date = s.get(..ISO_DATE_LEN)?;
        let shift_id = s.get(ISO_DATE_LEN..)?.strip_prefix(KEY_SEPARATOR)?;
        let labor_date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
        Some(Self::new(labor_date, ShiftId::new(shift_id)))
    }
}

impl From<&ShiftRecord> for CacheKey {
    fn from(shift: &ShiftRecord) -> Self {
        Self::new(shift.labor_date, shift.shift_id.clone())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.labor_date.format("%Y-%m-%d"),
            KEY_SEPARATOR,
            self.shift_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_display_matches_storage_format() {
        let key = CacheKey::new(date(2026, 10, 16), ShiftId::new("42"));
        assert_eq!(key.to_string(), "2026-10-16 - 42");
    }

    #[test]
    fn test_parse_storage_format() {
        let key = CacheKey::parse("2026-10-16 - 42").unwrap();
        assert_eq!(key.labor_date, date(2026, 10, 16));
        assert_eq!(key.shift_id.as_str(), "42");
    }

    #[test]
    fn test_shift_id_containing_separator_survives() {
        let key = CacheKey::new(date(2026, 1, 2), ShiftId::new("7 - late"));
        let parsed = CacheKey::parse(&key.to_string()).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        assert!(CacheKey::parse("").is_none());
        assert!(CacheKey::parse("2026-10-16").is_none());
        assert!(CacheKey::parse("2026-10-16-42").is_none());
        assert!(CacheKey::parse("not a date - 42").is_none());
        assert!(CacheKey::parse("2026-13-40 - 42").is_none());
    }

    #[test]
    fn test_same_id_on_different_days_are_distinct() {
        let a = CacheKey::new(date(2026, 1, 1), ShiftId::new("1"));
        let b = CacheKey::new(date(2026, 1, 2), ShiftId::new("1"));
        assert_ne!(a, b);
        assert!(a < b);
    }
}
