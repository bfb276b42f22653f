//! Decides whether a cached roster may be trusted.
//!
//! A shift whose labor date is before today has happened and its roster can
//! no longer change. Anything dated today or later is always re-fetched.

use chrono::NaiveDate;

/// True if a shift on `labor_date` is final and may be stored.
pub fn is_cacheable(labor_date: NaiveDate, today: NaiveDate) -> bool {
    labor_date < today
}

/// True if `entry` exists and the shift it describes is final.
///
/// An entry for a shift that is not (yet) final can only exist if the clock
/// moved backwards between runs; it is ignored.
pub fn should_use_cache(entry: Option<&str>, labor_date: NaiveDate, today: NaiveDate) -> bool {
    entry.is_some() && is_cacheable(labor_date, today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_is_cacheable() {
        let today = date(17);
        assert!(is_cacheable(date(16), today));
        assert!(!is_cacheable(date(17), today));
        assert!(!is_cacheable(date(18), today));
    }

    #[test]
    fn test_should_use_cache_requires_entry() {
        assert!(!should_use_cache(None, date(1), date(17)));
        assert!(should_use_cache(Some("roster"), date(1), date(17)));
    }

    #[test]
    fn test_should_use_cache_ignores_entry_for_today_and_later() {
        assert!(!should_use_cache(Some("roster"), date(17), date(17)));
        assert!(!should_use_cache(Some("roster"), date(20), date(17)));
    }
}
