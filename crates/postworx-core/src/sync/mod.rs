//! One sync pass: schedule fetch, per-shift roster resolution, calendar
//! assembly and optional cache eviction.
//!
//! Shifts are resolved strictly one after another. `today` is fixed when the
//! runner is created so every freshness decision in a run agrees.

pub mod window;

use std::fmt;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::cache::{is_cacheable, should_use_cache, CacheKey, ShiftCache};
use crate::calendar::ShiftCalendar;
use crate::models::{CoworkerRecord, ShiftId, ShiftRecord};
use crate::roster;

pub use window::DateWindow;

/// Where schedules and rosters come from. Implemented by `ApiClient`.
#[allow(async_fn_in_trait)]
pub trait ScheduleSource {
    async fn fetch_schedule(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<ShiftRecord>>;

    async fn fetch_coworkers(
        &self,
        shift_id: &ShiftId,
        labor_date: NaiveDate,
    ) -> Result<Vec<CoworkerRecord>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub window: DateWindow,
    /// Evict cache entries dated before `window.start` after the pass
    pub cull_cache: bool,
    /// Abort on the first shift that cannot be resolved
    pub fail_fast: bool,
}

/// How a shift's roster was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOutcome {
    Cached,
    Fetched,
    Unavailable,
}

impl fmt::Display for ShiftOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ShiftOutcome::Cached => "cached",
            ShiftOutcome::Fetched => "fetched",
            ShiftOutcome::Unavailable => "unavailable",
        };
        f.pad(label)
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedShift {
    pub key: CacheKey,
    pub position: String,
    pub outcome: ShiftOutcome,
    /// False if the shift could not be turned into a calendar event
    pub in_calendar: bool,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub shifts: Vec<ResolvedShift>,
    /// Number of coworker requests made
    pub fetches: usize,
    pub evicted: usize,
}

impl SyncReport {
    pub fn count(&self, outcome: ShiftOutcome) -> usize {
        self.shifts.iter().filter(|s| s.outcome == outcome).count()
    }
}

/// Called with each shift as soon as it has been resolved.
type ShiftHook<'a> = Box<dyn FnMut(&ResolvedShift) + 'a>;

pub struct SyncRunner<'a, S> {
    source: &'a S,
    cache: &'a mut ShiftCache,
    options: &'a SyncOptions,
    today: NaiveDate,
    on_shift: Option<ShiftHook<'a>>,
}

impl<'a, S: ScheduleSource> SyncRunner<'a, S> {
    pub fn new(
        source: &'a S,
        cache: &'a mut ShiftCache,
        options: &'a SyncOptions,
        today: NaiveDate,
    ) -> Self {
        Self {
            source,
            cache,
            options,
            today,
            on_shift: None,
        }
    }

    /// Report each shift while the pass is still running.
    pub fn on_shift(mut self, hook: impl FnMut(&ResolvedShift) + 'a) -> Self {
        self.on_shift = Some(Box::new(hook));
        self
    }

    /// Run a full pass, adding one event per shift to `calendar`.
    pub async fn run(&mut self, calendar: &mut ShiftCalendar) -> Result<SyncReport> {
        let window = self.options.window;
        info!(start = %window.start, end = %window.end, today = %self.today, "Fetching schedule");

        let mut shifts = self
            .source
            .fetch_schedule(window.start, window.end)
            .await
            .context("Failed to fetch schedule")?;
        shifts.sort_by_key(|s| s.labor_date);
        debug!(count = shifts.len(), "Schedule fetched");

        let mut report = SyncReport::default();
        for shift in &shifts {
            let key = CacheKey::from(shift);
            let (entry, outcome) = self.resolve(shift, &key, &mut report).await?;

            let in_calendar = match calendar.add_shift(shift, &entry) {
                Ok(_) => true,
                Err(e) if !self.options.fail_fast => {
                    warn!(key = %key, error = %e, "Skipping shift with unusable times");
                    false
                }
                Err(e) => return Err(e),
            };

            let resolved = ResolvedShift {
                key,
                position: shift.position_name.clone(),
                outcome,
                in_calendar,
            };
            if let Some(hook) = self.on_shift.as_mut() {
                hook(&resolved);
            }
            report.shifts.push(resolved);
        }

        if self.options.cull_cache {
            report.evicted = self.cache.evict(window.start)?;
        }

        info!(
            shifts = report.shifts.len(),
            fetches = report.fetches,
            evicted = report.evicted,
            "Sync pass complete"
        );
        Ok(report)
    }

    /// Roster text for one shift, from the cache if it can be trusted,
    /// otherwise from the network.
    async fn resolve(
        &mut self,
        shift: &ShiftRecord,
        key: &CacheKey,
        report: &mut SyncReport,
    ) -> Result<(String, ShiftOutcome)> {
        let cached = self.cache.get(key);
        if should_use_cache(cached, shift.labor_date, self.today) {
            debug!(key = %key, "Using cached roster");
            let entry = cached.unwrap_or_default().to_string();
            return Ok((entry, ShiftOutcome::Cached));
        }

        debug!(key = %key, "Fetching roster");
        report.fetches += 1;
        match self
            .source
            .fetch_coworkers(&shift.shift_id, shift.labor_date)
            .await
        {
            Ok(coworkers) => {
                let entry = roster::render_entry(shift, &coworkers);
                if is_cacheable(shift.labor_date, self.today) {
                    self.cache.put(key.clone(), entry.clone())?;
                }
                Ok((entry, ShiftOutcome::Fetched))
            }
            Err(e) if !self.options.fail_fast => {
                warn!(key = %key, error = %e, "Failed to fetch coworkers, roster unavailable");
                Ok((roster::unavailable_entry(shift), ShiftOutcome::Unavailable))
            }
            Err(e) => Err(e.context(format!("Failed to fetch coworkers for shift {}", key))),
        }
    }
}
