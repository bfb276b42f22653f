use std::fmt;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};

/// Wall-clock format the scheduling API uses for shift times ("9:00 AM").
const WALL_CLOCK_FORMAT: &str = "%I:%M %p";

/// Opaque shift identifier. The API sends it as a number or a string
/// depending on the endpoint, so both are accepted and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShiftId(String);

impl ShiftId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ShiftId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => ShiftId(n.to_string()),
            RawId::Text(s) => ShiftId(s),
        })
    }
}

/// Accepts `7.5` as well as `"7.5"` for numeric fields.
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawNumber {
        Number(f64),
        Text(String),
    }

    match RawNumber::deserialize(deserializer)? {
        RawNumber::Number(n) => Ok(n),
        RawNumber::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// One scheduled work period for the user, as returned by the schedule endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ShiftRecord {
    #[serde(rename = "laborDate")]
    pub labor_date: NaiveDate,
    #[serde(rename = "positionName", default)]
    pub position_name: String,
    #[serde(rename = "inTimeText")]
    pub in_time: String,
    #[serde(rename = "outTimeText")]
    pub out_time: String,
    #[serde(deserialize_with = "number_or_string", default)]
    pub hours: f64,
    #[serde(rename = "scheduleShiftId")]
    pub shift_id: ShiftId,
    #[serde(rename = "locationName", default)]
    pub location_name: String,
}

impl ShiftRecord {
    /// Human readable length, e.g. "8h" or "7h30m".
    pub fn duration_label(&self) -> String {
        let total_minutes = (self.hours.max(0.0) * 60.0).round() as i64;
        let hours = total_minutes / 60;
        let minutes = total_minutes % 60;
        if minutes == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h{}m", hours, minutes)
        }
    }

    /// Location with the organization name mixed in: "Store_123" -> "Store Org, 123".
    pub fn location_display(&self, org: &str) -> String {
        self.location_name.replace('_', &format!(" {}, ", org))
    }

    /// Start and end of the shift in UTC, interpreting the wall-clock times in `tz`.
    ///
    /// An out-time at or before the in-time belongs to the following day
    /// (overnight shifts).
    pub fn utc_span(&self, tz: Tz) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let start = parse_wall_clock(self.labor_date, &self.in_time)?;
        let mut end = parse_wall_clock(self.labor_date, &self.out_time)?;
        if end <= start {
            end += Duration::days(1);
        }
        Ok((to_utc(tz, start)?, to_utc(tz, end)?))
    }
}

fn parse_wall_clock(date: NaiveDate, text: &str) -> Result<NaiveDateTime> {
    let time = NaiveTime::parse_from_str(text.trim(), WALL_CLOCK_FORMAT)
        .with_context(|| format!("Unrecognized shift time: {:?}", text))?;
    Ok(date.and_time(time))
}

fn to_utc(tz: Tz, local: NaiveDateTime) -> Result<DateTime<Utc>> {
    // Ambiguous times (DST fall back) take the first occurrence; times that
    // fall in a DST gap are shifted forward by the gap.
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("{} does not exist in {}", local, tz))
}

/// One coworker's presence on a shift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoworkerRecord {
    pub employee_name: String,
    pub position_name: String,
    pub in_time: Option<String>,
    pub out_time: Option<String>,
}

/// Coworker item as returned by the coworkers endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CoworkerApiItem {
    #[serde(rename = "employeeName", default)]
    pub employee_name: Option<String>,
    #[serde(rename = "positionName", default)]
    pub position_name: Option<String>,
    #[serde(rename = "stationName", default)]
    pub station_name: Option<String>,
    #[serde(rename = "inTimeText", default)]
    pub in_time: Option<String>,
    #[serde(rename = "outTimeText", default)]
    pub out_time: Option<String>,
}

impl CoworkerApiItem {
    /// Convert to the domain record, folding the station into the position:
    /// "Cashier" + "Dine Cashier 2" -> "Cashier: Dine Cashier 2".
    pub fn to_coworker(&self) -> CoworkerRecord {
        let position = self.position_name.clone().unwrap_or_default();
        let position_name = match self.station_name.as_deref() {
            Some(station) if !station.trim().is_empty() => format!("{}: {}", position, station),
            _ => position,
        };

        CoworkerRecord {
            employee_name: self.employee_name.clone().unwrap_or_default(),
            position_name,
            in_time: self.in_time.clone(),
            out_time: self.out_time.clone(),
        }
    }
}
