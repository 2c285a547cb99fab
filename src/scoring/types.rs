//! Data types shared by the scorers, the combiner and the orchestrator.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;
use tracing::debug;

/// A (weekday, hour) pair selecting one bucket of a weekly histogram.
///
/// `weekday` counts from Sunday (0) to Saturday (6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub weekday: u8,
    pub hour: u8,
}

impl TimeSlot {
    /// Returns `None` unless `weekday <= 6` and `hour <= 23`.
    pub fn new(weekday: u8, hour: u8) -> Option<Self> {
        (weekday <= 6 && hour <= 23).then_some(Self { weekday, hour })
    }

    fn from_datetime(dt: &NaiveDateTime) -> Self {
        Self {
            weekday: dt.weekday().num_days_from_sunday() as u8,
            hour: dt.hour() as u8,
        }
    }
}

/// The calendar date and slot derived from an optional ISO-8601 input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestTime {
    pub date: Option<NaiveDate>,
    pub slot: Option<TimeSlot>,
}

impl RequestTime {
    /// Parses an RFC 3339 timestamp (seconds optional), a naive
    /// `YYYY-MM-DDTHH:MM[:SS]` timestamp or a bare `YYYY-MM-DD` date. A bare date yields no slot.
    ///
    /// Unparseable input is swallowed and yields an empty `RequestTime`.
    pub fn parse(input: Option<&str>) -> Self {
        let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::default();
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Self::from_naive(dt.naive_local());
        }
        // RFC 3339 requires seconds; accept offsets on minute precision too
        if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z") {
            return Self::from_naive(dt.naive_local());
        }

        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Self::from_naive(dt);
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Self {
                date: Some(date),
                slot: None,
            };
        }

        debug!(input = raw, "Ignoring unparseable date/time");
        Self::default()
    }

    fn from_naive(dt: NaiveDateTime) -> Self {
        Self {
            date: Some(dt.date()),
            slot: Some(TimeSlot::from_datetime(&dt)),
        }
    }
}

/// Busyness (0-100) for one hour of the day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourlyBusyness {
    pub hour: u8,
    pub busyness: f64,
}

/// Either 24 hourly entries, one slot-specific entry, or nothing ("no data").
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BusynessProfile(Vec<HourlyBusyness>);

impl BusynessProfile {
    pub fn new(entries: Vec<HourlyBusyness>) -> Self {
        debug_assert!(entries.len() <= 24);
        Self(entries)
    }

    pub fn single(hour: u8, busyness: f64) -> Self {
        Self(vec![HourlyBusyness { hour, busyness }])
    }

    pub fn entries(&self) -> &[HourlyBusyness] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A one-entry profile carries the requested slot's value directly.
    pub fn is_single_slot(&self) -> bool {
        self.0.len() == 1
    }
}

/// Three-bucket qualitative label for a [0, 1] score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Label {
    Low,
    Medium,
    High,
}

/// The three inputs of one combination strategy, keyed by signal name.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Features {
    pub weather: f64,
    pub events: f64,
    pub historical: f64,
}

/// Feature form (for the regression) and modifier form (for the heuristic)
/// of the same three provider results.
///
/// In `modifiers`, `historical` holds the baseline the modifiers scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signals {
    pub features: Features,
    pub modifiers: Features,
}
