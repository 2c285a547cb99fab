//! Collapses weekly popular-times histograms into a single busyness profile.

use std::collections::BTreeMap;

use tracing::debug;

use crate::scoring::types::{BusynessProfile, HourlyBusyness, TimeSlot};
use crate::scoring::utility::mean;

pub const HOURS_PER_DAY: usize = 24;

/// Weekday (0 = Sunday) to 24 hourly busyness values. `None` marks a value
/// the provider sent that was not a number.
pub type WeeklyHistogram = BTreeMap<u8, Vec<Option<f64>>>;

/// A day counts only if it has exactly 24 finite values.
fn valid_day(values: &[Option<f64>]) -> Option<Vec<f64>> {
    if values.len() != HOURS_PER_DAY {
        return None;
    }
    values.iter().map(|v| v.filter(|x| x.is_finite())).collect()
}

/// Nearest integer, halves to even, within 0..=100.
fn bucket(value: f64) -> f64 {
    value.round_ties_even().clamp(0.0, 100.0)
}

/// Averages every valid day into one 24-entry profile.
///
/// With a `slot` whose weekday is present and valid, the one requested bucket
/// is returned instead. An empty profile means "no data", not zero busyness.
pub fn normalize(week: &WeeklyHistogram, slot: Option<TimeSlot>) -> BusynessProfile {
    if let Some(slot) = slot {
        if let Some(day) = week.get(&slot.weekday).and_then(|d| valid_day(d)) {
            let value = bucket(day[slot.hour as usize]);
            debug!(weekday = slot.weekday, hour = slot.hour, value, "Using slot bucket");
            return BusynessProfile::single(slot.hour, value);
        }
    }

    let mut totals = [0.0f64; HOURS_PER_DAY];
    let mut valid_days = 0usize;

    for values in week.values() {
        let Some(day) = valid_day(values) else {
            continue;
        };
        valid_days += 1;
        for (total, v) in totals.iter_mut().zip(day) {
            *total += v;
        }
    }

    debug!(total_days = week.len(), valid_days, "Normalized weekly histogram");

    if valid_days == 0 {
        return BusynessProfile::default();
    }

    BusynessProfile::new(
        totals
            .iter()
            .enumerate()
            .map(|(hour, total)| HourlyBusyness {
                hour: hour as u8,
                busyness: bucket(total / valid_days as f64),
            })
            .collect(),
    )
}

/// Mean busyness of a profile, 0.0 when it is empty. Not rounded.
pub fn average_busyness(profile: &BusynessProfile) -> f64 {
    let values: Vec<f64> = profile.entries().iter().map(|e| e.busyness).collect();
    mean(&values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(f: impl Fn(usize) -> f64) -> Vec<Option<f64>> {
        (0..HOURS_PER_DAY).map(|h| Some(f(h))).collect()
    }

    #[test]
    fn test_empty_week_is_empty_profile() {
        assert!(normalize(&WeeklyHistogram::new(), None).is_empty());
    }

    #[test]
    fn test_all_days_malformed_is_empty_profile() {
        let mut week = WeeklyHistogram::new();
        week.insert(0, vec![Some(10.0); 12]);
        let mut bad = day(|_| 50.0);
        bad[5] = None;
        week.insert(1, bad);
        week.insert(2, Vec::new());

        assert!(normalize(&week, None).is_empty());
        assert!(normalize(&week, TimeSlot::new(1, 5)).is_empty());
    }

    #[test]
    fn test_identical_days_round_trip() {
        let shape = |h: usize| (h * 4) as f64;
        let week: WeeklyHistogram = (0..7).map(|d| (d, day(shape))).collect();

        let profile = normalize(&week, None);
        assert_eq!(profile.entries().len(), 24);
        for entry in profile.entries() {
            assert_eq!(entry.busyness, shape(entry.hour as usize));
        }
    }

    #[test]
    fn test_averages_only_valid_days_and_rounds() {
        let mut week = WeeklyHistogram::new();
        week.insert(0, day(|_| 10.0));
        week.insert(1, day(|_| 15.0));
        week.insert(2, vec![Some(100.0); 23]);

        // 12.5 rounds to the even neighbour
        let profile = normalize(&week, None);
        assert!(profile.entries().iter().all(|e| e.busyness == 12.0));
    }

    #[test]
    fn test_half_busyness_rounds_to_even() {
        let mut week = WeeklyHistogram::new();
        week.insert(0, day(|_| 0.0));
        week.insert(1, day(|_| 1.0));
        assert!(normalize(&week, None).entries().iter().all(|e| e.busyness == 0.0));

        week.insert(2, day(|_| 2.0));
        week.insert(3, day(|_| 3.0));
        // 1.5 goes up to 2
        assert!(normalize(&week, None).entries().iter().all(|e| e.busyness == 2.0));
    }

    #[test]
    fn test_slot_returns_single_bucket() {
        let mut week = WeeklyHistogram::new();
        week.insert(3, day(|h| h as f64 * 2.6));

        let profile = normalize(&week, TimeSlot::new(3, 10));
        assert!(profile.is_single_slot());
        assert_eq!(profile.entries()[0], HourlyBusyness { hour: 10, busyness: 26.0 });
    }

    #[test]
    fn test_average_busyness_of_week() {
        let mut week = WeeklyHistogram::new();
        week.insert(1, day(|h| if h < 12 { 20.0 } else { 61.0 }));

        assert_eq!(average_busyness(&normalize(&week, None)), 40.5);
        assert_eq!(average_busyness(&BusynessProfile::default()), 0.0);
    }

    #[test]
    fn test_slot_on_missing_day_falls_back_to_average() {
        let mut week = WeeklyHistogram::new();
        week.insert(3, day(|_| 40.0));

        let profile = normalize(&week, TimeSlot::new(5, 12));
        assert_eq!(profile.entries().len(), 24);
    }
}
