//! Events feature (count based) and modifier (distance decayed).

use crate::config::ScoringConfig;
use crate::geo::{Coordinate, distance_km};
use crate::scoring::utility::clamp01;
use crate::services::{Event, EventsPayload, ProviderResult};

pub const NEUTRAL_MODIFIER: f64 = 1.0;

/// Distance from `origin` to the event: the provider's own figure if it sent
/// one, otherwise computed from coordinates. `None` if neither is available.
pub fn event_distance(event: &Event, origin: Option<Coordinate>) -> Option<f64> {
    if let Some(d) = event.distance_km.filter(|d| d.is_finite() && *d >= 0.0) {
        return Some(d);
    }
    Some(distance_km(origin?, event.coordinate?))
}

/// `base + step * count`, capped at 1.0. Failed or empty results give `base`.
pub fn events_feature(result: &ProviderResult<EventsPayload>, cfg: &ScoringConfig) -> f64 {
    let count = result.payload().map_or(0, |p| p.events.len());
    clamp01(cfg.event_base + cfg.event_step * count as f64)
}

/// `1 + sum(exp(-decay * km))` over events with a known distance, capped.
///
/// Events whose distance cannot be resolved are skipped.
pub fn events_modifier(
    result: &ProviderResult<EventsPayload>,
    origin: Option<Coordinate>,
    cfg: &ScoringConfig,
) -> f64 {
    let Some(payload) = result.payload() else {
        return NEUTRAL_MODIFIER;
    };

    let influence: f64 = payload
        .events
        .iter()
        .filter_map(|e| event_distance(e, origin))
        .map(|km| (-cfg.event_decay_per_km * km).exp())
        .sum();

    (NEUTRAL_MODIFIER + influence).min(cfg.event_modifier_cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_distance(km: f64) -> Event {
        Event {
            title: format!("event {km}"),
            distance_km: Some(km),
            ..Default::default()
        }
    }

    fn ok(events: Vec<Event>) -> ProviderResult<EventsPayload> {
        ProviderResult::Ok(EventsPayload { events })
    }

    #[test]
    fn test_feature_counts_and_saturates() {
        let cfg = ScoringConfig::default();
        assert_eq!(events_feature(&ok(vec![]), &cfg), 0.3);
        assert!((events_feature(&ok(vec![at_distance(1.0); 2]), &cfg) - 0.5).abs() < 1e-12);
        assert_eq!(events_feature(&ok(vec![at_distance(1.0); 7]), &cfg), 1.0);
        assert_eq!(events_feature(&ok(vec![at_distance(1.0); 12]), &cfg), 1.0);
    }

    #[test]
    fn test_error_is_neutral() {
        let cfg = ScoringConfig::default();
        let err = ProviderResult::Err("429 Too Many Requests".into());
        assert_eq!(events_feature(&err, &cfg), 0.3);
        assert_eq!(events_modifier(&err, None, &cfg), 1.0);
    }

    #[test]
    fn test_event_on_top_of_origin_hits_cap() {
        let cfg = ScoringConfig::default();
        assert_eq!(events_modifier(&ok(vec![at_distance(0.0)]), None, &cfg), 1.5);
    }

    #[test]
    fn test_decay_at_one_km() {
        let cfg = ScoringConfig::default();
        let m = events_modifier(&ok(vec![at_distance(1.0)]), None, &cfg);
        assert!((m - 1.301194).abs() < 1e-6);
    }

    #[test]
    fn test_far_events_barely_move_modifier() {
        let cfg = ScoringConfig::default();
        let m = events_modifier(&ok(vec![at_distance(5.0), at_distance(8.0)]), None, &cfg);
        assert!(m > 1.0 && m < 1.003);
    }

    #[test]
    fn test_unresolvable_distance_is_skipped() {
        let cfg = ScoringConfig::default();
        let no_distance = Event {
            title: "Somewhere".into(),
            ..Default::default()
        };
        assert_eq!(events_modifier(&ok(vec![no_distance]), None, &cfg), 1.0);
    }

    #[test]
    fn test_distance_from_coordinates() {
        let origin = Coordinate::new(37.7749, -122.4194).unwrap();
        let event = Event {
            title: "Nearby".into(),
            coordinate: Some(origin),
            ..Default::default()
        };
        assert_eq!(event_distance(&event, Some(origin)), Some(0.0));
        assert_eq!(event_distance(&event, None), None);

        let cfg = ScoringConfig::default();
        assert_eq!(events_modifier(&ok(vec![event]), Some(origin), &cfg), 1.5);
    }

    #[test]
    fn test_negative_distance_falls_back_to_coordinates() {
        let event = Event {
            title: "Bad".into(),
            distance_km: Some(-3.0),
            ..Default::default()
        };
        assert_eq!(event_distance(&event, None), None);
    }
}
