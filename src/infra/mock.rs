//! Deterministic stand-ins used when no API key is configured.

use anyhow::Result;
use async_trait::async_trait;

use crate::scoring::histogram::{HOURS_PER_DAY, WeeklyHistogram, normalize};
use crate::geo::Coordinate;
use crate::services::{
    AreaQuery, AreaTrafficPayload, AreaTrafficProvider, Event, EventsPayload, EventsProvider, EventsQuery,
    FootTrafficPayload, FootTrafficProvider, FootTrafficQuery, PlaceBusyness,
};

pub struct MockEvents;

#[async_trait]
impl EventsProvider for MockEvents {
    async fn events(&self, _query: &EventsQuery) -> Result<EventsPayload> {
        Ok(EventsPayload {
            events: vec![
                Event {
                    title: "Street Food Festival".into(),
                    distance_km: Some(1.2),
                    attendance: Some(5000),
                    ..Default::default()
                },
                Event {
                    title: "Farmers Market".into(),
                    distance_km: Some(0.8),
                    attendance: Some(1200),
                    ..Default::default()
                },
            ],
        })
    }
}

pub struct MockFootTraffic;

/// Closed overnight, lunch and dinner peaks, busier on weekends.
fn mock_week() -> WeeklyHistogram {
    (0u8..7)
        .map(|weekday| {
            let weekend = weekday == 0 || weekday == 6;
            let day = (0..HOURS_PER_DAY)
                .map(|hour| {
                    let base: f64 = match hour {
                        0..=6 => 0.0,
                        7..=10 => 25.0,
                        11..=13 => 70.0,
                        14..=16 => 40.0,
                        17..=20 => 65.0,
                        _ => 20.0,
                    };
                    Some(if weekend { (base * 1.25).min(100.0) } else { base })
                })
                .collect();
            (weekday, day)
        })
        .collect()
}

#[async_trait]
impl FootTrafficProvider for MockFootTraffic {
    async fn popular_times(&self, query: &FootTrafficQuery) -> Result<FootTrafficPayload> {
        Ok(FootTrafficPayload {
            place_name: Some(query.place_query.clone()),
            source: "mock".to_string(),
            series: normalize(&mock_week(), query.slot),
        })
    }
}

pub struct MockAreaTraffic;

const MOCK_PLACES: [(&str, f64, f64, f64); 4] = [
    ("Mock Cafe", 37.7749, -122.4194, 80.0),
    ("Mock Restaurant", 37.7759, -122.4294, 55.0),
    ("Mock Park", 37.7739, -122.4154, 25.0),
    ("Mock Bar", 37.79, -122.41, 90.0),
];

/// The same four San Francisco places whatever the bounds.
#[async_trait]
impl AreaTrafficProvider for MockAreaTraffic {
    async fn area_popular_times(&self, _query: &AreaQuery) -> Result<AreaTrafficPayload> {
        let places = MOCK_PLACES
            .iter()
            .map(|&(name, lat, lng, avg_busyness)| -> Result<PlaceBusyness> {
                Ok(PlaceBusyness {
                    name: Some(name.to_string()),
                    coordinate: Some(Coordinate::new(lat, lng)?),
                    avg_busyness,
                    types: Vec::new(),
                })
            })
            .collect::<Result<_>>()?;
        Ok(AreaTrafficPayload {
            places,
            source: "mock".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::types::TimeSlot;

    #[tokio::test]
    async fn test_mock_events_have_distances() {
        let query = EventsQuery {
            query: "San Francisco".into(),
            date: None,
            origin: None,
        };
        let payload = MockEvents.events(&query).await.unwrap();
        assert_eq!(payload.events.len(), 2);
        assert!(payload.events.iter().all(|e| e.distance_km.is_some()));
    }

    #[tokio::test]
    async fn test_mock_foot_traffic_respects_slot() {
        let slot_query = FootTrafficQuery {
            place_query: "Dolores Park".into(),
            slot: TimeSlot::new(6, 12),
        };
        let payload = MockFootTraffic.popular_times(&slot_query).await.unwrap();
        assert!(payload.series.is_single_slot());
        assert_eq!(payload.series.entries()[0].busyness, 88.0);

        let all_day = FootTrafficQuery { slot: None, ..slot_query };
        let payload = MockFootTraffic.popular_times(&all_day).await.unwrap();
        assert_eq!(payload.series.entries().len(), 24);
    }

    #[tokio::test]
    async fn test_mock_area_lists_four_places() {
        let bounds = crate::services::Bounds::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let payload = MockAreaTraffic
            .area_popular_times(&AreaQuery::new(bounds, &[]))
            .await
            .unwrap();

        assert_eq!(payload.source, "mock");
        assert_eq!(payload.places.len(), 4);
        let json = serde_json::to_value(&payload.places[3]).unwrap();
        assert_eq!(json, serde_json::json!({
            "name": "Mock Bar",
            "coordinates": {"lat": 37.79, "lng": -122.41},
            "avg_busyness": 90.0
        }));
    }
}
