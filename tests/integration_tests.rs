use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use foot_traffic::infra::mock::{MockEvents, MockFootTraffic};
use foot_traffic::predict::{PredictionRequest, Predictor, Providers};
use foot_traffic::scoring::combine::{Combiner, Strategy};
use foot_traffic::scoring::types::Label;
use foot_traffic::services::{
    EventsPayload, EventsProvider, EventsQuery, FootTrafficPayload, FootTrafficProvider,
    FootTrafficQuery, WeatherPayload, WeatherProvider, WeatherQuery,
};
use foot_traffic::summary::Summarizer;

struct Unreachable;

#[async_trait]
impl WeatherProvider for Unreachable {
    async fn forecast(&self, _q: &WeatherQuery) -> Result<WeatherPayload> {
        Err(anyhow!("connection refused"))
    }
}

#[async_trait]
impl EventsProvider for Unreachable {
    async fn events(&self, _q: &EventsQuery) -> Result<EventsPayload> {
        Err(anyhow!("connection refused"))
    }
}

#[async_trait]
impl FootTrafficProvider for Unreachable {
    async fn popular_times(&self, _q: &FootTrafficQuery) -> Result<FootTrafficPayload> {
        Err(anyhow!("connection refused"))
    }
}

struct Sluggish;

#[async_trait]
impl WeatherProvider for Sluggish {
    async fn forecast(&self, _q: &WeatherQuery) -> Result<WeatherPayload> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Err(anyhow!("upstream 503"))
    }
}

fn all_unreachable() -> Providers {
    let down = Arc::new(Unreachable);
    Providers {
        weather: down.clone(),
        events: down.clone(),
        foot: down,
    }
}

#[tokio::test]
async fn test_every_provider_down_gives_neutral_prediction() {
    let request = PredictionRequest::new(37.7749, -122.4194, None, "San Francisco").unwrap();
    let result = Predictor::new(all_unreachable(), Combiner::Heuristic)
        .predict(&request)
        .await;

    assert!((result.score() - 50.0).abs() < 1e-9);
    assert_eq!(result.label(), Label::Medium);
    assert_eq!(result.strategy(), Strategy::Heuristic);
    assert!(!result.raw().weather.is_ok());
    assert!(!result.raw().events.is_ok());
    assert!(!result.raw().foot.is_ok());

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["raw"]["events"]["error"], "connection refused");
}

#[tokio::test]
async fn test_mock_backends_on_a_saturday_lunch() {
    let providers = Providers {
        weather: Arc::new(Unreachable),
        events: Arc::new(MockEvents),
        foot: Arc::new(MockFootTraffic),
    };
    let request =
        PredictionRequest::new(37.7749, -122.4194, Some("2024-06-01T12:00"), "Dolores Park").unwrap();
    let result = Predictor::new(providers, Combiner::Heuristic)
        .predict(&request)
        .await;

    // 0.88 baseline x neutral weather x capped 1.5 event modifier, clamped to 1
    assert!((result.features().historical - 0.88).abs() < 1e-9);
    assert_eq!(result.features().events, 1.5);
    assert_eq!(result.score(), 100.0);
    assert_eq!(result.label(), Label::High);

    let summary = Summarizer::offline().summarize(&result).await;
    assert!(summary.starts_with("Foot traffic near Dolores Park looks high (100/100)."));
    assert!(summary.contains("2 nearby events may draw crowds, including Street Food Festival."));
}

#[tokio::test]
async fn test_model_strategy_with_every_provider_down() {
    let request = PredictionRequest::new(37.7749, -122.4194, None, "").unwrap();
    let result = Predictor::new(all_unreachable(), Combiner::for_strategy(Strategy::Model))
        .predict(&request)
        .await;

    assert_eq!(result.strategy(), Strategy::Model);
    // Events feature falls back to its 0.3 base, the others to 0.5
    assert_eq!(result.features().events, 0.3);
    assert!(result.score() > 0.0 && result.score() < 100.0);
}

#[tokio::test]
async fn test_slow_failure_is_awaited_not_abandoned() {
    let down = Arc::new(Unreachable);
    let providers = Providers {
        weather: Arc::new(Sluggish),
        events: down.clone(),
        foot: down,
    };
    let request = PredictionRequest::new(37.7749, -122.4194, None, "San Francisco").unwrap();
    let result = Predictor::new(providers, Combiner::Heuristic)
        .predict_within(&request, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(result.raw().weather.error(), Some("upstream 503"));
    assert_eq!(result.label(), Label::Medium);
}

#[tokio::test]
async fn test_deadline_cancels_whole_prediction() {
    let down = Arc::new(Unreachable);
    let providers = Providers {
        weather: Arc::new(Sluggish),
        events: down.clone(),
        foot: down,
    };
    let request = PredictionRequest::new(37.7749, -122.4194, None, "San Francisco").unwrap();
    let outcome = Predictor::new(providers, Combiner::Heuristic)
        .predict_within(&request, Duration::from_millis(20))
        .await;

    assert!(outcome.is_err());
}
