//! Prediction orchestrator.
//!
//! Fans out the weather, events and popular-times calls concurrently, turns
//! every outcome (success, error, panic or timeout) into a [`ProviderResult`],
//! scores the three results and combines them into a [`PredictionResult`].

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use futures::FutureExt;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ScoringConfig;
use crate::geo::Coordinate;
use crate::scoring::combine::{Combiner, Strategy, label};
use crate::scoring::score_signals;
use crate::scoring::types::{Features, Label, RequestTime};
use crate::services::{
    EventsPayload, EventsProvider, EventsQuery, FootTrafficPayload, FootTrafficProvider,
    FootTrafficQuery, ProviderResult, WeatherPayload, WeatherProvider, WeatherQuery,
};

pub const DEFAULT_PLACE_QUERY: &str = "San Francisco";
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// The three collaborators a prediction fans out to.
#[derive(Clone)]
pub struct Providers {
    pub weather: Arc<dyn WeatherProvider>,
    pub events: Arc<dyn EventsProvider>,
    pub foot: Arc<dyn FootTrafficProvider>,
}

/// Validated prediction input.
#[derive(Debug, Clone)]
pub struct PredictionRequest {
    pub coordinate: Coordinate,
    pub time: RequestTime,
    pub place_query: String,
}

impl PredictionRequest {
    /// Validates coordinates and parses the optional ISO-8601 date/time.
    ///
    /// # Errors
    ///
    /// Fails only for out-of-range coordinates. An unparseable date/time is
    /// ignored and a blank place query becomes [`DEFAULT_PLACE_QUERY`].
    pub fn new(latitude: f64, longitude: f64, when: Option<&str>, place_query: &str) -> Result<Self> {
        let place_query = match place_query.trim() {
            "" => DEFAULT_PLACE_QUERY.to_string(),
            q => q.to_string(),
        };
        Ok(Self {
            coordinate: Coordinate::new(latitude, longitude)?,
            time: RequestTime::parse(when),
            place_query,
        })
    }

    pub fn weather_query(&self) -> WeatherQuery {
        WeatherQuery {
            coordinate: self.coordinate,
            date: self.time.date,
        }
    }

    pub fn events_query(&self) -> EventsQuery {
        EventsQuery {
            query: self.place_query.clone(),
            date: self.time.date,
            origin: Some(self.coordinate),
        }
    }

    pub fn foot_traffic_query(&self) -> FootTrafficQuery {
        FootTrafficQuery {
            place_query: self.place_query.clone(),
            slot: self.time.slot,
        }
    }
}

/// Every provider outcome, reported alongside the score.
#[derive(Debug, Clone, Serialize)]
pub struct RawResults {
    pub weather: ProviderResult<WeatherPayload>,
    pub events: ProviderResult<EventsPayload>,
    pub foot: ProviderResult<FootTrafficPayload>,
}

/// Final, immutable outcome of one prediction.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    score: f64,
    label: Label,
    strategy: Strategy,
    features: Features,
    raw: RawResults,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
}

impl PredictionResult {
    /// Score on a 0-100 scale.
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// The values the chosen strategy consumed: features for the model,
    /// modifiers plus the historical baseline for the heuristic.
    pub fn features(&self) -> &Features {
        &self.features
    }

    pub fn raw(&self) -> &RawResults {
        &self.raw
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn with_summary(self, summary: String) -> Self {
        Self {
            summary: Some(summary),
            ..self
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "provider panicked".to_string()
    }
}

/// Runs one provider call so that nothing it does can escape: errors, panics
/// and overruns of `timeout` all become [`ProviderResult::Err`].
pub async fn guarded<T, F>(source: &'static str, timeout: Duration, call: F) -> ProviderResult<T>
where
    F: Future<Output = Result<T>>,
{
    let result = match tokio::time::timeout(timeout, AssertUnwindSafe(call).catch_unwind()).await {
        Ok(Ok(outcome)) => ProviderResult::from(outcome),
        Ok(Err(panic)) => ProviderResult::Err(format!("{source} provider panicked: {}", panic_message(panic))),
        Err(_) => ProviderResult::Err(format!("{source} provider timed out after {}s", timeout.as_secs_f64())),
    };

    if let Some(error) = result.error() {
        warn!(source, error, "Provider failed, using neutral default");
    }
    result
}

/// Orchestrates one prediction. Holds the combiner (and its fitted model)
/// for the life of the process; nothing in it is mutated after construction.
pub struct Predictor {
    providers: Providers,
    combiner: Combiner,
    scoring: ScoringConfig,
    provider_timeout: Duration,
}

impl Predictor {
    pub fn new(providers: Providers, combiner: Combiner) -> Self {
        Self {
            providers,
            combiner,
            scoring: ScoringConfig::default(),
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// # Errors
    ///
    /// Rejects a config that fails [`ScoringConfig::validate`].
    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Result<Self> {
        scoring.validate()?;
        self.scoring = scoring;
        Ok(self)
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn combiner(&self) -> &Combiner {
        &self.combiner
    }

    /// Always produces a result; provider failures only shift features to
    /// their neutral defaults.
    #[tracing::instrument(
        skip(self, request),
        fields(lat = request.coordinate.latitude(), lng = request.coordinate.longitude(), place = %request.place_query)
    )]
    pub async fn predict(&self, request: &PredictionRequest) -> PredictionResult {
        let weather_query = request.weather_query();
        let events_query = request.events_query();
        let foot_query = request.foot_traffic_query();

        let (weather, events, foot) = tokio::join!(
            guarded("weather", self.provider_timeout, self.providers.weather.forecast(&weather_query)),
            guarded("events", self.provider_timeout, self.providers.events.events(&events_query)),
            guarded("foot_traffic", self.provider_timeout, self.providers.foot.popular_times(&foot_query)),
        );

        let signals = score_signals(&weather, &events, &foot, request.coordinate, &self.scoring);
        debug!(features = ?signals.features, modifiers = ?signals.modifiers, "Signals scored");

        let combined = self.combiner.combine(&signals);
        let label = label(combined.score);
        let score = combined.score * 100.0;

        info!(
            score,
            label = ?label,
            strategy = ?combined.strategy,
            weather_ok = weather.is_ok(),
            events_ok = events.is_ok(),
            foot_ok = foot.is_ok(),
            "Prediction complete"
        );

        PredictionResult {
            score,
            label,
            strategy: combined.strategy,
            features: combined.inputs,
            raw: RawResults { weather, events, foot },
            summary: None,
        }
    }

    /// Like [`Predictor::predict`], but gives up after `deadline`. In-flight
    /// provider calls are dropped and no partial result is returned.
    pub async fn predict_within(&self, request: &PredictionRequest, deadline: Duration) -> Result<PredictionResult> {
        tokio::time::timeout(deadline, self.predict(request))
            .await
            .map_err(|_| anyhow!("prediction cancelled after {}s", deadline.as_secs_f64()))
    }
}
