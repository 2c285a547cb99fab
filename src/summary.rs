//! Human-readable explanation of a prediction.
//!
//! A text-generation backend is tried first when configured; any failure,
//! timeout or empty reply falls back to a template built from the features.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::predict::{PredictionResult, guarded};
use crate::scoring::combine::Strategy;
use crate::scoring::types::Label;
use crate::services::{NarrativeBackend, ProviderResult};

const NOON: usize = 12;
const HIGH_BASELINE: f64 = 0.66;
const LOW_BASELINE: f64 = 0.33;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Summarizer {
    backend: Option<Arc<dyn NarrativeBackend>>,
    timeout: Duration,
}

impl Summarizer {
    pub fn new(backend: Option<Arc<dyn NarrativeBackend>>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Template only.
    pub fn offline() -> Self {
        Self::new(None)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Never fails and never returns an empty string.
    #[tracing::instrument(skip_all)]
    pub async fn summarize(&self, result: &PredictionResult) -> String {
        if let Some(backend) = &self.backend {
            let prompt = build_prompt(result);
            if let ProviderResult::Ok(text) = guarded("summary", self.timeout, backend.generate(&prompt)).await {
                let text = text.trim();
                if !text.is_empty() {
                    return text.to_string();
                }
            }
            debug!("Falling back to template summary");
        }
        template_summary(result)
    }
}

fn place_name(result: &PredictionResult) -> &str {
    result
        .raw()
        .foot
        .payload()
        .and_then(|p| p.place_name.as_deref())
        .unwrap_or("the selected area")
}

fn event_titles(result: &PredictionResult) -> Vec<&str> {
    result
        .raw()
        .events
        .payload()
        .map(|p| p.events.iter().map(|e| e.title.as_str()).collect())
        .unwrap_or_default()
}

fn label_word(label: Label) -> &'static str {
    match label {
        Label::High => "high",
        Label::Medium => "moderate",
        Label::Low => "low",
    }
}

/// Prompt sent to the text-generation backend.
pub fn build_prompt(result: &PredictionResult) -> String {
    let hourly = result.raw().weather.payload().map(|p| &p.hourly);
    let noon = |series: Option<&Vec<Option<f64>>>, default: f64| {
        series
            .and_then(|s| s.get(NOON).copied().flatten())
            .unwrap_or(default)
    };
    let temp = noon(hourly.map(|h| &h.temperature), 15.0);
    let precip = noon(hourly.map(|h| &h.precipitation), 0.0);

    let titles = event_titles(result);
    let events = if titles.is_empty() {
        "None reported".to_string()
    } else {
        titles.join(", ")
    };

    let mut prompt = String::new();
    prompt.push_str(
        "You advise a food truck operator on where to park. In two or three friendly, \
         concise sentences, explain the foot traffic outlook for the location below.\n\n",
    );
    let _ = writeln!(prompt, "Predicted traffic score: {:.0}/100 ({:?})", result.score(), result.label());
    let _ = writeln!(prompt, "Location: {}", place_name(result));
    let _ = writeln!(prompt, "Midday weather: {temp}°C, {precip}mm precipitation");
    let _ = writeln!(prompt, "Nearby events: {events}");
    prompt
}

/// Deterministic explanation from the score, label and features.
pub fn template_summary(result: &PredictionResult) -> String {
    let features = result.features();
    let mut parts = vec![format!(
        "Foot traffic near {} looks {} ({:.0}/100).",
        place_name(result),
        label_word(result.label()),
        result.score()
    )];

    // Neutral point differs per strategy: modifiers centre on 1.0, features on 0.5
    let neutral_weather = match result.strategy() {
        Strategy::Heuristic => 1.0,
        Strategy::Model => 0.5,
    };
    parts.push(if !result.raw().weather.is_ok() {
        "Weather data was unavailable, so it was treated as neutral.".to_string()
    } else if features.weather > neutral_weather + 1e-9 {
        "Pleasant weather should boost traffic.".to_string()
    } else if features.weather < neutral_weather - 1e-9 {
        "The weather is likely to suppress traffic.".to_string()
    } else {
        "The weather should have little effect.".to_string()
    });

    let titles = event_titles(result);
    parts.push(match titles.as_slice() {
        [] => "No nearby events were reported.".to_string(),
        [one] => format!("One nearby event may draw crowds: {one}."),
        [first, rest @ ..] => format!("{} nearby events may draw crowds, including {first}.", rest.len() + 1),
    });

    parts.push(
        match features.historical {
            h if h >= HIGH_BASELINE => "Historically this spot is busy at this time.",
            h if h <= LOW_BASELINE => "Historically this spot is quiet at this time.",
            _ => "Historically this spot sees moderate traffic.",
        }
        .to_string(),
    );

    parts.join(" ")
}
