//! Contracts for the external collaborators the predictor depends on.
//!
//! Each provider is an async trait returning `anyhow::Result<Payload>`; the
//! orchestrator turns every outcome into a [`ProviderResult`].

pub mod events_api;
pub mod foot_traffic_api;
pub mod summary_api;
pub mod weather_api;

pub use events_api::{Event, EventsPayload, EventsProvider, EventsQuery};
pub use foot_traffic_api::{
    AreaQuery, AreaTrafficPayload, AreaTrafficProvider, Bounds, DEFAULT_PLACE_TYPES, FootTrafficPayload,
    FootTrafficProvider, FootTrafficQuery, PlaceBusyness,
};
pub use summary_api::NarrativeBackend;
pub use weather_api::{HourlySeries, WeatherPayload, WeatherProvider, WeatherQuery};

use serde::Serialize;

/// Outcome of one provider call, kept for transparency in the final result.
///
/// Serializes as `{"data": ...}` on success and `{"error": "..."}` on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ProviderResult<T> {
    #[serde(rename = "data")]
    Ok(T),
    #[serde(rename = "error")]
    Err(String),
}

impl<T> ProviderResult<T> {
    pub fn payload(&self) -> Option<&T> {
        match self {
            ProviderResult::Ok(payload) => Some(payload),
            ProviderResult::Err(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ProviderResult::Ok(_) => None,
            ProviderResult::Err(message) => Some(message.as_str()),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ProviderResult::Ok(_))
    }
}

impl<T> From<anyhow::Result<T>> for ProviderResult<T> {
    fn from(result: anyhow::Result<T>) -> Self {
        match result {
            Ok(payload) => ProviderResult::Ok(payload),
            // `{:#}` keeps the context chain on one line
            Err(e) => ProviderResult::Err(format!("{e:#}")),
        }
    }
}
