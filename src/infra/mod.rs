//! Concrete provider clients and the wiring that picks them from settings.
//!
//! Weather always uses Open-Meteo. Events and popular times use their paid
//! APIs when a key is configured and deterministic mocks otherwise.

pub mod gemini {
    pub mod client;
}
pub mod mock;
pub mod open_meteo {
    pub mod client;
}
pub mod outscraper {
    pub mod client;
}
pub mod serpapi {
    pub mod client;
}

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::Settings;
use crate::predict::Providers;
use crate::services::{AreaTrafficProvider, EventsProvider, FootTrafficProvider, NarrativeBackend};

pub fn providers_from_settings(settings: &Settings) -> Result<Providers> {
    let weather = Arc::new(open_meteo::client::OpenMeteoClient::new(settings)?);

    let events: Arc<dyn EventsProvider> = match &settings.serpapi_api_key {
        Some(key) => Arc::new(serpapi::client::SerpApiClient::new(key, &settings.events_location)?),
        None => {
            info!("SERPAPI_API_KEY not set, using mock events");
            Arc::new(mock::MockEvents)
        }
    };

    let foot: Arc<dyn FootTrafficProvider> = match &settings.outscraper_api_key {
        Some(key) => Arc::new(outscraper::client::OutscraperClient::new(key, &settings.place_locality)?),
        None => {
            info!("OUTSCRAPER_API_KEY not set, using mock popular times");
            Arc::new(mock::MockFootTraffic)
        }
    };

    Ok(Providers { weather, events, foot })
}

/// Outscraper area search when keyed, the fixed mock places otherwise.
pub fn area_provider_from_settings(settings: &Settings) -> Result<Arc<dyn AreaTrafficProvider>> {
    let area: Arc<dyn AreaTrafficProvider> = match &settings.outscraper_api_key {
        Some(key) => Arc::new(outscraper::client::OutscraperClient::new(key, &settings.place_locality)?),
        None => {
            info!("OUTSCRAPER_API_KEY not set, using mock area places");
            Arc::new(mock::MockAreaTraffic)
        }
    };
    Ok(area)
}

/// `None` when no Gemini key is configured; summaries then use the template.
pub fn narrator_from_settings(settings: &Settings) -> Result<Option<Arc<dyn NarrativeBackend>>> {
    let Some(key) = &settings.gemini_api_key else {
        return Ok(None);
    };
    let client = gemini::client::GeminiClient::new(key, &settings.gemini_model)?;
    Ok(Some(Arc::new(client)))
}
