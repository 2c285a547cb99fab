use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::config::Settings;
use crate::fetch::{BasicClient, HttpClient, fetch_json};
use crate::services::{WeatherPayload, WeatherProvider, WeatherQuery};

const TIMEOUT: Duration = Duration::from_secs(20);
const HOURLY_FIELDS: &str = "temperature_2m,precipitation,cloud_cover,windspeed_10m";

/// Hourly forecasts from the Open-Meteo API. No key required.
pub struct OpenMeteoClient<C = BasicClient> {
    http: C,
    base_url: String,
    timezone: String,
}

impl OpenMeteoClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self::with_client(
            BasicClient::with_timeout(TIMEOUT)?,
            &settings.open_meteo_base,
            &settings.open_meteo_timezone,
        ))
    }
}

impl<C> OpenMeteoClient<C> {
    pub fn with_client(http: C, base_url: &str, timezone: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            timezone: timezone.to_string(),
        }
    }

    /// A dated query pins the series to that day, so hour index 0 is local
    /// midnight of the requested date.
    pub fn forecast_url(&self, query: &WeatherQuery) -> Result<Url> {
        let mut params = vec![
            ("latitude", query.coordinate.latitude().to_string()),
            ("longitude", query.coordinate.longitude().to_string()),
            ("hourly", HOURLY_FIELDS.to_string()),
            ("timezone", self.timezone.clone()),
        ];
        if let Some(date) = query.date {
            let day = date.format("%Y-%m-%d").to_string();
            params.push(("start_date", day.clone()));
            params.push(("end_date", day));
        }
        Url::parse_with_params(&self.base_url, &params)
            .with_context(|| format!("invalid Open-Meteo base URL '{}'", self.base_url))
    }
}

#[async_trait]
impl<C: HttpClient> WeatherProvider for OpenMeteoClient<C> {
    #[tracing::instrument(skip(self), fields(lat = query.coordinate.latitude(), lng = query.coordinate.longitude()))]
    async fn forecast(&self, query: &WeatherQuery) -> Result<WeatherPayload> {
        let url = self.forecast_url(query)?;
        let payload: WeatherPayload = fetch_json(&self.http, url)
            .await
            .context("Open-Meteo forecast request failed")?;
        debug!(hours = payload.hourly.temperature.len(), "Forecast received");
        Ok(payload)
    }
}
