//! Trait and types for an hourly weather forecast source.

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

#[derive(Debug, Clone)]
pub struct WeatherQuery {
    pub coordinate: Coordinate,
    /// Day to forecast; `None` means the series starts today.
    pub date: Option<NaiveDate>,
}

/// Parallel hourly arrays. Any array may be shorter than the others or
/// contain gaps (`null`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default, rename = "temperature_2m")]
    pub temperature: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation: Vec<Option<f64>>,
    #[serde(default)]
    pub cloud_cover: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherPayload {
    #[serde(default)]
    pub hourly: HourlySeries,
}

/// Abstraction over a forecast provider (e.g., Open-Meteo).
#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn forecast(&self, query: &WeatherQuery) -> Result<WeatherPayload>;
}
