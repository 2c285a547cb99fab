//! Trait and types for a nearby-events source.

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use crate::geo::Coordinate;

#[derive(Debug, Clone)]
pub struct EventsQuery {
    pub query: String,
    pub date: Option<NaiveDate>,
    /// Point that event distances are measured from, when known.
    pub origin: Option<Coordinate>,
}

/// A single event. Only `title` is guaranteed; distance may be given
/// directly or derived from `coordinate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Event {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventsPayload {
    pub events: Vec<Event>,
}

/// Abstraction over an events search provider (e.g., SerpApi Google Events).
#[async_trait::async_trait]
pub trait EventsProvider: Send + Sync {
    async fn events(&self, query: &EventsQuery) -> Result<EventsPayload>;
}
