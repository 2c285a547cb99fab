use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::fetch::auth::UrlParam;
use crate::fetch::{BasicClient, HttpClient, fetch_json};
use crate::services::{Event, EventsPayload, EventsProvider, EventsQuery};

const BASE_URL: &str = "https://serpapi.com/search.json";
const TIMEOUT: Duration = Duration::from_secs(30);

/// Google Events search through SerpApi.
pub struct SerpApiClient<C = UrlParam<BasicClient>> {
    http: C,
    base_url: String,
    location: String,
}

impl SerpApiClient {
    pub fn new(api_key: &str, location: &str) -> Result<Self> {
        let http = UrlParam::new(BasicClient::with_timeout(TIMEOUT)?, "api_key", api_key);
        Ok(Self::with_client(http, BASE_URL, location))
    }
}

impl<C> SerpApiClient<C> {
    pub fn with_client(http: C, base_url: &str, location: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            location: location.to_string(),
        }
    }

    pub fn search_url(&self, query: &EventsQuery) -> Result<Url> {
        let q = match query.date {
            Some(date) => format!("{} {}", query.query, date.format("%Y-%m-%d")),
            None => query.query.clone(),
        };
        Url::parse_with_params(
            &self.base_url,
            &[
                ("engine", "google_events"),
                ("q", q.as_str()),
                ("hl", "en"),
                ("gl", "us"),
                ("location", self.location.as_str()),
            ],
        )
        .context("invalid SerpApi base URL")
    }
}

fn text(value: &Value) -> Option<String> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty()).map(String::from)
}

/// Converts SerpApi `events_results` into [`Event`]s. Entries without a
/// title are dropped; every other field is optional.
pub fn normalize_events(payload: &Value) -> Vec<Event> {
    let Some(results) = payload["events_results"].as_array() else {
        return Vec::new();
    };

    results
        .iter()
        .filter_map(|ev| {
            let title = text(&ev["title"])?;
            let when = text(&ev["date"]["when"])
                .or_else(|| text(&ev["date"]["start_date"]))
                .or_else(|| text(&ev["when"]));
            let address = match &ev["address"] {
                Value::Array(lines) => {
                    let parts: Vec<String> = lines.iter().filter_map(text).collect();
                    (!parts.is_empty()).then(|| parts.join(", "))
                }
                other => text(other),
            };
            let venue = text(&ev["venue"]["name"]).or_else(|| text(&ev["venue"]));

            Some(Event {
                title,
                when,
                venue,
                address,
                link: text(&ev["link"]),
                ..Default::default()
            })
        })
        .collect()
}

#[async_trait]
impl<C: HttpClient> EventsProvider for SerpApiClient<C> {
    #[tracing::instrument(skip(self), fields(q = %query.query))]
    async fn events(&self, query: &EventsQuery) -> Result<EventsPayload> {
        let url = self.search_url(query)?;
        let payload: Value = fetch_json(&self.http, url)
            .await
            .context("SerpApi events request failed")?;
        if let Some(error) = payload["error"].as_str() {
            anyhow::bail!("SerpApi error: {error}");
        }

        let events = normalize_events(&payload);
        debug!(count = events.len(), "Events normalized");
        Ok(EventsPayload { events })
    }
}
