use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::Weekday;
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::fetch::auth::ApiKey;
use crate::fetch::{BasicClient, HttpClient, fetch_json};
use crate::geo::Coordinate;
use crate::scoring::histogram::{HOURS_PER_DAY, WeeklyHistogram, average_busyness, normalize};
use crate::services::{
    AreaQuery, AreaTrafficPayload, AreaTrafficProvider, Bounds, FootTrafficPayload, FootTrafficProvider,
    FootTrafficQuery, PlaceBusyness,
};

const BASE_URL: &str = "https://api.app.outscraper.com/maps/search-v3";
const TIMEOUT: Duration = Duration::from_secs(30);
const PLACE_ID_PREFIX: &str = "placeid:";
const AREA_RESULTS_PER_TYPE: &str = "20";
const AREA_ZOOM: u8 = 14;

/// Popular-times histograms from Outscraper's Google Maps search.
pub struct OutscraperClient<C = ApiKey<BasicClient>> {
    http: C,
    base_url: String,
    locality: String,
}

impl OutscraperClient {
    pub fn new(api_key: &str, locality: &str) -> Result<Self> {
        let http = ApiKey::new(BasicClient::with_timeout(TIMEOUT)?, "X-API-KEY", api_key)?;
        Ok(Self::with_client(http, BASE_URL, locality))
    }
}

impl<C> OutscraperClient<C> {
    pub fn with_client(http: C, base_url: &str, locality: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            locality: locality.to_string(),
        }
    }

    /// `placeid:<id>` is sent as the bare id; free text gets the locality
    /// appended unless it already mentions it.
    pub fn search_term(&self, place_query: &str) -> String {
        let trimmed = place_query.trim();
        if let Some(id) = trimmed.strip_prefix(PLACE_ID_PREFIX) {
            return id.trim().to_string();
        }
        if self.locality.is_empty() || trimmed.to_lowercase().contains(&self.locality.to_lowercase()) {
            trimmed.to_string()
        } else {
            format!("{trimmed}, {}", self.locality)
        }
    }

    pub fn search_url(&self, place_query: &str) -> Result<Url> {
        let term = self.search_term(place_query);
        Url::parse_with_params(
            &self.base_url,
            &[
                ("query", term.as_str()),
                ("limit", "1"),
                ("async", "false"),
                ("language", "en"),
            ],
        )
        .context("invalid Outscraper base URL")
    }

    /// One request with a `query` per place type, centred on the bounds.
    pub fn area_url(&self, query: &AreaQuery) -> Result<Url> {
        let center = query.bounds.center();
        let coordinates = format!("@{},{},{AREA_ZOOM}z", center.latitude(), center.longitude());

        let mut params: Vec<(&str, &str)> = query.types.iter().map(|t| ("query", t.as_str())).collect();
        params.extend([
            ("coordinates", coordinates.as_str()),
            ("limit", AREA_RESULTS_PER_TYPE),
            ("async", "false"),
            ("language", "en"),
        ]);
        Url::parse_with_params(&self.base_url, &params).context("invalid Outscraper base URL")
    }
}

/// Weekday of one `popular_times` entry, 0 = Sunday. Prefers `day_text`,
/// falling back to the numeric `day` (1 = Monday .. 7 = Sunday).
fn weekday_of(day: &Value) -> Option<u8> {
    if let Some(name) = day["day_text"].as_str() {
        if let Ok(weekday) = Weekday::from_str(name.trim()) {
            return Some(weekday.num_days_from_sunday() as u8);
        }
    }
    match day["day"].as_u64() {
        Some(n @ 1..=7) => Some((n % 7) as u8),
        _ => None,
    }
}

/// Builds the weekly histogram for one place. Hours the place does not
/// report count as 0; a non-numeric percentage poisons that day.
pub fn weekly_histogram(place: &Value) -> WeeklyHistogram {
    let mut week = WeeklyHistogram::new();
    let Some(days) = place["popular_times"].as_array() else {
        return week;
    };

    for day in days {
        let Some(weekday) = weekday_of(day) else {
            continue;
        };
        let Some(hours) = day["popular_times"].as_array() else {
            continue;
        };

        let mut values = vec![Some(0.0); HOURS_PER_DAY];
        for entry in hours {
            let Some(hour) = entry["hour"].as_u64().filter(|h| (*h as usize) < HOURS_PER_DAY) else {
                continue;
            };
            values[hour as usize] = entry["percentage"].as_f64();
        }
        week.insert(weekday, values);
    }

    week
}

/// First place in an Outscraper response (`data` is a list of result lists).
fn first_place(response: &Value) -> Option<&Value> {
    response["data"].as_array()?.first().and_then(|results| match results {
        Value::Array(places) => places.first(),
        Value::Object(_) => Some(results),
        _ => None,
    })
}

fn place_coordinate(place: &Value) -> Option<Coordinate> {
    Coordinate::new(place["latitude"].as_f64()?, place["longitude"].as_f64()?).ok()
}

fn place_types(place: &Value) -> Vec<String> {
    let listed = place["subtypes"].as_str().or_else(|| place["type"].as_str()).unwrap_or_default();
    listed
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Places inside `bounds` that report popular times, once each, with their
/// week-averaged busyness. Every result list in `data` is searched.
pub fn area_places(response: &Value, bounds: &Bounds) -> Vec<PlaceBusyness> {
    let Some(lists) = response["data"].as_array() else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    lists
        .iter()
        .filter_map(Value::as_array)
        .flatten()
        .filter(|place| place["popular_times"].as_array().is_some_and(|days| !days.is_empty()))
        .filter_map(|place| {
            let coordinate = place_coordinate(place)?;
            if !bounds.contains(coordinate) {
                return None;
            }
            let id = place["place_id"].as_str().map(String::from).unwrap_or_else(|| {
                format!("{}@{},{}", place["name"], coordinate.latitude(), coordinate.longitude())
            });
            if !seen.insert(id) {
                return None;
            }

            Some(PlaceBusyness {
                name: place["name"].as_str().map(String::from),
                coordinate: Some(coordinate),
                avg_busyness: average_busyness(&normalize(&weekly_histogram(place), None)),
                types: place_types(place),
            })
        })
        .collect()
}

#[async_trait]
impl<C: HttpClient> AreaTrafficProvider for OutscraperClient<C> {
    #[tracing::instrument(skip(self), fields(types = ?query.types))]
    async fn area_popular_times(&self, query: &AreaQuery) -> Result<AreaTrafficPayload> {
        let url = self.area_url(query)?;
        let response: Value = fetch_json(&self.http, url)
            .await
            .context("Outscraper area search request failed")?;

        let places = area_places(&response, &query.bounds);
        debug!(count = places.len(), "Area places received");
        Ok(AreaTrafficPayload {
            places,
            source: "outscraper_bounds".to_string(),
        })
    }
}

#[async_trait]
impl<C: HttpClient> FootTrafficProvider for OutscraperClient<C> {
    #[tracing::instrument(skip(self), fields(place = %query.place_query))]
    async fn popular_times(&self, query: &FootTrafficQuery) -> Result<FootTrafficPayload> {
        let url = self.search_url(&query.place_query)?;
        let response: Value = fetch_json(&self.http, url)
            .await
            .context("Outscraper search request failed")?;

        let place = first_place(&response)
            .ok_or_else(|| anyhow!("Place '{}' not found.", query.place_query))?;
        let week = weekly_histogram(place);
        debug!(days = week.len(), "Popular times received");

        Ok(FootTrafficPayload {
            place_name: place["name"].as_str().map(String::from),
            source: "outscraper".to_string(),
            series: normalize(&week, query.slot),
        })
    }
}
