//! Trait and types for a historical popular-times source.

use anyhow::{Context, Result, ensure};
use serde::Serialize;

use crate::geo::Coordinate;
use crate::scoring::types::{BusynessProfile, TimeSlot};

#[derive(Debug, Clone)]
pub struct FootTrafficQuery {
    pub place_query: String,
    /// When set, providers return the one matching bucket if they have it.
    pub slot: Option<TimeSlot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FootTrafficPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
    pub source: String,
    pub series: BusynessProfile,
}

/// Abstraction over a popular-times provider (e.g., Outscraper).
#[async_trait::async_trait]
pub trait FootTrafficProvider: Send + Sync {
    async fn popular_times(&self, query: &FootTrafficQuery) -> Result<FootTrafficPayload>;
}

/// Place categories searched when an area query names none.
pub const DEFAULT_PLACE_TYPES: [&str; 6] = ["restaurant", "cafe", "food", "tourist_attraction", "store", "bar"];

/// A map rectangle given by its south-west and north-east corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    south_west: Coordinate,
    north_east: Coordinate,
}

impl Bounds {
    /// # Errors
    ///
    /// Fails if either corner is out of range or the south-west corner is
    /// not south and west of the north-east one.
    pub fn new(sw_lat: f64, sw_lng: f64, ne_lat: f64, ne_lng: f64) -> Result<Self> {
        let south_west = Coordinate::new(sw_lat, sw_lng).context("south-west corner")?;
        let north_east = Coordinate::new(ne_lat, ne_lng).context("north-east corner")?;
        ensure!(
            sw_lat <= ne_lat && sw_lng <= ne_lng,
            "south-west corner ({sw_lat}, {sw_lng}) must lie south-west of north-east corner ({ne_lat}, {ne_lng})"
        );
        Ok(Self { south_west, north_east })
    }

    pub fn south_west(&self) -> Coordinate {
        self.south_west
    }

    pub fn north_east(&self) -> Coordinate {
        self.north_east
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        (self.south_west.latitude()..=self.north_east.latitude()).contains(&point.latitude())
            && (self.south_west.longitude()..=self.north_east.longitude()).contains(&point.longitude())
    }

    pub fn center(&self) -> Coordinate {
        let lat = (self.south_west.latitude() + self.north_east.latitude()) / 2.0;
        let lng = (self.south_west.longitude() + self.north_east.longitude()) / 2.0;
        // midpoint of two in-range corners is in range
        Coordinate::new(lat, lng).unwrap_or(self.south_west)
    }
}

#[derive(Debug, Clone)]
pub struct AreaQuery {
    pub bounds: Bounds,
    pub types: Vec<String>,
}

impl AreaQuery {
    /// Blank entries are dropped; no types at all means [`DEFAULT_PLACE_TYPES`].
    pub fn new(bounds: Bounds, types: &[String]) -> Self {
        let mut types: Vec<String> = types
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if types.is_empty() {
            types = DEFAULT_PLACE_TYPES.iter().map(|t| t.to_string()).collect();
        }
        Self { bounds, types }
    }
}

/// One place in an area search with its whole-week average busyness (0-100).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceBusyness {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "coordinates", skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
    pub avg_busyness: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AreaTrafficPayload {
    pub places: Vec<PlaceBusyness>,
    pub source: String,
}

/// Popular times for every matching place inside a map rectangle.
#[async_trait::async_trait]
pub trait AreaTrafficProvider: Send + Sync {
    async fn area_popular_times(&self, query: &AreaQuery) -> Result<AreaTrafficPayload>;
}
