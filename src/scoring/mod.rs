//! Pure numeric core: histogram normalization, per-source scorers, the
//! regression model and the score combiner.
//!
//! Nothing here performs I/O; every scorer accepts a provider result (success
//! or failure) and returns a finite, range-bounded value.

pub mod combine;
pub mod events;
pub mod histogram;
pub mod historical;
pub mod model;
pub mod types;
pub mod utility;
pub mod weather;

use crate::config::ScoringConfig;
use crate::geo::Coordinate;
use crate::services::{EventsPayload, FootTrafficPayload, ProviderResult, WeatherPayload};
use types::{Features, Signals};

/// Scores all three provider results in both feature and modifier form.
pub fn score_signals(
    weather: &ProviderResult<WeatherPayload>,
    events: &ProviderResult<EventsPayload>,
    foot: &ProviderResult<FootTrafficPayload>,
    origin: Coordinate,
    cfg: &ScoringConfig,
) -> Signals {
    let baseline = historical::historical_baseline(foot);

    Signals {
        features: Features {
            weather: weather::weather_feature(weather, cfg),
            events: events::events_feature(events, cfg),
            historical: baseline,
        },
        modifiers: Features {
            weather: weather::weather_modifier(weather, cfg),
            events: events::events_modifier(events, Some(origin), cfg),
            historical: baseline,
        },
    }
}
