//! Runtime configuration: provider endpoints and keys from the environment,
//! scoring constants from an optional JSON file.

use std::ops::RangeInclusive;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

/// Bounds every heuristic modifier must stay within.
pub const MODIFIER_RANGE: RangeInclusive<f64> = 0.0..=2.0;

/// Tunable constants used by the feature scorers.
///
/// Stored as a JSON object on disk; any omitted field keeps its default:
/// ```json
/// { "event_decay_per_km": 0.9, "weather_modifier_floor": 0.75 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub ideal_temp_c: f64,
    pub temp_tolerance_c: f64,
    pub precip_cap_mm: f64,
    pub temp_weight: f64,
    pub precip_weight: f64,
    pub cloud_weight: f64,
    /// First hour index of the daytime window.
    pub daytime_start: usize,
    /// Exclusive end of the daytime window.
    pub daytime_end: usize,
    pub weather_modifier_floor: f64,
    pub weather_modifier_span: f64,
    pub event_base: f64,
    pub event_step: f64,
    pub event_decay_per_km: f64,
    pub event_modifier_cap: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            ideal_temp_c: 20.0,
            temp_tolerance_c: 10.0,
            precip_cap_mm: 5.0,
            temp_weight: 0.5,
            precip_weight: 0.35,
            cloud_weight: 0.15,
            daytime_start: 8,
            daytime_end: 20,
            weather_modifier_floor: 0.7,
            weather_modifier_span: 0.6,
            event_base: 0.3,
            event_step: 0.1,
            event_decay_per_km: 1.2,
            event_modifier_cap: 1.5,
        }
    }
}

impl ScoringConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading scoring config '{path}'"))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("parsing scoring config '{path}'"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let numbers = [
            ("ideal_temp_c", self.ideal_temp_c),
            ("temp_tolerance_c", self.temp_tolerance_c),
            ("precip_cap_mm", self.precip_cap_mm),
            ("temp_weight", self.temp_weight),
            ("precip_weight", self.precip_weight),
            ("cloud_weight", self.cloud_weight),
            ("weather_modifier_floor", self.weather_modifier_floor),
            ("weather_modifier_span", self.weather_modifier_span),
            ("event_base", self.event_base),
            ("event_step", self.event_step),
            ("event_decay_per_km", self.event_decay_per_km),
            ("event_modifier_cap", self.event_modifier_cap),
        ];
        for (name, value) in numbers {
            ensure!(value.is_finite(), "{name} must be a finite number, got {value}");
        }

        ensure!(
            self.daytime_start < self.daytime_end && self.daytime_end <= 24,
            "daytime window {}..{} must lie within 0..24",
            self.daytime_start,
            self.daytime_end
        );
        ensure!(self.temp_tolerance_c > 0.0, "temp_tolerance_c must be positive");
        ensure!(self.precip_cap_mm > 0.0, "precip_cap_mm must be positive");
        ensure!(
            self.temp_weight >= 0.0 && self.precip_weight >= 0.0 && self.cloud_weight >= 0.0,
            "weather weights must not be negative"
        );

        let floor = self.weather_modifier_floor;
        let ceiling = floor + self.weather_modifier_span;
        ensure!(self.weather_modifier_span >= 0.0, "weather_modifier_span must not be negative");
        ensure!(
            MODIFIER_RANGE.contains(&floor) && MODIFIER_RANGE.contains(&ceiling),
            "weather modifier range {floor}..{ceiling} must lie within {}..{}",
            MODIFIER_RANGE.start(),
            MODIFIER_RANGE.end()
        );

        ensure!(
            (0.0..=1.0).contains(&self.event_base) && self.event_step >= 0.0,
            "event_base must lie in 0..1 and event_step must not be negative"
        );
        ensure!(self.event_decay_per_km >= 0.0, "event_decay_per_km must not be negative");
        ensure!(
            (1.0..=*MODIFIER_RANGE.end()).contains(&self.event_modifier_cap),
            "event_modifier_cap must lie within 1..{}",
            MODIFIER_RANGE.end()
        );
        Ok(())
    }
}

/// Provider endpoints, API keys and timeouts.
#[derive(Debug, Clone)]
pub struct Settings {
    pub open_meteo_base: String,
    pub open_meteo_timezone: String,
    pub serpapi_api_key: Option<String>,
    pub events_location: String,
    pub outscraper_api_key: Option<String>,
    pub place_locality: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub provider_timeout: Duration,
    pub request_timeout: Duration,
}

impl Settings {
    /// Reads settings from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());
        let secs = |key: &str, default: u64| -> Result<Duration> {
            let secs = match get(key) {
                Some(raw) => raw
                    .parse::<u64>()
                    .with_context(|| format!("{key} must be a whole number of seconds, got '{raw}'"))?,
                None => default,
            };
            ensure!(secs > 0, "{key} must be greater than zero");
            Ok(Duration::from_secs(secs))
        };

        Ok(Self {
            open_meteo_base: get_or("OPEN_METEO_BASE", "https://api.open-meteo.com/v1/forecast"),
            open_meteo_timezone: get_or("OPEN_METEO_TIMEZONE", "America/Los_Angeles"),
            serpapi_api_key: get("SERPAPI_API_KEY"),
            events_location: get_or("EVENTS_LOCATION", "San Francisco, California"),
            outscraper_api_key: get("OUTSCRAPER_API_KEY"),
            place_locality: get_or("PLACE_LOCALITY", "San Francisco"),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get_or("GEMINI_MODEL", "gemini-1.5-flash"),
            provider_timeout: secs("PROVIDER_TIMEOUT_SECS", 30)?,
            request_timeout: secs("REQUEST_TIMEOUT_SECS", 60)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env;
    use std::fs;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_settings_defaults() {
        let s = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s.open_meteo_base, "https://api.open-meteo.com/v1/forecast");
        assert_eq!(s.serpapi_api_key, None);
        assert_eq!(s.provider_timeout, Duration::from_secs(30));
        assert_eq!(s.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_blank_keys_are_unset() {
        let s = Settings::from_lookup(lookup(&[("SERPAPI_API_KEY", "  "), ("GEMINI_API_KEY", "abc")]))
            .unwrap();
        assert_eq!(s.serpapi_api_key, None);
        assert_eq!(s.gemini_api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn test_bad_timeout_fails() {
        assert!(Settings::from_lookup(lookup(&[("PROVIDER_TIMEOUT_SECS", "soon")])).is_err());
        assert!(Settings::from_lookup(lookup(&[("REQUEST_TIMEOUT_SECS", "0")])).is_err());
    }

    #[test]
    fn test_scoring_load_partial_file() {
        let path = format!("{}/foot_traffic_scoring_test.json", env::temp_dir().display());
        fs::write(&path, r#"{"event_decay_per_km": 0.9}"#).unwrap();

        let config = ScoringConfig::load(&path).unwrap();
        assert_eq!(config.event_decay_per_km, 0.9);
        assert_eq!(config.weather_modifier_floor, 0.7);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_scoring_rejects_bad_window() {
        let config = ScoringConfig {
            daytime_start: 20,
            daytime_end: 8,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_scoring_is_valid() {
        assert!(ScoringConfig::default().validate().is_ok());
    }

    #[test]
    fn test_scoring_rejects_out_of_range_modifiers_and_weights() {
        let invalid = [
            ScoringConfig { weather_modifier_floor: -0.1, ..Default::default() },
            ScoringConfig { weather_modifier_span: 1.6, ..Default::default() },
            ScoringConfig { weather_modifier_span: -0.2, ..Default::default() },
            ScoringConfig { temp_weight: -0.5, ..Default::default() },
            ScoringConfig { event_base: 1.2, ..Default::default() },
            ScoringConfig { event_modifier_cap: 3.0, ..Default::default() },
            ScoringConfig { ideal_temp_c: f64::NAN, ..Default::default() },
        ];
        for config in invalid {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn test_scoring_load_rejects_invalid_file() {
        let path = format!("{}/foot_traffic_scoring_invalid.json", env::temp_dir().display());
        fs::write(&path, r#"{"daytime_start": 20, "daytime_end": 8}"#).unwrap();

        assert!(ScoringConfig::load(&path).is_err());

        fs::remove_file(&path).unwrap();
    }
}
