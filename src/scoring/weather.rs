//! Weather feature and modifier.

use crate::config::ScoringConfig;
use crate::scoring::utility::{clamp01, finite, mean};
use crate::services::{HourlySeries, ProviderResult, WeatherPayload};

/// Substituted when the forecast failed or has no temperatures.
pub const NEUTRAL_FEATURE: f64 = 0.5;
pub const NEUTRAL_MODIFIER: f64 = 1.0;

// Fallbacks for an empty daytime slice of one series
const FALLBACK_TEMP_C: f64 = 18.0;
const FALLBACK_CLOUD_PCT: f64 = 50.0;

/// Empty when the window is inverted or lies past the end of the series.
fn daytime(values: &[Option<f64>], cfg: &ScoringConfig) -> Vec<f64> {
    let end = cfg.daytime_end.min(values.len());
    let start = cfg.daytime_start.min(end);
    finite(&values[start..end])
}

/// Scores daytime conditions in [0, 1]: ideal temperature, no rain, clear sky.
///
/// Returns `None` if the series has no usable temperature at all.
pub fn daytime_score(hourly: &HourlySeries, cfg: &ScoringConfig) -> Option<f64> {
    if finite(&hourly.temperature).is_empty() {
        return None;
    }

    let temps = daytime(&hourly.temperature, cfg);
    let precips = daytime(&hourly.precipitation, cfg);
    let clouds = daytime(&hourly.cloud_cover, cfg);

    let avg_temp = if temps.is_empty() { FALLBACK_TEMP_C } else { mean(&temps) };
    let temp_score = 1.0 - ((avg_temp - cfg.ideal_temp_c).abs() / cfg.temp_tolerance_c).min(1.0);

    let total_precip: f64 = precips.iter().sum();
    let precip_score = 1.0 - clamp01(total_precip / cfg.precip_cap_mm);

    let avg_cloud = if clouds.is_empty() { FALLBACK_CLOUD_PCT } else { mean(&clouds) };
    let cloud_score = 1.0 - clamp01(avg_cloud / 100.0);

    Some(clamp01(
        temp_score * cfg.temp_weight + precip_score * cfg.precip_weight + cloud_score * cfg.cloud_weight,
    ))
}

pub fn weather_feature(result: &ProviderResult<WeatherPayload>, cfg: &ScoringConfig) -> f64 {
    result
        .payload()
        .and_then(|p| daytime_score(&p.hourly, cfg))
        .unwrap_or(NEUTRAL_FEATURE)
}

/// Remaps the daytime score onto a multiplier centred near 1.0
/// (0.7..1.3 with the default constants).
pub fn weather_modifier(result: &ProviderResult<WeatherPayload>, cfg: &ScoringConfig) -> f64 {
    result
        .payload()
        .and_then(|p| daytime_score(&p.hourly, cfg))
        .map(|base| cfg.weather_modifier_floor + cfg.weather_modifier_span * base)
        .unwrap_or(NEUTRAL_MODIFIER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(temp: f64, precip: f64, cloud: f64) -> HourlySeries {
        HourlySeries {
            temperature: vec![Some(temp); 24],
            precipitation: vec![Some(precip); 24],
            cloud_cover: vec![Some(cloud); 24],
            ..Default::default()
        }
    }

    fn ok(hourly: HourlySeries) -> ProviderResult<WeatherPayload> {
        ProviderResult::Ok(WeatherPayload { hourly })
    }

    #[test]
    fn test_ideal_day_scores_one() {
        let cfg = ScoringConfig::default();
        let result = ok(series(20.0, 0.0, 0.0));
        assert!((weather_feature(&result, &cfg) - 1.0).abs() < 1e-12);
        assert!((weather_modifier(&result, &cfg) - 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_terrible_day_scores_zero() {
        let cfg = ScoringConfig::default();
        let result = ok(series(40.0, 2.0, 100.0));
        assert_eq!(weather_feature(&result, &cfg), 0.0);
        assert!((weather_modifier(&result, &cfg) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_only_daytime_hours_count() {
        let cfg = ScoringConfig::default();
        let mut hourly = series(20.0, 0.0, 0.0);
        // heavy rain at night only
        hourly.precipitation[2] = Some(50.0);
        hourly.precipitation[22] = Some(50.0);
        assert!((weather_feature(&ok(hourly), &cfg) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_mix() {
        let cfg = ScoringConfig::default();
        // temp 25 -> 0.5, precip 12 x 0.25 = 3mm -> 0.4, cloud 50 -> 0.5
        let result = ok(series(25.0, 0.25, 50.0));
        let expected = 0.5 * 0.5 + 0.4 * 0.35 + 0.5 * 0.15;
        assert!((weather_feature(&result, &cfg) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_error_and_empty_are_neutral() {
        let cfg = ScoringConfig::default();
        let err = ProviderResult::Err("timeout".into());
        assert_eq!(weather_feature(&err, &cfg), NEUTRAL_FEATURE);
        assert_eq!(weather_modifier(&err, &cfg), NEUTRAL_MODIFIER);

        let empty = ok(HourlySeries::default());
        assert_eq!(weather_feature(&empty, &cfg), NEUTRAL_FEATURE);
        assert_eq!(weather_modifier(&empty, &cfg), NEUTRAL_MODIFIER);
    }

    #[test]
    fn test_inverted_window_does_not_panic() {
        let cfg = ScoringConfig {
            daytime_start: 20,
            daytime_end: 8,
            ..Default::default()
        };
        // every daytime slice is empty, so the per-series fallbacks apply
        let score = weather_feature(&ok(series(20.0, 0.0, 0.0)), &cfg);
        let expected = 0.8 * 0.5 + 1.0 * 0.35 + 0.5 * 0.15;
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_short_and_gappy_series_stay_in_range() {
        let cfg = ScoringConfig::default();
        let hourly = HourlySeries {
            temperature: vec![Some(15.0); 10],
            precipitation: vec![None; 3],
            cloud_cover: Vec::new(),
            ..Default::default()
        };
        let score = weather_feature(&ok(hourly), &cfg);
        assert!((0.0..=1.0).contains(&score));
    }
}
