use crate::scoring::utility::{clamp01, mean};
use crate::services::{FootTrafficPayload, ProviderResult};

/// Substituted when popular-times data failed or was empty.
pub const NEUTRAL_BASELINE: f64 = 0.5;

/// Historical busyness normalized to [0, 1].
///
/// A single-slot profile is used directly; a full profile is averaged.
pub fn historical_baseline(result: &ProviderResult<FootTrafficPayload>) -> f64 {
    let Some(payload) = result.payload() else {
        return NEUTRAL_BASELINE;
    };
    let series = &payload.series;
    if series.is_empty() {
        return NEUTRAL_BASELINE;
    }

    let busyness = if series.is_single_slot() {
        series.entries()[0].busyness
    } else {
        let values: Vec<f64> = series.entries().iter().map(|e| e.busyness).collect();
        mean(&values)
    };

    if !busyness.is_finite() {
        return NEUTRAL_BASELINE;
    }
    clamp01(busyness / 100.0)
}
