//! Linear regression over the three features.
//!
//! Fits `score = intercept + w_weather * weather + w_events * events +
//! w_historical * historical` by ordinary least squares (normal equations,
//! solved with partial-pivot Gaussian elimination). The model is built once at
//! startup and is read-only afterwards.

use anyhow::{Result, bail, ensure};

use crate::scoring::types::Features;
use crate::scoring::utility::clamp01;

const N_PARAMS: usize = 4;

/// Engineered samples: `[weather, events, historical] -> target`.
const STUB_SAMPLES: [([f64; 3], f64); 6] = [
    ([0.8, 0.6, 0.7], 0.75),
    ([0.2, 0.1, 0.3], 0.2),
    ([0.5, 0.2, 0.4], 0.4),
    ([0.9, 0.9, 0.9], 0.95),
    ([0.4, 0.7, 0.6], 0.6),
    ([0.7, 0.4, 0.8], 0.7),
];

#[derive(Debug, Clone, PartialEq)]
pub struct TrafficModel {
    intercept: f64,
    /// Weights for weather, events, historical, in that order.
    weights: [f64; 3],
    r_squared: f64,
}

impl TrafficModel {
    /// Fits the model on the built-in six-sample stub.
    pub fn train_stub() -> Result<Self> {
        Self::fit(&STUB_SAMPLES)
    }

    /// Fits the model by least squares.
    ///
    /// # Errors
    ///
    /// Fails with fewer samples than parameters or a singular design matrix.
    pub fn fit(samples: &[([f64; 3], f64)]) -> Result<Self> {
        ensure!(
            samples.len() >= N_PARAMS,
            "need at least {N_PARAMS} samples to fit, got {}",
            samples.len()
        );

        // Augmented normal equations [XᵀX | Xᵀy] with a leading intercept column
        let mut m = [[0.0f64; N_PARAMS + 1]; N_PARAMS];
        for (x, y) in samples {
            let row = [1.0, x[0], x[1], x[2]];
            for i in 0..N_PARAMS {
                for j in 0..N_PARAMS {
                    m[i][j] += row[i] * row[j];
                }
                m[i][N_PARAMS] += row[i] * y;
            }
        }

        let beta = solve(m)?;
        let mut model = Self {
            intercept: beta[0],
            weights: [beta[1], beta[2], beta[3]],
            r_squared: 0.0,
        };

        let mean_y = samples.iter().map(|(_, y)| y).sum::<f64>() / samples.len() as f64;
        let ss_tot: f64 = samples.iter().map(|(_, y)| (y - mean_y).powi(2)).sum();
        let ss_res: f64 = samples
            .iter()
            .map(|(x, y)| (y - model.raw_predict(x)).powi(2))
            .sum();
        model.r_squared = if ss_tot > 1e-10 { 1.0 - ss_res / ss_tot } else { 1.0 };

        Ok(model)
    }

    fn raw_predict(&self, x: &[f64; 3]) -> f64 {
        self.intercept + self.weights.iter().zip(x).map(|(w, v)| w * v).sum::<f64>()
    }

    /// Unclamped prediction; may be non-finite if the inputs are.
    pub fn predict_raw(&self, features: &Features) -> f64 {
        self.raw_predict(&[features.weather, features.events, features.historical])
    }

    /// Prediction clamped to [0, 1].
    pub fn predict(&self, features: &Features) -> f64 {
        clamp01(self.predict_raw(features))
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn weights(&self) -> [f64; 3] {
        self.weights
    }

    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }
}

fn solve(mut m: [[f64; N_PARAMS + 1]; N_PARAMS]) -> Result<[f64; N_PARAMS]> {
    for col in 0..N_PARAMS {
        let pivot = (col..N_PARAMS)
            .max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))
            .unwrap_or(col);
        if m[pivot][col].abs() < 1e-12 {
            bail!("singular design matrix in regression");
        }
        m.swap(col, pivot);

        for row in col + 1..N_PARAMS {
            let factor = m[row][col] / m[col][col];
            for k in col..=N_PARAMS {
                m[row][k] -= factor * m[col][k];
            }
        }
    }

    let mut beta = [0.0; N_PARAMS];
    for i in (0..N_PARAMS).rev() {
        let tail: f64 = (i + 1..N_PARAMS).map(|k| m[i][k] * beta[k]).sum();
        beta[i] = (m[i][N_PARAMS] - tail) / m[i][i];
    }
    Ok(beta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(weather: f64, events: f64, historical: f64) -> Features {
        Features {
            weather,
            events,
            historical,
        }
    }

    #[test]
    fn test_stub_coefficients() {
        let model = TrafficModel::train_stub().unwrap();
        assert!((model.intercept() - -0.019116).abs() < 1e-5);
        let [w, e, h] = model.weights();
        assert!((w - 0.359065).abs() < 1e-5);
        assert!((e - 0.297424).abs() < 1e-5);
        assert!((h - 0.431200).abs() < 1e-5);
        assert!(model.r_squared() > 0.95);
    }

    #[test]
    fn test_predicts_near_training_targets() {
        let model = TrafficModel::train_stub().unwrap();
        assert!((model.predict(&features(0.9, 0.9, 0.9)) - 0.9598).abs() < 1e-3);
        assert!((model.predict(&features(0.5, 0.3, 0.5)) - 0.4652).abs() < 1e-3);
    }

    #[test]
    fn test_prediction_is_clamped() {
        let model = TrafficModel::train_stub().unwrap();
        assert!(model.predict_raw(&features(1.0, 1.0, 1.0)) > 1.0);
        assert_eq!(model.predict(&features(1.0, 1.0, 1.0)), 1.0);
        assert_eq!(model.predict(&features(0.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn test_recovers_exact_plane() {
        let samples: Vec<([f64; 3], f64)> = [[0.1, 0.2, 0.3], [0.5, 0.1, 0.9], [0.7, 0.7, 0.2], [0.3, 0.9, 0.4], [0.9, 0.4, 0.6]]
            .into_iter()
            .map(|x| (x, 0.1 + 0.2 * x[0] + 0.3 * x[1] + 0.4 * x[2]))
            .collect();
        let model = TrafficModel::fit(&samples).unwrap();
        assert!((model.intercept() - 0.1).abs() < 1e-9);
        assert!((model.weights()[2] - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_samples_fail() {
        let same = [([0.5, 0.5, 0.5], 0.5); 6];
        assert!(TrafficModel::fit(&same).is_err());
        assert!(TrafficModel::fit(&STUB_SAMPLES[..3]).is_err());
    }
}
