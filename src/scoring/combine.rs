//! Turns scored signals into one [0, 1] score and a label.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::scoring::model::TrafficModel;
use crate::scoring::types::{Features, Label, Signals};
use crate::scoring::utility::clamp01;

/// Which combination produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Model,
    Heuristic,
}

/// Score plus the exact inputs the chosen strategy consumed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Combination {
    pub score: f64,
    pub strategy: Strategy,
    pub inputs: Features,
}

/// The combination strategy. [`Combiner::Heuristic`] is always available and
/// is what the model path falls back to.
#[derive(Debug, Clone, Default)]
pub enum Combiner {
    Model(TrafficModel),
    #[default]
    Heuristic,
}

impl Combiner {
    /// Builds the requested strategy. A model that fails to fit degrades to
    /// the heuristic instead of failing startup.
    pub fn for_strategy(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Heuristic => Combiner::Heuristic,
            Strategy::Model => match TrafficModel::train_stub() {
                Ok(model) => Combiner::Model(model),
                Err(e) => {
                    warn!(error = %e, "Regression fit failed, using heuristic");
                    Combiner::Heuristic
                }
            },
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Combiner::Model(_) => Strategy::Model,
            Combiner::Heuristic => Strategy::Heuristic,
        }
    }

    pub fn combine(&self, signals: &Signals) -> Combination {
        if let Combiner::Model(model) = self {
            let raw = model.predict_raw(&signals.features);
            if raw.is_finite() {
                return Combination {
                    score: clamp01(raw),
                    strategy: Strategy::Model,
                    inputs: signals.features,
                };
            }
            warn!(raw, "Model produced a non-finite score, using heuristic");
        }

        Combination {
            score: heuristic(&signals.modifiers),
            strategy: Strategy::Heuristic,
            inputs: signals.modifiers,
        }
    }
}

/// `historical baseline x weather modifier x event modifier`, clamped.
pub fn heuristic(modifiers: &Features) -> f64 {
    clamp01(modifiers.historical * modifiers.weather * modifiers.events)
}

/// Maps a [0, 1] score onto a label. Both boundaries are strict.
///
/// | Range       | Label  |
/// |-------------|--------|
/// | > 0.75      | High   |
/// | > 0.50      | Medium |
/// | otherwise   | Low    |
pub fn label(score: f64) -> Label {
    match score {
        s if s > 0.75 => Label::High,
        s if s > 0.5 => Label::Medium,
        _ => Label::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(features: Features, modifiers: Features) -> Signals {
        Signals { features, modifiers }
    }

    fn f(weather: f64, events: f64, historical: f64) -> Features {
        Features {
            weather,
            events,
            historical,
        }
    }

    #[test]
    fn test_label_boundaries() {
        assert_eq!(label(1.0), Label::High);
        assert_eq!(label(0.751), Label::High);
        assert_eq!(label(0.75), Label::Medium);
        assert_eq!(label(0.501), Label::Medium);
        assert_eq!(label(0.5), Label::Low);
        assert_eq!(label(0.0), Label::Low);
    }

    #[test]
    fn test_heuristic_at_neutral_defaults() {
        let c = Combiner::Heuristic.combine(&signals(f(0.5, 0.3, 0.5), f(1.0, 1.0, 0.5)));
        assert_eq!(c.score, 0.5);
        assert_eq!(c.strategy, Strategy::Heuristic);
        assert_eq!(c.inputs, f(1.0, 1.0, 0.5));
    }

    #[test]
    fn test_heuristic_is_clamped() {
        assert_eq!(heuristic(&f(1.3, 1.5, 0.9)), 1.0);
        assert!((heuristic(&f(0.7, 1.0, 0.4)) - 0.28).abs() < 1e-12);
    }

    #[test]
    fn test_model_path_uses_features() {
        let combiner = Combiner::for_strategy(Strategy::Model);
        assert_eq!(combiner.strategy(), Strategy::Model);

        let c = combiner.combine(&signals(f(0.9, 0.9, 0.9), f(1.3, 1.5, 0.9)));
        assert_eq!(c.strategy, Strategy::Model);
        assert!((c.score - 0.9598).abs() < 1e-3);
        assert_eq!(c.inputs, f(0.9, 0.9, 0.9));
    }

    #[test]
    fn test_model_falls_back_on_non_finite() {
        let combiner = Combiner::for_strategy(Strategy::Model);
        let c = combiner.combine(&signals(f(f64::NAN, 0.3, 0.5), f(1.0, 1.0, 0.5)));
        assert_eq!(c.strategy, Strategy::Heuristic);
        assert_eq!(c.score, 0.5);
    }
}
