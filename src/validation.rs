//! Holdout validation and accuracy metrics.

use serde::Serialize;

use crate::core::TimeSeries;
use crate::selector::{instantiate, ModelChoice};

/// Minimum series length before holdout validation is attempted.
pub const MIN_VALIDATION_POINTS: usize = 30;

/// Fraction of the series used for training in the holdout split.
const TRAIN_FRACTION: f64 = 0.8;

/// Accuracy of a holdout refit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationMetrics {
    /// Mean absolute error.
    #[serde(serialize_with = "crate::api::round2")]
    pub mae: f64,
    /// Root mean squared error.
    #[serde(serialize_with = "crate::api::round2")]
    pub rmse: f64,
    /// Mean absolute percentage error; the denominator is offset by 1 so
    /// zero-demand days do not divide by zero.
    #[serde(serialize_with = "crate::api::round2")]
    pub mape: f64,
    pub train_size: usize,
    pub test_size: usize,
}

/// Result of the validation step: metrics, or a note explaining why they
/// were skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ValidationOutcome {
    Metrics(ValidationMetrics),
    Skipped { note: String },
}

impl ValidationOutcome {
    pub fn metrics(&self) -> Option<&ValidationMetrics> {
        match self {
            Self::Metrics(m) => Some(m),
            Self::Skipped { .. } => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Validate a strategy on a chronological 80/20 holdout split.
///
/// A fresh instance of the resolved strategy is fitted on the head and
/// scored on the tail. Short series skip validation rather than failing:
/// the primary fit has already succeeded, and the metrics are advisory.
pub fn holdout_validate(choice: ModelChoice, series: &TimeSeries, seed: u64) -> ValidationOutcome {
    let n = series.len();
    if n < MIN_VALIDATION_POINTS {
        return ValidationOutcome::Skipped {
            note: format!(
                "insufficient data for validation: need at least {MIN_VALIDATION_POINTS} points, got {n}"
            ),
        };
    }

    let train_size = (n as f64 * TRAIN_FRACTION) as usize;
    let (train, test) = series.split_at(train_size);

    let mut model = instantiate(choice, train.len(), seed);
    let forecast = match model.fit(&train).and_then(|_| model.predict(test.len())) {
        Ok(forecast) => forecast,
        Err(error) => {
            return ValidationOutcome::Skipped {
                note: format!("validation refit failed: {error}"),
            }
        }
    };

    ValidationOutcome::Metrics(score(test.values(), forecast.point(), train.len()))
}

fn score(actual: &[f64], predicted: &[f64], train_size: usize) -> ValidationMetrics {
    let n = actual.len().min(predicted.len());
    let pairs = actual[..n].iter().zip(predicted[..n].iter());

    let mae = pairs
        .clone()
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n as f64;
    let rmse = (pairs
        .clone()
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n as f64)
        .sqrt();
    let mape = pairs
        .map(|(a, p)| ((a - p) / (a + 1.0)).abs())
        .sum::<f64>()
        / n as f64
        * 100.0;

    ValidationMetrics {
        mae,
        rmse,
        mape,
        train_size,
        test_size: n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn series(n: usize) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let values = (0..n).map(|i| 10.0 + (i % 5) as f64).collect();
        TimeSeries::daily(start, values).unwrap()
    }

    #[test]
    fn short_series_skip_validation() {
        let outcome = holdout_validate(ModelChoice::Naive, &series(29), 42);
        assert!(outcome.is_skipped());
        match outcome {
            ValidationOutcome::Skipped { note } => {
                assert!(note.contains("insufficient data"), "unexpected note: {note}")
            }
            ValidationOutcome::Metrics(_) => unreachable!(),
        }
    }

    #[test]
    fn holdout_splits_eighty_twenty() {
        let outcome = holdout_validate(ModelChoice::Naive, &series(50), 42);
        let metrics = outcome.metrics().expect("validation should run");

        assert_eq!(metrics.train_size, 40);
        assert_eq!(metrics.test_size, 10);
    }

    #[test]
    fn perfect_forecast_scores_zero() {
        let metrics = score(&[5.0, 5.0, 5.0], &[5.0, 5.0, 5.0], 12);
        assert_relative_eq!(metrics.mae, 0.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.rmse, 0.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.mape, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn mape_offsets_zero_demand_days() {
        // Actual zero with predicted 2: |0 - 2| / (0 + 1) = 2.
        let metrics = score(&[0.0], &[2.0], 1);
        assert_relative_eq!(metrics.mape, 200.0, epsilon = 1e-12);
    }

    #[test]
    fn score_handles_known_errors() {
        let metrics = score(&[10.0, 20.0], &[8.0, 24.0], 2);
        assert_relative_eq!(metrics.mae, 3.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.rmse, (10.0_f64).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn validation_runs_for_tree_choice() {
        let outcome = holdout_validate(ModelChoice::Tree, &series(40), 42);
        let metrics = outcome.metrics().expect("tree validation should run");
        assert_eq!(metrics.train_size + metrics.test_size, 40);
        assert!(metrics.mae.is_finite());
    }
}
