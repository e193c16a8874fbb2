//! Feature-based gradient-boosted tree regressor.
//!
//! Engineers calendar, lag, and rolling-window features for every day,
//! fits boosted regression trees against demand, and predicts recursively
//! one day at a time, feeding each prediction back into the feature
//! history for the next day.

mod features;
mod gbdt;

pub use gbdt::TreeParams;

use chrono::{Days, NaiveDate};

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::traits::{check_horizon, DemandModel};

use features::feature_matrix;
use gbdt::GradientBoostedTrees;

/// Relative width of the uncertainty band around each point forecast.
const BAND: f64 = 0.15;

/// Gradient-boosted tree forecaster over engineered date features.
#[derive(Debug, Clone)]
pub struct TreeRegressor {
    params: TreeParams,
    seed: u64,
    model: Option<GradientBoostedTrees>,
    history_dates: Vec<NaiveDate>,
    history_values: Vec<f64>,
}

impl TreeRegressor {
    /// Create a regressor with default hyperparameters and the given
    /// training seed.
    ///
    /// The seed is per-instance so concurrent per-product fits never share
    /// RNG state.
    pub fn new(seed: u64) -> Self {
        Self::with_params(TreeParams::default(), seed)
    }

    pub fn with_params(params: TreeParams, seed: u64) -> Self {
        Self {
            params,
            seed,
            model: None,
            history_dates: Vec::new(),
            history_values: Vec::new(),
        }
    }

    pub fn params(&self) -> &TreeParams {
        &self.params
    }
}

impl Default for TreeRegressor {
    fn default() -> Self {
        Self::new(42)
    }
}

impl DemandModel for TreeRegressor {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        if series.is_empty() {
            return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
        }

        let rows = feature_matrix(series.dates(), series.values());
        let model = GradientBoostedTrees::fit(&self.params, &rows, series.values(), self.seed);

        self.model = Some(model);
        self.history_dates = series.dates().to_vec();
        self.history_values = series.values().to_vec();
        Ok(())
    }

    fn predict(&self, periods: usize) -> Result<Forecast> {
        let model = self.model.as_ref().ok_or(ForecastError::NotFitted)?;
        check_horizon(periods)?;

        let mut dates = self.history_dates.clone();
        let mut values = self.history_values.clone();
        let mut point = Vec::with_capacity(periods);

        // Single-step recursion: each day's features are computed against
        // actual history plus the predictions made so far.
        for _ in 0..periods {
            let next_date = *dates.last().expect("fitted on non-empty series") + Days::new(1);
            dates.push(next_date);
            values.push(0.0);

            let rows = feature_matrix(&dates, &values);
            let row = rows.last().expect("matrix has a row per date");
            let prediction = model.predict(row).max(0.0);

            *values.last_mut().expect("placeholder just pushed") = prediction;
            point.push(prediction);
        }

        let forecast_dates = dates[dates.len() - periods..].to_vec();
        Forecast::with_relative_band(forecast_dates, point, BAND)
    }

    fn name(&self) -> &'static str {
        "TreeRegressor"
    }

    fn is_fitted(&self) -> bool {
        self.model.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn weekly_series(n: usize) -> TimeSeries {
        // Demand alternates by weekday: high Mon-Fri, low Sat/Sun.
        let values = (0..n)
            .map(|i| if i % 7 < 5 { 20.0 } else { 4.0 })
            .collect();
        TimeSeries::daily(start(), values).unwrap()
    }

    #[test]
    fn fit_then_predict_produces_horizon_points() {
        let ts = weekly_series(60);
        let mut model = TreeRegressor::new(42);
        model.fit(&ts).unwrap();

        let forecast = model.predict(14).unwrap();
        assert_eq!(forecast.horizon(), 14);
        assert!(forecast.point().iter().all(|p| *p >= 0.0));
    }

    #[test]
    fn learns_weekday_structure() {
        let ts = weekly_series(90);
        let mut model = TreeRegressor::new(42);
        model.fit(&ts).unwrap();

        // The series starts on a Monday and ends after 90 days on a
        // Saturday, so the first two forecast days are Sunday and Monday.
        let forecast = model.predict(7).unwrap();
        let sunday = forecast.point()[0];
        let monday = forecast.point()[1];
        assert!(
            monday > sunday,
            "expected weekday demand {monday} above weekend demand {sunday}"
        );
    }

    #[test]
    fn bounds_are_fifteen_percent() {
        let ts = weekly_series(40);
        let mut model = TreeRegressor::new(42);
        model.fit(&ts).unwrap();

        let forecast = model.predict(3).unwrap();
        for i in 0..3 {
            let p = forecast.point()[i];
            assert_relative_eq!(forecast.lower()[i], (p * 0.85).max(0.0), epsilon = 1e-12);
            assert_relative_eq!(forecast.upper()[i], p * 1.15, epsilon = 1e-12);
        }
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let ts = weekly_series(45);

        let mut a = TreeRegressor::new(7);
        let mut b = TreeRegressor::new(7);
        a.fit(&ts).unwrap();
        b.fit(&ts).unwrap();

        assert_eq!(a.predict(10).unwrap(), b.predict(10).unwrap());
    }

    #[test]
    fn predict_requires_fit() {
        let model = TreeRegressor::default();
        assert!(matches!(model.predict(5), Err(ForecastError::NotFitted)));
    }

    #[test]
    fn rejects_empty_series() {
        let ts = TimeSeries::daily(start(), vec![]).unwrap();
        let mut model = TreeRegressor::default();
        assert!(matches!(
            model.fit(&ts),
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn zero_horizon_is_invalid() {
        let ts = weekly_series(35);
        let mut model = TreeRegressor::default();
        model.fit(&ts).unwrap();
        assert!(matches!(model.predict(0), Err(ForecastError::Validation(_))));
    }

    #[test]
    fn forecast_dates_continue_the_series() {
        let ts = weekly_series(35);
        let mut model = TreeRegressor::default();
        model.fit(&ts).unwrap();

        let forecast = model.predict(2).unwrap();
        let expected_first = ts.end_date().unwrap() + Days::new(1);
        assert_eq!(forecast.dates()[0], expected_first);
        assert_eq!(forecast.dates()[1], expected_first + Days::new(1));
    }
}
