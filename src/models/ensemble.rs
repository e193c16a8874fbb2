//! Ensemble forecaster.
//!
//! Owns one instance of each member strategy and combines their forecasts
//! as a weighted average. A member that fails to fit is excluded rather
//! than aborting the ensemble; weights renormalize over the members that
//! survived.

use tracing::warn;

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::traits::{check_horizon, BoxedModel, DemandModel};
use crate::models::{SeasonalDecomposition, TreeRegressor};

/// Relative width of the band around the ensemble mean. Narrower than any
/// member's own band, reflecting the variance reduction from averaging.
const BAND: f64 = 0.10;

struct Member {
    weight: f64,
    model: BoxedModel,
    /// Whether the member fitted successfully in the most recent `fit`.
    active: bool,
}

/// Weighted combination of independently fitted member strategies.
pub struct Ensemble {
    members: Vec<Member>,
}

impl Ensemble {
    /// Default ensemble: seasonal decomposition and the tree regressor at
    /// equal weight.
    pub fn new(seed: u64) -> Self {
        Self::with_members(vec![
            (0.5, Box::new(SeasonalDecomposition::new()) as BoxedModel),
            (0.5, Box::new(TreeRegressor::new(seed)) as BoxedModel),
        ])
    }

    /// Build an ensemble from `(weight, model)` pairs. Weights are
    /// relative; they are normalized over the fitted subset at predict
    /// time.
    pub fn with_members(members: Vec<(f64, BoxedModel)>) -> Self {
        Self {
            members: members
                .into_iter()
                .map(|(weight, model)| Member {
                    weight,
                    model,
                    active: false,
                })
                .collect(),
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Names of the members that fitted successfully.
    pub fn fitted_member_names(&self) -> Vec<&'static str> {
        self.members
            .iter()
            .filter(|m| m.active)
            .map(|m| m.model.name())
            .collect()
    }
}

impl DemandModel for Ensemble {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        if self.members.is_empty() {
            return Err(ForecastError::validation(
                "ensemble has no member strategies".to_string(),
            ));
        }

        let mut fitted = 0usize;
        for member in &mut self.members {
            match member.model.fit(series) {
                Ok(()) => {
                    member.active = true;
                    fitted += 1;
                }
                Err(error) => {
                    member.active = false;
                    warn!(member = member.model.name(), %error, "excluding ensemble member");
                }
            }
        }

        if fitted == 0 {
            return Err(ForecastError::validation(
                "no ensemble member could be fitted".to_string(),
            ));
        }
        Ok(())
    }

    fn predict(&self, periods: usize) -> Result<Forecast> {
        if !self.is_fitted() {
            return Err(ForecastError::NotFitted);
        }
        check_horizon(periods)?;

        let mut forecasts: Vec<(f64, Forecast)> = Vec::new();
        for member in self.members.iter().filter(|m| m.active) {
            match member.model.predict(periods) {
                Ok(forecast) => forecasts.push((member.weight, forecast)),
                Err(error) => {
                    warn!(member = member.model.name(), %error, "ensemble member failed to predict");
                }
            }
        }

        if forecasts.is_empty() {
            return Err(ForecastError::validation(
                "no ensemble member produced a forecast".to_string(),
            ));
        }

        let total_weight: f64 = forecasts.iter().map(|(w, _)| w).sum();
        let mut point = vec![0.0; periods];
        for (weight, forecast) in &forecasts {
            let share = weight / total_weight;
            for (combined, p) in point.iter_mut().zip(forecast.point()) {
                *combined += share * p;
            }
        }

        // Date axis from the first successful member.
        let dates = forecasts[0].1.dates().to_vec();
        Forecast::with_relative_band(dates, point, BAND)
    }

    fn name(&self) -> &'static str {
        "Ensemble"
    }

    fn is_fitted(&self) -> bool {
        self.members.iter().any(|m| m.active)
    }
}
