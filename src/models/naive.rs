//! Naive rolling-average forecaster.
//!
//! The always-available fallback: no minimum data volume beyond one
//! observation and no numerical backend.

use chrono::{Days, NaiveDate};

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::traits::{check_horizon, DemandModel};

/// Relative width of the uncertainty band around each point forecast.
const BAND: f64 = 0.20;

/// Forecasts the next value as the rolling mean of the most recent
/// `window` observations, folding each prediction back into the window
/// for subsequent days.
#[derive(Debug, Clone)]
pub struct NaiveAverage {
    window: usize,
    recent: Option<Vec<f64>>,
    end_date: Option<NaiveDate>,
}

impl NaiveAverage {
    /// Create a forecaster with the given rolling window (at least 1).
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            recent: None,
            end_date: None,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Default for NaiveAverage {
    fn default() -> Self {
        Self::new(7)
    }
}

impl DemandModel for NaiveAverage {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        if series.is_empty() {
            return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
        }

        let values = series.values();
        let tail = values.len().saturating_sub(self.window);
        self.recent = Some(values[tail..].to_vec());
        self.end_date = series.end_date();
        Ok(())
    }

    fn predict(&self, periods: usize) -> Result<Forecast> {
        let recent = self.recent.as_ref().ok_or(ForecastError::NotFitted)?;
        let end_date = self.end_date.ok_or(ForecastError::NotFitted)?;
        check_horizon(periods)?;

        let mut working = recent.clone();
        let mut point = Vec::with_capacity(periods);
        for _ in 0..periods {
            let tail = working.len().saturating_sub(self.window);
            let window = &working[tail..];
            let mean = window.iter().sum::<f64>() / window.len() as f64;
            let prediction = mean.max(0.0);
            point.push(prediction);
            working.push(prediction);
        }

        let dates = (1..=periods as u64)
            .map(|i| end_date + Days::new(i))
            .collect();
        Forecast::with_relative_band(dates, point, BAND)
    }

    fn name(&self) -> &'static str {
        "NaiveAverage"
    }

    fn is_fitted(&self) -> bool {
        self.recent.is_some()
    }
}
