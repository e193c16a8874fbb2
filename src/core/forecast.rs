//! Forecast result structures.

use chrono::NaiveDate;

use crate::error::{ForecastError, Result};

/// One forecasted day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub forecast: f64,
    pub lower: f64,
    pub upper: f64,
}

/// A dated forecast with uncertainty bounds.
///
/// Stored as parallel vectors; `lower <= upper` holds for every step, and
/// point forecasts and lower bounds are non-negative (demand cannot be
/// negative).
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    dates: Vec<NaiveDate>,
    point: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Forecast {
    /// Create a forecast from parallel vectors.
    pub fn new(
        dates: Vec<NaiveDate>,
        point: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Result<Self> {
        let n = dates.len();
        if point.len() != n || lower.len() != n || upper.len() != n {
            return Err(ForecastError::validation(format!(
                "forecast vectors must have equal length (dates {}, point {}, lower {}, upper {})",
                n,
                point.len(),
                lower.len(),
                upper.len()
            )));
        }
        for i in 0..n {
            if lower[i] > upper[i] {
                return Err(ForecastError::validation(format!(
                    "lower bound {} exceeds upper bound {} at step {}",
                    lower[i], upper[i], i
                )));
            }
        }
        Ok(Self {
            dates,
            point,
            lower,
            upper,
        })
    }

    /// Create a forecast with symmetric relative bounds of `band` around
    /// each point value, clamping the lower bound at zero.
    pub fn with_relative_band(dates: Vec<NaiveDate>, point: Vec<f64>, band: f64) -> Result<Self> {
        let lower = point.iter().map(|p| (p * (1.0 - band)).max(0.0)).collect();
        let upper = point.iter().map(|p| p * (1.0 + band)).collect();
        Self::new(dates, point, lower, upper)
    }

    /// Number of forecasted steps.
    pub fn horizon(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// The forecast at step `index`.
    pub fn get(&self, index: usize) -> Option<ForecastPoint> {
        if index >= self.horizon() {
            return None;
        }
        Some(ForecastPoint {
            date: self.dates[index],
            forecast: self.point[index],
            lower: self.lower[index],
            upper: self.upper[index],
        })
    }

    /// Iterate over the forecast as dated points.
    pub fn iter(&self) -> impl Iterator<Item = ForecastPoint> + '_ {
        (0..self.horizon()).map(|i| self.get(i).expect("index in range"))
    }
}
