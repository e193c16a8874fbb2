//! Seasonal decomposition forecaster.
//!
//! Decomposes the series into trend, weekly, and yearly components under a
//! multiplicative seasonality assumption and extrapolates them with native
//! uncertainty intervals.
//!
//! The decomposition backend is compile-time optional (`seasonal` cargo
//! feature, on by default). Without it, `fit` reports the strategy as
//! unavailable so the ensemble and selector can degrade to the remaining
//! models instead of crashing.

use chrono::{Datelike, Days, NaiveDate};

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::traits::{check_horizon, DemandModel};

/// Minimum history: two weekly cycles.
pub const MIN_POINTS: usize = 14;

/// Minimum history before the yearly index is estimated: two full cycles.
#[cfg(feature = "seasonal")]
const MIN_YEARLY_POINTS: usize = 730;

/// Trend guard against division by a vanishing denominator.
#[cfg(feature = "seasonal")]
const TREND_EPS: f64 = 1e-6;

/// Configuration for [`SeasonalDecomposition`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalConfig {
    /// Width of the prediction interval, in (0, 1).
    pub interval_width: f64,
    /// Estimate the weekly component.
    pub weekly: bool,
    /// Estimate the yearly component (requires two years of history).
    pub yearly: bool,
}

impl Default for SeasonalConfig {
    fn default() -> Self {
        Self {
            interval_width: 0.95,
            weekly: true,
            yearly: true,
        }
    }
}

#[derive(Debug, Clone)]
struct FittedComponents {
    intercept: f64,
    slope: f64,
    train_len: usize,
    end_date: NaiveDate,
    /// Multiplicative index per weekday, Monday first, mean 1.
    weekly: [f64; 7],
    /// Multiplicative index per day-of-year (0-based ordinal), mean 1.
    yearly: Option<Vec<f64>>,
    /// Residual dispersion of the fitted values.
    sigma: f64,
    /// Normal quantile for the configured interval width.
    z: f64,
}

/// Trend x weekly x yearly multiplicative decomposition forecaster.
#[derive(Debug, Clone, Default)]
pub struct SeasonalDecomposition {
    config: SeasonalConfig,
    state: Option<FittedComponents>,
}

impl SeasonalDecomposition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SeasonalConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Whether the decomposition backend is compiled in.
    pub fn is_available() -> bool {
        cfg!(feature = "seasonal")
    }

    pub fn config(&self) -> &SeasonalConfig {
        &self.config
    }
}

impl DemandModel for SeasonalDecomposition {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        #[cfg(not(feature = "seasonal"))]
        {
            let _ = series;
            Err(ForecastError::StrategyUnavailable(
                "seasonal decomposition backend not compiled in (enable the `seasonal` feature)"
                    .to_string(),
            ))
        }
        #[cfg(feature = "seasonal")]
        {
            self.state = Some(backend::decompose(&self.config, series)?);
            Ok(())
        }
    }

    fn predict(&self, periods: usize) -> Result<Forecast> {
        let state = self.state.as_ref().ok_or(ForecastError::NotFitted)?;
        check_horizon(periods)?;

        let mut dates = Vec::with_capacity(periods);
        let mut point = Vec::with_capacity(periods);
        let mut lower = Vec::with_capacity(periods);
        let mut upper = Vec::with_capacity(periods);

        for h in 1..=periods {
            let date = state.end_date + Days::new(h as u64);
            let x = (state.train_len - 1 + h) as f64;
            let trend = state.intercept + state.slope * x;
            let weekly = state.weekly[date.weekday().num_days_from_monday() as usize];
            let yearly = state
                .yearly
                .as_ref()
                .map_or(1.0, |index| index[date.ordinal0() as usize]);

            let forecast = (trend * weekly * yearly).max(0.0);
            let spread = state.z * state.sigma;
            dates.push(date);
            point.push(forecast);
            lower.push((forecast - spread).max(0.0));
            upper.push(forecast + spread);
        }

        Forecast::new(dates, point, lower, upper)
    }

    fn name(&self) -> &'static str {
        "SeasonalDecomposition"
    }

    fn is_fitted(&self) -> bool {
        self.state.is_some()
    }
}

#[cfg(feature = "seasonal")]
mod backend {
    use statrs::distribution::{ContinuousCDF, Normal};

    use super::*;

    pub(super) fn decompose(
        config: &SeasonalConfig,
        series: &TimeSeries,
    ) -> Result<FittedComponents> {
        if !(config.interval_width > 0.0 && config.interval_width < 1.0) {
            return Err(ForecastError::validation(format!(
                "interval width must be in (0, 1), got {}",
                config.interval_width
            )));
        }
        let n = series.len();
        if n < MIN_POINTS {
            return Err(ForecastError::InsufficientData {
                needed: MIN_POINTS,
                got: n,
            });
        }

        let values = series.values();
        let dates = series.dates();

        let trend = centered_moving_average(values, 7);
        let (intercept, slope) = trend_line(&trend);

        // Ratio to the smoothed trend drives both seasonal indices.
        let ratios: Vec<Option<f64>> = values
            .iter()
            .zip(trend.iter())
            .map(|(y, t)| (*t > TREND_EPS).then(|| y / t))
            .collect();

        let weekly = if config.weekly {
            weekly_index(dates, &ratios)
        } else {
            [1.0; 7]
        };

        let yearly = (config.yearly && n >= MIN_YEARLY_POINTS)
            .then(|| yearly_index(dates, &ratios, &weekly));

        // Residual dispersion of the reconstructed fit.
        let mut sq_sum = 0.0;
        for i in 0..n {
            let line = (intercept + slope * i as f64).max(0.0);
            let w = weekly[dates[i].weekday().num_days_from_monday() as usize];
            let y_idx = yearly
                .as_ref()
                .map_or(1.0, |index: &Vec<f64>| index[dates[i].ordinal0() as usize]);
            let fitted = line * w * y_idx;
            sq_sum += (values[i] - fitted).powi(2);
        }
        let sigma = (sq_sum / n as f64).sqrt();

        let normal = Normal::new(0.0, 1.0)
            .map_err(|_| ForecastError::validation("unit normal construction".to_string()))?;
        let z = normal.inverse_cdf((1.0 + config.interval_width) / 2.0);

        Ok(FittedComponents {
            intercept,
            slope,
            train_len: n,
            end_date: series.end_date().expect("series is non-empty"),
            weekly,
            yearly,
            sigma,
            z,
        })
    }

    /// Centered moving average with partial windows at the edges.
    fn centered_moving_average(values: &[f64], window: usize) -> Vec<f64> {
        let n = values.len();
        let half = window / 2;
        (0..n)
            .map(|i| {
                let lo = i.saturating_sub(half);
                let hi = (i + half + 1).min(n);
                values[lo..hi].iter().sum::<f64>() / (hi - lo) as f64
            })
            .collect()
    }

    /// Least-squares line through the smoothed trend.
    fn trend_line(trend: &[f64]) -> (f64, f64) {
        let n = trend.len() as f64;
        let x_mean = (n - 1.0) / 2.0;
        let y_mean = trend.iter().sum::<f64>() / n;

        let mut num = 0.0;
        let mut den = 0.0;
        for (i, t) in trend.iter().enumerate() {
            let dx = i as f64 - x_mean;
            num += dx * (t - y_mean);
            den += dx * dx;
        }
        let slope = if den > 0.0 { num / den } else { 0.0 };
        (y_mean - slope * x_mean, slope)
    }

    /// Mean detrended ratio per weekday, normalized to mean 1.
    fn weekly_index(dates: &[NaiveDate], ratios: &[Option<f64>]) -> [f64; 7] {
        let mut sums = [0.0; 7];
        let mut counts = [0usize; 7];
        for (date, ratio) in dates.iter().zip(ratios.iter()) {
            if let Some(r) = ratio {
                let d = date.weekday().num_days_from_monday() as usize;
                sums[d] += r;
                counts[d] += 1;
            }
        }

        let mut index = [1.0; 7];
        for d in 0..7 {
            if counts[d] > 0 {
                index[d] = sums[d] / counts[d] as f64;
            }
        }
        normalize(&mut index);
        index
    }

    /// Mean deweeklied ratio per day-of-year, circularly smoothed and
    /// normalized to mean 1.
    fn yearly_index(dates: &[NaiveDate], ratios: &[Option<f64>], weekly: &[f64; 7]) -> Vec<f64> {
        const DAYS: usize = 366;
        let mut sums = vec![0.0; DAYS];
        let mut counts = vec![0usize; DAYS];

        for (date, ratio) in dates.iter().zip(ratios.iter()) {
            let Some(r) = ratio else { continue };
            let w = weekly[date.weekday().num_days_from_monday() as usize];
            if w <= TREND_EPS {
                continue;
            }
            let doy = date.ordinal0() as usize;
            sums[doy] += r / w;
            counts[doy] += 1;
        }

        let raw: Vec<f64> = (0..DAYS)
            .map(|d| {
                if counts[d] > 0 {
                    sums[d] / counts[d] as f64
                } else {
                    1.0
                }
            })
            .collect();

        // +/- 7 day circular smoothing knocks down day-level noise.
        let mut smoothed: Vec<f64> = (0..DAYS)
            .map(|d| {
                let mut sum = 0.0;
                for offset in -7i32..=7 {
                    let at = (d as i32 + offset).rem_euclid(DAYS as i32) as usize;
                    sum += raw[at];
                }
                sum / 15.0
            })
            .collect();

        let mean = smoothed.iter().sum::<f64>() / DAYS as f64;
        if mean > TREND_EPS {
            for v in &mut smoothed {
                *v /= mean;
            }
        }
        smoothed
    }

    fn normalize(index: &mut [f64; 7]) {
        let mean = index.iter().sum::<f64>() / 7.0;
        if mean > TREND_EPS {
            for v in index.iter_mut() {
                *v /= mean;
            }
        }
    }
}
