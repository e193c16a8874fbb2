//! Reorder recommendations derived from a demand forecast.

use serde::Serialize;

use crate::core::Forecast;
use crate::error::{ForecastError, Result};

/// An actionable reorder recommendation.
///
/// All quantities keep full precision internally; rounding happens at the
/// serialization boundary only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReorderRecommendation {
    #[serde(serialize_with = "crate::api::round2")]
    pub current_stock: f64,
    #[serde(serialize_with = "crate::api::round2")]
    pub reorder_point: f64,
    #[serde(serialize_with = "crate::api::round2")]
    pub safety_stock: f64,
    pub should_reorder: bool,
    #[serde(serialize_with = "crate::api::round2")]
    pub recommended_order_qty: f64,
    pub days_until_stockout: usize,
    #[serde(serialize_with = "crate::api::round2")]
    pub avg_daily_demand: f64,
    #[serde(serialize_with = "crate::api::round2")]
    pub demand_during_lead_time: f64,
}

/// Derives reorder points from a forecast and current stock state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReorderAdvisor {
    lead_time_days: usize,
    safety_multiplier: f64,
}

impl Default for ReorderAdvisor {
    fn default() -> Self {
        Self {
            lead_time_days: 7,
            safety_multiplier: 1.5,
        }
    }
}

impl ReorderAdvisor {
    pub fn new(lead_time_days: usize) -> Self {
        Self {
            lead_time_days,
            ..Self::default()
        }
    }

    pub fn with_safety_multiplier(mut self, multiplier: f64) -> Self {
        self.safety_multiplier = multiplier;
        self
    }

    pub fn lead_time_days(&self) -> usize {
        self.lead_time_days
    }

    /// Derive a recommendation from the forecast and the current stock
    /// level.
    ///
    /// The forecast must cover at least the lead time, otherwise the
    /// lead-time demand cannot be computed.
    pub fn recommend(&self, forecast: &Forecast, current_stock: f64) -> Result<ReorderRecommendation> {
        if self.lead_time_days == 0 {
            return Err(ForecastError::validation(
                "lead time must be at least 1 day".to_string(),
            ));
        }
        if forecast.horizon() < self.lead_time_days {
            return Err(ForecastError::validation(format!(
                "forecast horizon ({}) is shorter than the lead time ({})",
                forecast.horizon(),
                self.lead_time_days
            )));
        }

        let point = forecast.point();
        let demand_during_lead_time: f64 = point[..self.lead_time_days].iter().sum();
        let avg_daily_demand = point.iter().sum::<f64>() / point.len() as f64;

        // Safety stock grows with the square root of the lead time:
        // demand variance, not just its mean, scales with the review
        // period.
        let safety_stock =
            avg_daily_demand * self.safety_multiplier * (self.lead_time_days as f64).sqrt();
        let reorder_point = demand_during_lead_time + safety_stock;

        let mut cumulative = 0.0;
        let mut days_until_stockout = 0;
        for p in point {
            cumulative += p;
            if cumulative > current_stock {
                break;
            }
            days_until_stockout += 1;
        }

        let should_reorder = current_stock <= reorder_point;
        // Two-week buffer beyond the bare reorder point.
        let recommended_order_qty =
            (reorder_point - current_stock + avg_daily_demand * 14.0).max(0.0);

        Ok(ReorderRecommendation {
            current_stock,
            reorder_point,
            safety_stock,
            should_reorder,
            recommended_order_qty,
            days_until_stockout,
            avg_daily_demand,
            demand_during_lead_time,
        })
    }
}
