//! Boundary types and entry points for the API layer.
//!
//! The transport (HTTP, queue, whatever) lives outside this crate; these
//! are the three request shapes it must honor, with serde defaults
//! matching the boundary contract. Dates serialize as ISO-8601 date
//! strings and every numeric forecast field is rounded to two decimals at
//! serialization only — internal computation keeps full precision.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::core::ForecastPoint;
use crate::error::ForecastError;
use crate::forecaster::Forecaster;
use crate::reorder::{ReorderAdvisor, ReorderRecommendation};
use crate::selector::ModelChoice;
use crate::validation::ValidationOutcome;

/// Serialize a float rounded to two decimal places.
pub(crate) fn round2<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 100.0).round() / 100.0)
}

/// The pipeline stage where a request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Prepare,
    Fit,
    Predict,
    Validate,
    Recommend,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Fit => "fit",
            Self::Predict => "predict",
            Self::Validate => "validate",
            Self::Recommend => "recommend",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed request, tagged with the stage that failed.
///
/// Serializes as `{"stage": ..., "error": ...}` so callers always learn
/// which stage failed and why.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{stage} stage failed: {source}")]
pub struct EngineError {
    pub stage: Stage,
    #[source]
    pub source: ForecastError,
}

impl Serialize for EngineError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("EngineError", 2)?;
        state.serialize_field("stage", self.stage.as_str())?;
        state.serialize_field("error", &self.source.to_string())?;
        state.end()
    }
}

fn at_stage(stage: Stage) -> impl Fn(ForecastError) -> EngineError {
    move |source| EngineError { stage, source }
}

fn default_periods() -> usize {
    30
}

fn default_model() -> String {
    "auto".to_string()
}

fn default_lead_time() -> usize {
    7
}

/// Single-product forecast request.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastRequest {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default = "default_periods")]
    pub periods: usize,
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for ForecastRequest {
    fn default() -> Self {
        Self {
            product_id: None,
            periods: default_periods(),
            model: default_model(),
        }
    }
}

/// One forecasted day at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPointDto {
    pub date: NaiveDate,
    #[serde(serialize_with = "round2")]
    pub forecast: f64,
    #[serde(serialize_with = "round2")]
    pub lower_bound: f64,
    #[serde(serialize_with = "round2")]
    pub upper_bound: f64,
}

impl From<ForecastPoint> for ForecastPointDto {
    fn from(point: ForecastPoint) -> Self {
        Self {
            date: point.date,
            forecast: point.forecast,
            lower_bound: point.lower,
            upper_bound: point.upper,
        }
    }
}

/// Single-product forecast response.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastResponse {
    pub product_id: Option<String>,
    pub periods: usize,
    /// Strategy name actually used.
    pub model: String,
    pub metrics: ValidationOutcome,
    pub forecast: Vec<ForecastPointDto>,
}

/// Reorder recommendation request.
#[derive(Debug, Clone, Deserialize)]
pub struct ReorderRequest {
    pub product_id: String,
    pub current_stock: f64,
    #[serde(default = "default_lead_time")]
    pub lead_time_days: usize,
}

/// Batch forecast request.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchForecastRequest {
    #[serde(default = "default_periods")]
    pub periods: usize,
    #[serde(default)]
    pub top_n: Option<usize>,
}

impl Default for BatchForecastRequest {
    fn default() -> Self {
        Self {
            periods: default_periods(),
            top_n: None,
        }
    }
}

/// Batch forecast response.
#[derive(Debug, Clone, Serialize)]
pub struct BatchForecastResponse {
    pub products_forecasted: usize,
    pub periods: usize,
    pub forecasts: BTreeMap<String, Vec<ForecastPointDto>>,
}

/// Generate a demand forecast for one product (or the whole inventory
/// when no product is given).
pub fn forecast_demand(
    records: &[Value],
    request: &ForecastRequest,
) -> Result<ForecastResponse, EngineError> {
    if request.periods == 0 {
        return Err(at_stage(Stage::Validate)(ForecastError::validation(
            "periods must be at least 1".to_string(),
        )));
    }

    let mut forecaster = Forecaster::new(ModelChoice::parse(&request.model));
    forecaster
        .prepare(records, request.product_id.as_deref())
        .map_err(at_stage(Stage::Prepare))?;
    forecaster.fit(None).map_err(at_stage(Stage::Fit))?;
    let result = forecaster
        .predict(request.periods)
        .map_err(at_stage(Stage::Predict))?;

    let metrics = forecaster
        .validation()
        .cloned()
        .unwrap_or(ValidationOutcome::Skipped {
            note: "validation not run".to_string(),
        });

    Ok(ForecastResponse {
        product_id: result.product_id,
        periods: request.periods,
        model: result.model.to_string(),
        metrics,
        forecast: result.forecast.iter().map(Into::into).collect(),
    })
}

/// Forecast over the lead time (plus a two-week buffer) and derive a
/// reorder recommendation.
pub fn reorder_recommendation(
    records: &[Value],
    request: &ReorderRequest,
) -> Result<ReorderRecommendation, EngineError> {
    if request.lead_time_days == 0 {
        return Err(at_stage(Stage::Validate)(ForecastError::validation(
            "lead_time_days must be at least 1".to_string(),
        )));
    }
    if !request.current_stock.is_finite() || request.current_stock < 0.0 {
        return Err(at_stage(Stage::Validate)(ForecastError::validation(
            format!("current_stock must be non-negative, got {}", request.current_stock),
        )));
    }

    let mut forecaster = Forecaster::new(ModelChoice::Auto);
    forecaster
        .prepare(records, Some(&request.product_id))
        .map_err(at_stage(Stage::Prepare))?;
    forecaster.fit(None).map_err(at_stage(Stage::Fit))?;
    let result = forecaster
        .predict(request.lead_time_days + 14)
        .map_err(at_stage(Stage::Predict))?;

    ReorderAdvisor::new(request.lead_time_days)
        .recommend(&result.forecast, request.current_stock)
        .map_err(at_stage(Stage::Recommend))
}

/// Forecast the most active products in one call.
pub fn batch_forecast(
    records: &[Value],
    request: &BatchForecastRequest,
) -> Result<BatchForecastResponse, EngineError> {
    if request.periods == 0 {
        return Err(at_stage(Stage::Validate)(ForecastError::validation(
            "periods must be at least 1".to_string(),
        )));
    }

    let forecaster = Forecaster::new(ModelChoice::Naive);
    let all = forecaster
        .forecast_all(records, request.periods, request.top_n)
        .map_err(at_stage(Stage::Prepare))?;

    let forecasts: BTreeMap<String, Vec<ForecastPointDto>> = all
        .into_iter()
        .map(|(id, product)| (id, product.forecast.iter().map(Into::into).collect()))
        .collect();

    Ok(BatchForecastResponse {
        products_forecasted: forecasts.len(),
        periods: request.periods,
        forecasts,
    })
}
