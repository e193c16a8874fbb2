//! Forecasting orchestrator.
//!
//! Drives the prepare -> select -> fit -> validate -> predict cycle for a
//! single product, and batch forecasting across products with per-product
//! failure isolation.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::{FieldNames, Forecast, TimeSeries, TimeSeriesBuilder};
use crate::error::{ForecastError, Result};
use crate::models::BoxedModel;
use crate::selector::{instantiate, ModelChoice};
use crate::validation::{holdout_validate, ValidationOutcome};

/// Default RNG seed for tree training when the caller does not supply one.
pub const DEFAULT_SEED: u64 = 42;

/// A forecast annotated with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductForecast {
    /// Product the forecast applies to, when one was filtered.
    pub product_id: Option<String>,
    /// Name of the strategy actually used.
    pub model: &'static str,
    /// When the forecast was generated.
    pub generated_at: DateTime<Utc>,
    pub forecast: Forecast,
}

/// Orchestrates one product's forecasting run.
///
/// State machine: unprepared -> prepared (series set) -> fitted ->
/// predicted (repeatable). `fit` may be called again with a new series;
/// all model and validation state is replaced.
pub struct Forecaster {
    choice: ModelChoice,
    seed: u64,
    builder: TimeSeriesBuilder,
    series: Option<TimeSeries>,
    product_id: Option<String>,
    model: Option<BoxedModel>,
    validation: Option<ValidationOutcome>,
}

impl Forecaster {
    pub fn new(choice: ModelChoice) -> Self {
        Self {
            choice,
            seed: DEFAULT_SEED,
            builder: TimeSeriesBuilder::new(),
            series: None,
            product_id: None,
            model: None,
            validation: None,
        }
    }

    /// Seed for tree training; per-instance so concurrent per-product
    /// runs never share RNG state.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Use caller-specific transaction column names.
    pub fn with_fields(mut self, fields: FieldNames) -> Self {
        self.builder = TimeSeriesBuilder::with_fields(fields);
        self
    }

    /// Aggregate transaction rows into the series for this run.
    ///
    /// Replaces any previously prepared series and clears fitted state.
    pub fn prepare(&mut self, records: &[Value], product_id: Option<&str>) -> Result<&TimeSeries> {
        let series = self.builder.build(records, product_id)?;
        debug!(
            points = series.len(),
            product = product_id.unwrap_or("<all>"),
            "prepared demand series"
        );
        self.product_id = product_id.map(str::to_string);
        self.series = Some(series);
        self.model = None;
        self.validation = None;
        Ok(self.series.as_ref().expect("series just stored"))
    }

    /// Select and fit a model on the passed series, or on the prepared one.
    ///
    /// Afterward the strategy is scored on a chronological holdout split;
    /// see [`holdout_validate`]. Refitting replaces all previous state.
    pub fn fit(&mut self, series: Option<TimeSeries>) -> Result<&mut Self> {
        if let Some(series) = series {
            self.series = Some(series);
        }
        let series = self.series.as_ref().ok_or_else(|| {
            ForecastError::validation(
                "no series available: call prepare() first or pass one to fit()".to_string(),
            )
        })?;

        let resolved = self.choice.resolve(series.len());
        let mut model = instantiate(resolved, series.len(), self.seed);
        info!(
            points = series.len(),
            start = ?series.start_date(),
            end = ?series.end_date(),
            model = model.name(),
            "fitting forecasting model"
        );

        model.fit(series)?;
        self.validation = Some(holdout_validate(resolved, series, self.seed));
        self.model = Some(model);
        Ok(self)
    }

    /// Forecast the next `periods` days with the fitted model.
    pub fn predict(&self, periods: usize) -> Result<ProductForecast> {
        let model = self.model.as_ref().ok_or(ForecastError::NotFitted)?;
        let forecast = model.predict(periods)?;
        debug!(periods, model = model.name(), "generated forecast");

        Ok(ProductForecast {
            product_id: self.product_id.clone(),
            model: model.name(),
            generated_at: Utc::now(),
            forecast,
        })
    }

    /// The prepared series, if any.
    pub fn series(&self) -> Option<&TimeSeries> {
        self.series.as_ref()
    }

    /// Name of the fitted strategy, if any.
    pub fn model_name(&self) -> Option<&'static str> {
        self.model.as_ref().map(|m| m.name())
    }

    /// Outcome of the holdout validation run alongside the last fit.
    pub fn validation(&self) -> Option<&ValidationOutcome> {
        self.validation.as_ref()
    }

    /// Forecast every product in the records independently.
    ///
    /// Products are ranked by transaction count descending (ties broken by
    /// id) and optionally truncated to the `top_n` most active. Each
    /// product runs its own prepare/fit/predict cycle with the naive
    /// strategy — cheap and robust for wide batch sweeps — on a bounded
    /// worker pool. A failing product is logged and skipped so one bad
    /// series cannot abort the batch.
    pub fn forecast_all(
        &self,
        records: &[Value],
        periods: usize,
        top_n: Option<usize>,
    ) -> Result<BTreeMap<String, ProductForecast>> {
        let product_field = self.builder.fields().product.clone();

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for row in records {
            if let Some(id) = row.get(&product_field).and_then(Value::as_str) {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        if counts.is_empty() {
            return Err(ForecastError::validation(format!(
                "no product identifiers found in field '{product_field}'"
            )));
        }

        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        if let Some(n) = top_n {
            ranked.truncate(n);
        }

        info!(products = ranked.len(), periods, "batch forecasting");

        let seed = self.seed;
        let fields = self.builder.fields().clone();

        let forecasts: BTreeMap<String, ProductForecast> = ranked
            .par_iter()
            .filter_map(|&(id, _)| {
                let run = || -> Result<ProductForecast> {
                    let mut forecaster = Forecaster::new(ModelChoice::Naive)
                        .with_seed(seed)
                        .with_fields(fields.clone());
                    forecaster.prepare(records, Some(id))?;
                    forecaster.fit(None)?;
                    forecaster.predict(periods)
                };
                match run() {
                    Ok(forecast) => Some((id.to_string(), forecast)),
                    Err(error) => {
                        warn!(product = id, %error, "skipping product in batch forecast");
                        None
                    }
                }
            })
            .collect();

        Ok(forecasts)
    }
}
