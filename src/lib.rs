//! # demand-forecast
//!
//! Demand forecasting engine for inventory management.
//!
//! Aggregates per-product transaction history into a gap-free daily
//! series, auto-selects a forecasting strategy for the amount of data
//! available (naive rolling average, feature-based gradient-boosted
//! trees, seasonal decomposition, or an ensemble of the latter two),
//! produces multi-day projections with uncertainty bounds, and turns them
//! into reorder recommendations.
//!
//! ```
//! use demand_forecast::prelude::*;
//! use serde_json::json;
//!
//! let records: Vec<_> = (0..21)
//!     .map(|i| json!({
//!         "Date": format!("2024-01-{:02}", i + 1),
//!         "Quantity": 5,
//!         "Product_ID": "SKU-1",
//!     }))
//!     .collect();
//!
//! let mut forecaster = Forecaster::new(ModelChoice::Auto);
//! forecaster.prepare(&records, Some("SKU-1")).unwrap();
//! forecaster.fit(None).unwrap();
//! let result = forecaster.predict(7).unwrap();
//! assert_eq!(result.forecast.horizon(), 7);
//! ```

pub mod api;
pub mod core;
pub mod error;
pub mod forecaster;
pub mod models;
pub mod reorder;
pub mod selector;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{FieldNames, Forecast, ForecastPoint, TimeSeries, TimeSeriesBuilder};
    pub use crate::error::{ForecastError, Result};
    pub use crate::forecaster::{Forecaster, ProductForecast};
    pub use crate::models::{BoxedModel, DemandModel};
    pub use crate::reorder::{ReorderAdvisor, ReorderRecommendation};
    pub use crate::selector::ModelChoice;
    pub use crate::validation::{ValidationMetrics, ValidationOutcome};
}
