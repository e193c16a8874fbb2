//! Core data structures for demand forecasting.

mod forecast;
mod time_series;

pub use forecast::{Forecast, ForecastPoint};
pub use time_series::{FieldNames, TimeSeries, TimeSeriesBuilder};
