//! Forecasting strategies.

mod traits;

mod ensemble;
mod naive;
mod seasonal;
mod tree;

pub use ensemble::Ensemble;
pub use naive::NaiveAverage;
pub use seasonal::{SeasonalConfig, SeasonalDecomposition};
pub use traits::{BoxedModel, DemandModel};
pub use tree::{TreeParams, TreeRegressor};
