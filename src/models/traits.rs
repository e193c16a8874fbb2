//! The common interface implemented by every forecasting strategy.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;

/// Common interface for demand forecasting strategies.
///
/// Object-safe; the orchestrator works with `Box<dyn DemandModel>`.
pub trait DemandModel {
    /// Fit the model to a daily demand series.
    ///
    /// Fails with [`InsufficientData`] when the series is too short for
    /// the strategy, or [`StrategyUnavailable`] when its backend is not
    /// compiled in.
    ///
    /// [`InsufficientData`]: crate::error::ForecastError::InsufficientData
    /// [`StrategyUnavailable`]: crate::error::ForecastError::StrategyUnavailable
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Forecast the next `periods` days (`periods >= 1`).
    ///
    /// Fails with [`NotFitted`] before a successful [`fit`](Self::fit).
    ///
    /// [`NotFitted`]: crate::error::ForecastError::NotFitted
    fn predict(&self, periods: usize) -> Result<Forecast>;

    /// Strategy name, as reported at the API boundary.
    fn name(&self) -> &'static str;

    /// Whether [`fit`](Self::fit) has succeeded.
    fn is_fitted(&self) -> bool;
}

/// Type alias for boxed strategy trait objects.
pub type BoxedModel = Box<dyn DemandModel + Send>;

/// Reject a zero forecast horizon.
///
/// Shared by every strategy: an empty forecast would silently break
/// downstream reorder arithmetic.
pub(crate) fn check_horizon(periods: usize) -> Result<()> {
    if periods == 0 {
        return Err(crate::error::ForecastError::validation(
            "forecast horizon must be at least 1 day".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForecastError;
    use crate::models::NaiveAverage;
    use chrono::NaiveDate;

    #[test]
    fn boxed_model_fit_predict() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let ts = TimeSeries::daily(start, (1..=20).map(f64::from).collect()).unwrap();

        let mut model: BoxedModel = Box::new(NaiveAverage::new(7));
        assert!(!model.is_fitted());

        model.fit(&ts).unwrap();
        assert!(model.is_fitted());

        let forecast = model.predict(5).unwrap();
        assert_eq!(forecast.horizon(), 5);
    }

    #[test]
    fn zero_horizon_is_rejected() {
        assert!(matches!(check_horizon(0), Err(ForecastError::Validation(_))));
        assert!(check_horizon(1).is_ok());
    }
}
