//! Model selection policy.
//!
//! Very short series cannot support feature engineering or seasonality
//! estimation, medium series favor the feature-driven regressor, and long
//! series justify fitting multiple strategies and averaging them.

use crate::models::{BoxedModel, Ensemble, NaiveAverage, SeasonalDecomposition, TreeRegressor};

/// Series length below which auto-selection falls back to [`NaiveAverage`].
pub const AUTO_NAIVE_BELOW: usize = 30;

/// Series length from which auto-selection prefers the [`Ensemble`].
pub const AUTO_ENSEMBLE_FROM: usize = 365;

/// The strategy requested at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChoice {
    /// Pick by series length.
    Auto,
    Naive,
    Tree,
    Seasonal,
    Ensemble,
}

impl ModelChoice {
    /// Parse a boundary model name. Unrecognized names fall back to the
    /// tree regressor.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "auto" => Self::Auto,
            "simple" | "naive" => Self::Naive,
            "xgboost" | "tree" => Self::Tree,
            "prophet" | "seasonal" => Self::Seasonal,
            "ensemble" => Self::Ensemble,
            _ => Self::Tree,
        }
    }

    /// Resolve `Auto` to a concrete strategy for a series of `len` points.
    pub fn resolve(self, len: usize) -> Self {
        match self {
            Self::Auto => {
                if len < AUTO_NAIVE_BELOW {
                    Self::Naive
                } else if len < AUTO_ENSEMBLE_FROM {
                    Self::Tree
                } else {
                    Self::Ensemble
                }
            }
            concrete => concrete,
        }
    }
}

/// Instantiate an unfitted model for the given choice.
///
/// `len` sizes the naive window (`min(7, len)`); `seed` feeds the tree
/// regressor so concurrent per-product fits stay independent.
pub fn instantiate(choice: ModelChoice, len: usize, seed: u64) -> BoxedModel {
    match choice.resolve(len) {
        ModelChoice::Naive => Box::new(NaiveAverage::new(7.min(len.max(1)))),
        ModelChoice::Tree => Box::new(TreeRegressor::new(seed)),
        ModelChoice::Seasonal => Box::new(SeasonalDecomposition::new()),
        ModelChoice::Ensemble => Box::new(Ensemble::new(seed)),
        ModelChoice::Auto => unreachable!("resolve returns a concrete choice"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_boundaries_are_exact() {
        assert_eq!(ModelChoice::Auto.resolve(1), ModelChoice::Naive);
        assert_eq!(ModelChoice::Auto.resolve(29), ModelChoice::Naive);
        assert_eq!(ModelChoice::Auto.resolve(30), ModelChoice::Tree);
        assert_eq!(ModelChoice::Auto.resolve(364), ModelChoice::Tree);
        assert_eq!(ModelChoice::Auto.resolve(365), ModelChoice::Ensemble);
        assert_eq!(ModelChoice::Auto.resolve(1000), ModelChoice::Ensemble);
    }

    #[test]
    fn explicit_choice_ignores_length() {
        assert_eq!(ModelChoice::Seasonal.resolve(5), ModelChoice::Seasonal);
        assert_eq!(ModelChoice::Naive.resolve(2000), ModelChoice::Naive);
    }

    #[test]
    fn parse_accepts_boundary_names() {
        assert_eq!(ModelChoice::parse("auto"), ModelChoice::Auto);
        assert_eq!(ModelChoice::parse("simple"), ModelChoice::Naive);
        assert_eq!(ModelChoice::parse("XGBoost"), ModelChoice::Tree);
        assert_eq!(ModelChoice::parse("prophet"), ModelChoice::Seasonal);
        assert_eq!(ModelChoice::parse("ensemble"), ModelChoice::Ensemble);
    }

    #[test]
    fn unrecognized_names_default_to_tree() {
        assert_eq!(ModelChoice::parse("arima"), ModelChoice::Tree);
        assert_eq!(ModelChoice::parse(""), ModelChoice::Tree);
    }

    #[test]
    fn instantiated_models_report_their_names() {
        assert_eq!(instantiate(ModelChoice::Naive, 50, 42).name(), "NaiveAverage");
        assert_eq!(instantiate(ModelChoice::Tree, 50, 42).name(), "TreeRegressor");
        assert_eq!(
            instantiate(ModelChoice::Seasonal, 50, 42).name(),
            "SeasonalDecomposition"
        );
        assert_eq!(instantiate(ModelChoice::Ensemble, 500, 42).name(), "Ensemble");
    }

    #[test]
    fn auto_instantiation_sizes_the_naive_window() {
        let model = instantiate(ModelChoice::Auto, 4, 42);
        assert_eq!(model.name(), "NaiveAverage");
    }
}
