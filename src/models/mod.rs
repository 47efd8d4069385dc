//! Regression models for lagged-feature forecasting

use crate::error::Result;
use ndarray::{Array1, Array2};
use std::fmt::Debug;

pub mod decision_tree;
pub mod gradient_boosting;
pub mod multi_output;

pub use decision_tree::DecisionTree;
pub use gradient_boosting::{BoostingParams, GradientBoostingRegressor};
pub use multi_output::MultiOutputRegressor;

/// Capability interface for a single-target regressor.
///
/// Every per-column model inside [`MultiOutputRegressor`] conforms to this;
/// the columns share one feature matrix but are otherwise independent.
pub trait Regressor: Debug {
    /// Fit the model to a feature matrix and one target vector
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict one value per input row
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}
