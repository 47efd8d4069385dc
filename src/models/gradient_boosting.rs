//! Gradient-boosted regression trees with a squared-error objective

use crate::error::{ForecastError, Result};
use crate::models::{DecisionTree, Regressor};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Boosting hyperparameters, fixed per session.
///
/// The defaults mirror the configuration the forecaster ships with:
/// 100 rounds, shrinkage 0.1, depth-5 trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostingParams {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples in a leaf
    pub min_samples_leaf: usize,
    /// Row subsample ratio per round
    pub subsample: f64,
    /// Seed for row subsampling; `None` draws from entropy
    pub random_state: Option<u64>,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 5,
            min_samples_leaf: 1,
            subsample: 1.0,
            random_state: Some(42),
        }
    }
}

impl BoostingParams {
    /// Validate the parameter combination
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ForecastError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.learning_rate <= 0.0 {
            return Err(ForecastError::InvalidParameter(
                "learning_rate must be positive".to_string(),
            ));
        }
        if self.subsample <= 0.0 || self.subsample > 1.0 {
            return Err(ForecastError::InvalidParameter(
                "subsample must be in (0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Gradient boosting regressor: each round fits a tree to the residuals of
/// the running prediction and shrinks its contribution by the learning rate.
#[derive(Debug, Clone)]
pub struct GradientBoostingRegressor {
    params: BoostingParams,
    trees: Vec<DecisionTree>,
    base_prediction: f64,
}

impl GradientBoostingRegressor {
    /// Create an unfitted regressor
    pub fn new(params: BoostingParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
            base_prediction: 0.0,
        }
    }

    /// The configured hyperparameters
    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    /// Whether fit has completed
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    fn subsample_indices(&self, n: usize, rng: &mut StdRng) -> Vec<usize> {
        let sample_size = ((n as f64) * self.params.subsample).ceil() as usize;
        let mut indices: Vec<usize> = (0..n).collect();
        if sample_size < n {
            indices.shuffle(rng);
            indices.truncate(sample_size);
            indices.sort_unstable();
        }
        indices
    }
}

impl Regressor for GradientBoostingRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.params.validate()?;

        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(ForecastError::DataError(
                "Cannot fit on an empty training matrix".to_string(),
            ));
        }
        if n_samples != y.len() {
            return Err(ForecastError::DataError(format!(
                "Feature matrix has {} rows but target vector has {}",
                n_samples,
                y.len()
            )));
        }

        debug!(
            rounds = self.params.n_estimators,
            samples = n_samples,
            features = x.ncols(),
            "fitting gradient boosting regressor"
        );

        let mut rng = match self.params.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        self.base_prediction = y.mean().unwrap_or(0.0);
        self.trees = Vec::with_capacity(self.params.n_estimators);

        let mut predictions = Array1::from_elem(n_samples, self.base_prediction);

        for _ in 0..self.params.n_estimators {
            let residuals: Array1<f64> = y
                .iter()
                .zip(predictions.iter())
                .map(|(yi, pi)| yi - pi)
                .collect();

            let row_indices = self.subsample_indices(n_samples, &mut rng);
            let x_round = x.select(ndarray::Axis(0), &row_indices);
            let y_round =
                Array1::from_vec(row_indices.iter().map(|&i| residuals[i]).collect());

            let mut tree = DecisionTree::new(self.params.max_depth, self.params.min_samples_leaf);
            tree.fit(&x_round, &y_round)?;

            let tree_pred = tree.predict(x)?;
            for i in 0..n_samples {
                predictions[i] += self.params.learning_rate * tree_pred[i];
            }

            self.trees.push(tree);
        }

        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ForecastError::NotReady(
                "Regressor has not been fitted".to_string(),
            ));
        }

        let mut predictions = Array1::from_elem(x.nrows(), self.base_prediction);
        for tree in &self.trees {
            let tree_pred = tree.predict(x)?;
            for i in 0..x.nrows() {
                predictions[i] += self.params.learning_rate * tree_pred[i];
            }
        }
        Ok(predictions)
    }
}
