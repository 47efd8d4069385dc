//! One independent regressor per target column behind a single call surface

use crate::error::{ForecastError, Result};
use crate::models::{BoostingParams, GradientBoostingRegressor, Regressor};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use tracing::debug;

/// Multi-output regression over a shared feature matrix.
///
/// Each target column gets its own regressor trained on the same features;
/// the per-column fits are independent and run in parallel, while the output
/// column order stays fixed to the order given at fit time.
#[derive(Debug)]
pub struct MultiOutputRegressor<R: Regressor = GradientBoostingRegressor> {
    columns: Vec<String>,
    models: Vec<R>,
    n_features: usize,
}

impl MultiOutputRegressor<GradientBoostingRegressor> {
    /// Fit one gradient-boosted regressor per target column.
    pub fn fit_boosted(
        columns: &[String],
        x: &Array2<f64>,
        y: &Array2<f64>,
        params: &BoostingParams,
    ) -> Result<Self> {
        Self::fit_each(columns, x, y, || GradientBoostingRegressor::new(params.clone()))
    }
}

impl<R: Regressor + Send> MultiOutputRegressor<R> {
    /// Fit one regressor per target column, built by `make`.
    ///
    /// `y` must have one column per entry in `columns`, aligned by position.
    pub fn fit_each<F>(columns: &[String], x: &Array2<f64>, y: &Array2<f64>, make: F) -> Result<Self>
    where
        F: Fn() -> R + Sync,
    {
        if columns.is_empty() {
            return Err(ForecastError::DataError(
                "At least one target column is required".to_string(),
            ));
        }
        if y.ncols() != columns.len() {
            return Err(ForecastError::DataError(format!(
                "Target matrix has {} columns but {} names were given",
                y.ncols(),
                columns.len()
            )));
        }
        if x.nrows() != y.nrows() {
            return Err(ForecastError::DataError(format!(
                "Feature matrix has {} rows but target matrix has {}",
                x.nrows(),
                y.nrows()
            )));
        }

        debug!(targets = columns.len(), rows = x.nrows(), "fitting per-column regressors");

        let models: Vec<R> = (0..columns.len())
            .into_par_iter()
            .map(|j| {
                let mut model = make();
                let y_col = y.column(j).to_owned();
                model.fit(x, &y_col)?;
                Ok(model)
            })
            .collect::<Result<Vec<R>>>()?;

        Ok(Self {
            columns: columns.to_vec(),
            models,
            n_features: x.ncols(),
        })
    }

    /// Width of the feature matrix the regressors were fitted on
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Target column names, in output order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of target columns
    pub fn n_targets(&self) -> usize {
        self.columns.len()
    }

    /// Predict all targets for every input row; the result has one column
    /// per target, in the fit-time order.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features {
            return Err(ForecastError::DataError(format!(
                "Input has {} features but the regressors were fitted on {}",
                x.ncols(),
                self.n_features
            )));
        }

        let mut out = Array2::zeros((x.nrows(), self.models.len()));
        for (j, model) in self.models.iter().enumerate() {
            let column: Array1<f64> = model.predict(x)?;
            out.column_mut(j).assign(&column);
        }
        Ok(out)
    }

    /// Predict all targets for a single feature vector.
    pub fn predict_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        let x = Array2::from_shape_vec((1, row.len()), row.to_vec())
            .map_err(|e| ForecastError::DataError(format!("Bad feature vector: {}", e)))?;
        let prediction = self.predict(&x)?;
        Ok(prediction.row(0).to_vec())
    }
}
