//! Evaluation metrics for fitted forecasters

use crate::error::{ForecastError, Result};
use crate::models::{MultiOutputRegressor, Regressor};
use ndarray::Array2;

/// Per-column error metrics on the held-out segment
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    /// (column name, root-mean-square error) pairs in target order
    per_column: Vec<(String, f64)>,
    /// Number of test rows the metrics were computed over
    n_rows: usize,
}

impl EvaluationReport {
    /// RMSE per target column, in the model's output order
    pub fn per_column_rmse(&self) -> &[(String, f64)] {
        &self.per_column
    }

    /// RMSE of a named column
    pub fn rmse(&self, column: &str) -> Option<f64> {
        self.per_column
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| *v)
    }

    /// RMSE pooled over every column
    pub fn overall_rmse(&self) -> f64 {
        if self.per_column.is_empty() {
            return 0.0;
        }
        let mean_sq = self
            .per_column
            .iter()
            .map(|(_, rmse)| rmse * rmse)
            .sum::<f64>()
            / self.per_column.len() as f64;
        mean_sq.sqrt()
    }

    /// Number of test rows the metrics cover
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }
}

impl std::fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Root Mean Square Error ({} test rows):", self.n_rows)?;
        for (name, rmse) in &self.per_column {
            writeln!(f, "  {}: {:.4}", name, rmse)?;
        }
        writeln!(f, "  overall: {:.4}", self.overall_rmse())?;
        Ok(())
    }
}

/// Computes per-column error metrics on a held-out segment
#[derive(Debug)]
pub struct Evaluator;

impl Evaluator {
    /// Predict once over the full test segment and compute per-column RMSE.
    ///
    /// Alignment is positional: predicted row k is compared with actual row
    /// k of the test segment, regardless of any timestamp index.
    pub fn evaluate<R: Regressor + Send>(
        model: &MultiOutputRegressor<R>,
        x_test: &Array2<f64>,
        y_test: &Array2<f64>,
    ) -> Result<EvaluationReport> {
        if x_test.nrows() == 0 {
            return Err(ForecastError::DataError(
                "Cannot evaluate on an empty test segment".to_string(),
            ));
        }
        if y_test.nrows() != x_test.nrows() || y_test.ncols() != model.n_targets() {
            return Err(ForecastError::DataError(format!(
                "Test targets have shape {}x{}, expected {}x{}",
                y_test.nrows(),
                y_test.ncols(),
                x_test.nrows(),
                model.n_targets()
            )));
        }

        let predicted = model.predict(x_test)?;
        let n = x_test.nrows() as f64;

        let per_column = model
            .columns()
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let sq_sum: f64 = predicted
                    .column(j)
                    .iter()
                    .zip(y_test.column(j).iter())
                    .map(|(p, a)| (p - a).powi(2))
                    .sum();
                (name.clone(), (sq_sum / n).sqrt())
            })
            .collect();

        Ok(EvaluationReport {
            per_column,
            n_rows: x_test.nrows(),
        })
    }
}

/// Root-mean-square error between two equally long slices
pub fn rmse(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    if predicted.len() != actual.len() || predicted.is_empty() {
        return Err(ForecastError::ValidationError(
            "Predicted and actual values must have the same non-zero length".to_string(),
        ));
    }
    let mse = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (p - a).powi(2))
        .sum::<f64>()
        / predicted.len() as f64;
    Ok(mse.sqrt())
}
