//! Chronological train/test partitioning

use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use chrono::{DateTime, Utc};
use ndarray::Array2;

/// Chronological partition of a [`FeatureTable`] into train and test segments.
///
/// Once produced the partition is immutable; evaluation and forecasting both
/// read from it for the rest of the session.
#[derive(Debug, Clone)]
pub struct Split {
    x_train: Array2<f64>,
    y_train: Array2<f64>,
    x_test: Array2<f64>,
    y_test: Array2<f64>,
    train_timestamps: Option<Vec<DateTime<Utc>>>,
    test_timestamps: Option<Vec<DateTime<Utc>>>,
}

impl Split {
    /// Training feature matrix
    pub fn x_train(&self) -> &Array2<f64> {
        &self.x_train
    }

    /// Training target matrix, one column per target
    pub fn y_train(&self) -> &Array2<f64> {
        &self.y_train
    }

    /// Test feature matrix
    pub fn x_test(&self) -> &Array2<f64> {
        &self.x_test
    }

    /// Test target matrix, one column per target
    pub fn y_test(&self) -> &Array2<f64> {
        &self.y_test
    }

    /// Number of training rows
    pub fn n_train(&self) -> usize {
        self.x_train.nrows()
    }

    /// Number of test rows
    pub fn n_test(&self) -> usize {
        self.x_test.nrows()
    }

    /// Timestamps of the training rows, when available
    pub fn train_timestamps(&self) -> Option<&[DateTime<Utc>]> {
        self.train_timestamps.as_deref()
    }

    /// Timestamps of the test rows, when available
    pub fn test_timestamps(&self) -> Option<&[DateTime<Utc>]> {
        self.test_timestamps.as_deref()
    }
}

/// Partitions a feature table chronologically at a configured fraction
#[derive(Debug)]
pub struct DatasetSplitter;

impl DatasetSplitter {
    /// Split `features` at `floor(train_perc * rows)`, first segment train,
    /// remainder test, original order preserved. Shuffling a time series
    /// would leak future information into training, so none happens here.
    pub fn split(features: &FeatureTable, train_perc: f64) -> Result<Split> {
        if train_perc <= 0.0 || train_perc >= 1.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "train_perc must be in (0, 1), got {}",
                train_perc
            )));
        }

        let n_rows = features.len();
        if n_rows == 0 {
            return Err(ForecastError::DataError(
                "Cannot split an empty feature table".to_string(),
            ));
        }

        let split_at = (train_perc * n_rows as f64).floor() as usize;
        if split_at == 0 || split_at == n_rows {
            return Err(ForecastError::ValidationError(format!(
                "Split at {} of {} rows leaves an empty partition",
                split_at, n_rows
            )));
        }

        let x_train = rows_to_matrix(&features.features()[..split_at], features.n_features())?;
        let x_test = rows_to_matrix(&features.features()[split_at..], features.n_features())?;
        let n_targets = features.target_names().len();
        let y_train = rows_to_matrix(&features.targets()[..split_at], n_targets)?;
        let y_test = rows_to_matrix(&features.targets()[split_at..], n_targets)?;

        let (train_timestamps, test_timestamps) = match features.timestamps() {
            Some(ts) => (
                Some(ts[..split_at].to_vec()),
                Some(ts[split_at..].to_vec()),
            ),
            None => (None, None),
        };

        Ok(Split {
            x_train,
            y_train,
            x_test,
            y_test,
            train_timestamps,
            test_timestamps,
        })
    }
}

fn rows_to_matrix(rows: &[Vec<f64>], n_cols: usize) -> Result<Array2<f64>> {
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), n_cols), flat)
        .map_err(|e| ForecastError::DataError(format!("Ragged feature rows: {}", e)))
}
