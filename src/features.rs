//! Lag expansion and calendar feature encoding

use crate::data::TimeSeriesTable;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::f64::consts::TAU;
use tracing::warn;

/// Names of the calendar features, in the order they are appended
pub const TIME_FEATURE_NAMES: [&str; 6] = [
    "hour",
    "day_of_week",
    "hour_sin",
    "hour_cos",
    "dow_sin",
    "dow_cos",
];

/// Ordered set of lag distances used for feature expansion.
///
/// Lags are powers of two up to the configured maximum, which keeps the
/// feature space compact while still reaching far back into the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LagSpec {
    lags: Vec<usize>,
}

impl LagSpec {
    /// Generate the lag set `{2^i : 2^i <= n_lag}`.
    pub fn powers_of_two(n_lag: usize) -> Result<Self> {
        if n_lag < 1 {
            return Err(ForecastError::InvalidParameter(
                "n_lag must be at least 1".to_string(),
            ));
        }

        let mut lags = Vec::new();
        let mut lag = 1usize;
        while lag <= n_lag {
            lags.push(lag);
            lag *= 2;
        }

        Ok(Self { lags })
    }

    /// The lag distances, strictly increasing, first element always 1
    pub fn lags(&self) -> &[usize] {
        &self.lags
    }

    /// The largest lag distance
    pub fn max_lag(&self) -> usize {
        *self.lags.last().unwrap_or(&1)
    }

    /// Number of lag distances
    pub fn len(&self) -> usize {
        self.lags.len()
    }

    /// A lag spec is never empty by construction
    pub fn is_empty(&self) -> bool {
        self.lags.is_empty()
    }
}

/// Supervised-learning table derived from a [`TimeSeriesTable`].
///
/// Feature rows hold only history (lagged values and, optionally, calendar
/// features); the current-step target values live in a separate block so the
/// model never sees them as input.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    feature_names: Vec<String>,
    /// Row-major feature values
    features: Vec<Vec<f64>>,
    target_names: Vec<String>,
    /// Row-major target values, aligned with the feature rows
    targets: Vec<Vec<f64>>,
    timestamps: Option<Vec<DateTime<Utc>>>,
}

impl FeatureTable {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Number of feature columns
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Feature column names
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Target column names, in the source table's order
    pub fn target_names(&self) -> &[String] {
        &self.target_names
    }

    /// Feature rows
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Target rows aligned with the feature rows
    pub fn targets(&self) -> &[Vec<f64>] {
        &self.targets
    }

    /// Timestamps aligned with the rows, when the source was calendar-indexed
    pub fn timestamps(&self) -> Option<&[DateTime<Utc>]> {
        self.timestamps.as_deref()
    }
}

/// Outcome of a feature build, including the effective configuration.
///
/// Time features are requested by the caller but may be disabled when the
/// source index cannot support them; the report makes that transition
/// observable instead of hiding it.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// The generated lag distances
    pub lag_spec: LagSpec,
    /// Whether time features were requested for this build
    pub time_features_requested: bool,
    /// Whether time features were actually encoded
    pub time_features_enabled: bool,
}

impl BuildReport {
    /// True when time features were requested but could not be encoded
    pub fn downgraded(&self) -> bool {
        self.time_features_requested && !self.time_features_enabled
    }
}

/// Converts a raw multivariate time series into a supervised-learning table
#[derive(Debug)]
pub struct FeatureBuilder;

impl FeatureBuilder {
    /// Expand `table` into lagged features plus optional calendar features.
    ///
    /// For every lag in the generated [`LagSpec`] and every column, a feature
    /// holds that column's value `lag` steps earlier. Rows without history
    /// for the largest lag are dropped outright. Features are grouped by lag
    /// (all columns at lag 1, then all columns at lag 2, ...), which is also
    /// the layout the recursive forecaster maintains step by step.
    pub fn build(
        table: &TimeSeriesTable,
        n_lag: usize,
        time_features: bool,
    ) -> Result<(FeatureTable, BuildReport)> {
        let lag_spec = LagSpec::powers_of_two(n_lag)?;
        let max_lag = lag_spec.max_lag();
        let n_rows = table.len();

        if n_rows < max_lag {
            return Err(ForecastError::DataError(format!(
                "Insufficient history: {} rows cannot cover the largest lag {}",
                n_rows, max_lag
            )));
        }

        let effective = Self::effective_time_features(table, time_features);

        let target_names = table.column_names().to_vec();
        let mut feature_names = Vec::with_capacity(
            target_names.len() * lag_spec.len() + if effective { 6 } else { 0 },
        );
        for lag in lag_spec.lags() {
            for col in &target_names {
                feature_names.push(format!("{}_lag{}", col, lag));
            }
        }
        if effective {
            feature_names.extend(TIME_FEATURE_NAMES.iter().map(|s| s.to_string()));
        }

        let mut features = Vec::with_capacity(n_rows - max_lag);
        let mut targets = Vec::with_capacity(n_rows - max_lag);

        for i in max_lag..n_rows {
            let mut row = Vec::with_capacity(feature_names.len());
            for &lag in lag_spec.lags() {
                for c in 0..table.n_columns() {
                    row.push(table.column_at(c)[i - lag]);
                }
            }
            if effective {
                // Index presence is guaranteed by effective_time_features
                if let Some(ts) = table.timestamps() {
                    row.extend(cyclical_time_features(&ts[i]));
                }
            }
            features.push(row);
            targets.push(table.row(i));
        }

        let timestamps = table
            .timestamps()
            .map(|ts| ts[max_lag..].to_vec());

        let report = BuildReport {
            lag_spec,
            time_features_requested: time_features,
            time_features_enabled: effective,
        };

        Ok((
            FeatureTable {
                feature_names,
                features,
                target_names,
                targets,
                timestamps,
            },
            report,
        ))
    }

    /// Decide whether time features can actually be encoded for this table.
    ///
    /// The recursive forecaster recomputes calendar features per step, which
    /// needs both a calendar index and a constant sampling interval; a table
    /// that lacks either gets the feature disabled with a diagnostic.
    fn effective_time_features(table: &TimeSeriesTable, requested: bool) -> bool {
        if !requested {
            return false;
        }
        if !table.has_calendar_index() {
            warn!("time features requested but the index is not calendar-typed, disabling");
            return false;
        }
        if table.infer_frequency().is_none() {
            warn!("time features requested but the sampling interval is not constant, disabling");
            return false;
        }
        true
    }
}

/// Cyclical encoding of a timestamp's hour-of-day and day-of-week.
///
/// Returns `[hour, day_of_week, hour_sin, hour_cos, dow_sin, dow_cos]` with
/// hour in `[0, 23]`, day-of-week in `[0, 6]` (Monday = 0) and the sine and
/// cosine pairs continuous across the wraparound boundary.
pub fn cyclical_time_features(ts: &DateTime<Utc>) -> [f64; 6] {
    let hour = ts.hour() as f64;
    let dow = ts.weekday().num_days_from_monday() as f64;
    [
        hour,
        dow,
        (TAU * hour / 24.0).sin(),
        (TAU * hour / 24.0).cos(),
        (TAU * dow / 7.0).sin(),
        (TAU * dow / 7.0).cos(),
    ]
}
