//! Recursive multi-step forecasting session

use crate::data::TimeSeriesTable;
use crate::error::{ForecastError, Result};
use crate::features::{cyclical_time_features, BuildReport, FeatureBuilder, LagSpec};
use crate::metrics::{EvaluationReport, Evaluator};
use crate::models::{BoostingParams, GradientBoostingRegressor, MultiOutputRegressor, Regressor};
use crate::split::{DatasetSplitter, Split};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Ordered sequence of predicted rows, one per forecast step.
///
/// Timestamps continue the source frequency from the last observed row; when
/// the frequency could not be inferred the table is positional only.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastTable {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
    timestamps: Option<Vec<DateTime<Utc>>>,
}

impl ForecastTable {
    /// Number of forecast steps
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Target column names, in output order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Predicted rows, in step order
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Predicted value at a step for a named column
    pub fn value(&self, step: usize, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(step).map(|row| row[idx])
    }

    /// Forecast timestamps, when the source frequency was inferable
    pub fn timestamps(&self) -> Option<&[DateTime<Utc>]> {
        self.timestamps.as_deref()
    }

    /// Serialize to row-oriented JSON records keyed by ISO timestamp, or by
    /// 0-based step when the table is unindexed.
    pub fn to_json(&self) -> Result<String> {
        let mut root = Map::new();
        for (i, row) in self.rows.iter().enumerate() {
            let key = match &self.timestamps {
                Some(ts) => ts[i].to_rfc3339(),
                None => i.to_string(),
            };
            let mut record = Map::new();
            for (name, value) in self.columns.iter().zip(row.iter()) {
                record.insert(name.clone(), json!(value));
            }
            root.insert(key, Value::Object(record));
        }
        Ok(serde_json::to_string(&Value::Object(root))?)
    }
}

/// Iteratively extends a series beyond the observed window by feeding each
/// prediction back as synthetic history.
///
/// The lag window is a ring buffer of per-target blocks, one block per lag
/// slot (front = lag 1). Each step drops the oldest block and pushes the
/// fresh prediction in front, so forecast error compounds with the horizon;
/// that degradation is intrinsic to recursive forecasting, not something the
/// forecaster tries to correct.
#[derive(Debug)]
pub struct RecursiveForecaster<'a, R: Regressor = GradientBoostingRegressor> {
    model: &'a MultiOutputRegressor<R>,
    window: VecDeque<Vec<f64>>,
    time_features: bool,
    next_timestamp: Option<DateTime<Utc>>,
    frequency: Option<Duration>,
}

impl<'a, R: Regressor + Send> RecursiveForecaster<'a, R> {
    /// Seed a forecaster from the most recent target history.
    ///
    /// `history` must hold at least `max(LagSpec)` rows; the initial window
    /// gathers, for each lag, the row exactly that many steps before the
    /// forecast origin. When `time_features` is set, `origin` must carry
    /// both the last observed timestamp and the sampling interval.
    pub fn from_history(
        model: &'a MultiOutputRegressor<R>,
        lag_spec: &LagSpec,
        history: &[Vec<f64>],
        origin: Option<(DateTime<Utc>, Duration)>,
        time_features: bool,
    ) -> Result<Self> {
        let max_lag = lag_spec.max_lag();
        if history.len() < max_lag {
            return Err(ForecastError::ForecastingError(format!(
                "Seed history has {} rows, the largest lag needs {}",
                history.len(),
                max_lag
            )));
        }
        if time_features && origin.is_none() {
            return Err(ForecastError::ForecastingError(
                "Time features need a forecast origin timestamp and interval".to_string(),
            ));
        }

        let mut window = VecDeque::with_capacity(lag_spec.len());
        for &lag in lag_spec.lags() {
            window.push_back(history[history.len() - lag].clone());
        }

        Ok(Self {
            model,
            window,
            time_features,
            next_timestamp: origin.map(|(last, freq)| last + freq),
            frequency: origin.map(|(_, freq)| freq),
        })
    }

    /// Produce exactly `steps` predicted rows.
    pub fn run(mut self, steps: usize) -> Result<ForecastTable> {
        let n_targets = self.model.n_targets();
        let mut rows = Vec::with_capacity(steps);
        let mut timestamps = self.next_timestamp.map(|_| Vec::with_capacity(steps));

        for _ in 0..steps {
            let mut features: Vec<f64> =
                Vec::with_capacity(self.window.len() * n_targets + 6);
            for block in &self.window {
                features.extend_from_slice(block);
            }
            if self.time_features {
                // Checked at construction: time features imply an origin
                if let Some(ts) = self.next_timestamp {
                    features.extend(cyclical_time_features(&ts));
                }
            }

            let predicted = self.model.predict_row(&features)?;

            if let (Some(out), Some(ts)) = (timestamps.as_mut(), self.next_timestamp) {
                out.push(ts);
                self.next_timestamp = self.frequency.map(|freq| ts + freq);
            }

            self.window.pop_back();
            self.window.push_front(predicted.clone());
            rows.push(predicted);
        }

        Ok(ForecastTable {
            columns: self.model.columns().to_vec(),
            rows,
            timestamps,
        })
    }
}

/// Outcome of `process_data`, exposing the effective configuration.
#[derive(Debug, Clone)]
pub struct ProcessReport {
    /// The generated lag distances
    pub lag_spec: LagSpec,
    /// Feature table rows after the lag drop
    pub n_rows: usize,
    /// Training rows
    pub n_train: usize,
    /// Test rows
    pub n_test: usize,
    /// Whether time features were requested for this session
    pub time_features_requested: bool,
    /// Whether time features were actually encoded
    pub time_features_enabled: bool,
    /// The inferred sampling interval, when constant
    pub frequency: Option<Duration>,
}

impl ProcessReport {
    /// True when time features were requested but could not be encoded
    pub fn downgraded(&self) -> bool {
        self.time_features_requested && !self.time_features_enabled
    }
}

/// State produced by `process_data`, immutable for the rest of the session
#[derive(Debug)]
struct SessionData {
    split: Split,
    build: BuildReport,
    target_names: Vec<String>,
    last_timestamp: Option<DateTime<Utc>>,
    frequency: Option<Duration>,
}

/// Multi-output gradient-boosted forecasting session.
///
/// One session processes one dataset sequentially through
/// `process_data` -> `fit` -> `evaluate` / `forecast`. Calling a stage
/// before its predecessor fails with a "not ready" error rather than
/// silently doing nothing.
#[derive(Debug)]
pub struct GradientBoostForecaster {
    n_lag: usize,
    time_feature: bool,
    params: BoostingParams,
    session: Option<SessionData>,
    model: Option<MultiOutputRegressor<GradientBoostingRegressor>>,
}

impl GradientBoostForecaster {
    /// Create a session with the given maximum lag (default configuration
    /// elsewhere: no time features, stock boosting parameters).
    pub fn new(n_lag: usize) -> Result<Self> {
        if n_lag < 1 {
            return Err(ForecastError::InvalidParameter(
                "n_lag must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            n_lag,
            time_feature: false,
            params: BoostingParams::default(),
            session: None,
            model: None,
        })
    }

    /// Request cyclical calendar features (may be downgraded at
    /// `process_data` time when the index cannot support them)
    pub fn with_time_features(mut self, enabled: bool) -> Self {
        self.time_feature = enabled;
        self
    }

    /// Override the boosting hyperparameters
    pub fn with_params(mut self, params: BoostingParams) -> Self {
        self.params = params;
        self
    }

    /// Build the feature table and chronological split for this session.
    ///
    /// Rebuilds everything from scratch on every call and invalidates any
    /// previously fitted model, since the feature layout may have changed.
    pub fn process_data(
        &mut self,
        table: &TimeSeriesTable,
        train_perc: f64,
    ) -> Result<ProcessReport> {
        let (features, build) = FeatureBuilder::build(table, self.n_lag, self.time_feature)?;
        let split = DatasetSplitter::split(&features, train_perc)?;

        let frequency = table.infer_frequency();
        if table.has_calendar_index() && frequency.is_none() {
            warn!("sampling interval is not constant, forecasts will be unindexed");
        }

        let report = ProcessReport {
            lag_spec: build.lag_spec.clone(),
            n_rows: features.len(),
            n_train: split.n_train(),
            n_test: split.n_test(),
            time_features_requested: build.time_features_requested,
            time_features_enabled: build.time_features_enabled,
            frequency,
        };

        debug!(
            rows = report.n_rows,
            train = report.n_train,
            test = report.n_test,
            time_features = report.time_features_enabled,
            "processed table into supervised split"
        );

        self.session = Some(SessionData {
            split,
            build,
            target_names: features.target_names().to_vec(),
            last_timestamp: table.last_timestamp(),
            frequency,
        });
        self.model = None;

        Ok(report)
    }

    /// Fit one gradient-boosted regressor per target column on the training
    /// segment. Requires `process_data` to have produced both partitions.
    pub fn fit(&mut self) -> Result<()> {
        let session = self.session.as_ref().ok_or_else(|| {
            ForecastError::NotReady(
                "Call process_data before fit, then evaluate/forecast".to_string(),
            )
        })?;

        let model = MultiOutputRegressor::fit_boosted(
            &session.target_names,
            session.split.x_train(),
            session.split.y_train(),
            &self.params,
        )?;
        self.model = Some(model);
        Ok(())
    }

    /// Per-column RMSE on the held-out segment.
    pub fn evaluate(&self) -> Result<EvaluationReport> {
        let session = self.session.as_ref().ok_or_else(|| {
            ForecastError::NotReady("Call process_data and fit before evaluate".to_string())
        })?;
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| ForecastError::NotReady("Call fit before evaluate".to_string()))?;

        Evaluator::evaluate(model, session.split.x_test(), session.split.y_test())
    }

    /// Forecast `steps` rows beyond the observed window.
    ///
    /// Seed state is the most recent `max(LagSpec)` rows of test-segment
    /// targets; a missing sampling frequency degrades the output to an
    /// unindexed table without aborting the forecast.
    pub fn forecast(&self, steps: usize) -> Result<ForecastTable> {
        if steps < 1 {
            return Err(ForecastError::InvalidParameter(
                "steps must be at least 1".to_string(),
            ));
        }
        let session = self.session.as_ref().ok_or_else(|| {
            ForecastError::NotReady("Call process_data and fit before forecast".to_string())
        })?;
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| ForecastError::NotReady("Call fit before forecast".to_string()))?;

        let y_test = session.split.y_test();
        let max_lag = session.build.lag_spec.max_lag();
        if y_test.nrows() < max_lag {
            return Err(ForecastError::ForecastingError(format!(
                "Test segment has {} rows, the largest lag needs {} as seed history",
                y_test.nrows(),
                max_lag
            )));
        }

        let history: Vec<Vec<f64>> = (y_test.nrows() - max_lag..y_test.nrows())
            .map(|i| y_test.row(i).to_vec())
            .collect();

        let origin = match (session.last_timestamp, session.frequency) {
            (Some(last), Some(freq)) => Some((last, freq)),
            _ => None,
        };

        let forecaster = RecursiveForecaster::from_history(
            model,
            &session.build.lag_spec,
            &history,
            origin,
            session.build.time_features_enabled,
        )?;
        forecaster.run(steps)
    }

    /// The lag distances generated for this session, once processed
    pub fn lag_spec(&self) -> Option<&LagSpec> {
        self.session.as_ref().map(|s| &s.build.lag_spec)
    }

    /// Whether time features are actually encoded, once processed
    pub fn time_features_enabled(&self) -> Option<bool> {
        self.session.as_ref().map(|s| s.build.time_features_enabled)
    }

    /// Whether a model has been fitted
    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }
}
