//! # Forecast Air
//!
//! A Rust library for short-horizon forecasting of multivariate weather and
//! air-quality time series.
//!
//! ## Features
//!
//! - Time series table handling with optional calendar indexing
//! - Lag expansion with a compact powers-of-two lag set
//! - Optional cyclical calendar features (hour-of-day, day-of-week)
//! - Chronological train/test splitting (never shuffled)
//! - Multi-output gradient-boosted tree regression, one model per target
//! - Per-column RMSE evaluation on the held-out segment
//! - Recursive multi-step forecasting that feeds predictions back as history
//!
//! ## Quick Start
//!
//! ```no_run
//! use forecast_air::GradientBoostForecaster;
//! use forecast_air::data::DataLoader;
//!
//! fn main() -> forecast_air::error::Result<()> {
//!     // Load hourly observations (time column plus numeric targets)
//!     let table = DataLoader::from_csv("hourly.csv")?;
//!
//!     // One session: process -> fit -> evaluate / forecast
//!     let mut session = GradientBoostForecaster::new(24)?.with_time_features(true);
//!     let report = session.process_data(&table, 0.8)?;
//!     println!("lags: {:?}", report.lag_spec.lags());
//!
//!     session.fit()?;
//!     println!("{}", session.evaluate()?);
//!
//!     let forecast = session.forecast(24)?;
//!     println!("{}", forecast.to_json()?);
//!     Ok(())
//! }
//! ```

pub mod data;
pub mod error;
pub mod features;
pub mod forecaster;
pub mod metrics;
pub mod models;
pub mod split;

// Re-export commonly used types
pub use crate::data::{DataLoader, TimeSeriesTable};
pub use crate::error::ForecastError;
pub use crate::features::{FeatureBuilder, FeatureTable, LagSpec};
pub use crate::forecaster::{ForecastTable, GradientBoostForecaster, RecursiveForecaster};
pub use crate::metrics::{EvaluationReport, Evaluator};
pub use crate::models::{BoostingParams, MultiOutputRegressor};
pub use crate::split::{DatasetSplitter, Split};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
