//! End-to-end forecasting run on synthetic hourly weather observations.
//!
//! Generates ten days of hourly temperature and PM2.5 readings with a daily
//! cycle plus noise, fits the session, prints the held-out RMSE and a
//! 24-hour forecast as JSON.

use chrono::{Duration, TimeZone, Utc};
use forecast_air::data::TimeSeriesTable;
use forecast_air::GradientBoostForecaster;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::TAU;

fn main() -> forecast_air::error::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let n = 240; // ten days of hourly observations
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let timestamps: Vec<_> = (0..n).map(|i| start + Duration::hours(i as i64)).collect();

    let mut rng = StdRng::seed_from_u64(7);
    let noise = Normal::new(0.0, 0.8).expect("valid distribution");

    let temperature: Vec<f64> = (0..n)
        .map(|i| 15.0 + 6.0 * (i as f64 * TAU / 24.0).sin() + noise.sample(&mut rng))
        .collect();
    let pm2_5: Vec<f64> = (0..n)
        .map(|i| 40.0 + 12.0 * (i as f64 * TAU / 24.0).cos() + noise.sample(&mut rng))
        .collect();

    let table = TimeSeriesTable::from_columns(
        timestamps,
        vec![
            ("temperature".to_string(), temperature),
            ("pm2_5".to_string(), pm2_5),
        ],
    )?;

    let mut session = GradientBoostForecaster::new(24)?.with_time_features(true);
    let report = session.process_data(&table, 0.8)?;
    println!(
        "lags {:?}, {} train rows, {} test rows, time features: {}",
        report.lag_spec.lags(),
        report.n_train,
        report.n_test,
        report.time_features_enabled
    );

    session.fit()?;
    println!("{}", session.evaluate()?);

    let forecast = session.forecast(24)?;
    println!("next 24 hours:\n{}", forecast.to_json()?);

    Ok(())
}
