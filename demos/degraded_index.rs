//! Shows the degraded paths: a positional table disables requested time
//! features and leaves the forecast unindexed, without aborting anything.

use forecast_air::data::TimeSeriesTable;
use forecast_air::GradientBoostForecaster;

fn main() -> forecast_air::error::Result<()> {
    tracing_subscriber::fmt().init();

    // Readings keyed by sample number only, no calendar index
    let co2: Vec<f64> = (0..150)
        .map(|i| 410.0 + 8.0 * (i as f64 * 0.26).sin())
        .collect();
    let table = TimeSeriesTable::unindexed(vec![("co2".to_string(), co2)])?;

    let mut session = GradientBoostForecaster::new(8)?.with_time_features(true);
    let report = session.process_data(&table, 0.8)?;
    println!(
        "time features requested: {}, effective: {}",
        report.time_features_requested, report.time_features_enabled
    );

    session.fit()?;
    let forecast = session.forecast(6)?;
    println!("forecast has timestamps: {}", forecast.timestamps().is_some());
    println!("{}", forecast.to_json()?);

    Ok(())
}
