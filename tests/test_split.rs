use chrono::{Duration, TimeZone, Utc};
use forecast_air::data::TimeSeriesTable;
use forecast_air::features::FeatureBuilder;
use forecast_air::split::DatasetSplitter;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn hourly_table(n: usize) -> TimeSeriesTable {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let timestamps = (0..n)
        .map(|i| start + Duration::hours(i as i64))
        .collect();
    let temperature: Vec<f64> = (0..n).map(|i| 15.0 + (i % 24) as f64).collect();
    let humidity: Vec<f64> = (0..n).map(|i| 60.0 - (i % 12) as f64).collect();

    TimeSeriesTable::from_columns(
        timestamps,
        vec![
            ("temperature".to_string(), temperature),
            ("humidity".to_string(), humidity),
        ],
    )
    .unwrap()
}

#[test]
fn split_sizes_follow_the_fraction() {
    let table = hourly_table(200);
    let (features, _) = FeatureBuilder::build(&table, 24, false).unwrap();
    assert_eq!(features.len(), 184);

    let split = DatasetSplitter::split(&features, 0.8).unwrap();
    assert_eq!(split.n_train(), 147);
    assert_eq!(split.n_test(), 37);
    assert_eq!(split.n_train() + split.n_test(), features.len());
}

#[test]
fn split_preserves_chronological_order() {
    let table = hourly_table(120);
    let (features, _) = FeatureBuilder::build(&table, 8, false).unwrap();
    let split = DatasetSplitter::split(&features, 0.75).unwrap();

    let train_ts = split.train_timestamps().unwrap();
    let test_ts = split.test_timestamps().unwrap();

    assert!(train_ts.windows(2).all(|w| w[0] < w[1]));
    assert!(test_ts.windows(2).all(|w| w[0] < w[1]));
    assert!(train_ts.last().unwrap() < test_ts.first().unwrap());
}

#[test]
fn split_matrices_align_with_feature_table() {
    let table = hourly_table(60);
    let (features, _) = FeatureBuilder::build(&table, 4, false).unwrap();
    let split = DatasetSplitter::split(&features, 0.5).unwrap();

    assert_eq!(split.x_train().ncols(), features.n_features());
    assert_eq!(split.y_train().ncols(), 2);

    // First training row matches the first feature row
    let first: Vec<f64> = split.x_train().row(0).to_vec();
    assert_eq!(&first, &features.features()[0]);
}

#[rstest]
#[case(0.0)]
#[case(1.0)]
#[case(-0.2)]
#[case(1.5)]
fn split_rejects_out_of_range_fraction(#[case] train_perc: f64) {
    let table = hourly_table(60);
    let (features, _) = FeatureBuilder::build(&table, 4, false).unwrap();
    assert!(DatasetSplitter::split(&features, train_perc).is_err());
}

#[test]
fn split_rejects_empty_feature_table() {
    let table = hourly_table(16);
    let (features, _) = FeatureBuilder::build(&table, 16, false).unwrap();
    assert!(features.is_empty());
    assert!(DatasetSplitter::split(&features, 0.8).is_err());
}

#[test]
fn split_rejects_degenerate_partitions() {
    let table = hourly_table(20);
    let (features, _) = FeatureBuilder::build(&table, 4, false).unwrap();
    // 16 rows at 1% would floor to an empty training partition
    assert!(DatasetSplitter::split(&features, 0.01).is_err());
}
