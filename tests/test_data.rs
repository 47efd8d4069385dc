use chrono::{Duration, TimeZone, Utc};
use forecast_air::data::{parse_timestamp, DataLoader, TimeSeriesTable};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn loads_an_hourly_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "time,temperature,pm2_5").unwrap();
    writeln!(file, "2024-03-01T00:00,14.2,41.0").unwrap();
    writeln!(file, "2024-03-01T01:00,13.9,43.5").unwrap();
    writeln!(file, "2024-03-01T02:00,13.5,44.1").unwrap();
    writeln!(file, "2024-03-01T03:00,13.2,42.8").unwrap();

    let table = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(table.len(), 4);
    assert_eq!(table.column_names(), &["temperature", "pm2_5"]);
    assert!(table.has_calendar_index());
    assert_eq!(table.infer_frequency(), Some(Duration::hours(1)));
    assert_eq!(table.column("pm2_5").unwrap()[1], 43.5);
}

#[test]
fn integer_time_column_leaves_the_table_positional() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "time,co2").unwrap();
    writeln!(file, "0,410.0").unwrap();
    writeln!(file, "1,412.5").unwrap();
    writeln!(file, "2,415.0").unwrap();

    let table = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(table.len(), 3);
    assert!(!table.has_calendar_index());
    assert!(table.infer_frequency().is_none());
}

#[test]
fn missing_cells_fail_instead_of_shifting_rows() {
    // Nulls in different rows of different columns: dropping them would
    // produce a shorter table pairing values from different records
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "time,a,b").unwrap();
    writeln!(file, "0,1.0,10.0").unwrap();
    writeln!(file, "1,,20.0").unwrap();
    writeln!(file, "2,3.0,").unwrap();
    writeln!(file, "3,4.0,40.0").unwrap();

    let result = DataLoader::from_csv(file.path());
    assert!(result.is_err());
    let message = result.unwrap_err().to_string();
    assert!(message.contains("missing values"), "got: {}", message);
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(DataLoader::from_csv("nonexistent_file.csv").is_err());
}

#[test]
fn rejects_non_monotonic_timestamps() {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let timestamps = vec![start, start + Duration::hours(2), start + Duration::hours(1)];
    let result = TimeSeriesTable::from_columns(
        timestamps,
        vec![("x".to_string(), vec![1.0, 2.0, 3.0])],
    );
    assert!(result.is_err());
}

#[test]
fn rejects_duplicate_timestamps() {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let timestamps = vec![start, start, start + Duration::hours(1)];
    let result = TimeSeriesTable::from_columns(
        timestamps,
        vec![("x".to_string(), vec![1.0, 2.0, 3.0])],
    );
    assert!(result.is_err());
}

#[test]
fn rejects_ragged_columns() {
    let result = TimeSeriesTable::unindexed(vec![
        ("a".to_string(), vec![1.0, 2.0, 3.0]),
        ("b".to_string(), vec![1.0]),
    ]);
    assert!(result.is_err());
}

#[test]
fn rejects_duplicate_column_names() {
    let result = TimeSeriesTable::unindexed(vec![
        ("a".to_string(), vec![1.0]),
        ("a".to_string(), vec![2.0]),
    ]);
    assert!(result.is_err());
}

#[test]
fn frequency_is_none_for_irregular_gaps() {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let timestamps = vec![
        start,
        start + Duration::hours(1),
        start + Duration::hours(3),
    ];
    let table = TimeSeriesTable::from_columns(
        timestamps,
        vec![("x".to_string(), vec![1.0, 2.0, 3.0])],
    )
    .unwrap();
    assert!(table.infer_frequency().is_none());
}

#[test]
fn row_access_follows_column_order() {
    let table = TimeSeriesTable::unindexed(vec![
        ("a".to_string(), vec![1.0, 2.0]),
        ("b".to_string(), vec![10.0, 20.0]),
    ])
    .unwrap();
    assert_eq!(table.row(1), vec![2.0, 20.0]);
    assert_eq!(table.column_at(1), &[10.0, 20.0]);
}

#[test]
fn parses_common_timestamp_formats() {
    let expected = Utc.with_ymd_and_hms(2024, 3, 1, 6, 30, 0).unwrap();
    assert_eq!(parse_timestamp("2024-03-01T06:30"), Some(expected));
    assert_eq!(parse_timestamp("2024-03-01T06:30:00"), Some(expected));
    assert_eq!(parse_timestamp("2024-03-01 06:30:00"), Some(expected));
    assert_eq!(parse_timestamp("2024-03-01T06:30:00Z"), Some(expected));

    let midnight = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    assert_eq!(parse_timestamp("2024-03-01"), Some(midnight));

    assert_eq!(parse_timestamp("not a time"), None);
}
