//! Time series table handling for forecasting

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Ordered multivariate time series with a fixed set of numeric columns.
///
/// The calendar index is optional: tables assembled from sources without a
/// parseable timestamp column stay positional, and downstream stages degrade
/// accordingly (no time features, no forecast timestamps).
#[derive(Debug, Clone)]
pub struct TimeSeriesTable {
    /// Column names, in a fixed order
    columns: Vec<String>,
    /// Column-major values, one vector per column
    values: Vec<Vec<f64>>,
    /// Calendar index, when the source carried one
    timestamps: Option<Vec<DateTime<Utc>>>,
}

impl TimeSeriesTable {
    /// Create a calendar-indexed table from named columns.
    pub fn from_columns(
        timestamps: Vec<DateTime<Utc>>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self> {
        let table = Self::build(columns, Some(timestamps))?;
        Ok(table)
    }

    /// Create a table without a calendar index (positional ordering only).
    pub fn unindexed(columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        Self::build(columns, None)
    }

    fn build(
        columns: Vec<(String, Vec<f64>)>,
        timestamps: Option<Vec<DateTime<Utc>>>,
    ) -> Result<Self> {
        if columns.is_empty() {
            return Err(ForecastError::DataError(
                "Table must have at least one column".to_string(),
            ));
        }

        let len = columns[0].1.len();
        for (name, values) in &columns {
            if values.len() != len {
                return Err(ForecastError::DataError(format!(
                    "Column '{}' has {} rows, expected {}",
                    name,
                    values.len(),
                    len
                )));
            }
        }

        let names: Vec<String> = columns.iter().map(|(n, _)| n.clone()).collect();
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(ForecastError::DataError(format!(
                    "Duplicate column name '{}'",
                    name
                )));
            }
        }

        if let Some(ts) = &timestamps {
            if ts.len() != len {
                return Err(ForecastError::DataError(format!(
                    "Timestamp index has {} entries, expected {}",
                    ts.len(),
                    len
                )));
            }
            for pair in ts.windows(2) {
                if pair[1] <= pair[0] {
                    return Err(ForecastError::DataError(format!(
                        "Timestamps must be unique and strictly increasing (found {} after {})",
                        pair[1], pair[0]
                    )));
                }
            }
        }

        Ok(Self {
            columns: names,
            values: columns.into_iter().map(|(_, v)| v).collect(),
            timestamps,
        })
    }

    /// Number of rows in the table
    pub fn len(&self) -> usize {
        self.values[0].len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of columns in the table
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column names in their fixed order
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Values of a named column
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ForecastError::DataError(format!("Column '{}' not found", name)))?;
        Ok(&self.values[idx])
    }

    /// Values of the column at a positional index
    pub fn column_at(&self, idx: usize) -> &[f64] {
        &self.values[idx]
    }

    /// One row of values, in column order
    pub fn row(&self, idx: usize) -> Vec<f64> {
        self.values.iter().map(|col| col[idx]).collect()
    }

    /// The calendar index, when present
    pub fn timestamps(&self) -> Option<&[DateTime<Utc>]> {
        self.timestamps.as_deref()
    }

    /// Whether the table carries a calendar index
    pub fn has_calendar_index(&self) -> bool {
        self.timestamps.is_some()
    }

    /// Last observed timestamp, when the table is calendar-indexed
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.as_ref().and_then(|ts| ts.last().copied())
    }

    /// Infer the constant sampling interval of the calendar index.
    ///
    /// Returns `None` when the table has no index, has fewer than two rows,
    /// or the gaps between consecutive timestamps are not all identical.
    pub fn infer_frequency(&self) -> Option<Duration> {
        let ts = self.timestamps.as_ref()?;
        if ts.len() < 2 {
            return None;
        }
        let step = ts[1] - ts[0];
        for pair in ts.windows(2) {
            if pair[1] - pair[0] != step {
                return None;
            }
        }
        Some(step)
    }
}

/// Loader that assembles a [`TimeSeriesTable`] from external sources
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a time series table from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<TimeSeriesTable> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(df)
    }

    /// Build a time series table from an existing DataFrame.
    ///
    /// The time column is detected by name ("time", "date", "timestamp") or
    /// temporal dtype; every remaining numeric column becomes a target. An
    /// integer or missing time column leaves the table positional.
    pub fn from_dataframe(df: DataFrame) -> Result<TimeSeriesTable> {
        let time_column = Self::detect_time_column(&df);

        let timestamps = match &time_column {
            Some(name) => Self::parse_time_column(&df, name)?,
            None => None,
        };
        if time_column.is_some() && timestamps.is_none() {
            debug!(
                column = time_column.as_deref().unwrap_or(""),
                "time column is not calendar-typed, leaving table unindexed"
            );
        }

        let mut columns = Vec::new();
        for series in df.get_columns() {
            if Some(series.name()) == time_column.as_deref() {
                continue;
            }
            if let Some(values) = Self::series_as_f64(series)? {
                columns.push((series.name().to_string(), values));
            }
        }

        if columns.is_empty() {
            return Err(ForecastError::DataError(
                "No numeric target columns found in data".to_string(),
            ));
        }

        match timestamps {
            Some(ts) => TimeSeriesTable::from_columns(ts, columns),
            None => TimeSeriesTable::unindexed(columns),
        }
    }

    /// Detect the time column in a DataFrame
    fn detect_time_column(df: &DataFrame) -> Option<String> {
        let column_names = df.get_column_names();

        for name in &column_names {
            let lower_name = name.to_lowercase();
            if lower_name.contains("time")
                || lower_name.contains("date")
                || lower_name.contains("timestamp")
            {
                return Some(name.to_string());
            }
        }

        if let Some(first_col) = df.get_columns().first() {
            if first_col.dtype().is_temporal() {
                return Some(first_col.name().to_string());
            }
        }

        None
    }

    /// Read a time column as UTC timestamps; `None` when it is not
    /// calendar-typed (for example a plain integer index).
    fn parse_time_column(df: &DataFrame, name: &str) -> Result<Option<Vec<DateTime<Utc>>>> {
        let col = df.column(name)?;

        let parsed = match col.dtype() {
            DataType::Datetime(unit, _) => {
                let divisor = match unit {
                    TimeUnit::Nanoseconds => 1_000_000_000,
                    TimeUnit::Microseconds => 1_000_000,
                    TimeUnit::Milliseconds => 1_000,
                };
                let nanos_per = 1_000_000_000 / divisor;
                col.datetime()?
                    .into_iter()
                    .map(|opt| {
                        opt.map(|raw| {
                            let secs = raw.div_euclid(divisor);
                            let nsec = (raw.rem_euclid(divisor) * nanos_per) as u32;
                            Utc.timestamp_opt(secs, nsec).single()
                        })
                        .flatten()
                    })
                    .collect::<Option<Vec<_>>>()
            }
            DataType::Date => col
                .date()?
                .into_iter()
                .map(|opt| {
                    opt.and_then(|days| {
                        NaiveDate::from_ymd_opt(1970, 1, 1)
                            .and_then(|epoch| epoch.checked_add_days(chrono::Days::new(days as u64)))
                            .map(|date| {
                                Utc.from_utc_datetime(&NaiveDateTime::new(
                                    date,
                                    chrono::NaiveTime::default(),
                                ))
                            })
                    })
                })
                .collect::<Option<Vec<_>>>(),
            DataType::Utf8 => col
                .utf8()?
                .into_iter()
                .map(|opt| opt.and_then(parse_timestamp))
                .collect::<Option<Vec<_>>>(),
            _ => None,
        };

        match parsed {
            Some(ts) if !ts.is_empty() => Ok(Some(ts)),
            _ => Ok(None),
        }
    }

    /// Read a numeric series as f64 values; `Ok(None)` for non-numeric
    /// dtypes, an error when the series contains null cells. Dropping nulls
    /// here would shift the rows below them and silently pair values from
    /// different source records, so malformed input fails instead.
    fn series_as_f64(series: &Series) -> Result<Option<Vec<f64>>> {
        let values: Option<Vec<f64>> = match series.dtype() {
            DataType::Float64 => series.f64()?.into_iter().collect(),
            DataType::Float32 => series
                .f32()?
                .into_iter()
                .map(|opt| opt.map(|v| v as f64))
                .collect(),
            DataType::Int64 => series
                .i64()?
                .into_iter()
                .map(|opt| opt.map(|v| v as f64))
                .collect(),
            DataType::Int32 => series
                .i32()?
                .into_iter()
                .map(|opt| opt.map(|v| v as f64))
                .collect(),
            DataType::UInt64 => series
                .u64()?
                .into_iter()
                .map(|opt| opt.map(|v| v as f64))
                .collect(),
            DataType::UInt32 => series
                .u32()?
                .into_iter()
                .map(|opt| opt.map(|v| v as f64))
                .collect(),
            _ => return Ok(None),
        };

        match values {
            Some(v) => Ok(Some(v)),
            None => Err(ForecastError::DataError(format!(
                "Column '{}' contains missing values",
                series.name()
            ))),
        }
    }
}

/// Parse a timestamp string in the formats hourly weather and air-quality
/// APIs emit (ISO-8601, with or without seconds or a time component).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let naive = NaiveDateTime::new(date, chrono::NaiveTime::default());
        return Some(Utc.from_utc_datetime(&naive));
    }
    None
}
