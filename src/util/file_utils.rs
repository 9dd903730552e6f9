// External crates
use chrono::NaiveDateTime;
use log::{debug, info};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

// Local modules
use crate::constants::TIMESTAMP_FORMATS;
use crate::error::{ForecastError, Result};

/// One source file's hourly measurements, in file order
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    /// File name the series was read from, used as its key downstream
    pub name: String,
    pub points: Vec<(NaiveDateTime, f64)>,
}

impl RawSeries {
    pub fn new(name: impl Into<String>, points: Vec<(NaiveDateTime, f64)>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Lists the `*.csv` files of a data directory, sorted by name
///
/// # Arguments
///
/// * `dir` - Directory holding one CSV file per region
/// * `excluded` - File names to leave out (e.g. aggregate files)
///
/// # Returns
///
/// The paths of the files to load, or an error if the directory is missing
/// or holds no usable file
pub fn list_source_files(dir: &Path, excluded: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ForecastError::MissingDirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();

        if !is_csv {
            debug!("Skipping non-CSV file {}", path.display());
            continue;
        }
        if excluded.iter().any(|name| name == file_name) {
            info!("Skipping excluded file {}", file_name);
            continue;
        }
        files.push(path);
    }

    if files.is_empty() {
        return Err(ForecastError::NoInputFiles(dir.to_path_buf()));
    }

    files.sort();
    Ok(files)
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::Int16
            | DataType::UInt64
            | DataType::UInt32
            | DataType::UInt16
    )
}

/// Parses a timestamp using the first accepted layout that matches
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Reads an hourly CSV file into a [`RawSeries`]
///
/// The first column is taken as the timestamp and the first numeric column
/// after it as the measurement. Rows where either is null are dropped.
pub fn read_hourly_csv(path: &Path) -> Result<RawSeries> {
    info!("Loading data from: {}", path.display());

    let file = File::open(path)?;
    let df = CsvReader::new(file).finish()?;

    if df.height() == 0 || df.width() < 2 {
        return Err(ForecastError::EmptyFile(path.to_path_buf()));
    }

    let columns = df.get_columns();
    let timestamp_col = &columns[0];
    let value_col = columns
        .iter()
        .skip(1)
        .find(|column| is_numeric(column.dtype()))
        .ok_or_else(|| ForecastError::MissingMeasurement(path.to_path_buf()))?;

    debug!(
        "{}: timestamp column '{}', measurement column '{}'",
        path.display(),
        timestamp_col.name(),
        value_col.name()
    );

    let values = value_col.cast(&DataType::Float64)?;
    let values = values.f64()?;
    let stamps = timestamp_col.str()?;

    let mut points = Vec::with_capacity(df.height());
    for (stamp, value) in stamps.into_iter().zip(values.into_iter()) {
        let (Some(stamp), Some(value)) = (stamp, value) else {
            continue;
        };
        let timestamp = parse_timestamp(stamp).ok_or_else(|| ForecastError::InvalidTimestamp {
            path: path.to_path_buf(),
            value: stamp.to_string(),
        })?;
        points.push((timestamp, value));
    }

    if points.is_empty() {
        return Err(ForecastError::EmptyFile(path.to_path_buf()));
    }

    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();

    Ok(RawSeries::new(name, points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_timestamp_layouts() {
        let expected = NaiveDate::from_ymd_opt(2004, 12, 31)
            .unwrap()
            .and_hms_opt(1, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2004-12-31 01:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2004-12-31T01:00:00"), Some(expected));
        assert_eq!(parse_timestamp(" 2004-12-31 01:00 "), Some(expected));
        assert_eq!(parse_timestamp("31/12/2004 01:00"), None);
    }

    #[test]
    fn test_read_hourly_csv_skips_missing_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("COMED_hourly.csv");
        std::fs::write(
            &path,
            "Datetime,COMED_MW\n2011-12-31 01:00:00,9970.0\n2011-12-31 02:00:00,\n2011-12-31 03:00:00,9218.0\n",
        )
        .unwrap();

        let series = read_hourly_csv(&path).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.points[1].1, 9218.0);
    }

    #[test]
    fn test_read_hourly_csv_requires_measurement() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        std::fs::write(&path, "Datetime,Region\n2011-12-31 01:00:00,north\n").unwrap();

        assert!(matches!(
            read_hourly_csv(&path),
            Err(ForecastError::MissingMeasurement(_))
        ));
    }
}
