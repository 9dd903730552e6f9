// External imports
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};

// Internal imports
use crate::util::file_utils::RawSeries;

pub type TestBackend = burn_ndarray::NdArray<f32>;
pub type TestAutodiffBackend = burn_autodiff::Autodiff<TestBackend>;

pub fn test_device() -> burn_ndarray::NdArrayDevice {
    burn_ndarray::NdArrayDevice::Cpu
}

pub fn start_time() -> NaiveDateTime {
    // A Monday
    NaiveDate::from_ymd_opt(2018, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// One reading per hour from `start_time`, in the order given
pub fn hourly_series(name: &str, values: &[f64]) -> RawSeries {
    let start = start_time();
    let points = values
        .iter()
        .enumerate()
        .map(|(i, &value)| (start + Duration::hours(i as i64), value))
        .collect();
    RawSeries::new(name, points)
}

/// A daily-cycle load curve, always positive
pub fn daily_cycle(num_rows: usize, base: f64) -> Vec<f64> {
    (0..num_rows)
        .map(|i| {
            let phase = (i % 24) as f64 / 24.0 * std::f64::consts::TAU;
            base + 0.2 * base * phase.sin()
        })
        .collect()
}

/// Writes `series` as a `Datetime,<column>` CSV file in `dir`
pub fn write_csv(dir: &Path, file_name: &str, column: &str, series: &RawSeries) -> PathBuf {
    let mut text = format!("Datetime,{}\n", column);
    for (timestamp, value) in &series.points {
        text.push_str(&format!("{},{}\n", timestamp.format("%Y-%m-%d %H:%M:%S"), value));
    }
    let path = dir.join(file_name);
    std::fs::write(&path, text).unwrap();
    path
}
