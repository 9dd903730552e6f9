// External imports
use chrono::Duration;

// Internal imports
use super::test_helpers::{daily_cycle, hourly_series, start_time, write_csv};
use crate::config::ExperimentConfig;
use crate::constants::FEATURE_COLUMNS;
use crate::error::ForecastError;
use crate::hourly::step_1_tensor_preparation::{build_file_pool, prepare_datasets, PreparedData};
use crate::util::file_utils::{list_source_files, read_hourly_csv, RawSeries};

fn fifteen_rows() -> RawSeries {
    let values: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
    hourly_series("AEP_hourly.csv", &values)
}

#[test]
fn test_fifteen_rows_give_five_windows() {
    let pool = build_file_pool(&fifteen_rows(), 10, 0.0).unwrap().unwrap();
    assert_eq!(pool.train.len(), 5);
    assert!(pool.test.is_empty());
    assert_eq!(pool.train.lookback(), 10);
    assert_eq!(pool.train.width(), FEATURE_COLUMNS.len());

    // Values 100..=114 scale onto i / 14
    let labels = pool.train.labels();
    assert!((labels[0] - 10.0 / 14.0).abs() < 1e-6);
    assert!((labels[4] - 1.0).abs() < 1e-6);

    // Window 0 covers rows 0..=9: row 0 is all zeros, row 1 is one hour later
    let first = pool.train.window(0);
    assert_eq!(first.len(), 10 * FEATURE_COLUMNS.len());
    assert!(first[..5].iter().all(|&v| v.abs() < 1e-6));
    assert!((first[5] - 1.0 / 14.0).abs() < 1e-6);
    assert!((first[6] - 1.0 / 14.0).abs() < 1e-6);
    // Day of week, month and day of year are constant here and scale to 0
    assert!(first[7..10].iter().all(|&v| v.abs() < 1e-6));

    // The last window covers rows 4..=13 and is labelled with row 14
    let last = pool.train.window(4);
    assert!((last[0] - 4.0 / 14.0).abs() < 1e-6);
    assert!((last[45] - 13.0 / 14.0).abs() < 1e-6);
}

#[test]
fn test_held_out_windows_are_the_chronological_tail() {
    let pool = build_file_pool(&fifteen_rows(), 10, 0.2).unwrap().unwrap();
    assert_eq!(pool.train.len(), 4);
    assert_eq!(pool.test.len(), 1);
    assert!((pool.test.labels()[0] - 1.0).abs() < 1e-6);
    assert!((pool.test.window(0)[0] - 4.0 / 14.0).abs() < 1e-6);
}

#[test]
fn test_window_counts_match_row_counts() {
    for rows in [5usize, 10, 11, 30, 127] {
        let series = hourly_series("x.csv", &daily_cycle(rows, 1000.0));
        let pool = build_file_pool(&series, 10, 0.1).unwrap();
        match pool {
            None => assert!(rows <= 10),
            Some(pool) => {
                let total = rows - 10;
                assert_eq!(pool.train.len() + pool.test.len(), total);
                assert_eq!(pool.test.len(), (total as f64 * 0.1).floor() as usize);
            }
        }
    }
}

#[test]
fn test_unsorted_rows_are_windowed_in_time_order() {
    let mut series = fifteen_rows();
    series.points.reverse();
    let pool = build_file_pool(&series, 10, 0.0).unwrap().unwrap();
    assert!((pool.train.labels()[0] - 10.0 / 14.0).abs() < 1e-6);
}

#[test]
fn test_label_scaler_inverts_to_physical_units() {
    let pool = build_file_pool(&fifteen_rows(), 10, 0.2).unwrap().unwrap();
    let restored = pool.scalers.label.inverse_transform(&[pool.test.labels()[0] as f64]);
    assert!((restored[0] - 114.0).abs() < 1e-3);
}

#[test]
fn test_pools_merge_in_file_order() {
    let a = build_file_pool(&hourly_series("a.csv", &daily_cycle(40, 500.0)), 10, 0.1)
        .unwrap()
        .unwrap();
    let b = build_file_pool(&hourly_series("b.csv", &daily_cycle(25, 900.0)), 10, 0.1)
        .unwrap()
        .unwrap();
    let (a_train, b_train) = (a.train.clone(), b.train.clone());

    let data = PreparedData::from_pools(vec![a, b], 10).unwrap();
    assert_eq!(data.train.len(), a_train.len() + b_train.len());
    assert_eq!(&data.train.labels()[..a_train.len()], a_train.labels());
    assert_eq!(&data.train.labels()[a_train.len()..], b_train.labels());
    assert_eq!(data.test_pools["a.csv"].len(), 3);
    assert_eq!(data.test_pools["b.csv"].len(), 1);
    assert_eq!(data.scalers.len(), 2);
}

#[test]
fn test_file_without_test_windows_is_left_out_of_evaluation() {
    let pool = build_file_pool(&fifteen_rows(), 10, 0.1).unwrap().unwrap();
    let data = PreparedData::from_pools(vec![pool], 10).unwrap();
    assert_eq!(data.train.len(), 5);
    assert!(data.test_pools.is_empty());
    assert!(data.scalers.contains_key("AEP_hourly.csv"));
}

#[test]
fn test_read_hourly_csv() {
    let dir = tempfile::tempdir().unwrap();
    let series = fifteen_rows();
    let path = write_csv(dir.path(), "AEP_hourly.csv", "AEP_MW", &series);

    let loaded = read_hourly_csv(&path).unwrap();
    assert_eq!(loaded.name, "AEP_hourly.csv");
    assert_eq!(loaded.len(), 15);
    assert_eq!(loaded.points[0], (start_time(), 100.0));
    assert_eq!(loaded.points[14], (start_time() + Duration::hours(14), 114.0));
}

#[test]
fn test_read_hourly_csv_rejects_bad_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    std::fs::write(&path, "Datetime,AEP_MW\nyesterday,100.0\n").unwrap();

    match read_hourly_csv(&path) {
        Err(ForecastError::InvalidTimestamp { value, .. }) => assert_eq!(value, "yesterday"),
        other => panic!("expected InvalidTimestamp, got {:?}", other),
    }
}

#[test]
fn test_list_source_files_filters_and_sorts() {
    let dir = tempfile::tempdir().unwrap();
    let series = fifteen_rows();
    write_csv(dir.path(), "PJME_hourly.csv", "PJME_MW", &series);
    write_csv(dir.path(), "AEP_hourly.csv", "AEP_MW", &series);
    write_csv(dir.path(), "pjm_hourly_est.csv", "PJM_Load", &series);
    std::fs::write(dir.path().join("notes.txt"), "not data").unwrap();

    let config = ExperimentConfig::default();
    let files = list_source_files(dir.path(), &config.excluded_files).unwrap();
    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["AEP_hourly.csv", "PJME_hourly.csv"]);
}

#[test]
fn test_list_source_files_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        list_source_files(dir.path(), &[]),
        Err(ForecastError::NoInputFiles(_))
    ));
    assert!(matches!(
        list_source_files(&dir.path().join("missing"), &[]),
        Err(ForecastError::MissingDirectory(_))
    ));
}

#[test]
fn test_prepare_datasets_skips_short_files() {
    let dir = tempfile::tempdir().unwrap();
    let long = hourly_series("long.csv", &daily_cycle(60, 800.0));
    let short = hourly_series("short.csv", &daily_cycle(8, 800.0));
    let long_path = write_csv(dir.path(), "long.csv", "MW", &long);
    let short_path = write_csv(dir.path(), "short.csv", "MW", &short);

    let config = ExperimentConfig {
        lookback: 10,
        ..ExperimentConfig::default()
    };
    let data = prepare_datasets(&[long_path, short_path], &config).unwrap();
    assert_eq!(data.train.len() + data.test_window_count(), 50);
    assert_eq!(data.test_pools["long.csv"].len(), 5);
    assert!(!data.scalers.contains_key("short.csv"));
}
