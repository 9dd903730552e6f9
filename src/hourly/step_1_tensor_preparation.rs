// External crates
use burn::tensor::{backend::Backend, Int, Shape, Tensor, TensorData};
use log::{debug, info, warn};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;

// Internal modules
use crate::config::ExperimentConfig;
use crate::constants::{FEATURE_COLUMNS, VALUE_COLUMN};
use crate::error::{ForecastError, Result};
use crate::util::file_utils::{read_hourly_csv, RawSeries};
use crate::util::pre_processor::{scale_series, FileScalers};

/// A set of fixed-length input windows and their next-hour labels
///
/// Windows are stored flat in row-major `[count, lookback, width]` order so
/// they can be handed to Burn without copying row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSet {
    lookback: usize,
    width: usize,
    inputs: Vec<f32>,
    labels: Vec<f32>,
}

impl WindowSet {
    pub fn new(lookback: usize, width: usize) -> Self {
        Self {
            lookback,
            width,
            inputs: Vec::new(),
            labels: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// Number of features per timestep
    pub fn width(&self) -> usize {
        self.width
    }

    /// Flattened `[lookback, width]` rows of window `index`
    pub fn window(&self, index: usize) -> &[f32] {
        let size = self.lookback * self.width;
        &self.inputs[index * size..(index + 1) * size]
    }

    pub fn labels(&self) -> &[f32] {
        &self.labels
    }

    pub fn push(&mut self, window: &[f32], label: f32) {
        debug_assert_eq!(window.len(), self.lookback * self.width);
        self.inputs.extend_from_slice(window);
        self.labels.push(label);
    }

    /// Appends every window of `other`; both sets must share a shape
    pub fn append(&mut self, other: &WindowSet) -> Result<()> {
        if other.lookback != self.lookback || other.width != self.width {
            return Err(ForecastError::InvalidConfig(format!(
                "cannot append windows of shape [{}, {}] to [{}, {}]",
                other.lookback, other.width, self.lookback, self.width
            )));
        }
        self.inputs.extend_from_slice(&other.inputs);
        self.labels.extend_from_slice(&other.labels);
        Ok(())
    }

    /// Splits off the last `count` windows, returning `(head, tail)`
    pub fn split_tail(mut self, count: usize) -> (WindowSet, WindowSet) {
        let count = count.min(self.len());
        let keep = self.len() - count;
        let size = self.lookback * self.width;

        let tail = WindowSet {
            lookback: self.lookback,
            width: self.width,
            inputs: self.inputs.split_off(keep * size),
            labels: self.labels.split_off(keep),
        };
        (self, tail)
    }

    /// Converts the set to `([count, lookback, width], [count, 1])` tensors
    pub fn to_tensors<B: Backend>(&self, device: &B::Device) -> (Tensor<B, 3>, Tensor<B, 2>) {
        let count = self.len();
        let features_data = TensorData::new(
            self.inputs.clone(),
            Shape::new([count, self.lookback, self.width]),
        );
        let targets_data = TensorData::new(self.labels.clone(), Shape::new([count, 1]));
        (
            Tensor::<B, 3>::from_data(features_data, device),
            Tensor::<B, 2>::from_data(targets_data, device),
        )
    }
}

/// Builds every lookback window of a scaled feature frame
///
/// For each row `i` in `lookback..height` the window covers rows
/// `[i - lookback, i)` and the label is the scaled measurement of row `i`,
/// giving `height - lookback` windows (none when the frame is too short).
pub fn build_windows(frame: &DataFrame, lookback: usize) -> PolarsResult<WindowSet> {
    let columns: Vec<Vec<f64>> = FEATURE_COLUMNS
        .iter()
        .map(|&name| {
            frame
                .column(name)
                .and_then(|col| col.f64().map(|ca| ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect()))
        })
        .collect::<PolarsResult<_>>()?;
    let value_idx = FEATURE_COLUMNS
        .iter()
        .position(|&name| name == VALUE_COLUMN)
        .unwrap_or(0);

    let width = columns.len();
    let n_rows = frame.height();
    let mut windows = WindowSet::new(lookback, width);
    if n_rows <= lookback {
        return Ok(windows);
    }

    let mut buffer = Vec::with_capacity(lookback * width);
    for i in lookback..n_rows {
        buffer.clear();
        for row in (i - lookback)..i {
            for column in &columns {
                buffer.push(column[row] as f32);
            }
        }
        windows.push(&buffer, columns[value_idx][i] as f32);
    }

    Ok(windows)
}

/// Windows of one source file, split chronologically
#[derive(Debug, Clone)]
pub struct FilePool {
    pub name: String,
    pub train: WindowSet,
    pub test: WindowSet,
    pub scalers: FileScalers,
}

/// Number of windows held out for testing from a file with `count` windows
pub fn test_count(count: usize, test_split: f64) -> usize {
    (count as f64 * test_split).floor() as usize
}

/// Turns one raw series into its training and held-out windows
///
/// Returns `None` when the series has fewer than `lookback + 1` rows.
pub fn build_file_pool(
    series: &RawSeries,
    lookback: usize,
    test_split: f64,
) -> Result<Option<FilePool>> {
    if series.len() <= lookback {
        warn!(
            "Skipping {}: {} rows, need at least {} for one window",
            series.name,
            series.len(),
            lookback + 1
        );
        return Ok(None);
    }

    let scaled = scale_series(series)?;
    let windows = build_windows(&scaled.frame, lookback)?;
    let held_out = test_count(windows.len(), test_split);
    let (train, test) = windows.split_tail(held_out);

    debug!(
        "{}: {} windows ({} train, {} test)",
        series.name,
        train.len() + test.len(),
        train.len(),
        test.len()
    );

    Ok(Some(FilePool {
        name: scaled.name,
        train,
        test,
        scalers: scaled.scalers,
    }))
}

/// Pooled training windows plus per-file held-out windows and scalers
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub train: WindowSet,
    /// Held-out windows keyed by file name; files with an empty tail are absent
    pub test_pools: BTreeMap<String, WindowSet>,
    /// Scalers keyed by file name, for every file that produced windows
    pub scalers: BTreeMap<String, FileScalers>,
}

impl PreparedData {
    /// Merges file pools in the order given
    pub fn from_pools(pools: Vec<FilePool>, lookback: usize) -> Result<Self> {
        let mut train = WindowSet::new(lookback, FEATURE_COLUMNS.len());
        let mut test_pools = BTreeMap::new();
        let mut scalers = BTreeMap::new();

        for pool in pools {
            train.append(&pool.train)?;
            if pool.test.is_empty() {
                warn!("{} has no held-out windows and is left out of evaluation", pool.name);
            } else {
                test_pools.insert(pool.name.clone(), pool.test);
            }
            scalers.insert(pool.name, pool.scalers);
        }

        Ok(Self {
            train,
            test_pools,
            scalers,
        })
    }

    pub fn test_window_count(&self) -> usize {
        self.test_pools.values().map(WindowSet::len).sum()
    }
}

/// Builds the shared training pool and per-file test pools from CSV files
///
/// Files are read and windowed in parallel, then merged in the order of
/// `files` so the pool layout does not depend on scheduling.
pub fn prepare_datasets(files: &[PathBuf], config: &ExperimentConfig) -> Result<PreparedData> {
    let pools = files
        .par_iter()
        .map(|path| {
            let series = read_hourly_csv(path)?;
            build_file_pool(&series, config.lookback, config.test_split)
        })
        .collect::<Result<Vec<_>>>()?;

    let pools: Vec<FilePool> = pools.into_iter().flatten().collect();
    let data = PreparedData::from_pools(pools, config.lookback)?;

    info!(
        "Prepared {} training windows and {} test windows from {} files",
        data.train.len(),
        data.test_window_count(),
        data.scalers.len()
    );

    Ok(data)
}

/// Shuffles sample indices and cuts them into full batches
///
/// A trailing partial batch is dropped.
pub fn shuffled_batches(num_samples: usize, batch_size: usize, rng: &mut StdRng) -> Vec<Vec<usize>> {
    let mut indices: Vec<usize> = (0..num_samples).collect();
    indices.shuffle(rng);
    indices
        .chunks_exact(batch_size)
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// Gathers rows `indices` along the first dimension of `tensor`
pub fn select_rows<B: Backend, const D: usize>(
    tensor: &Tensor<B, D>,
    indices: &[usize],
    device: &B::Device,
) -> Tensor<B, D> {
    let indices_vec: Vec<i32> = indices.iter().map(|&x| x as i32).collect();
    let indices_data = TensorData::new(indices_vec, Shape::new([indices.len()]));
    let index_tensor = Tensor::<B, 1, Int>::from_data(indices_data, device);
    tensor.clone().select(0, index_tensor)
}
