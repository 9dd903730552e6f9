use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing data, training or evaluating the forecasters
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Data directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("No usable CSV files in {}", .0.display())]
    NoInputFiles(PathBuf),

    #[error("File {} contains no rows", .0.display())]
    EmptyFile(PathBuf),

    #[error("File {} has no numeric measurement column", .0.display())]
    MissingMeasurement(PathBuf),

    #[error("Cannot parse timestamp '{value}' in {}", .path.display())]
    InvalidTimestamp { path: PathBuf, value: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Training pool has {available} windows, fewer than one batch of {batch_size}")]
    InsufficientTrainingData { available: usize, batch_size: usize },

    #[error("No held-out windows to evaluate")]
    NoHeldOutWindows,

    #[error("No scaler recorded for {0}")]
    MissingScaler(String),

    #[error("Tensor data error: {0}")]
    TensorData(String),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
