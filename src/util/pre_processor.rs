// External crates
use polars::prelude::*;
use serde::{Deserialize, Serialize};

// Local modules
use crate::constants::{FEATURE_COLUMNS, VALUE_COLUMN};
use crate::util::feature_engineering::calendar_feature_frame;
use crate::util::file_utils::RawSeries;

/// Column-wise min-max scaler mapping each fitted column onto [0, 1]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    columns: Vec<String>,
    mins: Vec<f64>,
    ranges: Vec<f64>,
}

impl MinMaxScaler {
    /// Fits the scaler on the given columns of a DataFrame
    ///
    /// A constant column gets a range of 1, so it scales to 0 rather than
    /// dividing by zero.
    pub fn fit(df: &DataFrame, columns: &[&str]) -> PolarsResult<Self> {
        let mut mins = Vec::with_capacity(columns.len());
        let mut ranges = Vec::with_capacity(columns.len());

        for &col in columns {
            let series = df.column(col)?.f64()?;
            let (min, max) = match (series.min(), series.max()) {
                (Some(min), Some(max)) => (min, max),
                _ => {
                    return Err(PolarsError::ComputeError(
                        format!("Cannot fit scaler on empty column {}", col).into(),
                    ))
                }
            };

            // Avoid division by zero
            let range = if (max - min).abs() < f64::EPSILON {
                1.0
            } else {
                max - min
            };

            mins.push(min);
            ranges.push(range);
        }

        Ok(Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            mins,
            ranges,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Scales every fitted column of `df`, leaving other columns untouched
    pub fn transform(&self, df: &DataFrame) -> PolarsResult<DataFrame> {
        let mut scaled = df.clone();
        for (idx, col) in self.columns.iter().enumerate() {
            let values: Vec<f64> = df
                .column(col)?
                .f64()?
                .into_iter()
                .map(|v| self.scale(idx, v.unwrap_or(f64::NAN)))
                .collect();
            scaled.replace(col, Series::new(col.as_str().into(), values))?;
        }
        Ok(scaled)
    }

    pub fn scale(&self, column: usize, value: f64) -> f64 {
        (value - self.mins[column]) / self.ranges[column]
    }

    pub fn unscale(&self, column: usize, value: f64) -> f64 {
        value * self.ranges[column] + self.mins[column]
    }

    /// Maps scaled values of the first fitted column back to physical units
    pub fn inverse_transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.unscale(0, v)).collect()
    }
}

/// The two scalers fitted for one source file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FileScalers {
    /// Fitted on every feature column
    pub features: MinMaxScaler,
    /// Fitted on the measurement column alone, used to invert predictions
    pub label: MinMaxScaler,
}

/// A source file's scaled feature frame together with its scalers
#[derive(Debug, Clone)]
pub struct ScaledSeries {
    pub name: String,
    pub frame: DataFrame,
    pub scalers: FileScalers,
}

/// Derives calendar features for a series and min-max scales them
pub fn scale_series(series: &RawSeries) -> PolarsResult<ScaledSeries> {
    let features = calendar_feature_frame(series)?;

    let feature_scaler = MinMaxScaler::fit(&features, &FEATURE_COLUMNS)?;
    let label_scaler = MinMaxScaler::fit(&features, &[VALUE_COLUMN])?;
    let frame = feature_scaler.transform(&features)?;

    Ok(ScaledSeries {
        name: series.name.clone(),
        frame,
        scalers: FileScalers {
            features: feature_scaler,
            label: label_scaler,
        },
    })
}
