// External crates
use chrono::{Datelike, NaiveDateTime, Timelike};
use polars::prelude::*;

// Local modules
use crate::constants::FEATURE_COLUMNS;
use crate::util::file_utils::RawSeries;

/// Calendar fields derived from one timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFeatures {
    /// Hour of day, 0-23
    pub hour: u32,
    /// Day of week, Monday = 0 through Sunday = 6
    pub day_of_week: u32,
    /// Month, 1-12
    pub month: u32,
    /// Day of year, 1-366
    pub day_of_year: u32,
}

impl From<&NaiveDateTime> for CalendarFeatures {
    fn from(timestamp: &NaiveDateTime) -> Self {
        Self {
            hour: timestamp.hour(),
            day_of_week: timestamp.weekday().num_days_from_monday(),
            month: timestamp.month(),
            day_of_year: timestamp.ordinal(),
        }
    }
}

/// Builds the model feature frame for one series
///
/// Rows are sorted by timestamp first. The timestamp itself is dropped;
/// the frame holds the measurement and the four calendar fields, as f64
/// columns named after [`FEATURE_COLUMNS`].
pub fn calendar_feature_frame(series: &RawSeries) -> PolarsResult<DataFrame> {
    let mut points = series.points.clone();
    points.sort_by_key(|(timestamp, _)| *timestamp);

    let n_rows = points.len();
    let mut value = Vec::with_capacity(n_rows);
    let mut hour = Vec::with_capacity(n_rows);
    let mut day_of_week = Vec::with_capacity(n_rows);
    let mut month = Vec::with_capacity(n_rows);
    let mut day_of_year = Vec::with_capacity(n_rows);

    for (timestamp, measurement) in &points {
        let calendar = CalendarFeatures::from(timestamp);
        value.push(*measurement);
        hour.push(calendar.hour as f64);
        day_of_week.push(calendar.day_of_week as f64);
        month.push(calendar.month as f64);
        day_of_year.push(calendar.day_of_year as f64);
    }

    let [value_name, hour_name, dow_name, month_name, doy_name] = FEATURE_COLUMNS;
    DataFrame::new(vec![
        Series::new(value_name.into(), value).into(),
        Series::new(hour_name.into(), hour).into(),
        Series::new(dow_name.into(), day_of_week).into(),
        Series::new(month_name.into(), month).into(),
        Series::new(doy_name.into(), day_of_year).into(),
    ])
}
