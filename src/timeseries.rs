//! Synthetic NDVI / tree cover series for the dashboard chart.
//!
//! The values are illustrative placeholders: NDVI climbs from 0.3 by 0.01 per
//! month and tree cover climbs from the measured value by 0.2 points per
//! month. Nothing here is measured or modelled, and it is not a forecast.

use crate::models::SeriesPoint;
use chrono::{Datelike, NaiveDate};

pub const DEFAULT_SERIES_MONTHS: u32 = 12;
pub const NDVI_BASELINE: f64 = 0.3;
pub const NDVI_MONTHLY_STEP: f64 = 0.01;
pub const TREE_COVER_MONTHLY_STEP: f64 = 0.2;

/// First day of the default series
#[must_use]
pub fn default_series_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default()
}

/// Series of `months` month-end points starting in January 2023
#[must_use]
pub fn synthesize_series(tree_cover_percent: f64, months: u32) -> Vec<SeriesPoint> {
    synthesize_series_from(default_series_start(), tree_cover_percent, months)
}

/// Series of `months` month-end points; the first point is the last day of
/// `start`'s month
#[must_use]
pub fn synthesize_series_from(
    start: NaiveDate,
    tree_cover_percent: f64,
    months: u32,
) -> Vec<SeriesPoint> {
    (0..months)
        .map_while(|i| {
            let date = nth_month_end(start, i)?;
            let step = f64::from(i);
            Some(SeriesPoint {
                date,
                ndvi: NDVI_BASELINE + NDVI_MONTHLY_STEP * step,
                tree_cover: tree_cover_percent + TREE_COVER_MONTHLY_STEP * step,
            })
        })
        .collect()
}

fn nth_month_end(start: NaiveDate, offset: u32) -> Option<NaiveDate> {
    let month_index = start.month0() + offset;
    let year = start.year() + i32::try_from(month_index / 12).ok()?;
    let month = month_index % 12 + 1;
    month_end(year, month)
}

fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}
