//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between pipeline stages without copying the upload around
//! - exported to JSON/CSV
//! - handed to a presentation layer for charting

use std::path::{Path, PathBuf};

use chrono::{Datelike, Months, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Header of the column holding the order date (matched case-sensitively).
pub const ORDER_DATE_COLUMN: &str = "ORDERDATE";
/// Header of the column holding the sale amount (matched case-sensitively).
pub const SALES_COLUMN: &str = "SALES";

/// Number of monthly steps forecast after the last observed month.
pub const FORECAST_HORIZON: usize = 12;
/// Seasonal period of the model, in months.
pub const SEASONAL_PERIOD: usize = 12;
/// Two-sided confidence level of the forecast bounds.
pub const CONFIDENCE_LEVEL: f64 = 0.95;
/// Two full seasonal cycles.
pub const MIN_HISTORY_MONTHS: usize = 2 * SEASONAL_PERIOD;

/// File name used when exporting the forecast table without an explicit path.
pub const DEFAULT_EXPORT_FILE: &str = "forecast_output.csv";

/// How sale amounts are checked before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Sum whatever parses; missing amounts contribute nothing, negatives are kept.
    #[default]
    Lenient,
    /// Reject the upload on the first missing, unparseable or negative amount.
    Strict,
}

/// What to do with calendar months that have no orders.
///
/// The seasonal model assumes one observation per calendar month, so a series
/// with holes would silently misalign the 12-month lag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GapFill {
    /// Insert explicit zero-sales months before fitting.
    #[default]
    Zero,
    /// Fit on the months present, treating them as consecutive.
    None,
}

/// The uploaded file, byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUpload {
    name: String,
    bytes: Vec<u8>,
}

impl RawUpload {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let bytes = std::fs::read(path)
            .map_err(|e| AppError::io(format!("Failed to read '{}': {e}", path.display())))?;
        Ok(Self::from_bytes(path.display().to_string(), bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One order row that survived date parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    /// 1-based line in the uploaded file.
    pub line: usize,
    pub order_date: NaiveDate,
    /// `None` when the cell was empty or not numeric (lenient mode only).
    pub sales: Option<f64>,
}

/// Total sales for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    /// First day of the month.
    pub month: NaiveDate,
    pub total: f64,
}

/// Monthly totals, strictly increasing by month.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthlySeries {
    points: Vec<MonthlyPoint>,
}

impl MonthlySeries {
    /// Build a series, checking ordering and month alignment.
    pub fn from_points(points: Vec<MonthlyPoint>) -> Result<Self, AppError> {
        for p in &points {
            if p.month.day() != 1 {
                return Err(AppError::internal(format!(
                    "Monthly point {} is not aligned to the first of the month.",
                    p.month
                )));
            }
        }
        if let Some(pair) = points.windows(2).find(|w| w[0].month >= w[1].month) {
            return Err(AppError::internal(format!(
                "Monthly points out of order: {} then {}.",
                pair[0].month, pair[1].month
            )));
        }
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[MonthlyPoint] {
        &self.points
    }

    pub fn months(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.month).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.total).collect()
    }

    pub fn first_month(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.month)
    }

    pub fn last_month(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.month)
    }

    /// Number of calendar months between the first and last month that have no entry.
    pub fn missing_months(&self) -> usize {
        match (self.first_month(), self.last_month()) {
            (Some(first), Some(last)) => {
                let span = months_between(first, last) as usize + 1;
                span - self.points.len()
            }
            _ => 0,
        }
    }

    /// Copy of the series with every absent month present as a zero total.
    pub fn with_gaps_filled(&self) -> MonthlySeries {
        let (Some(first), Some(last)) = (self.first_month(), self.last_month()) else {
            return self.clone();
        };

        let span = months_between(first, last) as usize + 1;
        let mut points = Vec::with_capacity(span);
        let mut observed = self.points.iter().peekable();
        for k in 0..span {
            let Some(month) = add_months(first, k as u32) else {
                break;
            };
            let total = match observed.peek() {
                Some(p) if p.month == month => {
                    let t = p.total;
                    observed.next();
                    t
                }
                _ => 0.0,
            };
            points.push(MonthlyPoint { month, total });
        }
        MonthlySeries { points }
    }
}

/// One forecast month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastStep {
    pub month: NaiveDate,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

/// The forecast horizon following the last historical month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub steps: Vec<ForecastStep>,
    pub confidence_level: f64,
}

impl ForecastResult {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn months(&self) -> Vec<NaiveDate> {
        self.steps.iter().map(|s| s.month).collect()
    }

    pub fn predicted(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.predicted).collect()
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub csv_path: PathBuf,
    pub validation: ValidationMode,
    pub gap_fill: GapFill,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_forecast: Option<PathBuf>,
    pub export_bounds: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

impl ForecastConfig {
    /// Defaults for a given input file: lenient validation, zero gap-fill, no exports.
    pub fn for_path(csv_path: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: csv_path.into(),
            validation: ValidationMode::default(),
            gap_fill: GapFill::default(),
            plot: true,
            plot_width: 100,
            plot_height: 25,
            export_forecast: None,
            export_bounds: None,
            export_json: None,
        }
    }
}

/// Truncate a date to the first day of its month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    // Day 1 exists in every month, so `with_day(1)` cannot fail.
    date.with_day(1).unwrap_or(date)
}

/// Advance a month-start date by `k` calendar months.
pub fn add_months(month: NaiveDate, k: u32) -> Option<NaiveDate> {
    month.checked_add_months(Months::new(k))
}

fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn point(y: i32, m: u32, total: f64) -> MonthlyPoint {
        MonthlyPoint {
            month: ymd(y, m, 1),
            total,
        }
    }

    #[test]
    fn month_start_truncates() {
        assert_eq!(month_start(ymd(2023, 1, 20)), ymd(2023, 1, 1));
        assert_eq!(month_start(ymd(2024, 2, 29)), ymd(2024, 2, 1));
    }

    #[test]
    fn add_months_crosses_year_boundary() {
        assert_eq!(add_months(ymd(2024, 12, 1), 1), Some(ymd(2025, 1, 1)));
        assert_eq!(add_months(ymd(2024, 12, 1), 12), Some(ymd(2025, 12, 1)));
    }

    #[test]
    fn series_rejects_duplicate_months() {
        let err = MonthlySeries::from_points(vec![point(2023, 1, 1.0), point(2023, 1, 2.0)]);
        assert!(err.is_err());
    }

    #[test]
    fn series_rejects_mid_month_dates() {
        let err = MonthlySeries::from_points(vec![MonthlyPoint {
            month: ymd(2023, 1, 5),
            total: 1.0,
        }]);
        assert!(err.is_err());
    }

    #[test]
    fn gap_fill_inserts_zero_months() {
        let series = MonthlySeries::from_points(vec![
            point(2023, 11, 5.0),
            point(2024, 2, 7.0),
        ])
        .unwrap();
        assert_eq!(series.missing_months(), 2);

        let filled = series.with_gaps_filled();
        assert_eq!(filled.len(), 4);
        assert_eq!(filled.values(), vec![5.0, 0.0, 0.0, 7.0]);
        assert_eq!(filled.months()[1], ymd(2023, 12, 1));
        assert_eq!(filled.missing_months(), 0);
    }

    #[test]
    fn gap_fill_on_contiguous_series_is_identity() {
        let series =
            MonthlySeries::from_points(vec![point(2023, 1, 1.0), point(2023, 2, 2.0)]).unwrap();
        assert_eq!(series.with_gaps_filled(), series);
    }
}
