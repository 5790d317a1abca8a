//! Result assembly: bundle the history, forecast and fit into one report.
//!
//! Assembly never changes a value. Every consumer (terminal tables, CSV,
//! JSON, chart) reads from the same `ForecastReport`.

pub mod format;

pub use format::*;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{ForecastResult, MonthlySeries};
use crate::fit::{FitSummary, SarimaFit};

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    /// Monthly totals as aggregated from the upload.
    pub history: MonthlySeries,
    /// The series actually fitted (after gap filling, if any).
    pub model_input: MonthlySeries,
    pub forecast: ForecastResult,
    pub fit: FitSummary,
}

impl ForecastReport {
    /// `(month, predicted)` pairs, in month order.
    pub fn forecast_table(&self) -> Vec<(NaiveDate, f64)> {
        self.forecast
            .steps
            .iter()
            .map(|s| (s.month, s.predicted))
            .collect()
    }
}

/// Bundle the outputs of a run.
pub fn assemble(
    history: MonthlySeries,
    model_input: MonthlySeries,
    forecast: ForecastResult,
    fit: &SarimaFit,
) -> ForecastReport {
    ForecastReport {
        history,
        model_input,
        forecast,
        fit: fit.summary(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MonthlyPoint, add_months};
    use crate::fit::{FitOptions, fit_sarima};
    use crate::models::SarimaOrder;

    fn sample_report() -> ForecastReport {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let points = (0..30)
            .map(|t| MonthlyPoint {
                month: add_months(start, t).unwrap(),
                total: 200.0
                    + 3.0 * t as f64
                    + [0.0, 10.0, 30.0][(t % 3) as usize]
                    + ((t * 31) % 7) as f64,
            })
            .collect();
        let series = MonthlySeries::from_points(points).unwrap();
        let fit = fit_sarima(&series, &FitOptions::new(SarimaOrder::seasonal_111(12))).unwrap();
        let forecast = fit.forecast(&series, 12, 0.95).unwrap();
        assemble(series.clone(), series, forecast, &fit)
    }

    #[test]
    fn forecast_table_copies_predictions_unchanged() {
        let report = sample_report();
        let table = report.forecast_table();
        assert_eq!(table.len(), 12);
        for ((month, value), step) in table.iter().zip(&report.forecast.steps) {
            assert_eq!(*month, step.month);
            assert_eq!(value.to_bits(), step.predicted.to_bits());
        }
        assert_eq!(table[0].0, NaiveDate::from_ymd_opt(2023, 7, 1).unwrap());
    }

    #[test]
    fn report_keeps_history_and_fit_summary() {
        let report = sample_report();
        assert_eq!(report.history.len(), 30);
        assert_eq!(report.model_input, report.history);
        assert_eq!(report.fit.n_obs, 30);
    }
}
