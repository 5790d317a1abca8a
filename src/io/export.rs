//! Export forecast results to CSV and JSON.
//!
//! The forecast CSV mirrors a spreadsheet-style export with an unnamed date
//! index column:
//!
//! ```text
//! ,Forecast
//! 2025-01-01,1234.5
//! ```
//!
//! All outputs are UTF-8. Writers take any `io::Write`; the `*_file`
//! variants create (or truncate) the target path.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::NaiveDate;
use tracing::info;

use crate::domain::{ForecastResult, MonthlySeries};
use crate::error::AppError;
use crate::report::ForecastReport;

const DATE_FMT: &str = "%Y-%m-%d";

/// Write the `(month, predicted)` table.
pub fn write_forecast_csv<W: Write>(out: W, table: &[(NaiveDate, f64)]) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["", "Forecast"]).map_err(csv_err)?;
    for (month, value) in table {
        wtr.write_record([month.format(DATE_FMT).to_string(), value.to_string()])
            .map_err(csv_err)?;
    }
    wtr.flush()
        .map_err(|e| AppError::io(format!("Failed to flush forecast CSV: {e}")))
}

/// Forecast table with the confidence bounds.
pub fn write_forecast_bounds_csv<W: Write>(
    out: W,
    forecast: &ForecastResult,
) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["", "Forecast", "lower", "upper"])
        .map_err(csv_err)?;
    for s in &forecast.steps {
        wtr.write_record([
            s.month.format(DATE_FMT).to_string(),
            s.predicted.to_string(),
            s.lower.to_string(),
            s.upper.to_string(),
        ])
        .map_err(csv_err)?;
    }
    wtr.flush()
        .map_err(|e| AppError::io(format!("Failed to flush forecast CSV: {e}")))
}

/// Monthly totals as `month,sales`.
pub fn write_history_csv<W: Write>(out: W, series: &MonthlySeries) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["month", "sales"]).map_err(csv_err)?;
    for p in series.points() {
        wtr.write_record([p.month.format(DATE_FMT).to_string(), p.total.to_string()])
            .map_err(csv_err)?;
    }
    wtr.flush()
        .map_err(|e| AppError::io(format!("Failed to flush history CSV: {e}")))
}

/// The whole report as pretty JSON.
pub fn write_report_json<W: Write>(out: W, report: &ForecastReport) -> Result<(), AppError> {
    serde_json::to_writer_pretty(out, report)
        .map_err(|e| AppError::io(format!("Failed to write report JSON: {e}")))
}

pub fn write_forecast_csv_file(path: &Path, table: &[(NaiveDate, f64)]) -> Result<(), AppError> {
    write_forecast_csv(create(path)?, table)?;
    info!(path = %path.display(), rows = table.len(), "forecast exported");
    Ok(())
}

pub fn write_forecast_bounds_csv_file(
    path: &Path,
    forecast: &ForecastResult,
) -> Result<(), AppError> {
    write_forecast_bounds_csv(create(path)?, forecast)?;
    info!(path = %path.display(), rows = forecast.len(), "forecast bounds exported");
    Ok(())
}

pub fn write_history_csv_file(path: &Path, series: &MonthlySeries) -> Result<(), AppError> {
    write_history_csv(create(path)?, series)?;
    info!(path = %path.display(), rows = series.len(), "monthly totals exported");
    Ok(())
}

pub fn write_report_json_file(path: &Path, report: &ForecastReport) -> Result<(), AppError> {
    let mut file = create(path)?;
    write_report_json(&mut file, report)?;
    file.flush().map_err(|e| {
        AppError::io(format!("Failed to write report JSON '{}': {e}", path.display()))
    })?;
    info!(path = %path.display(), "report exported");
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>, AppError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", path.display())))
}

fn csv_err(e: csv::Error) -> AppError {
    AppError::io(format!("Failed to write CSV row: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ForecastStep, MonthlyPoint};
    use crate::error::ErrorKind;
    use crate::fit::FitSummary;

    fn ymd(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn step(month: NaiveDate, predicted: f64, lower: f64, upper: f64) -> ForecastStep {
        ForecastStep { month, predicted, lower, upper }
    }

    fn forecast() -> ForecastResult {
        ForecastResult {
            steps: vec![
                step(ymd(2025, 1), 1234.5, 1000.0, 1469.0),
                step(ymd(2025, 2), -3.25, -50.0, 43.5),
            ],
            confidence_level: 0.95,
        }
    }

    fn history() -> MonthlySeries {
        MonthlySeries::from_points(vec![
            MonthlyPoint { month: ymd(2024, 11), total: 10.0 },
            MonthlyPoint { month: ymd(2024, 12), total: 20.5 },
        ])
        .unwrap()
    }

    fn report() -> ForecastReport {
        ForecastReport {
            history: history(),
            model_input: history(),
            forecast: forecast(),
            fit: FitSummary {
                model: "SARIMA(1,1,1)(1,1,1,12)".to_string(),
                ar: vec![0.1],
                ma: vec![0.2],
                seasonal_ar: vec![0.3],
                seasonal_ma: vec![0.4],
                sigma2: 1.0,
                log_likelihood: -1.0,
                aic: 12.0,
                bic: 13.0,
                n_obs: 2,
                n_effective: 1,
                iterations: 5,
                converged: true,
            },
        }
    }

    #[test]
    fn forecast_csv_has_unnamed_index_header() {
        let table = vec![(ymd(2025, 1), 1234.5), (ymd(2025, 2), -3.25)];
        let mut buf = Vec::new();
        write_forecast_csv(&mut buf, &table).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, ",Forecast\n2025-01-01,1234.5\n2025-02-01,-3.25\n");
    }

    #[test]
    fn bounds_csv_adds_lower_and_upper() {
        let mut buf = Vec::new();
        write_forecast_bounds_csv(&mut buf, &forecast()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ",Forecast,lower,upper");
        assert_eq!(lines[1], "2025-01-01,1234.5,1000,1469");
    }

    #[test]
    fn history_csv_layout() {
        let mut buf = Vec::new();
        write_history_csv(&mut buf, &history()).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "month,sales\n2024-11-01,10\n2024-12-01,20.5\n"
        );
    }

    #[test]
    fn report_json_round_trips_through_serde_value() {
        let mut buf = Vec::new();
        write_report_json(&mut buf, &report()).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["history"][1]["month"], "2024-12-01");
        assert_eq!(v["forecast"]["steps"][0]["predicted"], 1234.5);
        assert_eq!(v["fit"]["model"], "SARIMA(1,1,1)(1,1,1,12)");
    }

    #[test]
    fn file_variants_create_files() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("forecast_output.csv");
        let json_path = dir.path().join("report.json");

        write_forecast_csv_file(&csv_path, &report().forecast_table()).unwrap();
        write_report_json_file(&json_path, &report()).unwrap();

        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert!(text.starts_with(",Forecast\n2025-01-01,1234.5\n"));
        assert!(std::fs::metadata(&json_path).unwrap().len() > 0);
    }

    #[test]
    fn unwritable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let err = write_history_csv_file(&path, &history()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
