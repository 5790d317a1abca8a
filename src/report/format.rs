//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (the tests below pin exact layouts)

use crate::domain::{ForecastResult, GapFill, MonthlySeries};

use super::ForecastReport;

/// Facts about a run that are not part of the report itself.
#[derive(Debug, Clone)]
pub struct RunFacts<'a> {
    pub source: &'a str,
    pub encoding: &'a str,
    pub encoding_fallback: bool,
    pub rows_read: usize,
    pub rows_used: usize,
    pub dropped_dates: usize,
    pub row_errors: usize,
    pub gap_fill: GapFill,
}

/// Format the run summary (input stats + fitted model).
pub fn format_run_summary(facts: &RunFacts<'_>, report: &ForecastReport) -> String {
    let mut out = String::new();

    out.push_str("=== sfc - Monthly Sales Forecast ===\n");
    out.push_str(&format!("Source: {}\n", facts.source));
    let fallback = if facts.encoding_fallback { " (fallback)" } else { "" };
    out.push_str(&format!("Encoding: {}{fallback}\n", facts.encoding));
    out.push_str(&format!(
        "Rows: read={} used={} bad_dates={} malformed={}\n",
        facts.rows_read, facts.rows_used, facts.dropped_dates, facts.row_errors
    ));

    let history = &report.history;
    if let (Some(first), Some(last)) = (history.first_month(), history.last_month()) {
        out.push_str(&format!(
            "History: {} months | {} .. {}\n",
            history.len(),
            first.format("%Y-%m"),
            last.format("%Y-%m")
        ));
    }
    let missing = history.missing_months();
    if missing > 0 {
        let action = match facts.gap_fill {
            GapFill::Zero => "filled with zero",
            GapFill::None => "left out",
        };
        out.push_str(&format!("Missing months: {missing} ({action})\n"));
    }

    let fit = &report.fit;
    out.push_str("\nModel:\n");
    out.push_str(&format!("- {}\n", fit.model));
    out.push_str(&format!(
        "- ar={} ma={} sar={} sma={}\n",
        fmt_vec(&fit.ar),
        fmt_vec(&fit.ma),
        fmt_vec(&fit.seasonal_ar),
        fmt_vec(&fit.seasonal_ma)
    ));
    out.push_str(&format!(
        "- sigma2={:.3} AIC={:.3} BIC={:.3} iterations={}\n",
        fit.sigma2, fit.aic, fit.bic, fit.iterations
    ));
    out.push('\n');

    out
}

/// Two-column table of monthly totals.
pub fn format_monthly_table(series: &MonthlySeries) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<10} {:>14}\n", "month", "sales"));
    out.push_str(&format!("{:-<10} {:-<14}\n", "", ""));
    for p in series.points() {
        out.push_str(&format!("{:<10} {:>14.2}\n", p.month.format("%Y-%m"), p.total));
    }
    out
}

/// Forecast table with bounds.
pub fn format_forecast_table(forecast: &ForecastResult) -> String {
    let pct = forecast.confidence_level * 100.0;
    let lower = format!("lower {pct:.0}%");
    let upper = format!("upper {pct:.0}%");

    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} {:>14} {:>14} {:>14}\n",
        "month", "forecast", lower, upper
    ));
    out.push_str(&format!("{:-<10} {:-<14} {:-<14} {:-<14}\n", "", "", "", ""));
    for s in &forecast.steps {
        out.push_str(&format!(
            "{:<10} {:>14.2} {:>14.2} {:>14.2}\n",
            s.month.format("%Y-%m"),
            s.predicted,
            s.lower,
            s.upper
        ));
    }
    out
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.4}")).collect();
    format!("[{}]", parts.join(", "))
}
