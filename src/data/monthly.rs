//! Row validation and calendar-month aggregation.
//!
//! Rows whose date cannot be parsed are dropped without individual reports;
//! only the count survives, for diagnostics. Everything else is grouped by
//! the first day of its month and summed.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::data::dates::parse_order_date;
use crate::domain::{
    MonthlyPoint, MonthlySeries, OrderRecord, SALES_COLUMN, ValidationMode, month_start,
};
use crate::error::AppError;
use crate::io::ingest::RawOrderRow;

/// Records admitted to aggregation plus what was discarded on the way.
#[derive(Debug, Clone)]
pub struct ParsedOrders {
    pub records: Vec<OrderRecord>,
    /// Rows dropped because the order date did not parse.
    pub dropped_dates: usize,
    /// Admitted rows whose sales cell was empty or not numeric (lenient mode).
    pub missing_sales: usize,
    /// Admitted rows with a negative amount (lenient mode).
    pub negative_sales: usize,
}

/// Aggregation output: the monthly series and the row accounting behind it.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub series: MonthlySeries,
    pub rows_used: usize,
}

/// Parse dates and amounts, applying the validation mode.
///
/// In strict mode the first missing, unparseable or negative amount on a row
/// with a valid date fails the run.
pub fn to_records(rows: &[RawOrderRow], mode: ValidationMode) -> Result<ParsedOrders, AppError> {
    let mut records = Vec::with_capacity(rows.len());
    let mut dropped_dates = 0usize;
    let mut missing_sales = 0usize;
    let mut negative_sales = 0usize;

    for row in rows {
        let Some(order_date) = parse_order_date(&row.order_date) else {
            dropped_dates += 1;
            continue;
        };

        let sales = parse_amount(&row.sales);
        match sales {
            None => {
                if mode == ValidationMode::Strict {
                    return Err(AppError::data_quality(format!(
                        "Line {}: missing or non-numeric `{SALES_COLUMN}` value '{}'.",
                        row.line, row.sales
                    )));
                }
                missing_sales += 1;
            }
            Some(v) if v < 0.0 => {
                if mode == ValidationMode::Strict {
                    return Err(AppError::data_quality(format!(
                        "Line {}: negative `{SALES_COLUMN}` value {v}.",
                        row.line
                    )));
                }
                negative_sales += 1;
            }
            Some(_) => {}
        }

        records.push(OrderRecord {
            line: row.line,
            order_date,
            sales,
        });
    }

    debug!(
        admitted = records.len(),
        dropped_dates, missing_sales, negative_sales, "parsed order rows"
    );

    Ok(ParsedOrders {
        records,
        dropped_dates,
        missing_sales,
        negative_sales,
    })
}

/// Sum sales per calendar month.
///
/// Months are emitted in ascending order; months with no orders are absent.
/// A month whose rows all lack an amount is present with a zero total.
pub fn aggregate(records: &[OrderRecord]) -> Result<Aggregation, AppError> {
    if records.is_empty() {
        return Err(AppError::data_quality(
            "No rows with a valid order date remain; nothing to aggregate.",
        ));
    }

    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in records {
        let total = totals.entry(month_start(r.order_date)).or_insert(0.0);
        if let Some(v) = r.sales {
            *total += v;
        }
    }

    let points = totals
        .into_iter()
        .map(|(month, total)| MonthlyPoint { month, total })
        .collect();
    let series = MonthlySeries::from_points(points)?;

    debug!(
        months = series.len(),
        missing_months = series.missing_months(),
        "aggregated monthly sales"
    );

    Ok(Aggregation {
        series,
        rows_used: records.len(),
    })
}

fn parse_amount(s: &str) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
