//! CSV ingest and schema validation.
//!
//! This module turns decoded upload text into raw `(ORDERDATE, SALES)` cells.
//!
//! Design goals:
//! - **Strict schema** for required headers (clear error naming every missing column)
//! - **Row-level tolerance** (skip malformed records, but report what happened)
//! - **No interpretation of cells** (dates and amounts are parsed by `data`)

use std::collections::HashMap;

use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{ORDER_DATE_COLUMN, SALES_COLUMN};
use crate::error::AppError;

/// The two cells the pipeline needs from one data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOrderRow {
    /// 1-based line in the file (the header is line 1).
    pub line: usize,
    pub order_date: String,
    pub sales: String,
}

/// A record-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: raw rows + record errors + counts.
#[derive(Debug, Clone, Default)]
pub struct OrderTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawOrderRow>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Parse decoded CSV text and extract the order date and sales cells.
///
/// Returns a `Schema` error when `ORDERDATE` or `SALES` is not a header.
pub fn load_order_table(text: &str) -> Result<OrderTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::schema(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let date_idx = header_map[ORDER_DATE_COLUMN];
    let sales_idx = header_map[SALES_COLUMN];

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let fallback_line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback_line);
                warn!(line, "skipping malformed CSV record: {e}");
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_line);

        rows.push(RawOrderRow {
            line,
            order_date: get_cell(&record, date_idx).to_string(),
            sales: get_cell(&record, sales_idx).to_string(),
        });
    }

    debug!(
        rows_read,
        rows = rows.len(),
        errors = row_errors.len(),
        "loaded order table"
    );

    Ok(OrderTable {
        headers: headers.iter().map(normalize_header_name).collect(),
        rows,
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins for duplicated headers.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report missing columns. Case is preserved: column matching is exact.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    let missing: Vec<&str> = [ORDER_DATE_COLUMN, SALES_COLUMN]
        .into_iter()
        .filter(|name| !header_map.contains_key(*name))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    let listed = missing
        .iter()
        .map(|name| format!("`{name}`"))
        .collect::<Vec<_>>()
        .join(", ");
    Err(AppError::schema(format!(
        "Missing required column(s): {listed}. The file must include the columns `{ORDER_DATE_COLUMN}` and `{SALES_COLUMN}`."
    )))
}

fn get_cell(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).map(str::trim).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn extracts_required_cells_and_ignores_extra_columns() {
        let text = "ORDERNUMBER,ORDERDATE,STATUS,SALES\n10107,2/24/2003 0:00,Shipped,2871\n10121,5/7/2003 0:00,Shipped,2765.9\n";
        let table = load_order_table(text).unwrap();
        assert_eq!(table.rows_read, 2);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].order_date, "2/24/2003 0:00");
        assert_eq!(table.rows[0].sales, "2871");
        assert_eq!(table.rows[0].line, 2);
        assert_eq!(table.rows[1].line, 3);
    }

    #[test]
    fn missing_sales_is_a_schema_error_naming_the_column() {
        let text = "ORDERDATE,REVENUE\n2023-01-05,100\n";
        let err = load_order_table(text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.message().contains("`SALES`"));
        assert!(!err.message().contains("Missing required column(s): `ORDERDATE`"));
    }

    #[test]
    fn both_missing_columns_are_reported() {
        let err = load_order_table("DATE,AMOUNT\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.message().contains("`ORDERDATE`, `SALES`"));
    }

    #[test]
    fn header_match_is_case_sensitive() {
        let err = load_order_table("orderdate,sales\n2023-01-05,100\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn bom_on_first_header_is_ignored() {
        let table = load_order_table("\u{feff}ORDERDATE,SALES\n2023-01-05,100\n").unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.headers[0], "ORDERDATE");
    }

    #[test]
    fn header_only_file_yields_no_rows() {
        let table = load_order_table("ORDERDATE,SALES\n").unwrap();
        assert_eq!(table.rows_read, 0);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn empty_file_is_a_schema_error() {
        let err = load_order_table("").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn short_rows_read_missing_cells_as_empty() {
        let table = load_order_table("ORDERDATE,SALES\n2023-01-05\n").unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].sales, "");
    }

    #[test]
    fn quoted_fields_with_commas_are_kept_whole() {
        let text = "CUSTOMER,ORDERDATE,SALES\n\"Land of Toys, Inc.\",2023-01-05,100\n";
        let table = load_order_table(text).unwrap();
        assert_eq!(table.rows[0].order_date, "2023-01-05");
        assert_eq!(table.rows[0].sales, "100");
    }
}
