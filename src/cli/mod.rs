//! Command-line parsing for the monthly sales forecaster.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{GapFill, ValidationMode};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sfc", version, about = "Monthly sales forecaster for order-level CSV exports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Aggregate orders by month, fit a seasonal model and forecast the next 12 months.
    Forecast(ForecastArgs),
    /// Print (and optionally export) the monthly totals without fitting.
    Aggregate(AggregateArgs),
}

/// Options shared by every command that reads an order file.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Order-level CSV with `ORDERDATE` and `SALES` columns.
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// How strictly sale amounts are checked.
    #[arg(long, value_enum, default_value_t = ValidationMode::Lenient)]
    pub validation: ValidationMode,

    /// What to do with months that have no orders.
    #[arg(long = "gap-fill", value_enum, default_value_t = GapFill::Zero)]
    pub gap_fill: GapFill,

    /// Log filter (e.g. `debug`, `sales_forecast=trace`). Overrides `RUST_LOG`.
    #[arg(long = "log-level", value_name = "FILTER")]
    pub log_level: Option<String>,
}

/// Options for `sfc forecast`.
#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Export the forecast table (`,Forecast`) to CSV.
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = crate::domain::DEFAULT_EXPORT_FILE
    )]
    pub export: Option<PathBuf>,

    /// Export the forecast with its lower/upper bounds to CSV.
    #[arg(long = "export-bounds", value_name = "PATH")]
    pub export_bounds: Option<PathBuf>,

    /// Export the full report (history, forecast, fit) to JSON.
    #[arg(long = "export-json", value_name = "PATH")]
    pub export_json: Option<PathBuf>,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for `sfc aggregate`.
#[derive(Debug, Args, Clone)]
pub struct AggregateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Export the monthly totals (`month,sales`) to CSV.
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_defaults() {
        let cli = Cli::try_parse_from(["sfc", "forecast", "orders.csv"]).unwrap();
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(args.input.csv, PathBuf::from("orders.csv"));
        assert_eq!(args.input.validation, ValidationMode::Lenient);
        assert_eq!(args.input.gap_fill, GapFill::Zero);
        assert!(args.export.is_none());
        assert!(!args.no_plot);
    }

    #[test]
    fn bare_export_flag_uses_default_file() {
        let cli = Cli::try_parse_from(["sfc", "forecast", "orders.csv", "--export"]).unwrap();
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(args.export, Some(PathBuf::from("forecast_output.csv")));
    }

    #[test]
    fn aggregate_accepts_strict_and_no_gap_fill() {
        let cli = Cli::try_parse_from([
            "sfc",
            "aggregate",
            "orders.csv",
            "--validation",
            "strict",
            "--gap-fill",
            "none",
            "--log-level",
            "debug",
        ])
        .unwrap();
        let Command::Aggregate(args) = cli.command else {
            panic!("expected aggregate");
        };
        assert_eq!(args.input.validation, ValidationMode::Strict);
        assert_eq!(args.input.gap_fill, GapFill::None);
        assert_eq!(args.input.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn csv_path_is_required() {
        assert!(Cli::try_parse_from(["sfc", "forecast"]).is_err());
    }
}
