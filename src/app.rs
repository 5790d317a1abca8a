//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - runs the forecast pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::cli::{AggregateArgs, Command, ForecastArgs, InputArgs};
use crate::domain::{ForecastConfig, RawUpload};
use crate::error::AppError;

pub mod pipeline;

/// Default filter when neither `--log-level` nor `RUST_LOG` is given.
const DEFAULT_LOG_FILTER: &str = "warn";

/// Entry point for the `sfc` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Forecast(args) => {
            init_logging(args.input.log_level.as_deref());
            handle_forecast(args)
        }
        Command::Aggregate(args) => {
            init_logging(args.input.log_level.as_deref());
            handle_aggregate(args)
        }
    }
}

/// Install the stderr subscriber.
///
/// An explicit filter wins; otherwise `RUST_LOG` is honoured, falling back to `warn`.
pub fn init_logging(level: Option<&str>) {
    let (filter, rejected) = resolve_filter(level);

    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();

    if let Some(bad) = rejected {
        tracing::warn!(filter = %bad, "invalid --log-level filter; using {DEFAULT_LOG_FILTER}");
    }
}

/// Build the filter, returning the explicit filter text if it failed to parse.
fn resolve_filter(level: Option<&str>) -> (EnvFilter, Option<String>) {
    match level {
        Some(l) => match EnvFilter::try_new(l) {
            Ok(filter) => (filter, None),
            Err(_) => (EnvFilter::new(DEFAULT_LOG_FILTER), Some(l.to_string())),
        },
        None => {
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
            (filter, None)
        }
    }
}

fn handle_forecast(args: ForecastArgs) -> Result<(), AppError> {
    let config = forecast_config_from_args(&args);
    let upload = RawUpload::from_path(&config.csv_path)?;
    let mut run = pipeline::run_forecast(upload, &config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.facts(), &run.report)
    );
    println!("{}", crate::report::format_monthly_table(&run.report.history));
    println!("{}", crate::report::format_forecast_table(&run.report.forecast));

    if config.plot {
        let plot = crate::plot::render_forecast_plot(
            &run.report.model_input,
            &run.report.forecast,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }
    run.mark_rendered()?;

    // Optional exports.
    if let Some(path) = &config.export_forecast {
        crate::io::export::write_forecast_csv_file(path, &run.report.forecast_table())?;
        println!("Forecast written to {}", path.display());
    }
    if let Some(path) = &config.export_bounds {
        crate::io::export::write_forecast_bounds_csv_file(path, &run.report.forecast)?;
    }
    if let Some(path) = &config.export_json {
        crate::io::export::write_report_json_file(path, &run.report)?;
    }

    Ok(())
}

fn handle_aggregate(args: AggregateArgs) -> Result<(), AppError> {
    let config = input_config(&args.input);
    let upload = RawUpload::from_path(&config.csv_path)?;
    let run = pipeline::run_aggregation(upload, &config)?;

    let history = match config.gap_fill {
        crate::domain::GapFill::Zero => run.history.with_gaps_filled(),
        crate::domain::GapFill::None => run.history.clone(),
    };

    println!(
        "Source: {} | encoding={} | rows read={} used={} bad_dates={}",
        run.input.source,
        run.input.encoding.name(),
        run.input.rows_read,
        run.input.rows_used,
        run.input.dropped_dates
    );
    println!("{}", crate::report::format_monthly_table(&history));

    if let Some(path) = &args.export {
        crate::io::export::write_history_csv_file(path, &history)?;
        println!("Monthly totals written to {}", path.display());
    }
    Ok(())
}

fn input_config(args: &InputArgs) -> ForecastConfig {
    ForecastConfig {
        validation: args.validation,
        gap_fill: args.gap_fill,
        ..ForecastConfig::for_path(args.csv.clone())
    }
}

pub fn forecast_config_from_args(args: &ForecastArgs) -> ForecastConfig {
    ForecastConfig {
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_forecast: args.export.clone(),
        export_bounds: args.export_bounds.clone(),
        export_json: args.export_json.clone(),
        ..input_config(&args.input)
    }
}
