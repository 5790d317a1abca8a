//! Shared forecast pipeline used by every front-end command.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! upload -> decode -> parse -> aggregate -> fit -> forecast -> (render)
//!
//! Each run walks the stages strictly in order. A failure stops the run and
//! records the stage that could not be reached; nothing from a failed run is
//! returned, so a previous run's output can never be mistaken for a new one.

use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use crate::data::{ParsedOrders, aggregate, to_records};
use crate::domain::{
    CONFIDENCE_LEVEL, FORECAST_HORIZON, ForecastConfig, GapFill, MonthlySeries, RawUpload,
    SEASONAL_PERIOD,
};
use crate::error::AppError;
use crate::fit::{FitOptions, fit_sarima};
use crate::io::{DetectedEncoding, RowError, decode, detect_encoding, load_order_table};
use crate::models::SarimaOrder;
use crate::report::{ForecastReport, RunFacts, assemble};

/// Pipeline stages, in the only order a run may take them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Idle,
    Uploaded,
    Decoded,
    Parsed,
    Aggregated,
    Fitted,
    Forecasted,
    Rendered,
    Failed,
}

impl Stage {
    /// The stage a successful step moves to.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Idle => Some(Stage::Uploaded),
            Stage::Uploaded => Some(Stage::Decoded),
            Stage::Decoded => Some(Stage::Parsed),
            Stage::Parsed => Some(Stage::Aggregated),
            Stage::Aggregated => Some(Stage::Fitted),
            Stage::Fitted => Some(Stage::Forecasted),
            Stage::Forecasted => Some(Stage::Rendered),
            Stage::Rendered | Stage::Failed => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Uploaded => "uploaded",
            Stage::Decoded => "decoded",
            Stage::Parsed => "parsed",
            Stage::Aggregated => "aggregated",
            Stage::Fitted => "fitted",
            Stage::Forecasted => "forecasted",
            Stage::Rendered => "rendered",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A run that stopped early.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct RunFailure {
    /// The stage the run was trying to reach.
    pub failed_at: Stage,
    pub error: AppError,
}

impl From<RunFailure> for AppError {
    fn from(f: RunFailure) -> Self {
        f.error
    }
}

/// Enforces stage ordering for a single run.
#[derive(Debug)]
struct Tracker {
    stage: Stage,
}

impl Tracker {
    fn new() -> Self {
        Self { stage: Stage::Idle }
    }

    fn advance(&mut self, to: Stage) -> Result<(), RunFailure> {
        if self.stage.next() != Some(to) {
            return Err(self.fail(
                to,
                AppError::internal(format!(
                    "Invalid pipeline transition {} -> {to}.",
                    self.stage
                )),
            ));
        }
        debug!(from = %self.stage, to = %to, "pipeline stage");
        self.stage = to;
        Ok(())
    }

    /// Run one step; on error the run moves to `Failed` and remembers `to`.
    fn step<T>(
        &mut self,
        to: Stage,
        f: impl FnOnce() -> Result<T, AppError>,
    ) -> Result<T, RunFailure> {
        match f() {
            Ok(v) => {
                self.advance(to)?;
                Ok(v)
            }
            Err(e) => Err(self.fail(to, e)),
        }
    }

    fn fail(&mut self, failed_at: Stage, error: AppError) -> RunFailure {
        warn!(stage = %failed_at, kind = error.kind().label(), "pipeline failed: {error}");
        self.stage = Stage::Failed;
        RunFailure { failed_at, error }
    }
}

/// Input-side facts common to every command.
#[derive(Debug, Clone)]
pub struct InputSummary {
    pub source: String,
    pub bytes: usize,
    pub encoding: DetectedEncoding,
    pub rows_read: usize,
    pub row_errors: Vec<RowError>,
    pub dropped_dates: usize,
    pub missing_sales: usize,
    pub negative_sales: usize,
    pub rows_used: usize,
}

/// Outputs of `run_aggregation`.
#[derive(Debug, Clone)]
pub struct AggregationRun {
    pub input: InputSummary,
    pub history: MonthlySeries,
    stage: Stage,
}

impl AggregationRun {
    pub fn stage(&self) -> Stage {
        self.stage
    }
}

/// All computed outputs of a single forecast run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub input: InputSummary,
    pub gap_fill: GapFill,
    pub report: ForecastReport,
    stage: Stage,
}

impl PipelineRun {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Record that the results were shown. Only valid once, after forecasting.
    pub fn mark_rendered(&mut self) -> Result<(), AppError> {
        if self.stage != Stage::Forecasted {
            return Err(AppError::internal(format!(
                "Cannot render a run in stage {}.",
                self.stage
            )));
        }
        debug!(from = %self.stage, to = %Stage::Rendered, "pipeline stage");
        self.stage = Stage::Rendered;
        Ok(())
    }

    pub fn facts(&self) -> RunFacts<'_> {
        RunFacts {
            source: &self.input.source,
            encoding: self.input.encoding.name(),
            encoding_fallback: self.input.encoding.fallback,
            rows_read: self.input.rows_read,
            rows_used: self.input.rows_used,
            dropped_dates: self.input.dropped_dates,
            row_errors: self.input.row_errors.len(),
            gap_fill: self.gap_fill,
        }
    }
}

/// Upload through aggregation.
fn load_history(
    upload: RawUpload,
    config: &ForecastConfig,
    tracker: &mut Tracker,
) -> Result<(InputSummary, MonthlySeries), RunFailure> {
    let source = upload.name().to_string();
    let bytes = upload.len();
    tracker.advance(Stage::Uploaded)?;
    debug!(source = %source, bytes, "upload received");

    let (encoding, text) = tracker.step(Stage::Decoded, || {
        let encoding = detect_encoding(upload.as_bytes());
        let text = decode(upload.as_bytes(), &encoding);
        Ok((encoding, text))
    })?;
    drop(upload);

    let table = tracker.step(Stage::Parsed, || load_order_table(&text))?;
    if !table.row_errors.is_empty() {
        warn!(count = table.row_errors.len(), "malformed CSV records skipped");
    }

    let validation = config.validation;
    let (parsed, aggregation) = tracker.step(Stage::Aggregated, || {
        let parsed: ParsedOrders = to_records(&table.rows, validation)?;
        let aggregation = aggregate(&parsed.records)?;
        Ok((parsed, aggregation))
    })?;

    let input = InputSummary {
        source,
        bytes,
        encoding,
        rows_read: table.rows_read,
        row_errors: table.row_errors,
        dropped_dates: parsed.dropped_dates,
        missing_sales: parsed.missing_sales,
        negative_sales: parsed.negative_sales,
        rows_used: aggregation.rows_used,
    };
    Ok((input, aggregation.series))
}

/// Decode, parse and aggregate an upload without fitting.
pub fn run_aggregation(
    upload: RawUpload,
    config: &ForecastConfig,
) -> Result<AggregationRun, RunFailure> {
    let mut tracker = Tracker::new();
    let (input, history) = load_history(upload, config, &mut tracker)?;
    Ok(AggregationRun {
        input,
        history,
        stage: tracker.stage,
    })
}

/// Execute the full forecast pipeline and return the computed outputs.
pub fn run_forecast(upload: RawUpload, config: &ForecastConfig) -> Result<PipelineRun, RunFailure> {
    let mut tracker = Tracker::new();
    let (input, history) = load_history(upload, config, &mut tracker)?;

    let missing = history.missing_months();
    let model_input = match config.gap_fill {
        GapFill::Zero if missing > 0 => {
            warn!(missing, "months without orders filled with zero");
            history.with_gaps_filled()
        }
        GapFill::None if missing > 0 => {
            warn!(missing, "months without orders left out; seasonal lags will be misaligned");
            history.clone()
        }
        _ => history.clone(),
    };

    let opts = FitOptions::new(SarimaOrder::seasonal_111(SEASONAL_PERIOD));
    let fit = tracker.step(Stage::Fitted, || fit_sarima(&model_input, &opts))?;
    let forecast = tracker.step(Stage::Forecasted, || {
        fit.forecast(&model_input, FORECAST_HORIZON, CONFIDENCE_LEVEL)
    })?;

    let report = assemble(history, model_input, forecast, &fit);
    Ok(PipelineRun {
        input,
        gap_fill: config.gap_fill,
        report,
        stage: tracker.stage,
    })
}
