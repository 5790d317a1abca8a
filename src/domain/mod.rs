//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the upload and its parsed rows (`RawUpload`, `OrderRecord`)
//! - the aggregated history (`MonthlySeries`)
//! - forecast outputs (`ForecastResult`, `ForecastStep`)
//! - run configuration (`ForecastConfig`, `ValidationMode`, `GapFill`)

pub mod types;

pub use types::*;
