//! Model estimation and forecasting.
//!
//! Responsibilities:
//!
//! - check there is enough history for a seasonal fit
//! - estimate coefficients by conditional sum of squares
//! - project the fitted model forward with confidence bounds

pub mod fitter;
pub mod forecast;

pub use fitter::*;
pub use forecast::*;
