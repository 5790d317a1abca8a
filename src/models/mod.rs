//! Seasonal ARIMA model implementation.
//!
//! The model is a plain value type with pure evaluation methods so that the
//! estimation code in `fit` can stay generic over coefficient vectors.

pub mod sarima;

pub use sarima::*;
