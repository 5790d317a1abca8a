//! Mathematical utilities: least squares, simplex search, lag polynomials.

pub mod ols;
pub mod optimize;
pub mod poly;

pub use ols::*;
pub use optimize::*;
