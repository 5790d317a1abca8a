//! Input/output helpers.
//!
//! - byte-level encoding detection and decoding (`encoding`)
//! - CSV ingest + header validation (`ingest`)
//! - result exports (CSV/JSON) (`export`)

pub mod encoding;
pub mod export;
pub mod ingest;

pub use encoding::*;
pub use export::*;
pub use ingest::*;
