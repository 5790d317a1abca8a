//! Error type shared by every pipeline stage.
//!
//! A run either succeeds or fails with exactly one `AppError`. The `kind`
//! lets front-ends branch on the failure category; the message is what the
//! user sees.

use thiserror::Error;

/// Failure category of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// File could not be read or written.
    Io,
    /// Required columns are absent from the upload.
    Schema,
    /// No usable rows (or strict validation rejected a row).
    DataQuality,
    /// The monthly series is too short for the seasonal model.
    InsufficientHistory,
    /// Numerical failure while estimating or forecasting.
    ModelFit,
    /// Anything else; indicates a bug rather than bad input.
    Internal,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Io => "I/O error",
            ErrorKind::Schema => "Schema error",
            ErrorKind::DataQuality => "Data error",
            ErrorKind::InsufficientHistory => "Insufficient history",
            ErrorKind::ModelFit => "Model fit error",
            ErrorKind::Internal => "Internal error",
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Schema, message)
    }

    pub fn data_quality(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataQuality, message)
    }

    pub fn insufficient_history(needed: usize, got: usize) -> Self {
        Self::new(
            ErrorKind::InsufficientHistory,
            format!(
                "Not enough history to fit a seasonal model: need at least {needed} months, got {got}."
            ),
        )
    }

    pub fn model_fit(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ModelFit, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> u8 {
        match self.kind {
            ErrorKind::Io | ErrorKind::Schema => 2,
            ErrorKind::DataQuality => 3,
            ErrorKind::InsufficientHistory | ErrorKind::ModelFit => 4,
            ErrorKind::Internal => 5,
        }
    }
}
