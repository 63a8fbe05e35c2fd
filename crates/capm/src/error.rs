//! Error types for CAPM analytics.

use derive_more::Display;
use serde::Serialize;
use thiserror::Error;

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, CapmError>;

/// Errors that can occur while fetching prices or computing analytics.
#[derive(Debug, Error)]
pub enum CapmError {
    /// The data source returned nothing usable, failed, or timed out
    #[error("Data unavailable for {instrument}: {reason}")]
    DataUnavailable {
        /// Instrument (or `*` for the joined table)
        instrument: String,
        /// What went wrong
        reason: String,
    },

    /// Not enough observations for the computation
    #[error("Insufficient data: need {required} observations, got {available}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Available number of observations
        available: usize,
    },

    /// A series has zero variance where a positive variance is required
    #[error("Zero variance in column: {0}")]
    ZeroVariance(String),

    /// A ratio has a zero denominator and is undefined
    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    /// Malformed user parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing required column in input data
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Polars DataFrame error
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A background task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),
}

/// Coarse error classification reported to the presentation layer.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Fetch failed or returned no rows
    DataUnavailable,
    /// Too few observations or a degenerate benchmark
    InsufficientData,
    /// Undefined ratio
    DivisionByZero,
    /// Rejected user parameters
    InvalidInput,
    /// Anything else (dataframe, I/O, task failures)
    Internal,
}

impl CapmError {
    /// Shorthand for a [`CapmError::DataUnavailable`] error.
    pub fn unavailable(instrument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            instrument: instrument.into(),
            reason: reason.into(),
        }
    }

    /// Classify this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DataUnavailable { .. } => ErrorKind::DataUnavailable,
            Self::InsufficientData { .. } | Self::ZeroVariance(_) => ErrorKind::InsufficientData,
            Self::DivisionByZero(_) => ErrorKind::DivisionByZero,
            Self::InvalidInput(_) | Self::MissingColumn(_) => ErrorKind::InvalidInput,
            Self::Polars(_) | Self::Io(_) | Self::Json(_) | Self::Task(_) => ErrorKind::Internal,
        }
    }
}
