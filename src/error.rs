//! Error types for plan computation

use thiserror::Error;

/// Errors raised while building or evaluating a business plan
#[derive(Error, Debug)]
pub enum PlanError {
    /// A required input is absent (no revenue streams, empty template, ...)
    #[error("Missing input: {what}")]
    MissingInput { what: String },

    /// Year-1 aggregates need at least a full year of projections
    #[error("Insufficient horizon: {months} months projected, {required} required")]
    InsufficientHorizon { months: usize, required: usize },

    #[error("Invalid template '{id}': {reason}")]
    InvalidTemplate { id: String, reason: String },

    #[error("Sector '{id}' not found in catalog")]
    UnknownSector { id: String },

    /// A percent-of-stream formula points at a stream not declared before it
    #[error("Stream '{stream}' depends on '{source_stream}', which is not declared before it")]
    UnknownStreamDependency { stream: String, source_stream: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl PlanError {
    pub fn missing(what: impl Into<String>) -> Self {
        PlanError::MissingInput { what: what.into() }
    }
}

pub type PlanResult<T> = Result<T, PlanError>;
