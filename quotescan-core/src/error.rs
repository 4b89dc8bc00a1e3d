//! Structured error types for planning and fetching.
//!
//! Two classes share one enum: invalid-input errors are raised at plan time
//! before any fetch, fetch failures are raised from whichever pull triggered
//! them. Both surface synchronously; a failed window fails the whole query.

use thiserror::Error;

use crate::interval;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("start/end must be a date or date-like string (could not parse '{0}')")]
    InvalidDate(String),

    #[error(
        "interval '{token}' is not valid, you should use one of the following valid intervals:\n{}",
        interval::TOKEN_HELP
    )]
    UnknownInterval { token: String },

    #[error("end must be after start")]
    EmptyRange,

    #[error("network error: {0}")]
    Network(String),

    #[error("quote service returned HTTP {code} for {url}")]
    Status { code: u16, url: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("response schema mismatch: expected {expected}, got {actual}")]
    SchemaMismatch { expected: String, actual: String },
}

impl QuoteError {
    /// True for errors raised by parameter validation, before any fetch.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            QuoteError::InvalidDate(_) | QuoteError::UnknownInterval { .. } | QuoteError::EmptyRange
        )
    }
}
