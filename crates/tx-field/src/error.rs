//! Demand-field error type.

use thiserror::Error;

/// Errors produced by `tx-field`.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("invalid field configuration: {0}")]
    Config(String),

    #[error("operating area {0} has no extent")]
    EmptyArea(String),
}

pub type FieldResult<T> = Result<T, FieldError>;
