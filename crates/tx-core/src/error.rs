//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `TxError` as one variant
//! via `#[from]` where configuration or lookup failures bubble up.

use thiserror::Error;

use crate::{CustomerId, TaxiId};

/// The top-level error type for `tx-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum TxError {
    #[error("taxi {0} not found")]
    TaxiNotFound(TaxiId),

    #[error("customer {0} not found")]
    CustomerNotFound(CustomerId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `tx-*` crates.
pub type TxResult<T> = Result<T, TxError>;
