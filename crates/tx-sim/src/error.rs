use thiserror::Error;

use tx_core::{CustomerId, TxError};
use tx_dispatch::{DispatchError, HostError};
use tx_mobility::MobilityError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] TxError),

    #[error("{what} length {got} does not match taxi count {expected}")]
    TaxiCountMismatch {
        expected: usize,
        got:      usize,
        what:     &'static str,
    },

    #[error("host error: {0}")]
    Host(#[from] HostError),

    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("mobility error: {0}")]
    Mobility(#[from] MobilityError),

    #[error("{0} is not a live customer")]
    UnknownCustomer(CustomerId),
}

pub type SimResult<T> = Result<T, SimError>;
