use thiserror::Error;

use crate::HostError;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// A state the protocol rules out by construction was reached.
    #[error("dispatch invariant violated: {0}")]
    Invariant(String),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
