use thiserror::Error;

use tx_core::Point;

#[derive(Debug, Error)]
pub enum MobilityError {
    #[error("operating area must have positive width and height")]
    InvalidBounds,

    #[error("vehicle speed must be positive and finite, got {0}")]
    InvalidSpeed(f64),

    #[error("start position {0} lies outside the operating area")]
    OutOfBounds(Point),

    #[error("too many vehicles for a 32-bit taxi id")]
    TooManyVehicles,
}

pub type MobilityResult<T> = Result<T, MobilityError>;
