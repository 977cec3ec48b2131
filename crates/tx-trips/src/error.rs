use thiserror::Error;

#[derive(Debug, Error)]
pub enum TripsError {
    #[error("trip CSV header error: {0}")]
    Header(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TripsResult<T> = Result<T, TripsError>;
