//! Error types for meshcrate

use thiserror::Error;

/// Main error type for meshcrate operations
#[derive(Error, Debug)]
pub enum Error {
    /// A precondition on the input mesh or settings was violated
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

/// Result type alias for meshcrate operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        Error::ThreadPool(e.to_string())
    }
}
