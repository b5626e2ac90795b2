use thiserror::Error;

/// Error produced when a search fails to deliver a result.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("No solution found")]
    NoSolutionFound,

    #[error("No move could be scored")]
    NoMoveFound,
}

/// Result when a search method might fail.
pub type Result<T> = std::result::Result<T, SearchError>;
