//! Unified error types for pagevault.
//!
//! Fetch-family failures surface immediately and are mapped to a
//! not-found style response at the boundary; storage failures are hard
//! errors. Absence on read paths is `Ok(None)`, never an error.

use tokio_rusqlite::rusqlite;

/// Unified error type for the pagevault crates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty URL, negative timestamp).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// URL failed canonicalization.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Fetch failed at the HTTP level (network error or non-2xx status).
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Fetch exceeded the configured timeout.
    #[error("fetch timed out: {0}")]
    FetchTimeout(String),

    /// Response body exceeded the configured size limit.
    #[error("fetch too large: {0}")]
    FetchTooLarge(String),

    /// Database operation failed.
    #[error("storage error: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("storage error: migration failed: {0}")]
    MigrationFailed(String),
}

impl Error {
    /// True for failures of the fetch collaborator.
    ///
    /// Callers distinguish these from storage failures: a failed fetch is
    /// reported like a missing page, a failed store operation is not.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl(_) | Error::Fetch(_) | Error::FetchTimeout(_) | Error::FetchTooLarge(_)
        )
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
