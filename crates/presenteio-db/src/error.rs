use thiserror::Error;

/// Outcome of a failed reservation attempt. The first three variants are
/// expected business outcomes; `Storage` is anything the logic did not
/// anticipate and is fatal for the request.
#[derive(Debug, Error)]
pub enum ReserveError {
    #[error("gift not found")]
    NotFound,
    #[error("gift is not active")]
    Inactive,
    #[error("gift is already reserved")]
    AlreadyReserved,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for ReserveError {
    fn from(err: rusqlite::Error) -> Self {
        ReserveError::Storage(err.into())
    }
}

#[derive(Debug, Error)]
pub enum CancelError {
    #[error("gift not found")]
    NotFound,
    /// No reservation matches the (gift, account) pair. Deliberately covers
    /// both "held by someone else" and "none at all" so callers cannot learn
    /// other accounts' reservation state.
    #[error("no reservation held by this account")]
    NotOwner,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for CancelError {
    fn from(err: rusqlite::Error) -> Self {
        CancelError::Storage(err.into())
    }
}
