use axum::http::StatusCode;
use thiserror::Error;

/// Errors surfaced by the storage layer.
///
/// The in-memory reference backend only produces the first two variants;
/// `Backend` exists so an asynchronous persistent implementation can report
/// I/O or connection failures through the same trait.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("username already taken")]
    UsernameTaken,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StorageError {
    /// Map a storage error onto the HTTP status the handlers return.
    pub fn status(&self) -> StatusCode {
        match self {
            StorageError::UsernameTaken => StatusCode::CONFLICT,
            StorageError::NotFound(_) => StatusCode::NOT_FOUND,
            StorageError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
