use std::path::PathBuf;

use thiserror::Error;

use crate::directory::error::{DeleteError, OpenReadError, OpenWriteError};
use crate::search::QueryError;

/// A file that exists but whose content cannot be trusted.
#[derive(Debug, Clone, Error)]
#[error("data corruption in {path:?}: {comment}")]
pub struct DataCorruption {
    path: PathBuf,
    comment: String,
}

impl DataCorruption {
    pub fn new(path: PathBuf, comment: String) -> DataCorruption {
        DataCorruption { path, comment }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// A caller handed in something unusable (bad open mode, malformed
    /// filter, field redefined with different options, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A named entity (segment file, codec, generation) is absent.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("an IO error occurred: '{0}'")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    OpenRead(#[from] OpenReadError),

    #[error(transparent)]
    OpenWrite(#[from] OpenWriteError),

    #[error(transparent)]
    Delete(#[from] DeleteError),

    #[error(transparent)]
    DataCorruption(#[from] DataCorruption),

    /// Filter or order conversion failure, carrying the offending node.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Misuse of a lifecycle: writing through a rolled-back writer,
    /// committing after a poisoned flush, ...
    #[error("invalid state: {0}")]
    State(String),

    /// A background worker died or reported a failure.
    #[error("error in thread: {0}")]
    ErrorInThread(String),
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::Io(error.into())
    }
}

impl From<bincode::Error> for Error {
    fn from(error: bincode::Error) -> Error {
        Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, error))
    }
}
