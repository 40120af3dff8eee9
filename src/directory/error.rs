use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Failure opening a file for reading.
#[derive(Debug, Clone, Error)]
pub enum OpenReadError {
    #[error("file does not exist: {0:?}")]
    FileDoesNotExist(PathBuf),
    #[error("an IO error occurred opening {path:?} for read: '{io_error}'")]
    IoError {
        io_error: Arc<std::io::Error>,
        path: PathBuf,
    },
}

impl OpenReadError {
    pub fn wrap_io_error(io_error: std::io::Error, path: PathBuf) -> OpenReadError {
        OpenReadError::IoError { io_error: Arc::new(io_error), path }
    }
}

/// Failure opening a file for writing.
#[derive(Debug, Clone, Error)]
pub enum OpenWriteError {
    #[error("file already exists: {0:?}")]
    FileAlreadyExists(PathBuf),
    #[error("an IO error occurred opening {path:?} for write: '{io_error}'")]
    IoError {
        io_error: Arc<std::io::Error>,
        path: PathBuf,
    },
}

impl OpenWriteError {
    pub fn wrap_io_error(io_error: std::io::Error, path: PathBuf) -> OpenWriteError {
        OpenWriteError::IoError { io_error: Arc::new(io_error), path }
    }
}

/// Failure deleting a file.
#[derive(Debug, Clone, Error)]
pub enum DeleteError {
    #[error("file does not exist: {0:?}")]
    FileDoesNotExist(PathBuf),
    #[error("an IO error occurred deleting {path:?}: '{io_error}'")]
    IoError {
        io_error: Arc<std::io::Error>,
        path: PathBuf,
    },
}
