//! Error types for ferrozip-core

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Core error types for the ferrozip library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed without a more specific location
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// I/O operation on a known path failed
    #[error("{action} {}: {source}", .path.display())]
    PathIo {
        /// What was being attempted ("open", "mkdir", ...)
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Source file or archive does not exist
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Archive could not be read as a zip container
    #[error("Invalid archive {}: {reason}", .path.display())]
    InvalidArchive { path: PathBuf, reason: String },

    /// Entry would be written outside the extraction root
    #[error("illegal file path: {0}")]
    PathTraversal(String),

    /// File already exists at destination
    #[error("file exists: {} (use overwrite option)", .0.display())]
    FileExists(PathBuf),

    /// Archive feature the codec does not handle (compression method,
    /// encryption)
    #[error("Zip error: {0}")]
    Zip(String),

    /// Configuration-related error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap an I/O error with the action and path it happened on.
    ///
    /// A `NotFound` error kind is promoted to [`Error::NotFound`].
    pub fn at(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Error::NotFound(path)
        } else {
            Error::PathIo {
                action,
                path,
                source,
            }
        }
    }

    /// Like [`Error::at`] but never promotes to `NotFound`.
    pub fn io_at(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::PathIo {
            action,
            path: path.into(),
            source,
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf);
        let message = err.to_string();
        match (path, err.into_io_error()) {
            (Some(path), Some(source)) => Error::at("walk", path, source),
            (None, Some(source)) => Error::Io(source),
            (_, None) => Error::Io(io::Error::new(io::ErrorKind::Other, message)),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
