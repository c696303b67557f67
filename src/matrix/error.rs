//! Error types for the matrix engine.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, querying or persisting a [`DMatrix`](super::DMatrix).
#[derive(Error, Debug)]
pub enum MatrixError {
    /// Shape, length or type mismatch detected before any work is done.
    #[error("invalid argument: {message}")]
    Argument { message: String },

    /// File could not be opened, read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Input file is readable but its content is malformed.
    #[error("invalid format in {path} (line {line}): {message}")]
    Format {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Structural inconsistency found while assembling the matrix.
    #[error("{message}")]
    Library { message: String },

    /// Requested info field has never been set on this matrix.
    #[error("info field `{field}` is not set")]
    NotFound { field: String },

    /// CSV parsing errors
    #[cfg(feature = "csv")]
    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    /// Binary buffer encoding errors
    #[error("binary encoding error: {source}")]
    Bincode {
        #[from]
        source: bincode::Error,
    },
}

/// Result alias used throughout the engine.
pub type MatrixResult<T> = Result<T, MatrixError>;

impl MatrixError {
    pub(crate) fn argument(message: impl Into<String>) -> Self {
        Self::Argument {
            message: message.into(),
        }
    }

    pub(crate) fn library(message: impl Into<String>) -> Self {
        Self::Library {
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(field: impl Into<String>) -> Self {
        Self::NotFound {
            field: field.into(),
        }
    }

    /// Re-tag a validation failure as malformed content of `path`.
    ///
    /// Errors that already describe an I/O or decoding problem pass through.
    pub(crate) fn in_file(self, path: impl Into<PathBuf>, line: usize) -> Self {
        match self {
            Self::Argument { message } | Self::Library { message } => {
                Self::format(path, line, message)
            }
            other => other,
        }
    }
}
