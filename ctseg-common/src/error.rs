//! Common error types for ctSeg

use thiserror::Error;

/// Common result type for ctSeg operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the ctSeg tools
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// NIfTI read or decode error, naming the offending file
    #[error("NIfTI error in {path}: {source}")]
    Nifti {
        path: String,
        source: nifti::NiftiError,
    },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap a NIfTI error with the file it came from
    pub fn nifti(path: &std::path::Path, source: nifti::NiftiError) -> Error {
        Error::Nifti {
            path: path.display().to_string(),
            source,
        }
    }
}
