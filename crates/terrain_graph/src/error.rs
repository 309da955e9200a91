//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! violated preconditions, out-of-range grid access, node operation failures,
//! graph document problems, IO, and generic errors.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("precondition violated: {0}")]
    Precondition(String),

    #[error("index ({row}, {col}) is out of range for a {height}x{width} grid")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        height: usize,
        width: usize,
    },

    #[error("operation error: {0}")]
    Operation(String),

    #[error("graph document error: {0}")]
    Serialization(String),

    #[error("unknown {kind} type '{tag}'")]
    UnknownType { kind: &'static str, tag: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
