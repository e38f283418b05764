//! Error types

use thiserror::Error;

/// Core errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Unknown intent target: {0}")]
    UnknownTarget(String),

    #[error("Invalid field path: {0}")]
    InvalidPath(String),
}

pub type Result<T> = std::result::Result<T, Error>;
