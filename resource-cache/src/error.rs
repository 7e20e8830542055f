//! Resource cache errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResourceCacheError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Invalid resource name: '{0}'")]
    InvalidName(String),
}

pub type Result<T> = std::result::Result<T, ResourceCacheError>;
