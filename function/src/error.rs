use std::path::PathBuf;

use fxn_engine::EngineError;
use fxn_remote::RemoteError;
use thiserror::Error;

/// Errors surfaced by the [`crate::Function`] facade.
#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("Failed to read config file {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// An `FXN_*` environment variable holds an unusable value.
    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    /// Local predictions need a native engine library.
    #[error("Local predictions are unavailable: no engine library configured")]
    LocalUnavailable,

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

pub type FunctionResult<T> = std::result::Result<T, FunctionError>;
