use fxn_values::ValueError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error(transparent)]
    Value(#[from] ValueError),

    /// Upload, download or request failure. `status` is absent when no
    /// response was received.
    #[error("Transport error for {url}: {message}")]
    Transport {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// The Function API answered with an error payload.
    #[error("Function API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Marshalling failure for a named input or output.
    #[error("Value '{key}': {source}")]
    Key {
        key: String,
        #[source]
        source: Box<RemoteError>,
    },
}

impl RemoteError {
    pub(crate) fn for_key(key: &str, err: RemoteError) -> Self {
        RemoteError::Key {
            key: key.to_string(),
            source: Box::new(err),
        }
    }

    pub(crate) fn transport(url: &str, err: reqwest::Error) -> Self {
        RemoteError::Transport {
            url: url.to_string(),
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;
