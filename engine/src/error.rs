//! Error types for the native engine boundary.

use std::fmt;
use std::path::PathBuf;

use fxn_resource_cache::ResourceCacheError;
use fxn_values::ValueError;
use thiserror::Error;

use crate::ffi::{
    FXNStatus, FXN_ERROR_INVALID_ARGUMENT, FXN_ERROR_INVALID_OPERATION,
    FXN_ERROR_NOT_IMPLEMENTED, FXN_OK,
};

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Boxed error from an external collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Engine status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    InvalidArgument,
    InvalidOperation,
    NotImplemented,
    /// A code outside the documented set.
    Other(FXNStatus),
}

impl Status {
    pub fn from_raw(raw: FXNStatus) -> Self {
        match raw {
            FXN_OK => Status::Ok,
            FXN_ERROR_INVALID_ARGUMENT => Status::InvalidArgument,
            FXN_ERROR_INVALID_OPERATION => Status::InvalidOperation,
            FXN_ERROR_NOT_IMPLEMENTED => Status::NotImplemented,
            other => Status::Other(other),
        }
    }

    /// Convert into a `Result`, tagging failures with the operation name.
    pub fn check(raw: FXNStatus, operation: &'static str) -> Result<()> {
        match Status::from_raw(raw) {
            Status::Ok => Ok(()),
            status => Err(EngineError::Status { operation, status }),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => f.write_str("ok"),
            Status::InvalidArgument => f.write_str("invalid argument"),
            Status::InvalidOperation => f.write_str("invalid operation"),
            Status::NotImplemented => f.write_str("not implemented"),
            Status::Other(code) => write!(f, "unknown status {}", code),
        }
    }
}

/// Errors raised while talking to the native engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to load engine library {}: {message}", path.display())]
    LibraryLoad {
        path: PathBuf,
        message: String,
    },

    #[error("FFI error: {0}")]
    Ffi(String),

    /// A non-OK status from an engine call.
    #[error("{operation} failed: {status}")]
    Status {
        operation: &'static str,
        status: Status,
    },

    #[error("{operation} returned a null handle")]
    NullHandle {
        operation: &'static str,
    },

    #[error(transparent)]
    Value(#[from] ValueError),

    /// Marshalling failure for a named input or output.
    #[error("Value '{key}': {source}")]
    Key {
        key: String,
        #[source]
        source: Box<EngineError>,
    },

    #[error("Failed to fetch predictor manifest for {tag}: {source}")]
    Manifest {
        tag: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to provision resource '{name}': {source}")]
    ResourceProvisioning {
        name: String,
        #[source]
        source: ResourceCacheError,
    },
}

impl EngineError {
    pub(crate) fn for_key(key: &str, err: EngineError) -> Self {
        EngineError::Key {
            key: key.to_string(),
            source: Box::new(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(Status::check(FXN_OK, "FXNValueRelease").is_ok());
        let err = Status::check(FXN_ERROR_INVALID_ARGUMENT, "FXNValueCreateArray").unwrap_err();
        assert!(matches!(
            err,
            EngineError::Status { operation: "FXNValueCreateArray", status: Status::InvalidArgument }
        ));
        assert_eq!(Status::from_raw(42), Status::Other(42));
        assert_eq!(err.to_string(), "FXNValueCreateArray failed: invalid argument");
    }
}
