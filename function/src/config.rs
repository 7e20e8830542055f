//! Client configuration.
//!
//! Sources, lowest priority first:
//! - Defaults
//! - TOML file
//! - `FXN_*` environment variables
//!
//! Command-line flags are layered on top by the CLI.

use std::path::{Path, PathBuf};

use fxn_remote::{RemoteAcceleration, DEFAULT_API_URL};
use fxn_values::Acceleration;
use serde::{Deserialize, Serialize};

use crate::error::{FunctionError, FunctionResult};

/// Configuration for a [`crate::Function`] client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionConfig {
    pub api_url: String,
    pub access_key: Option<String>,
    /// Identifies this client to the API. Defaults to the engine's own
    /// identifier, or the target platform without an engine.
    pub client_id: Option<String>,
    /// Where predictor resources are cached.
    pub cache_dir: PathBuf,
    /// Payloads smaller than this many bytes are inlined in remote
    /// requests. Zero uploads everything.
    pub max_inline_size: usize,
    /// Native engine library. Local predictions are disabled without one.
    pub library_path: Option<PathBuf>,
    pub acceleration: Acceleration,
    pub remote_acceleration: RemoteAcceleration,
    pub request_timeout_secs: Option<u64>,
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            access_key: None,
            client_id: None,
            cache_dir: default_cache_dir(),
            max_inline_size: 0,
            library_path: None,
            acceleration: Acceleration::Auto,
            remote_acceleration: RemoteAcceleration::Auto,
            request_timeout_secs: None,
        }
    }
}

/// `<home>/.fxn/cache`, or `.fxn/cache` when there is no home directory.
pub fn default_cache_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".fxn")
        .join("cache")
}

impl FunctionConfig {
    /// Defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> FunctionResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Load a TOML file. Missing keys keep their defaults.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> FunctionResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| FunctionError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| FunctionError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults overridden by the environment.
    pub fn from_env() -> FunctionResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `FXN_*` environment variables.
    pub fn apply_env(&mut self) -> FunctionResult<()> {
        self.apply_vars(|var| std::env::var(var).ok())
    }

    /// Override fields from variables supplied by `lookup`.
    pub fn apply_vars<F>(&mut self, lookup: F) -> FunctionResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("FXN_API_URL") {
            self.api_url = url;
        }
        if let Some(key) = lookup("FXN_ACCESS_KEY") {
            self.access_key = Some(key);
        }
        if let Some(client_id) = lookup("FXN_CLIENT_ID") {
            self.client_id = Some(client_id);
        }
        if let Some(dir) = lookup("FXN_CACHE_DIR") {
            self.cache_dir = PathBuf::from(dir);
        }
        if let Some(size) = lookup("FXN_MAX_INLINE_SIZE") {
            self.max_inline_size = size.trim().parse().map_err(|_| FunctionError::InvalidEnv {
                var: "FXN_MAX_INLINE_SIZE",
                value: size.clone(),
            })?;
        }
        if let Some(path) = lookup("FXN_LIBRARY_PATH") {
            self.library_path = Some(PathBuf::from(path));
        }
        Ok(())
    }
}
