//! Local cache for predictor resources.
//!
//! Resources (weights, graphs, auxiliary files) are downloaded once into a
//! cache directory and handed to the engine by path. Writes go to a unique
//! temporary file that is renamed into place, so a concurrent reader never
//! observes a partially written resource.

pub mod cache;
pub mod download;
pub mod error;

pub use cache::ResourceCache;
pub use download::{HttpFetcher, ProgressCallback, ResourceFetcher};
pub use error::{ResourceCacheError, Result};
