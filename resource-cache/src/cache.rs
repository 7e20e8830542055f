//! On-disk cache of predictor resources.

use crate::download::{HttpFetcher, ProgressCallback, ResourceFetcher};
use crate::error::{ResourceCacheError, Result};
use fxn_values::PredictionResource;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Filesystem cache for predictor resources.
///
/// Each resource lives at `<root>/<name>`, where the name is the resource's
/// explicit name or else the last path segment of its URL. A resource that is
/// already present is returned without touching the network.
pub struct ResourceCache {
    root: PathBuf,
    fetcher: Arc<dyn ResourceFetcher>,
}

impl ResourceCache {
    /// Create a cache rooted at `root`, downloading over HTTP.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self::with_fetcher(root, Arc::new(HttpFetcher::new()))
    }

    pub fn with_fetcher<P: AsRef<Path>>(root: P, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            fetcher,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a resource is cached at, whether or not it has been fetched yet.
    pub fn path_for(&self, resource: &PredictionResource) -> Result<PathBuf> {
        let name = resource_name(resource)?;
        Ok(self.root.join(name))
    }

    /// Check if a resource is cached
    pub async fn contains(&self, resource: &PredictionResource) -> Result<bool> {
        let path = self.path_for(resource)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    /// Return the local path of `resource`, downloading it first if needed.
    pub async fn retrieve(&self, resource: &PredictionResource) -> Result<PathBuf> {
        self.retrieve_with_progress(resource, None).await
    }

    pub async fn retrieve_with_progress(
        &self,
        resource: &PredictionResource,
        progress: Option<ProgressCallback>,
    ) -> Result<PathBuf> {
        let path = self.path_for(resource)?;
        if tokio::fs::try_exists(&path).await? {
            log::debug!("Resource already cached: {}", path.display());
            return Ok(path);
        }

        tokio::fs::create_dir_all(&self.root).await?;

        log::info!("Fetching {} resource from {}", resource.resource_type, resource.url);
        let data = self.fetcher.fetch(&resource.url, progress).await?;

        // Write next to the final location so the rename stays on one filesystem.
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp = self
            .root
            .join(format!(".{}.tmp-{}", file_name, uuid::Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&temp, &data).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }

        log::info!("Cached {} ({} bytes)", path.display(), data.len());

        Ok(path)
    }

    /// Delete a cached resource. Returns `false` if it was not cached.
    pub async fn remove(&self, resource: &PredictionResource) -> Result<bool> {
        let path = self.path_for(resource)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                log::info!("Removed cached resource {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Cache file name for a resource.
fn resource_name(resource: &PredictionResource) -> Result<String> {
    let name = match &resource.name {
        Some(name) => name.clone(),
        None => {
            let path = resource
                .url
                .split(['?', '#'])
                .next()
                .unwrap_or(&resource.url);
            path.trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string()
        }
    };

    if !is_safe_file_name(&name) {
        return Err(ResourceCacheError::InvalidName(name));
    }
    Ok(name)
}

/// Validate a cache file name (single path component, no traversal)
fn is_safe_file_name(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }

    if name.contains('/') || name.contains('\\') || name.contains('\0') {
        return false;
    }

    // Reserved for in-flight downloads
    !name.starts_with('.')
}
