//! Scoped preview references for selected videos.
//!
//! A [`PreviewSource`] is the local stand-in for a browser object URL: an
//! opaque `blob:` reference that resolves to the selected file while the
//! handle is alive. Dropping the handle revokes the reference.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use url::Url;

use crate::error::{DashboardError, Result};

const PREVIEW_SCHEME_PREFIX: &str = "blob:movement-analyzer/";

#[derive(Debug, Default)]
struct Registry {
    next_id: AtomicU64,
    live: Mutex<HashMap<String, PathBuf>>,
}

impl Registry {
    fn live(&self) -> MutexGuard<'_, HashMap<String, PathBuf>> {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Registry of live preview references
#[derive(Debug, Clone, Default)]
pub struct PreviewStore {
    registry: Arc<Registry>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a preview reference for `path`
    pub fn create(&self, path: &Path) -> PreviewSource {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let url = format!("{}{}", PREVIEW_SCHEME_PREFIX, id);
        self.registry.live().insert(url.clone(), path.to_path_buf());
        debug!("🎞️  Created preview {} for {}", url, path.display());

        PreviewSource {
            url,
            path: path.to_path_buf(),
            registry: Arc::clone(&self.registry),
        }
    }

    /// Resolve a preview reference to its file, if still live
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        self.registry.live().get(url).cloned()
    }

    /// Number of preview references not yet released
    pub fn live_count(&self) -> usize {
        self.registry.live().len()
    }
}

/// A live preview reference; revoked on drop
#[derive(Debug)]
pub struct PreviewSource {
    url: String,
    path: PathBuf,
    registry: Arc<Registry>,
}

impl PreviewSource {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A `file://` URL a local player can open directly
    pub fn file_url(&self) -> Result<Url> {
        let absolute = std::fs::canonicalize(&self.path)?;
        Url::from_file_path(&absolute).map_err(|_| DashboardError::InvalidFile(absolute))
    }
}

impl Drop for PreviewSource {
    fn drop(&mut self) {
        if self.registry.live().remove(&self.url).is_some() {
            debug!("🧹 Released preview {}", self.url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_resolves_while_alive() {
        let store = PreviewStore::new();
        let preview = store.create(Path::new("/videos/squat.mp4"));

        assert!(preview.url().starts_with("blob:movement-analyzer/"));
        assert_eq!(
            store.resolve(preview.url()),
            Some(PathBuf::from("/videos/squat.mp4"))
        );
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn test_preview_released_on_drop() {
        let store = PreviewStore::new();
        let preview = store.create(Path::new("/videos/squat.mp4"));
        let url = preview.url().to_string();

        drop(preview);
        assert_eq!(store.resolve(&url), None);
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_preview_urls_are_unique() {
        let store = PreviewStore::new();
        let a = store.create(Path::new("a.mp4"));
        let b = store.create(Path::new("a.mp4"));
        assert_ne!(a.url(), b.url());
        assert_eq!(store.live_count(), 2);
    }

    #[test]
    fn test_file_url() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"x").unwrap();

        let store = PreviewStore::new();
        let preview = store.create(&path);
        let url = preview.file_url().unwrap();
        assert_eq!(url.scheme(), "file");
        assert!(url.path().ends_with("/clip.mp4"));
    }
}
