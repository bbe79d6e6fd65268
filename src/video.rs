use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::UploadConfig;
use crate::error::{DashboardError, Result};

/// File picker filter, the equivalent of an `accept=".mov,.mp4"` hint
#[derive(Debug, Clone)]
pub struct AcceptFilter {
    extensions: Vec<String>,
    enforce: bool,
}

impl AcceptFilter {
    pub fn new(extensions: &[String], enforce: bool) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            enforce,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(&config.accepted_extensions, config.enforce_extensions)
    }

    /// Check whether a path carries one of the accepted extensions
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    pub fn is_enforced(&self) -> bool {
        self.enforce
    }

    /// Render the filter the way a file dialog shows it
    pub fn pattern(&self) -> String {
        self.extensions
            .iter()
            .map(|ext| format!(".{}", ext))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for AcceptFilter {
    fn default() -> Self {
        Self::from_config(&crate::config::Config::default().upload)
    }
}

/// A local video chosen by the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub filename: String,
    pub extension: Option<String>,
    pub size_bytes: u64,
}

impl SelectedFile {
    /// Open a user-chosen file, applying the picker filter.
    ///
    /// Only existence and the optional size limit are checked; the content
    /// is never inspected.
    pub async fn open(path: &Path, filter: &AcceptFilter, max_file_size: u64) -> Result<Self> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|_| DashboardError::InvalidFile(path.to_path_buf()))?;
        if !metadata.is_file() {
            return Err(DashboardError::InvalidFile(path.to_path_buf()));
        }

        if !filter.matches(path) {
            if filter.is_enforced() {
                return Err(DashboardError::UnsupportedExtension(display_extension(path)));
            }
            warn!(
                "⚠️  {} does not match the picker filter {}, continuing anyway",
                path.display(),
                filter.pattern()
            );
        }

        if max_file_size > 0 && metadata.len() > max_file_size {
            return Err(DashboardError::InvalidFile(path.to_path_buf()));
        }

        let selected = Self {
            path: path.to_path_buf(),
            filename: path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| "video".to_string()),
            extension: path
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase()),
            size_bytes: metadata.len(),
        };

        info!(
            "📹 Selected video: {} ({:.1} MB)",
            selected.filename,
            selected.size_bytes as f64 / 1_000_000.0
        );
        Ok(selected)
    }

    /// MIME type sent with the multipart part
    pub fn mime_type(&self) -> &'static str {
        match self.extension.as_deref() {
            Some("mp4") | Some("m4v") => "video/mp4",
            Some("mov") => "video/quicktime",
            Some("webm") => "video/webm",
            Some("mkv") => "video/x-matroska",
            Some("avi") => "video/x-msvideo",
            _ => "application/octet-stream",
        }
    }

    /// Read the whole file for upload
    pub async fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }

    /// Calculate MD5 hash of the video file
    pub async fn calculate_hash(&self) -> Result<String> {
        let content = tokio::fs::read(&self.path).await?;
        let hash = md5::compute(&content);
        Ok(format!("{:x}", hash))
    }
}

fn display_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_else(|| "(none)".to_string())
}

/// List the files a picker with `filter` would offer inside `dir`
pub fn discover_videos(dir: &Path, filter: &AcceptFilter, recursive: bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(DashboardError::InvalidFile(dir.to_path_buf()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut videos: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && filter.matches(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    videos.sort();
    debug!("📁 Found {} pickable videos in {}", videos.len(), dir.display());
    Ok(videos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_filter_matches_case_insensitively() {
        let filter = AcceptFilter::default();
        assert!(filter.matches(Path::new("squat.MP4")));
        assert!(filter.matches(Path::new("jump.mov")));
        assert!(!filter.matches(Path::new("notes.txt")));
        assert!(!filter.matches(Path::new("no_extension")));
        assert_eq!(filter.pattern(), ".mov,.mp4");
    }

    #[tokio::test]
    async fn test_open_is_advisory_by_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.avi");
        tokio::fs::write(&path, b"not really a video").await.unwrap();

        let selected = assert_ok!(SelectedFile::open(&path, &AcceptFilter::default(), 0).await);
        assert_eq!(selected.filename, "clip.avi");
        assert_eq!(selected.size_bytes, 18);
        assert_eq!(selected.mime_type(), "video/x-msvideo");
    }

    #[tokio::test]
    async fn test_open_rejects_when_enforced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.avi");
        tokio::fs::write(&path, b"x").await.unwrap();

        let filter = AcceptFilter::new(&["mp4".to_string()], true);
        let err = SelectedFile::open(&path, &filter, 0).await.unwrap_err();
        assert!(matches!(err, DashboardError::UnsupportedExtension(ext) if ext == ".avi"));
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let err = SelectedFile::open(Path::new("/definitely/missing.mp4"), &AcceptFilter::default(), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidFile(_)));
    }

    #[tokio::test]
    async fn test_open_respects_size_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.mp4");
        tokio::fs::write(&path, vec![0u8; 64]).await.unwrap();

        assert_err!(SelectedFile::open(&path, &AcceptFilter::default(), 32).await);
        assert_ok!(SelectedFile::open(&path, &AcceptFilter::default(), 64).await);
    }

    #[test]
    fn test_discover_videos() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"a").unwrap();
        std::fs::write(dir.path().join("b.MOV"), b"b").unwrap();
        std::fs::write(dir.path().join("c.txt"), b"c").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/d.mp4"), b"d").unwrap();

        let filter = AcceptFilter::default();
        let flat = discover_videos(dir.path(), &filter, false).unwrap();
        assert_eq!(flat.len(), 2);

        let deep = discover_videos(dir.path(), &filter, true).unwrap();
        assert_eq!(deep.len(), 3);
    }
}
