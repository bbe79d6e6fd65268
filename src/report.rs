use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::api::AnalysisResult;
use crate::error::Result;
use crate::video::SelectedFile;

/// Record of one completed analysis, saved as JSON on request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub server: String,
    pub video: SelectedFile,
    /// MD5 of the uploaded file
    pub checksum: Option<String>,
    pub summary: Value,
    pub processed_video: String,
    pub downloaded_to: Option<PathBuf>,
}

impl AnalysisReport {
    pub fn new(server: &str, video: SelectedFile, result: &AnalysisResult) -> Self {
        Self {
            generated_at: Utc::now(),
            server: server.to_string(),
            video,
            checksum: None,
            summary: result.summary.clone(),
            processed_video: result.processed_video.clone(),
            downloaded_to: None,
        }
    }

    pub fn with_checksum(mut self, checksum: String) -> Self {
        self.checksum = Some(checksum);
        self
    }

    pub fn with_download(mut self, path: PathBuf) -> Self {
        self.downloaded_to = Some(path);
        self
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json_content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json_content).await?;
        info!("📝 Report saved to {}", path.display());
        Ok(())
    }
}
