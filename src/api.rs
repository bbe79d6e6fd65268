//! Client for the remote analysis service.
//!
//! The service accepts one video per `POST /analyze` request as
//! `multipart/form-data` and answers with an opaque summary plus the path of
//! a processed video hosted by the same server.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::video::SelectedFile;

/// Body of a successful analysis response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub summary: Value,
    pub download_url: String,
}

/// Body of a failed analysis response
#[derive(Debug, Clone, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Outcome of an analysis as shown by the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Opaque summary, displayed verbatim
    pub summary: Value,

    /// Absolute reference to the processed video
    pub processed_video: String,
}

/// Health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub status: u16,
    pub message: Option<String>,
}

/// Anything that can analyse a selected video
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, file: &SelectedFile) -> Result<AnalysisResult>;
}

/// Resolve the `download_url` of a response against the server base URL.
///
/// Relative paths are appended to the base; absolute http(s) URLs are kept.
pub fn resolve_download_url(base_url: &str, download_url: &str) -> Result<String> {
    if let Ok(absolute) = Url::parse(download_url) {
        if matches!(absolute.scheme(), "http" | "https") {
            return Ok(absolute.to_string());
        }
    }

    let download_url = download_url.trim();
    if download_url.is_empty() {
        return Err(DashboardError::InvalidResponse("empty download_url".to_string()));
    }

    let base = base_url.trim_end_matches('/');
    let resolved = if download_url.starts_with('/') {
        format!("{}{}", base, download_url)
    } else {
        format!("{}/{}", base, download_url)
    };

    // Make sure the result is something a player can open
    Url::parse(&resolved)?;
    Ok(resolved)
}

/// Parse a raw response body into an [`AnalysisResponse`]
pub fn parse_analysis_body(body: &str) -> Result<AnalysisResponse> {
    let json: Value = serde_json::from_str(body)?;

    let summary = json
        .get("summary")
        .cloned()
        .ok_or_else(|| DashboardError::InvalidResponse("missing summary".to_string()))?;
    let download_url = json["download_url"]
        .as_str()
        .ok_or_else(|| DashboardError::InvalidResponse("missing download_url".to_string()))?
        .to_string();

    Ok(AnalysisResponse {
        summary,
        download_url,
    })
}

/// HTTP client for the analysis service
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    config: Config,
    client: reqwest::Client,
}

impl AnalysisClient {
    pub fn new(config: Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if config.request.timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(config.request.timeout_seconds));
        }
        if config.request.connect_timeout_seconds > 0 {
            builder = builder.connect_timeout(Duration::from_secs(config.request.connect_timeout_seconds));
        }
        let client = builder.build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn map_send_error(&self, e: reqwest::Error) -> DashboardError {
        if e.is_timeout() {
            DashboardError::Timeout(self.config.request.timeout_seconds)
        } else {
            DashboardError::Http(e)
        }
    }

    /// Upload a video and wait for its analysis
    pub async fn submit(&self, file: &SelectedFile) -> Result<AnalysisResult> {
        let endpoint = self.config.analyze_url();
        info!("🌐 Submitting {} to {}", file.filename, endpoint);

        let video_data = file
            .read_bytes()
            .await
            .map_err(|e| match e {
                DashboardError::Io(source) => DashboardError::UploadRead {
                    path: file.path.clone(),
                    source,
                },
                other => other,
            })?;
        let form = reqwest::multipart::Form::new().part(
            self.config.upload.field_name.clone(),
            reqwest::multipart::Part::bytes(video_data)
                .file_name(file.filename.clone())
                .mime_str(file.mime_type())?,
        );

        let start_time = std::time::Instant::now();
        let response = self
            .client
            .post(&endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            return Err(DashboardError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let parsed = parse_analysis_body(&body)?;
        let processed_video = resolve_download_url(self.config.base_url(), &parsed.download_url)?;

        info!(
            "✅ Analysis completed in {:.1}s: {}",
            start_time.elapsed().as_secs_f64(),
            processed_video
        );

        Ok(AnalysisResult {
            summary: parsed.summary,
            processed_video,
        })
    }

    /// Probe the service root
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = self.config.health_url();
        debug!("Checking analysis service at {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body["message"].as_str().map(str::to_string));

        if !status.is_success() {
            warn!("Analysis service health check failed: {}", status);
        }

        Ok(HealthStatus {
            healthy: status.is_success(),
            status: status.as_u16(),
            message,
        })
    }

    /// Stream a processed video into `dir`, returning the written path
    pub async fn download(&self, reference: &str, dir: &Path) -> Result<PathBuf> {
        let url = Url::parse(reference)?;
        let filename = url
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|name| !name.is_empty())
            .unwrap_or("processed.mp4")
            .to_string();

        tokio::fs::create_dir_all(dir).await?;
        let target = dir.join(&filename);
        info!("⬇️  Downloading {} to {}", url, target.display());

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(DashboardError::Server {
                status: status.as_u16(),
                message,
            });
        }

        // Write next to the target and move into place once complete
        let temp = tempfile::NamedTempFile::new_in(dir)?;
        let mut out = tokio::fs::File::from_std(temp.reopen()?);
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.map_send_error(e))?;
            out.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        out.flush().await?;
        drop(out);

        temp.persist(&target).map_err(|e| DashboardError::Io(e.error))?;
        info!("💾 Saved processed video ({:.1} MB)", written as f64 / 1_000_000.0);
        Ok(target)
    }
}

#[async_trait]
impl AnalysisService for AnalysisClient {
    async fn analyze(&self, file: &SelectedFile) -> Result<AnalysisResult> {
        self.submit(file).await
    }
}
