use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Configuration for the movement analysis dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Analysis service location
    pub server: ServerConfig,

    /// File selection and upload settings
    pub upload: UploadConfig,

    /// Request behaviour
    pub request: RequestConfig,

    /// Output and logging settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the analysis service; processed video paths resolve against it
    pub base_url: String,

    /// Path of the analysis endpoint
    pub analyze_path: String,

    /// Path probed by the health check
    pub health_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Extensions offered by the file picker (advisory unless enforced)
    pub accepted_extensions: Vec<String>,

    /// Reject files outside `accepted_extensions` instead of warning
    pub enforce_extensions: bool,

    /// Multipart field carrying the video
    pub field_name: String,

    /// Maximum file size in bytes (0 = no limit)
    pub max_file_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Total request timeout in seconds (0 = wait indefinitely)
    pub timeout_seconds: u64,

    /// Connection timeout in seconds (0 = reqwest default)
    pub connect_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,

    /// Where downloaded processed videos are written
    pub download_dir: PathBuf,

    /// Record an MD5 checksum of the uploaded file in reports
    pub compute_checksum: bool,
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let mut config_paths = vec![
            PathBuf::from("movement-analyzer.toml"),
            PathBuf::from("config/movement-analyzer.toml"),
        ];
        if let Ok(home) = std::env::var("HOME") {
            config_paths.push(Path::new(&home).join(".config/movement-analyzer/config.toml"));
        }

        for path in &config_paths {
            if path.exists() {
                match Self::load_from(path) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config file {}: {}", path.display(), e),
                }
            }
        }

        // Try environment variables
        Self::from_env()
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Cannot read {}: {}", path.display(), e))?;
        let mut config: Config = toml::from_str(&config_str)?;
        config.apply_env();
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `MOVEMENT_ANALYZER_*` overrides from `lookup`
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("MOVEMENT_ANALYZER_SERVER_URL") {
            self.server.base_url = url;
        }

        if let Some(timeout) = lookup("MOVEMENT_ANALYZER_TIMEOUT") {
            match timeout.trim().parse() {
                Ok(seconds) => self.request.timeout_seconds = seconds,
                Err(_) => tracing::warn!(
                    "Ignoring MOVEMENT_ANALYZER_TIMEOUT={:?}, expected whole seconds; keeping {}",
                    timeout,
                    self.request.timeout_seconds
                ),
            }
        }

        if let Some(log_level) = lookup("MOVEMENT_ANALYZER_LOG_LEVEL") {
            self.output.log_level = log_level;
        }

        if let Some(dir) = lookup("MOVEMENT_ANALYZER_DOWNLOAD_DIR") {
            self.output.download_dir = PathBuf::from(dir);
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.server.base_url)
            .map_err(|e| anyhow!("Invalid server.base_url {}: {}", self.server.base_url, e))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(anyhow!("server.base_url must be http or https"));
        }

        if !self.server.analyze_path.starts_with('/') {
            return Err(anyhow!("server.analyze_path must start with '/'"));
        }

        if self.upload.accepted_extensions.is_empty() {
            return Err(anyhow!("upload.accepted_extensions must not be empty"));
        }

        if self.upload.field_name.trim().is_empty() {
            return Err(anyhow!("upload.field_name must not be empty"));
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.server.base_url.trim_end_matches('/')
    }

    /// Absolute URL of the analysis endpoint
    pub fn analyze_url(&self) -> String {
        format!("{}{}", self.base_url(), self.server.analyze_path)
    }

    /// Absolute URL probed by the health check
    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url(), self.server.health_path)
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Movement Analyzer Configuration:\n\
            - Server: {}\n\
            - Analyze Endpoint: {}\n\
            - Accepted Extensions: {}{}\n\
            - Upload Field: {}\n\
            - Timeout: {}\n\
            - Download Directory: {}",
            self.base_url(),
            self.analyze_url(),
            self.upload.accepted_extensions.join(", "),
            if self.upload.enforce_extensions { " (enforced)" } else { " (advisory)" },
            self.upload.field_name,
            if self.request.timeout_seconds == 0 {
                "none".to_string()
            } else {
                format!("{}s", self.request.timeout_seconds)
            },
            self.output.download_dir.display(),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upload: UploadConfig::default(),
            request: RequestConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            analyze_path: "/analyze".to_string(),
            health_path: "/".to_string(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            accepted_extensions: vec!["mov".to_string(), "mp4".to_string()],
            enforce_extensions: false,
            field_name: "file".to_string(),
            max_file_size: 0, // No limit
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 0,
            connect_timeout_seconds: 10,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            download_dir: PathBuf::from("./processed"),
            compute_checksum: true,
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.config.request.timeout_seconds = seconds;
        self
    }

    pub fn with_download_dir(mut self, dir: PathBuf) -> Self {
        self.config.output.download_dir = dir;
        self
    }

    pub fn enforce_extensions(mut self, enforce: bool) -> Self {
        self.config.upload.enforce_extensions = enforce;
        self
    }

    pub fn compute_checksum(mut self, enable: bool) -> Self {
        self.config.output.compute_checksum = enable;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
