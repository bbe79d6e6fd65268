//! Error types for the movement analysis dashboard

use std::path::PathBuf;

/// Result type for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Alert shown when a submission is attempted without a selected video
pub const NO_FILE_ALERT: &str = "Please select a video first!";

/// Alert shown for every failed analysis request
pub const ANALYSIS_FAILED_ALERT: &str = "Analysis failed. Check console for errors.";

/// Error types for dashboard operations
#[derive(thiserror::Error, Debug)]
pub enum DashboardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("No video selected")]
    NoFileSelected,

    #[error("An analysis request is already in flight")]
    RequestInFlight,

    #[error("A processed result is already shown; drop or choose a new video first")]
    ResultAlreadyShown,

    #[error("Not a readable video file: {}", .0.display())]
    InvalidFile(PathBuf),

    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("Cannot read {} for upload: {source}", .path.display())]
    UploadRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Request {0} was superseded by a newer selection")]
    Superseded(u64),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DashboardError {
    /// True for failures that happened while talking to the analysis service.
    ///
    /// All of these share one recovery path: the session goes back to
    /// previewing and the user may resubmit.
    pub fn is_request_failure(&self) -> bool {
        matches!(
            self,
            DashboardError::Http(_)
                | DashboardError::UploadRead { .. }
                | DashboardError::Json(_)
                | DashboardError::Server { .. }
                | DashboardError::InvalidResponse(_)
                | DashboardError::Timeout(_)
        )
    }

    /// The user-facing alert for this error, if the dashboard shows one
    pub fn alert(&self) -> Option<&'static str> {
        match self {
            DashboardError::NoFileSelected => Some(NO_FILE_ALERT),
            e if e.is_request_failure() => Some(ANALYSIS_FAILED_ALERT),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failures_share_one_alert() {
        let server = DashboardError::Server {
            status: 500,
            message: "boom".to_string(),
        };
        let invalid = DashboardError::InvalidResponse("missing download_url".to_string());

        assert_eq!(server.alert(), Some(ANALYSIS_FAILED_ALERT));
        assert_eq!(invalid.alert(), Some(ANALYSIS_FAILED_ALERT));
        assert_eq!(DashboardError::Timeout(5).alert(), Some(ANALYSIS_FAILED_ALERT));

        let unreadable = DashboardError::UploadRead {
            path: PathBuf::from("/videos/gone.mp4"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(unreadable.is_request_failure());
        assert_eq!(unreadable.alert(), Some(ANALYSIS_FAILED_ALERT));
    }

    #[test]
    fn test_superseded_request_is_silent() {
        let superseded = DashboardError::Superseded(3);
        assert!(!superseded.is_request_failure());
        assert_eq!(superseded.alert(), None);
    }

    #[test]
    fn test_no_file_alert() {
        assert_eq!(DashboardError::NoFileSelected.alert(), Some(NO_FILE_ALERT));
        assert!(!DashboardError::NoFileSelected.is_request_failure());
        assert_eq!(DashboardError::RequestInFlight.alert(), None);
    }
}
