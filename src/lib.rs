//! Movement Analyzer
//!
//! Dashboard client for the movement analysis service: pick a local video,
//! preview it, submit it for analysis and review the returned summary and
//! processed video.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod preview;
pub mod render;
pub mod report;
pub mod state;
pub mod video;

// Re-export main types for easy access
pub use crate::api::{AnalysisClient, AnalysisResult, AnalysisService, HealthStatus};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::dashboard::{Completion, Dashboard};
pub use crate::error::{DashboardError, Result};
pub use crate::preview::{PreviewSource, PreviewStore};
pub use crate::report::AnalysisReport;
pub use crate::state::{RequestPhase, RequestTicket, UploadSession, ViewState};
pub use crate::video::{AcceptFilter, SelectedFile};
