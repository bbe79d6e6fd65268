use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, info};

use crate::api::AnalysisResult;
use crate::error::{DashboardError, Result};
use crate::preview::PreviewSource;
use crate::video::SelectedFile;

/// Identifies one analysis request issued by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether an analysis request is outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Idle,
    Busy { ticket: RequestTicket },
}

/// The four interaction states the dashboard can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewState {
    /// Nothing selected
    Empty,

    /// A video is selected and can be submitted
    Previewing,

    /// The selected video is being analysed
    Processing,

    /// Summary and processed video are available
    ResultShown,
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ViewState::Empty => "empty",
            ViewState::Previewing => "previewing",
            ViewState::Processing => "processing",
            ViewState::ResultShown => "result shown",
        };
        f.write_str(label)
    }
}

/// State of one dashboard session.
///
/// Fields are only changed through the transition methods. A request is
/// identified by the ticket handed out by [`UploadSession::start_request`];
/// completions carrying any other ticket are ignored.
#[derive(Debug)]
pub struct UploadSession {
    file: Option<SelectedFile>,
    preview: Option<PreviewSource>,
    phase: RequestPhase,
    summary: Option<Value>,
    processed_video: Option<String>,
    issued: u64,
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            file: None,
            preview: None,
            phase: RequestPhase::Idle,
            summary: None,
            processed_video: None,
            issued: 0,
        }
    }

    /// Select a new video.
    ///
    /// Replaces the previous preview (releasing it) and clears any result.
    /// Returns the ticket of a request that was in flight, which is now stale.
    pub fn select(&mut self, file: SelectedFile, preview: PreviewSource) -> Option<RequestTicket> {
        let superseded = self.invalidate_request();
        debug!("🔄 Selecting {} (preview {})", file.filename, preview.url());

        self.file = Some(file);
        self.preview = Some(preview);
        self.summary = None;
        self.processed_video = None;
        superseded
    }

    /// Drop the selected video and everything derived from it
    pub fn drop_video(&mut self) -> Option<RequestTicket> {
        let superseded = self.invalidate_request();
        self.file = None;
        self.preview = None;
        self.summary = None;
        self.processed_video = None;
        debug!("🗑️  Session cleared");
        superseded
    }

    /// Begin an analysis request for the selected video
    pub fn start_request(&mut self) -> Result<(RequestTicket, SelectedFile)> {
        let file = self.file.clone().ok_or(DashboardError::NoFileSelected)?;

        if let RequestPhase::Busy { .. } = self.phase {
            return Err(DashboardError::RequestInFlight);
        }
        if self.processed_video.is_some() {
            return Err(DashboardError::ResultAlreadyShown);
        }

        self.issued += 1;
        let ticket = RequestTicket(self.issued);
        self.phase = RequestPhase::Busy { ticket };
        info!("📤 Analysis request {} started for {}", ticket, file.filename);
        Ok((ticket, file))
    }

    /// Record a successful analysis. Returns false if the ticket is stale.
    pub fn succeed(&mut self, ticket: RequestTicket, result: AnalysisResult) -> bool {
        if !self.is_current(ticket) {
            debug!("Ignoring stale completion {}", ticket);
            return false;
        }

        self.phase = RequestPhase::Idle;
        self.summary = Some(result.summary);
        self.processed_video = Some(result.processed_video);
        info!("✅ Analysis request {} completed", ticket);
        true
    }

    /// Record a failed analysis. Returns false if the ticket is stale.
    pub fn fail(&mut self, ticket: RequestTicket) -> bool {
        if !self.is_current(ticket) {
            debug!("Ignoring stale failure {}", ticket);
            return false;
        }

        self.phase = RequestPhase::Idle;
        true
    }

    fn is_current(&self, ticket: RequestTicket) -> bool {
        matches!(self.phase, RequestPhase::Busy { ticket: current } if current == ticket)
    }

    fn invalidate_request(&mut self) -> Option<RequestTicket> {
        match std::mem::replace(&mut self.phase, RequestPhase::Idle) {
            RequestPhase::Busy { ticket } => {
                info!("🚫 Request {} superseded", ticket);
                Some(ticket)
            }
            RequestPhase::Idle => None,
        }
    }

    /// Current interaction state
    pub fn view(&self) -> ViewState {
        if self.file.is_none() {
            ViewState::Empty
        } else if self.is_processing() {
            ViewState::Processing
        } else if self.processed_video.is_some() {
            ViewState::ResultShown
        } else {
            ViewState::Previewing
        }
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.phase, RequestPhase::Busy { .. })
    }

    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn preview(&self) -> Option<&PreviewSource> {
        self.preview.as_ref()
    }

    pub fn summary(&self) -> Option<&Value> {
        self.summary.as_ref()
    }

    pub fn processed_video(&self) -> Option<&str> {
        self.processed_video.as_deref()
    }
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}
