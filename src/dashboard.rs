//! The dashboard controller.
//!
//! Owns the session, the preview registry and the analysis service, and
//! turns user actions into session transitions. Background submissions
//! report back through a channel so the owner applies every transition.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::api::{AnalysisResult, AnalysisService};
use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::preview::PreviewStore;
use crate::render;
use crate::state::{RequestTicket, UploadSession, ViewState};
use crate::video::{AcceptFilter, SelectedFile};

/// Result of a background request, delivered to the owning loop
#[derive(Debug)]
pub struct Completion {
    pub ticket: RequestTicket,
    pub outcome: Result<AnalysisResult>,
}

pub struct Dashboard {
    config: Config,
    filter: AcceptFilter,
    previews: PreviewStore,
    session: UploadSession,
    service: Arc<dyn AnalysisService>,
    in_flight: Option<(RequestTicket, JoinHandle<()>)>,
}

impl Dashboard {
    pub fn new(config: Config, service: Arc<dyn AnalysisService>) -> Self {
        let filter = AcceptFilter::from_config(&config.upload);
        Self {
            config,
            filter,
            previews: PreviewStore::new(),
            session: UploadSession::new(),
            service,
            in_flight: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn filter(&self) -> &AcceptFilter {
        &self.filter
    }

    pub fn session(&self) -> &UploadSession {
        &self.session
    }

    pub fn previews(&self) -> &PreviewStore {
        &self.previews
    }

    pub fn view(&self) -> ViewState {
        self.session.view()
    }

    /// Pick a video; any previous preview and result are discarded
    pub async fn choose(&mut self, path: &Path) -> Result<()> {
        let file = SelectedFile::open(path, &self.filter, self.config.upload.max_file_size).await?;
        let preview = self.previews.create(&file.path);
        let superseded = self.session.select(file, preview);
        self.cancel(superseded);
        Ok(())
    }

    /// Clear the selection and everything derived from it
    pub fn drop_video(&mut self) {
        let superseded = self.session.drop_video();
        self.cancel(superseded);
        info!("🗑️  Video dropped");
    }

    fn cancel(&mut self, superseded: Option<RequestTicket>) {
        let Some(ticket) = superseded else { return };
        if let Some((running, handle)) = self.in_flight.take() {
            if running == ticket {
                handle.abort();
                info!("🛑 Cancelled analysis request {}", ticket);
            } else {
                self.in_flight = Some((running, handle));
            }
        }
    }

    /// Submit the selected video and wait for the analysis
    pub async fn submit(&mut self) -> Result<AnalysisResult> {
        let (ticket, file) = self.start()?;
        let outcome = self.service.analyze(&file).await;
        self.apply(ticket, outcome)
            .unwrap_or_else(|| Err(DashboardError::Superseded(ticket.id())))
    }

    /// Submit on a background task; the completion arrives on `tx`
    pub fn submit_background(&mut self, tx: mpsc::UnboundedSender<Completion>) -> Result<RequestTicket> {
        let (ticket, file) = self.start()?;
        let service = Arc::clone(&self.service);

        let handle = tokio::spawn(async move {
            let outcome = service.analyze(&file).await;
            if tx.send(Completion { ticket, outcome }).is_err() {
                warn!("Dashboard closed before request {} completed", ticket);
            }
        });
        self.in_flight = Some((ticket, handle));
        Ok(ticket)
    }

    fn start(&mut self) -> Result<(RequestTicket, SelectedFile)> {
        self.session.start_request().inspect_err(|e| {
            if let DashboardError::NoFileSelected = e {
                warn!("Submission attempted without a selected video");
            }
        })
    }

    /// Apply a background completion.
    ///
    /// Returns `None` when the completion belongs to a superseded request.
    pub fn complete(&mut self, completion: Completion) -> Option<Result<AnalysisResult>> {
        if matches!(&self.in_flight, Some((ticket, _)) if *ticket == completion.ticket) {
            self.in_flight = None;
        }
        self.apply(completion.ticket, completion.outcome)
    }

    fn apply(&mut self, ticket: RequestTicket, outcome: Result<AnalysisResult>) -> Option<Result<AnalysisResult>> {
        match outcome {
            Ok(result) => {
                if self.session.succeed(ticket, result.clone()) {
                    Some(Ok(result))
                } else {
                    None
                }
            }
            Err(e) => {
                if self.session.fail(ticket) {
                    error!("❌ Analysis failed: {}", e);
                    Some(Err(e))
                } else {
                    None
                }
            }
        }
    }

    /// Render the current view
    pub fn render(&self) -> String {
        render::render_session(&self.session, &self.filter)
    }

    /// Abort outstanding work and release the preview
    pub fn shutdown(&mut self) {
        if let Some((ticket, handle)) = self.in_flight.take() {
            handle.abort();
            info!("🛑 Aborted analysis request {} on shutdown", ticket);
        }
        self.session.drop_video();
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        if let Some((_, handle)) = self.in_flight.take() {
            handle.abort();
        }
    }
}
