//! Text rendering of the dashboard view

use serde_json::Value;
use std::fmt::Write;

use crate::state::{UploadSession, ViewState};
use crate::video::AcceptFilter;

pub const HEADLINE: &str = "Movement analysis made easy.";
pub const SUMMARY_HEADING: &str = "Color Summary";
pub const PROCESSED_HEADING: &str = "Processed Video";

/// Controls offered to the user in the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    AddVideo,
    Submit,
    Processing,
    DropVideo,
}

impl Affordance {
    pub fn label(&self) -> &'static str {
        match self {
            Affordance::AddVideo => "Add video",
            Affordance::Submit => "Submit for analysis",
            Affordance::Processing => "Processing...",
            Affordance::DropVideo => "Drop Video",
        }
    }
}

/// Which controls are visible.
///
/// "Add video" only while nothing is previewed, the submit control only
/// while a preview exists without a processed result, "Drop Video" always.
pub fn affordances(session: &UploadSession) -> Vec<Affordance> {
    let mut controls = Vec::new();
    match session.view() {
        ViewState::Empty => controls.push(Affordance::AddVideo),
        ViewState::Previewing => controls.push(Affordance::Submit),
        ViewState::Processing => controls.push(Affordance::Processing),
        ViewState::ResultShown => {}
    }
    controls.push(Affordance::DropVideo);
    controls
}

/// Pretty-print the opaque summary with two-space indentation
pub fn format_summary(summary: &Value) -> String {
    serde_json::to_string_pretty(summary).unwrap_or_else(|_| summary.to_string())
}

/// Render the whole dashboard
pub fn render_session(session: &UploadSession, filter: &AcceptFilter) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", HEADLINE);
    let _ = writeln!(out, "State: {}", session.view());
    let _ = writeln!(out);

    for control in affordances(session) {
        match control {
            Affordance::AddVideo => {
                let _ = writeln!(out, "[{}]  accepts {}", control.label(), filter.pattern());
            }
            Affordance::DropVideo => {}
            _ => {
                let _ = writeln!(out, "[{}]", control.label());
            }
        }
    }

    if let (Some(preview), Some(file)) = (session.preview(), session.file()) {
        let _ = writeln!(
            out,
            "Preview: {} ({}, {:.1} MB)",
            preview.url(),
            file.filename,
            file.size_bytes as f64 / 1_000_000.0
        );
    }

    if let Some(summary) = session.summary().filter(|summary| !summary.is_null()) {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", SUMMARY_HEADING);
        let _ = writeln!(out, "{}", format_summary(summary));
    }

    if let Some(processed) = session.processed_video() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", PROCESSED_HEADING);
        let _ = writeln!(out, "{}", processed);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "[{}]", Affordance::DropVideo.label());
    out
}

/// Render a transient alert
pub fn render_alert(message: &str) -> String {
    format!("⚠️  {}", message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AnalysisResult;
    use crate::preview::PreviewStore;
    use crate::video::SelectedFile;
    use serde_json::json;
    use std::path::PathBuf;

    fn session_with_file(store: &PreviewStore) -> UploadSession {
        let file = SelectedFile {
            path: PathBuf::from("/videos/squat.mp4"),
            filename: "squat.mp4".to_string(),
            extension: Some("mp4".to_string()),
            size_bytes: 2_500_000,
        };
        let preview = store.create(&file.path);
        let mut session = UploadSession::new();
        session.select(file, preview);
        session
    }

    #[test]
    fn test_empty_view() {
        let session = UploadSession::new();
        assert_eq!(
            affordances(&session),
            vec![Affordance::AddVideo, Affordance::DropVideo]
        );

        let text = render_session(&session, &AcceptFilter::default());
        assert!(text.contains("[Add video]  accepts .mov,.mp4"));
        assert!(!text.contains("Preview:"));
        assert!(text.contains("[Drop Video]"));
    }

    #[test]
    fn test_previewing_and_processing_views() {
        let store = PreviewStore::new();
        let mut session = session_with_file(&store);
        let text = render_session(&session, &AcceptFilter::default());
        assert!(text.contains("[Submit for analysis]"));
        assert!(text.contains("Preview: blob:movement-analyzer/1 (squat.mp4, 2.5 MB)"));

        session.start_request().unwrap();
        let text = render_session(&session, &AcceptFilter::default());
        assert!(text.contains("[Processing...]"));
        assert!(!text.contains("[Submit for analysis]"));
    }

    #[test]
    fn test_result_view_shows_summary_verbatim() {
        let store = PreviewStore::new();
        let mut session = session_with_file(&store);
        let (ticket, _) = session.start_request().unwrap();
        session.succeed(
            ticket,
            AnalysisResult {
                summary: json!({"red": 10}),
                processed_video: "http://localhost:8000/out/1.mp4".to_string(),
            },
        );

        assert_eq!(affordances(&session), vec![Affordance::DropVideo]);
        let text = render_session(&session, &AcceptFilter::default());
        assert!(text.contains("Color Summary"));
        assert!(text.contains("\"red\": 10"));
        assert!(text.contains("Processed Video\nhttp://localhost:8000/out/1.mp4"));
        assert!(!text.contains("[Add video]"));
    }

    #[test]
    fn test_null_summary_is_not_rendered() {
        let store = PreviewStore::new();
        let mut session = session_with_file(&store);
        let (ticket, _) = session.start_request().unwrap();
        session.succeed(
            ticket,
            AnalysisResult {
                summary: serde_json::Value::Null,
                processed_video: "http://localhost:8000/out/2.mp4".to_string(),
            },
        );

        let text = render_session(&session, &AcceptFilter::default());
        assert!(!text.contains("Color Summary"));
        assert!(!text.contains("null"));
        assert!(text.contains("Processed Video\nhttp://localhost:8000/out/2.mp4"));
    }

    #[test]
    fn test_format_summary_passthrough() {
        let nested = json!({"scores": [1, 2], "notes": null});
        let text = format_summary(&nested);
        assert!(text.contains("\"scores\": [\n    1,\n    2\n  ]"));
        assert!(text.contains("\"notes\": null"));
    }
}
