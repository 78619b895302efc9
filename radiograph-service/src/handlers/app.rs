use crate::handlers::session_error;
use crate::models::{Phase, SessionState};
use crate::services::session_registry::current_key;
use crate::utils::render_markdown;
use crate::AppState;
use askama::Template;
use chrono::{DateTime, Utc};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use service_core::error::AppError;
use tower_sessions::Session;

/// Redirect target after an analysis; the query names the outcome it
/// completed so the notice never applies to a later one.
pub fn completed_location(completed_at: DateTime<Utc>) -> String {
    format!("/?completed={}", completed_at.timestamp_millis())
}

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    pub completed: Option<String>,
}

pub struct ImageView {
    pub filename: String,
    pub mime_type: &'static str,
    pub size: String,
}

pub struct ResultView {
    pub html: String,
    pub failed: bool,
    pub stale: bool,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub phase: &'static str,
    pub is_idle: bool,
    pub is_analyzing: bool,
    pub image: Option<ImageView>,
    pub result: Option<ResultView>,
    pub notice: Option<&'static str>,
}

impl IndexTemplate {
    /// `completed` is the millisecond timestamp carried by the analyze
    /// redirect, if any.
    pub fn from_state(state: &SessionState, completed: Option<i64>) -> Self {
        let phase = state.phase();

        let image = state.image().map(|image| ImageView {
            filename: image.filename.clone(),
            mime_type: image.mime().as_str(),
            size: format_size(image.size_bytes()),
        });

        let result = state.result().map(|outcome| ResultView {
            html: render_markdown(&outcome.display_text()),
            failed: outcome.is_failure(),
            stale: state.result_is_stale(),
        });

        let just_completed = phase == Phase::Analyzed
            && state
                .result()
                .is_some_and(|outcome| Some(outcome.completed_at.timestamp_millis()) == completed);
        let notice = just_completed.then_some("Analysis completed!");

        Self {
            phase: phase.as_str(),
            is_idle: phase == Phase::Idle,
            is_analyzing: phase == Phase::Analyzing,
            image,
            result,
            notice,
        }
    }
}

fn format_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.0} KB", (bytes as f64 / 1024.0).ceil())
    }
}

pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<IndexQuery>,
) -> Result<IndexTemplate, AppError> {
    let snapshot = match current_key(&session).await.map_err(session_error)? {
        Some(key) => state.sessions.snapshot(key),
        None => SessionState::default(),
    };

    let completed = query.completed.and_then(|v| v.parse::<i64>().ok());
    Ok(IndexTemplate::from_state(&snapshot, completed))
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "radiograph-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness check: the analysis provider must be usable.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.analysis_client.provider().health_check().await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "error": e.to_string() })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisOutcome, UploadedImage};
    use axum::body::Bytes;

    #[test]
    fn idle_page_shows_upload_prompt() {
        let html = IndexTemplate::from_state(&SessionState::default(), None)
            .render()
            .unwrap();
        assert!(html.contains("Please upload a dental radiograph image to begin analysis"));
        assert!(html.contains("What this tool analyzes"));
    }

    #[test]
    fn analyzed_page_renders_result_and_download() {
        let mut state = SessionState::default();
        state
            .upload(UploadedImage::new("radiograph.png", None, Bytes::from_static(b"x")))
            .unwrap();
        let sent = state.begin_analysis().unwrap();
        state
            .complete_analysis(AnalysisOutcome::new(sent.id, Ok("**Findings:** none".into())))
            .unwrap();

        let completed = state.result().unwrap().completed_at.timestamp_millis();
        let page = IndexTemplate::from_state(&state, Some(completed));
        assert_eq!(page.notice, Some("Analysis completed!"));

        let html = page.render().unwrap();
        assert!(html.contains("<strong>Findings:</strong>"));
        assert!(html.contains("Download Analysis Report"));
        assert!(html.contains("radiograph.png"));
        assert!(html.contains("src=\"/static/app.js\""));
        assert!(!html.contains("onsubmit="));
        assert!(!html.contains("onchange="));
    }

    #[test]
    fn notice_only_matches_its_own_outcome() {
        let mut state = SessionState::default();
        state
            .upload(UploadedImage::new("radiograph.png", None, Bytes::from_static(b"x")))
            .unwrap();
        let sent = state.begin_analysis().unwrap();
        state
            .complete_analysis(AnalysisOutcome::new(sent.id, Ok("ok".into())))
            .unwrap();
        let completed = state.result().unwrap().completed_at.timestamp_millis();

        assert_eq!(IndexTemplate::from_state(&state, None).notice, None);
        assert_eq!(IndexTemplate::from_state(&state, Some(completed - 1)).notice, None);
        assert_eq!(
            completed_location(state.result().unwrap().completed_at),
            format!("/?completed={}", completed)
        );
    }

    #[test]
    fn notice_requires_a_result() {
        let mut state = SessionState::default();
        state
            .upload(UploadedImage::new("a.jpg", None, Bytes::from_static(b"x")))
            .unwrap();
        assert_eq!(IndexTemplate::from_state(&state, Some(0)).notice, None);
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(10), "1 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
