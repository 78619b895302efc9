use crate::handlers::session_error;
use crate::models::{AnalysisErrorKind, ImageMime, Phase, SessionState};
use crate::services::session_registry::current_key;
use crate::AppState;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use service_core::error::AppError;
use tower_sessions::Session;

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultSummary>,
}

#[derive(Debug, Serialize)]
pub struct ImageSummary {
    pub filename: String,
    pub declared_type: Option<String>,
    pub mime_type: ImageMime,
    pub size_bytes: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Completed,
    Failed,
}

#[derive(Debug, Serialize)]
pub struct ResultSummary {
    pub status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<AnalysisErrorKind>,
    pub text: String,
    pub stale: bool,
    pub completed_at: DateTime<Utc>,
}

impl From<&SessionState> for SessionView {
    fn from(state: &SessionState) -> Self {
        let image = state.image().map(|image| ImageSummary {
            filename: image.filename.clone(),
            declared_type: image.declared_type.clone(),
            mime_type: image.mime(),
            size_bytes: image.size_bytes(),
        });

        let result = state.result().map(|outcome| ResultSummary {
            status: if outcome.is_failure() {
                ResultStatus::Failed
            } else {
                ResultStatus::Completed
            },
            error_kind: outcome.result.as_ref().err().map(|e| e.kind),
            text: outcome.display_text(),
            stale: state.result_is_stale(),
            completed_at: outcome.completed_at,
        });

        Self {
            phase: state.phase(),
            image,
            result,
        }
    }
}

/// JSON snapshot of the caller's session.
pub async fn session_snapshot(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<SessionView>, AppError> {
    let snapshot = match current_key(&session).await.map_err(session_error)? {
        Some(key) => state.sessions.snapshot(key),
        None => SessionState::default(),
    };

    Ok(Json(SessionView::from(&snapshot)))
}
