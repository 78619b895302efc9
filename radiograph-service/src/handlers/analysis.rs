use crate::handlers::app::completed_location;
use crate::handlers::session_error;
use crate::models::{AnalysisError, AnalysisErrorKind, AnalysisOutcome, TransitionError};
use crate::services::session_registry::current_key;
use crate::services::SessionRegistry;
use crate::AppState;
use axum::{extract::State, response::Redirect};
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use tower_sessions::Session;
use uuid::Uuid;

/// Run the analysis for the session's current radiograph.
///
/// The request blocks until the provider answers. The call itself runs on
/// its own task so the outcome is recorded even if the browser goes away.
pub async fn analyze_handler(
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect, AppError> {
    let key = current_key(&session)
        .await
        .map_err(session_error)?
        .ok_or(TransitionError::NoImage)?;

    let image = state
        .sessions
        .update_existing(key, |s| s.begin_analysis())
        .unwrap_or(Err(TransitionError::NoImage))?;
    let upload_id = image.id;

    tracing::info!(
        workspace = %key,
        file_name = %image.filename,
        mime_type = %image.mime(),
        "Analyzing radiograph"
    );

    let client = state.analysis_client.clone();
    let sessions = state.sessions.clone();
    let task = tokio::spawn(async move {
        let result = client.analyze(&image.bytes, image.mime()).await;
        record_outcome(&sessions, key, AnalysisOutcome::new(image.id, result))
    });

    let completed_at = match task.await {
        Ok(completed_at) => completed_at,
        Err(e) => {
            tracing::error!(workspace = %key, error = %e, "Analysis task aborted");
            let outcome = AnalysisOutcome::new(
                upload_id,
                Err(AnalysisError::new(
                    AnalysisErrorKind::Api,
                    "analysis task aborted unexpectedly",
                )),
            );
            record_outcome(&state.sessions, key, outcome)
        }
    };

    Ok(match completed_at {
        Some(at) => Redirect::to(&completed_location(at)),
        None => Redirect::to("/"),
    })
}

/// Apply `outcome` to the session. Returns its completion time when it was
/// kept, `None` when the session moved on in the meantime.
fn record_outcome(
    sessions: &SessionRegistry,
    key: Uuid,
    outcome: AnalysisOutcome,
) -> Option<DateTime<Utc>> {
    let completed_at = outcome.completed_at;
    match sessions.update_existing(key, |s| s.complete_analysis(outcome)) {
        Some(Ok(())) => Some(completed_at),
        Some(Err(e)) => {
            tracing::info!(workspace = %key, reason = %e, "Discarded analysis outcome");
            None
        }
        None => {
            tracing::info!(workspace = %key, "Session cleared during analysis");
            None
        }
    }
}

/// Drop the session's image and result in one step.
pub async fn clear_handler(
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect, AppError> {
    if let Some(key) = current_key(&session).await.map_err(session_error)? {
        state.sessions.clear(key);
        tracing::info!(workspace = %key, "Session cleared");
    }

    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Phase, UploadedImage};
    use axum::body::Bytes;

    fn in_flight(sessions: &SessionRegistry, key: Uuid) -> Uuid {
        sessions
            .update(key, |s| -> Result<UploadedImage, TransitionError> {
                s.upload(UploadedImage::new("radiograph.png", None, Bytes::from_static(b"x")))?;
                s.begin_analysis()
            })
            .unwrap()
            .id
    }

    #[test]
    fn kept_outcome_reports_completion_time() {
        let sessions = SessionRegistry::new();
        let key = Uuid::new_v4();
        let upload_id = in_flight(&sessions, key);

        let outcome = AnalysisOutcome::new(upload_id, Ok("Findings: ...".into()));
        let expected = outcome.completed_at;

        assert_eq!(record_outcome(&sessions, key, outcome), Some(expected));
        assert_eq!(sessions.snapshot(key).phase(), Phase::Analyzed);
    }

    #[test]
    fn outcome_for_another_upload_is_discarded() {
        let sessions = SessionRegistry::new();
        let key = Uuid::new_v4();
        in_flight(&sessions, key);

        let stale = AnalysisOutcome::new(Uuid::new_v4(), Ok("late".into()));
        assert_eq!(record_outcome(&sessions, key, stale), None);
        assert_eq!(sessions.snapshot(key).phase(), Phase::Analyzing);
    }

    #[test]
    fn outcome_after_clear_is_discarded() {
        let sessions = SessionRegistry::new();
        let key = Uuid::new_v4();
        let upload_id = in_flight(&sessions, key);
        sessions.clear(key);

        let outcome = AnalysisOutcome::new(
            upload_id,
            Err(AnalysisError::new(AnalysisErrorKind::Api, "aborted")),
        );
        assert_eq!(record_outcome(&sessions, key, outcome), None);
        assert!(sessions.is_empty());
    }
}
