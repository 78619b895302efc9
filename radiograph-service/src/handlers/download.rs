use crate::handlers::session_error;
use crate::models::analysis::{REPORT_CONTENT_TYPE, REPORT_FILE_NAME};
use crate::services::session_registry::current_key;
use crate::AppState;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use service_core::error::AppError;
use tower_sessions::Session;

/// Download the current analysis text as a markdown file.
pub async fn download_report(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let snapshot = match current_key(&session).await.map_err(session_error)? {
        Some(key) => state.sessions.snapshot(key),
        None => Default::default(),
    };

    let outcome = snapshot
        .result()
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("No analysis result available")))?;

    Ok((
        [
            (header::CONTENT_TYPE, REPORT_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", REPORT_FILE_NAME),
            ),
        ],
        outcome.display_text(),
    )
        .into_response())
}

/// Serve the uploaded radiograph for the preview panel.
pub async fn image_preview(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let snapshot = match current_key(&session).await.map_err(session_error)? {
        Some(key) => state.sessions.snapshot(key),
        None => Default::default(),
    };

    let image = snapshot
        .image()
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("No radiograph uploaded")))?;

    Ok((
        [
            (header::CONTENT_TYPE, image.mime().as_str()),
            (header::CACHE_CONTROL, "no-store"),
        ],
        image.bytes.clone(),
    )
        .into_response())
}
