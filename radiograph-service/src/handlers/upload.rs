use crate::handlers::session_error;
use crate::models::image::{is_accepted_filename, ACCEPTED_EXTENSIONS};
use crate::models::UploadedImage;
use crate::services::session_registry::ensure_key;
use crate::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::Redirect,
};
use service_core::error::AppError;
use tower_sessions::Session;

/// Multipart field carrying the radiograph.
pub const FILE_FIELD: &str = "file";

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(anyhow::anyhow!(err.body_text()))
    }
}

/// Accept a single radiograph and make it the session's current image.
pub async fn upload_handler(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        // Browsers send an empty part when no file was chosen
        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            continue;
        }

        if !is_accepted_filename(&file_name) {
            tracing::warn!(file_name = %file_name, "Rejected upload with unsupported extension");
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Unsupported file type: {} (accepted: {})",
                file_name,
                ACCEPTED_EXTENSIONS.join(", ")
            )));
        }

        let declared_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some(UploadedImage::new(file_name, declared_type, data));
        break;
    }

    let image = upload
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No radiograph file was provided")))?;

    let key = ensure_key(&session).await.map_err(session_error)?;

    tracing::info!(
        workspace = %key,
        file_name = %image.filename,
        declared_type = image.declared_type.as_deref().unwrap_or("-"),
        mime_type = %image.mime(),
        size = image.size_bytes(),
        "Radiograph uploaded"
    );

    state.sessions.update(key, |s| s.upload(image))?;

    Ok(Redirect::to("/"))
}
