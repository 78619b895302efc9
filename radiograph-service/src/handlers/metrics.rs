use axum::response::IntoResponse;
use service_core::error::AppError;

pub async fn metrics() -> Result<impl IntoResponse, AppError> {
    crate::services::metrics::gather()
        .map_err(|e| AppError::InternalError(anyhow::Error::new(e)))
}
