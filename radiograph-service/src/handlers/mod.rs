//! HTTP handlers: the interaction controller for the single analysis page.

pub mod analysis;
pub mod app;
pub mod download;
pub mod metrics;
pub mod session;
pub mod upload;

use crate::models::TransitionError;
use service_core::error::AppError;

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::Conflict(anyhow::Error::new(err))
    }
}

pub(crate) fn session_error(err: tower_sessions::session::Error) -> AppError {
    AppError::InternalError(anyhow::Error::new(err).context("Session store failure"))
}
