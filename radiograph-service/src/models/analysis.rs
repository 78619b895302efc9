//! Analysis results as held in session state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// File name offered by the download action.
pub const REPORT_FILE_NAME: &str = "dental_radiography_analysis.md";

/// Content type of the downloadable report.
pub const REPORT_CONTENT_TYPE: &str = "text/markdown; charset=utf-8";

/// Broad cause of a failed analysis call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisErrorKind {
    NotConfigured,
    Network,
    Authentication,
    RateLimited,
    ContentFiltered,
    MalformedResponse,
    Api,
}

impl AnalysisErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisErrorKind::NotConfigured => "not_configured",
            AnalysisErrorKind::Network => "network",
            AnalysisErrorKind::Authentication => "authentication",
            AnalysisErrorKind::RateLimited => "rate_limited",
            AnalysisErrorKind::ContentFiltered => "content_filtered",
            AnalysisErrorKind::MalformedResponse => "malformed_response",
            AnalysisErrorKind::Api => "api",
        }
    }
}

/// Any failure of the outbound analysis call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Error analyzing image: {message}")]
pub struct AnalysisError {
    pub kind: AnalysisErrorKind,
    pub message: String,
}

impl AnalysisError {
    pub fn new(kind: AnalysisErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The result of one analyze action, tied to the upload it was run on.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub upload_id: Uuid,
    pub result: Result<String, AnalysisError>,
    pub completed_at: DateTime<Utc>,
}

impl AnalysisOutcome {
    pub fn new(upload_id: Uuid, result: Result<String, AnalysisError>) -> Self {
        Self {
            upload_id,
            result,
            completed_at: Utc::now(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }

    /// Text shown in the result slot and offered for download. Failures
    /// render through the same path as model output.
    pub fn display_text(&self) -> String {
        match &self.result {
            Ok(text) => text.clone(),
            Err(err) => err.to_string(),
        }
    }

    /// Metric label for this outcome.
    pub fn outcome_label(&self) -> &'static str {
        match &self.result {
            Ok(_) => "success",
            Err(err) => err.kind.as_str(),
        }
    }
}
