//! Per-session interaction state machine.
//!
//! ```text
//! Idle --upload--> Uploaded --analyze--> Analyzing --done--> Analyzed
//!                     ^                                          |
//!                     +------------- upload (new file) ----------+
//! any --clear--> Idle
//! ```
//!
//! The phase is derived from what the state holds rather than stored, so
//! an image and a result can never disagree with the reported phase.

use super::analysis::AnalysisOutcome;
use super::image::UploadedImage;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Uploaded,
    Analyzing,
    Analyzed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Uploaded => "uploaded",
            Phase::Analyzing => "analyzing",
            Phase::Analyzed => "analyzed",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("No radiograph has been uploaded")]
    NoImage,

    #[error("An analysis is already running for this session")]
    AnalysisInFlight,

    #[error("The radiograph changed while it was being analyzed")]
    StaleOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    image: Option<UploadedImage>,
    result: Option<AnalysisOutcome>,
    /// Upload id of the analysis currently in flight.
    in_flight: Option<Uuid>,
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        let Some(image) = &self.image else {
            return Phase::Idle;
        };

        if self.in_flight.is_some() {
            return Phase::Analyzing;
        }

        match &self.result {
            Some(outcome) if outcome.upload_id == image.id => Phase::Analyzed,
            _ => Phase::Uploaded,
        }
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        self.image.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisOutcome> {
        self.result.as_ref()
    }

    /// True when the held result was produced for an earlier upload.
    pub fn result_is_stale(&self) -> bool {
        match (&self.image, &self.result) {
            (Some(image), Some(outcome)) => outcome.upload_id != image.id,
            _ => false,
        }
    }

    /// Replace the current image. A previous result stays visible until the
    /// next analysis or an explicit clear.
    pub fn upload(&mut self, image: UploadedImage) -> Result<(), TransitionError> {
        if self.in_flight.is_some() {
            return Err(TransitionError::AnalysisInFlight);
        }
        self.image = Some(image);
        Ok(())
    }

    /// Enter `Analyzing` and hand back the image to send.
    pub fn begin_analysis(&mut self) -> Result<UploadedImage, TransitionError> {
        let image = self.image.as_ref().ok_or(TransitionError::NoImage)?;
        if self.in_flight.is_some() {
            return Err(TransitionError::AnalysisInFlight);
        }
        self.in_flight = Some(image.id);
        Ok(image.clone())
    }

    /// Record the outcome of the in-flight analysis. Success and failure
    /// both land in `Analyzed`.
    pub fn complete_analysis(&mut self, outcome: AnalysisOutcome) -> Result<(), TransitionError> {
        if self.in_flight != Some(outcome.upload_id) {
            return Err(TransitionError::StaleOutcome);
        }
        self.in_flight = None;
        self.result = Some(outcome);
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
