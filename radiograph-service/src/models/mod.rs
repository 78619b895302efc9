pub mod analysis;
pub mod image;
pub mod session;

pub use analysis::{AnalysisError, AnalysisErrorKind, AnalysisOutcome};
pub use image::{ImageMime, UploadedImage};
pub use session::{Phase, SessionState, TransitionError};
