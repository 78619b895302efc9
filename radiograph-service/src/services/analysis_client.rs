//! Radiograph analysis client.
//!
//! Wraps a shared `VisionProvider` with the fixed periodontal analysis
//! prompt. Every provider failure is folded into a typed `AnalysisError`.

use super::metrics;
use super::providers::{ImageInput, ProviderError, VisionProvider};
use crate::models::{AnalysisError, AnalysisErrorKind, ImageMime};
use std::sync::Arc;
use std::time::Instant;

/// Instruction sent alongside every radiograph.
pub const ANALYSIS_PROMPT: &str = include_str!("../../prompts/periodontal_analysis.md");

impl From<ProviderError> for AnalysisError {
    fn from(err: ProviderError) -> Self {
        let kind = match &err {
            ProviderError::NotConfigured(_) => AnalysisErrorKind::NotConfigured,
            ProviderError::Unauthorized(_) => AnalysisErrorKind::Authentication,
            ProviderError::RateLimited(_) => AnalysisErrorKind::RateLimited,
            ProviderError::ContentFiltered => AnalysisErrorKind::ContentFiltered,
            ProviderError::MalformedResponse(_) => AnalysisErrorKind::MalformedResponse,
            ProviderError::ApiError(_) => AnalysisErrorKind::Api,
            ProviderError::NetworkError(_) => AnalysisErrorKind::Network,
        };
        AnalysisError::new(kind, err.to_string())
    }
}

#[derive(Clone)]
pub struct AnalysisClient {
    provider: Arc<dyn VisionProvider>,
    prompt: &'static str,
}

impl AnalysisClient {
    pub fn new(provider: Arc<dyn VisionProvider>) -> Self {
        Self {
            provider,
            prompt: ANALYSIS_PROMPT,
        }
    }

    pub fn provider(&self) -> &Arc<dyn VisionProvider> {
        &self.provider
    }

    /// One outbound call per invocation; no retries, no caching.
    pub async fn analyze(&self, image: &[u8], mime: ImageMime) -> Result<String, AnalysisError> {
        let started = Instant::now();
        let result = self
            .provider
            .generate(self.prompt, ImageInput { bytes: image, mime })
            .await;
        let elapsed = started.elapsed();

        match result {
            Ok(response) => {
                tracing::info!(
                    model = %self.provider.model(),
                    mime_type = %mime,
                    image_bytes = image.len(),
                    input_tokens = response.input_tokens,
                    output_tokens = response.output_tokens,
                    duration_ms = elapsed.as_millis() as u64,
                    "Radiograph analysis completed"
                );
                metrics::record_analysis("success", elapsed);
                Ok(response.text)
            }
            Err(err) => {
                let err = AnalysisError::from(err);
                tracing::warn!(
                    model = %self.provider.model(),
                    kind = err.kind.as_str(),
                    error = %err.message,
                    duration_ms = elapsed.as_millis() as u64,
                    "Radiograph analysis failed"
                );
                metrics::record_analysis(err.kind.as_str(), elapsed);
                Err(err)
            }
        }
    }
}
