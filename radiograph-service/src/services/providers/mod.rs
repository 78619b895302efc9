//! Multimodal model provider abstractions and implementations.
//!
//! The analysis client talks to a `VisionProvider`; Gemini is the production
//! backend and the mock backs local runs and tests.

pub mod gemini;
pub mod mock;

use crate::models::ImageMime;
use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Response blocked by content filter")]
    ContentFiltered,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Image part of a request.
#[derive(Debug, Clone, Copy)]
pub struct ImageInput<'a> {
    pub bytes: &'a [u8],
    pub mime: ImageMime,
}

/// Result of a provider response.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Generated text.
    pub text: String,

    /// Input tokens consumed.
    pub input_tokens: i32,

    /// Output tokens generated.
    pub output_tokens: i32,
}

/// Trait for image + text generation providers (e.g., Gemini).
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Generate a text response for one image and an instruction prompt.
    async fn generate(
        &self,
        prompt: &str,
        image: ImageInput<'_>,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;

    /// Model identifier, for logs.
    fn model(&self) -> &str;
}
