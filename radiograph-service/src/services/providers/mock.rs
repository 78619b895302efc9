//! Mock provider for local runs and tests.

use super::{ImageInput, ProviderError, ProviderResponse, VisionProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Canned-response vision provider.
pub struct MockVisionProvider {
    reply: Option<String>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockVisionProvider {
    /// Always answers with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fails with an API error.
    pub fn failing() -> Self {
        Self {
            reply: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Simulate a slow upstream.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of `generate` calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    async fn generate(
        &self,
        prompt: &str,
        image: ImageInput<'_>,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.reply {
            Some(reply) => Ok(ProviderResponse {
                text: reply.clone(),
                input_tokens: (prompt.len() + image.bytes.len()) as i32 / 4,
                output_tokens: reply.len() as i32 / 4,
            }),
            None => Err(ProviderError::ApiError(
                "Mock provider configured to fail".to_string(),
            )),
        }
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn model(&self) -> &str {
        "mock"
    }
}
