//! Completion provider abstraction
//!
//! The turn processor only depends on [`CompletionService`]; concrete
//! providers live in submodules.

mod error;
mod openai;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use openai::{OpenAICompatService, ProviderConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use types::*;

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;

/// Common interface for streaming completion providers
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Open a streamed completion for the given ordered messages
    async fn stream(&self, request: &CompletionRequest) -> Result<FragmentStream, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for completion services
pub struct LoggingService {
    inner: Arc<dyn CompletionService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn CompletionService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl CompletionService for LoggingService {
    async fn stream(&self, request: &CompletionRequest) -> Result<FragmentStream, LlmError> {
        let start = Instant::now();
        let result = self.inner.stream(request).await;
        let open_ms = start.elapsed().as_millis();

        match result {
            Ok(fragments) => {
                tracing::info!(
                    model = %self.model_id,
                    open_ms = %open_ms,
                    messages = request.messages.len(),
                    "Completion stream opened"
                );

                let model_id = self.model_id.clone();
                let mut count = 0usize;
                let logged = fragments.inspect(move |fragment| match fragment {
                    Ok(_) => count += 1,
                    Err(e) => tracing::error!(
                        model = %model_id,
                        fragments = count,
                        kind = ?e.kind,
                        error = %e.message,
                        "Completion stream failed"
                    ),
                });
                Ok(Box::pin(logged))
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    open_ms = %open_ms,
                    kind = ?e.kind,
                    error = %e.message,
                    "Completion request failed"
                );
                Err(e)
            }
        }
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
