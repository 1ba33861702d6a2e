use async_trait::async_trait;
use log::{debug, warn};

use crate::error::{AccountPlanError, Result};
use crate::llm::types::CompletionResponse;

/// A text-completion backend with a primary and a fallback call path.
///
/// Implementations must be safe to share between concurrent pipeline runs.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn generate_content(&self, model: &str, contents: &str) -> Result<CompletionResponse>;

    /// Only invoked after [`generate_content`](Self::generate_content) has failed.
    async fn generate(&self, model: &str, prompt: &str) -> Result<CompletionResponse>;
}

/// Call the primary path, retrying once through the fallback path.
///
/// When both fail the error carries both messages, since either may explain the failure.
pub async fn complete_with_fallback(
    service: &dyn CompletionService,
    model: &str,
    prompt: &str,
) -> Result<CompletionResponse> {
    match service.generate_content(model, prompt).await {
        Ok(resp) => Ok(resp),
        Err(primary) => {
            warn!("Primary generate_content call failed: {}", primary);
            match service.generate(model, prompt).await {
                Ok(resp) => {
                    debug!("Fallback generate call succeeded");
                    Ok(resp)
                }
                Err(fallback) => {
                    warn!("Fallback generate call failed: {}", fallback);
                    Err(AccountPlanError::SynthesisTransport {
                        primary: primary.to_string(),
                        fallback: fallback.to_string(),
                    })
                }
            }
        }
    }
}
