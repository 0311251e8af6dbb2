use std::time::Instant;

use tracing::info;

use recap_core::config::DigestConfig;

use crate::provider::{CompletionClient, CompletionRequest, ProviderError, TokenUsage};
use crate::tier::ModelTier;
use crate::tokenizer::Tokenizer;

/// Generated text plus the accounting needed to report on it.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
    pub tier: ModelTier,
    pub model: String,
}

/// Central agent runtime. Holds the completion client, tokenizer and digest
/// settings. Shared across handlers via Arc in the host state.
pub struct AgentRuntime {
    client: Box<dyn CompletionClient>,
    tokenizer: Box<dyn Tokenizer>,
    config: DigestConfig,
}

impl AgentRuntime {
    pub fn new(
        client: Box<dyn CompletionClient>,
        tokenizer: Box<dyn Tokenizer>,
        config: DigestConfig,
    ) -> Self {
        Self {
            client,
            tokenizer,
            config,
        }
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    /// Send `prompt` to the model configured for `tier`. Errors are returned unchanged.
    pub async fn complete(&self, tier: ModelTier, prompt: &str) -> Result<Completion, ProviderError> {
        let model = tier.model(&self.config).to_string();
        let request = CompletionRequest {
            model: model.clone(),
            prompt: prompt.to_string(),
            params: self.config.generation,
        };

        let start = Instant::now();
        let response = self.client.complete(&request).await?;
        info!(
            provider = self.client.name(),
            model = %response.model,
            tier = %tier,
            tokens = response.usage.total_tokens,
            stop_reason = %response.stop_reason,
            duration_ms = start.elapsed().as_millis() as u64,
            "completion finished"
        );

        Ok(Completion {
            text: response.content,
            usage: response.usage,
            tier,
            model,
        })
    }
}
