use std::time::Duration;

use recap_core::types::ActionKind;
use recap_memory::{MemoryError, RateLimitError};

use crate::provider::ProviderError;

use super::channel::ChannelError;

/// Ways a digest invocation can end without producing output.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("not enough history: {found} messages, need {required}")]
    InsufficientHistory { found: usize, required: usize },

    #[error("{action} is on cooldown for another {}s", remaining.as_secs())]
    RateLimited {
        action: ActionKind,
        remaining: Duration,
    },

    #[error("prompt does not fit: {tokens} tokens, budget {budget}")]
    Unfittable { tokens: usize, budget: usize },

    #[error(transparent)]
    Completion(#[from] ProviderError),

    #[error(transparent)]
    History(#[from] ChannelError),

    #[error("rate limit store: {0}")]
    Store(#[from] MemoryError),
}

impl From<RateLimitError> for PipelineError {
    fn from(e: RateLimitError) -> Self {
        match e {
            RateLimitError::Cooldown { action, remaining } => Self::RateLimited { action, remaining },
            RateLimitError::Store(e) => Self::Store(e),
        }
    }
}
