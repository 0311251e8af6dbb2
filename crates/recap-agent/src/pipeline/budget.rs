//! Token budget trimming.
//!
//! Compose, count, and drop the oldest message until the document fits.
//! Positional tags are re-rendered on every pass because indices shift as
//! the front of the transcript is removed.

use tracing::debug;

use crate::tier::ModelTier;
use crate::tokenizer::Tokenizer;

use super::compose::{Composer, PromptDocument};
use super::error::PipelineError;
use super::transcript::Transcript;

/// A transcript that fits the budget, with its rendered document.
#[derive(Debug, Clone)]
pub struct Trimmed {
    pub transcript: Transcript,
    pub document: PromptDocument,
    pub tier: ModelTier,
    /// Messages dropped from the front to fit.
    pub removed: usize,
}

/// Shrink `transcript` from the oldest end until its document is at most `budget` tokens.
///
/// The loop runs at most `transcript.len() + 1` times. An empty transcript is
/// never a valid result.
pub fn fit_to_budget(
    mut transcript: Transcript,
    composer: &Composer,
    tokenizer: &dyn Tokenizer,
    budget: usize,
) -> Result<Trimmed, PipelineError> {
    let max_passes = transcript.len() + 1;
    let mut removed = 0;
    let mut last_tokens = 0;

    for _ in 0..max_passes {
        if transcript.is_empty() {
            break;
        }

        let document = composer.compose(&transcript, tokenizer);
        if removed == 0 {
            debug!(tokens = document.tokens, budget, messages = transcript.len(), "initial prompt size");
        }
        last_tokens = document.tokens;

        if document.tokens <= budget {
            let tier = ModelTier::for_token_count(document.tokens);
            debug!(tokens = document.tokens, removed, tier = %tier, "prompt fits budget");
            return Ok(Trimmed {
                transcript,
                document,
                tier,
                removed,
            });
        }

        transcript.drop_oldest();
        removed += 1;
    }

    Err(PipelineError::Unfittable {
        tokens: last_tokens,
        budget,
    })
}
