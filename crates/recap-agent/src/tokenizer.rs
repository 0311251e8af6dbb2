//! Token counting for prompt budgeting.

use tiktoken_rs::CoreBPE;

/// Counts tokens the way the completion service will. Must be deterministic.
pub trait Tokenizer: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// GPT-2 byte-pair encoding (`r50k_base`).
pub struct Gpt2Tokenizer {
    bpe: CoreBPE,
}

impl Gpt2Tokenizer {
    pub fn new() -> Result<Self, TokenizerError> {
        let bpe = tiktoken_rs::r50k_base().map_err(|e| TokenizerError(e.to_string()))?;
        Ok(Self { bpe })
    }
}

impl Tokenizer for Gpt2Tokenizer {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to load tokenizer vocabulary: {0}")]
pub struct TokenizerError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_is_deterministic() {
        let tok = Gpt2Tokenizer::new().unwrap();
        let text = "user alice at 12:00 {message:0}:\n hello there";
        assert_eq!(tok.count(text), tok.count(text));
        assert!(tok.count(text) > 0);
        assert_eq!(tok.count(""), 0);
    }
}
