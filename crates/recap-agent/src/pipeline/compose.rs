use chrono::FixedOffset;

use crate::tokenizer::Tokenizer;

use super::normalize::normalize;
use super::transcript::Transcript;

/// The full prompt sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptDocument {
    pub prefix: String,
    pub body: String,
    pub suffix: String,
    pub text: String,
    pub tokens: usize,
}

/// Wraps a rendered transcript in a fixed prefix and suffix.
#[derive(Debug, Clone)]
pub struct Composer {
    prefix: String,
    suffix: String,
    offset: FixedOffset,
}

impl Composer {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>, offset: FixedOffset) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            offset,
        }
    }

    /// Render `transcript` and count the result with `tokenizer`.
    pub fn compose(&self, transcript: &Transcript, tokenizer: &dyn Tokenizer) -> PromptDocument {
        let mut ordered: Vec<_> = transcript.iter().collect();
        ordered.sort_by_key(|m| (m.created_at, m.id));

        let body = ordered
            .iter()
            .enumerate()
            .map(|(i, m)| normalize(m, i, self.offset))
            .collect::<Vec<_>>()
            .join("\n")
            .replace("\n\n", "\n");

        let text = format!("{}\n\n{}\n\n{}", self.prefix, body, self.suffix);
        let tokens = tokenizer.count(&text);

        PromptDocument {
            prefix: self.prefix.clone(),
            body,
            suffix: self.suffix.clone(),
            text,
            tokens,
        }
    }
}
