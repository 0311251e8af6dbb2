//! Transcript extraction: fetch, filter and order.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use recap_core::config::MIN_MESSAGES;
use recap_core::types::Message;

use super::channel::ChatChannel;
use super::error::PipelineError;

/// Channel messages in ascending creation order, no duplicate ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn from_messages(mut messages: Vec<Message>) -> Self {
        messages.sort_by_key(|m| (m.created_at, m.id));
        let mut seen = HashSet::with_capacity(messages.len());
        messages.retain(|m| seen.insert(m.id));
        Self { messages }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Remove and return the chronologically oldest message.
    pub fn drop_oldest(&mut self) -> Option<Message> {
        if self.messages.is_empty() {
            None
        } else {
            Some(self.messages.remove(0))
        }
    }
}

/// Window settings for one extraction.
#[derive(Debug, Clone, Copy)]
pub struct ExtractParams {
    pub scan_limit: usize,
    /// Messages at or before this instant are ignored.
    pub cutoff: DateTime<Utc>,
    pub bot_id: u64,
}

/// Drop empty messages, the bot's own messages, and anything not after the cutoff.
pub fn filter_history(messages: Vec<Message>, params: &ExtractParams) -> Vec<Message> {
    messages
        .into_iter()
        .filter(|m| !m.content.is_empty())
        .filter(|m| m.author_id != params.bot_id)
        .filter(|m| m.created_at > params.cutoff)
        .collect()
}

/// Fetch and filter the channel window. Fails with `InsufficientHistory`
/// when fewer than [`MIN_MESSAGES`] remain.
pub async fn extract(
    channel: &dyn ChatChannel,
    params: &ExtractParams,
) -> Result<Transcript, PipelineError> {
    let fetched = channel.fetch_history(params.scan_limit).await?;
    let scanned = fetched.len();
    let transcript = Transcript::from_messages(filter_history(fetched, params));

    debug!(
        channel_id = channel.channel_id(),
        scanned,
        kept = transcript.len(),
        cutoff = %params.cutoff,
        "transcript extracted"
    );

    if transcript.len() < MIN_MESSAGES {
        return Err(PipelineError::InsufficientHistory {
            found: transcript.len(),
            required: MIN_MESSAGES,
        });
    }
    Ok(transcript)
}
