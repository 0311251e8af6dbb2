//! Chat platform boundary used by the transcript extractor.

use async_trait::async_trait;

use recap_core::types::Message;

/// A readable chat channel.
#[async_trait]
pub trait ChatChannel: Send + Sync {
    fn channel_id(&self) -> u64;

    /// `None` for direct messages.
    fn guild_id(&self) -> Option<u64>;

    /// Up to `limit` most recent messages, newest first.
    async fn fetch_history(&self, limit: usize) -> Result<Vec<Message>, ChannelError>;
}

#[derive(Debug, thiserror::Error)]
#[error("history fetch failed: {0}")]
pub struct ChannelError(pub String);
