//! Discord channel history as a pipeline [`ChatChannel`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::builder::GetMessages;
use serenity::http::Http;
use serenity::model::channel::Message as DiscordMessage;
use serenity::model::id::{ChannelId, GuildId, MessageId};
use serenity::model::user::User;
use tracing::debug;

use recap_agent::pipeline::{ChannelError, ChatChannel};
use recap_core::types::{Mention, Message, MessageRef};

/// Discord REST returns at most 100 messages per page.
const PAGE_SIZE: usize = 100;
/// Snowflake epoch (2015-01-01T00:00:00Z) in milliseconds.
const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

pub struct DiscordChannel {
    http: Arc<Http>,
    channel_id: ChannelId,
    guild_id: Option<GuildId>,
}

impl DiscordChannel {
    pub fn new(http: Arc<Http>, channel_id: ChannelId, guild_id: Option<GuildId>) -> Self {
        Self {
            http,
            channel_id,
            guild_id,
        }
    }
}

#[async_trait]
impl ChatChannel for DiscordChannel {
    fn channel_id(&self) -> u64 {
        self.channel_id.get()
    }

    fn guild_id(&self) -> Option<u64> {
        self.guild_id.map(|g| g.get())
    }

    async fn fetch_history(&self, limit: usize) -> Result<Vec<Message>, ChannelError> {
        let mut out = Vec::with_capacity(limit);
        let mut before: Option<MessageId> = None;

        while out.len() < limit {
            let page = (limit - out.len()).min(PAGE_SIZE);
            let mut builder = GetMessages::new().limit(page as u8);
            if let Some(id) = before {
                builder = builder.before(id);
            }

            let batch = self
                .channel_id
                .messages(self.http.as_ref(), builder)
                .await
                .map_err(|e| ChannelError(e.to_string()))?;

            let Some(oldest) = batch.last() else {
                break;
            };
            before = Some(oldest.id);
            let exhausted = batch.len() < page;
            out.extend(batch.iter().map(to_message));
            if exhausted {
                break;
            }
        }

        debug!(channel_id = %self.channel_id, fetched = out.len(), limit, "history fetched");
        Ok(out)
    }
}

/// Name shown for a user: global display name, falling back to the username.
pub fn display_name(user: &User) -> &str {
    user.global_name.as_deref().unwrap_or(&user.name)
}

/// Creation time encoded in a Discord snowflake id, millisecond precision.
pub fn snowflake_time(id: u64) -> DateTime<Utc> {
    let ms = (id >> 22) as i64 + DISCORD_EPOCH_MS;
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Convert a serenity message into the pipeline's platform-neutral form.
pub fn to_message(msg: &DiscordMessage) -> Message {
    let reference = msg.message_reference.as_ref().map(|_| {
        match msg.referenced_message.as_deref() {
            Some(quoted) => MessageRef::Resolved {
                author: display_name(&quoted.author).to_string(),
                content: quoted.content.clone(),
            },
            None => MessageRef::Unresolvable,
        }
    });

    Message {
        id: msg.id.get(),
        author_name: display_name(&msg.author).to_string(),
        author_id: msg.author.id.get(),
        content: msg.content.clone(),
        created_at: snowflake_time(msg.id.get()),
        attachments: msg.attachments.len(),
        embeds: msg.embeds.len(),
        reference,
        mentions: msg
            .mentions
            .iter()
            .map(|u| Mention {
                id: u.id.get(),
                display_name: display_name(u).to_string(),
            })
            .collect(),
    }
}
