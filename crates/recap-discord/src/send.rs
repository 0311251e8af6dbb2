//! Outbound rendering of digests: embeds, prompt log attachment, replies.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serenity::builder::{CreateAttachment, CreateEmbed, CreateEmbedFooter, CreateMessage};
use serenity::http::Http;
use serenity::model::id::{ChannelId, MessageId};

use recap_agent::pipeline::Digest;

const SUMMARY_TITLE: &str = "Chat Summarization";
const SUMMARY_COLOUR: u32 = 0x3498db;
const EMPTY_OUTPUT: &str = "(the model returned no text)";

/// Footer with token accounting for a summary.
pub fn footer_text(digest: &Digest) -> String {
    format!(
        "Request cost: ${:.2} | Tokens: {}",
        digest.cost_usd, digest.completion.usage.total_tokens
    )
}

/// Attachment name for the prompt log.
pub fn prompt_filename(at: DateTime<Utc>) -> String {
    format!("prompt_log_{}.txt", at.format("%Y-%m-%d_%H-%M-%S"))
}

/// Human-readable wait, e.g. `14m 05s` or `42s`.
pub fn format_wait(wait: Duration) -> String {
    let secs = wait.as_secs().max(1);
    if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

fn chunks_or_placeholder(digest: &Digest) -> Vec<&str> {
    if digest.chunks.is_empty() {
        vec![EMPTY_OUTPUT]
    } else {
        digest.chunks.iter().map(String::as_str).collect()
    }
}

/// One embed per chunk; the title goes on the first, the footer on the last.
pub fn summary_embeds(digest: &Digest) -> Vec<CreateEmbed> {
    let chunks = chunks_or_placeholder(digest);
    let last = chunks.len() - 1;
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut e = CreateEmbed::new().description(chunk).colour(SUMMARY_COLOUR);
            if i == 0 {
                e = e.title(SUMMARY_TITLE);
            }
            if i == last {
                e = e.footer(CreateEmbedFooter::new(footer_text(digest)));
            }
            e
        })
        .collect()
}

/// Post a summary to `channel_id`, one message per embed, prompt log attached to the last.
pub async fn send_summary(
    http: &Http,
    channel_id: ChannelId,
    digest: &Digest,
) -> Result<(), serenity::Error> {
    let embeds = summary_embeds(digest);
    let last = embeds.len() - 1;
    for (i, embed) in embeds.into_iter().enumerate() {
        let mut msg = CreateMessage::new().embed(embed);
        if i == last {
            let log = CreateAttachment::bytes(
                digest.prompt.as_bytes().to_vec(),
                prompt_filename(Utc::now()),
            );
            msg = msg.add_file(log);
        }
        channel_id.send_message(http, msg).await?;
    }
    Ok(())
}

/// Reply to `reply_to` with the digest chunks as embeds.
pub async fn send_reply(
    http: &Http,
    channel_id: ChannelId,
    reply_to: MessageId,
    digest: &Digest,
) -> Result<(), serenity::Error> {
    for (i, chunk) in chunks_or_placeholder(digest).into_iter().enumerate() {
        let mut msg = CreateMessage::new().embed(CreateEmbed::new().description(chunk));
        if i == 0 {
            msg = msg.reference_message((channel_id, reply_to));
        }
        channel_id.send_message(http, msg).await?;
    }
    Ok(())
}

/// Plain-text reply, used for cooldown and no-op notices.
pub async fn send_notice(
    http: &Http,
    channel_id: ChannelId,
    reply_to: MessageId,
    text: &str,
) -> Result<(), serenity::Error> {
    let msg = CreateMessage::new()
        .content(text)
        .reference_message((channel_id, reply_to));
    channel_id.send_message(http, msg).await.map(|_| ())
}
