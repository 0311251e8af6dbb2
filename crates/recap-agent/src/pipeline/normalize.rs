//! One message → one chat-log line.
//!
//! Line shape:
//!
//! ```text
//! user alice at 14:05 {message:12}:
//!  see you there <1 attachments, reply to "when is the meetup?…" from bob>
//! ```
//!
//! The `{message:N}` tag carries the message's position in the transcript so
//! the model can cite it; the post-processor turns cited tags into links.

use std::sync::LazyLock;

use chrono::FixedOffset;
use regex::Regex;

use recap_core::config::REPLY_QUOTE_CHARS;
use recap_core::types::{Mention, Message, MessageRef};

/// Trailing id of a custom emote (`<:name:123456>`).
static EMOTE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":[0-9]+>").expect("emote pattern is valid"));

/// Render `message` at transcript position `index`. Pure; never fails.
pub fn normalize(message: &Message, index: usize, offset: FixedOffset) -> String {
    let time = message.created_at.with_timezone(&offset).format("%H:%M");
    let mut text = format!(
        "user {} at {} {{message:{}}}:\n {}",
        message.author_name, time, index, message.content
    );

    let metadata = metadata(message);
    if !metadata.is_empty() {
        text.push_str(&format!(" <{}>\n", metadata.join(", ")));
    }

    rewrite_inline(&text, &message.mentions)
}

/// Replace `<@id>` / `<@!id>` with `@name` and strip custom emote ids.
pub fn rewrite_inline(text: &str, mentions: &[Mention]) -> String {
    let mut text = text.to_string();
    for mention in mentions {
        let name = format!("@{}", mention.display_name);
        text = text
            .replace(&format!("<@{}>", mention.id), &name)
            .replace(&format!("<@!{}>", mention.id), &name);
    }

    EMOTE_ID.replace_all(&text, ":>").into_owned()
}

fn metadata(message: &Message) -> Vec<String> {
    let mut metadata = Vec::new();
    if message.attachments > 0 {
        metadata.push(format!("{} attachments", message.attachments));
    }
    if message.embeds > 0 {
        metadata.push(format!("{} embeds", message.embeds));
    }
    if let Some(MessageRef::Resolved { author, content }) = &message.reference {
        let quote: String = content.chars().take(REPLY_QUOTE_CHARS).collect();
        metadata.push(format!("reply to \"{quote}\u{2026}\" from {author}"));
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn msg(content: &str) -> Message {
        Message::text(
            42,
            1,
            "alice",
            content,
            Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 0).unwrap(),
        )
    }

    #[test]
    fn plain_message_line() {
        let line = normalize(&msg("hello"), 3, utc());
        assert_eq!(line, "user alice at 14:05 {message:3}:\n hello");
    }

    #[test]
    fn time_uses_configured_offset() {
        let line = normalize(&msg("hello"), 0, FixedOffset::east_opt(2 * 3600).unwrap());
        assert!(line.starts_with("user alice at 16:05 "));
    }

    #[test]
    fn attachments_and_embeds_are_annotated() {
        let mut m = msg("look");
        m.attachments = 2;
        m.embeds = 1;
        let line = normalize(&m, 0, utc());
        assert!(line.ends_with(" look <2 attachments, 1 embeds>\n"), "{line}");
    }

    #[test]
    fn resolved_reply_quotes_first_32_chars() {
        let mut m = msg("agreed");
        m.reference = Some(MessageRef::Resolved {
            author: "bob".to_string(),
            content: "the deposit pool is almost empty again today, again".to_string(),
        });
        let line = normalize(&m, 0, utc());
        assert!(
            line.contains("<reply to \"the deposit pool is almost empty\u{2026}\" from bob>"),
            "{line}"
        );
    }

    #[test]
    fn unresolvable_reply_has_no_annotation() {
        let mut m = msg("agreed");
        m.reference = Some(MessageRef::Unresolvable);
        assert_eq!(normalize(&m, 0, utc()), "user alice at 14:05 {message:0}:\n agreed");
    }

    #[test]
    fn mentions_become_display_names() {
        let mut m = msg("ping <@123> and <@!456>");
        m.mentions = vec![
            Mention {
                id: 123,
                display_name: "bob".to_string(),
            },
            Mention {
                id: 456,
                display_name: "carol".to_string(),
            },
        ];
        let line = normalize(&m, 0, utc());
        assert!(line.ends_with("ping @bob and @carol"), "{line}");
        // source message untouched
        assert_eq!(m.content, "ping <@123> and <@!456>");
    }

    #[test]
    fn emote_ids_are_stripped() {
        let line = normalize(&msg("nice <:rocket:1034221337> <a:spin:99>"), 0, utc());
        assert!(line.ends_with("nice <:rocket:> <a:spin:>"), "{line}");
    }

    #[test]
    fn normalization_is_repeatable() {
        let mut m = msg("hi <@7> <:e:1>");
        m.mentions = vec![Mention {
            id: 7,
            display_name: "dave".to_string(),
        }];
        m.attachments = 1;
        assert_eq!(normalize(&m, 5, utc()), normalize(&m, 5, utc()));
    }
}
