use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A user mentioned inside a message body (`<@id>` in the raw content).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub id: u64,
    pub display_name: String,
}

/// The message a reply points at.
///
/// `Unresolvable` covers deleted messages and references the platform did
/// not hand back with the fetched history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRef {
    Resolved { author: String, content: String },
    Unresolvable,
}

/// One channel message as fetched from the platform. Never mutated after fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub author_name: String,
    pub author_id: u64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub attachments: usize,
    pub embeds: usize,
    pub reference: Option<MessageRef>,
    pub mentions: Vec<Mention>,
}

impl Message {
    /// Plain text message with no attachments, embeds, reply or mentions.
    pub fn text(
        id: u64,
        author_id: u64,
        author_name: impl Into<String>,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            author_name: author_name.into(),
            author_id,
            content: content.into(),
            created_at,
            attachments: 0,
            embeds: 0,
            reference: None,
            mentions: Vec::new(),
        }
    }
}

/// Which bot action a rate-limit record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Summary,
    MentionReply,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::MentionReply => "mention-reply",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "summary" => Ok(Self::Summary),
            "mention-reply" => Ok(Self::MentionReply),
            other => Err(format!("unknown action kind: {other}")),
        }
    }
}

/// Last successful invocation of an action in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRecord {
    pub channel_id: u64,
    pub action: ActionKind,
    pub last_invoked: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_kind_round_trips_through_str() {
        for kind in [ActionKind::Summary, ActionKind::MentionReply] {
            let parsed: ActionKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("financial-advice".parse::<ActionKind>().is_err());
    }

    #[test]
    fn action_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&ActionKind::MentionReply).unwrap();
        assert_eq!(json, r#""mention-reply""#);
    }
}
