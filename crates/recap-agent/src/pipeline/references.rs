//! Rewrite `{message:N}` citations in generated text into deep links.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::transcript::Transcript;

static MESSAGE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{message:(\d+)\}").expect("message tag pattern is valid"));

/// Where a transcript lives, for building links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLocation {
    /// `None` for direct messages.
    pub guild_id: Option<u64>,
    pub channel_id: u64,
}

impl ChannelLocation {
    pub fn message_link(&self, message_id: u64) -> String {
        let guild = self
            .guild_id
            .map(|g| g.to_string())
            .unwrap_or_else(|| "@me".to_string());
        format!(
            "https://discord.com/channels/{}/{}/{}",
            guild, self.channel_id, message_id
        )
    }
}

/// Replace every tag whose index is inside `transcript` with a masked link.
/// Tags pointing past the end are left as written.
pub fn resolve_references(text: &str, transcript: &Transcript, location: ChannelLocation) -> String {
    MESSAGE_TAG
        .replace_all(text, |caps: &Captures| {
            let target = caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|index| transcript.get(index));
            match target {
                Some(message) => format!("[\u{2197}]({})", location.message_link(message.id)),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Distinct in-range indices cited in `text`, ascending.
pub fn cited_indices(text: &str, transcript: &Transcript) -> Vec<usize> {
    let mut indices: Vec<usize> = MESSAGE_TAG
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse::<usize>().ok())
        .filter(|&i| i < transcript.len())
        .collect();
    indices.sort_unstable();
    indices.dedup();
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};
    use recap_core::types::Message;

    const LOC: ChannelLocation = ChannelLocation {
        guild_id: Some(405163713063288832),
        channel_id: 405163713063288833,
    };

    fn transcript(n: u64) -> Transcript {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        Transcript::from_messages(
            (0..n)
                .map(|i| Message::text(1000 + i, 1, "a", "x", t0 + TimeDelta::minutes(i as i64)))
                .collect(),
        )
    }

    #[test]
    fn in_range_tag_becomes_link_to_that_message() {
        let out = resolve_references("see {message:3} for details", &transcript(10), LOC);
        assert_eq!(
            out,
            "see [\u{2197}](https://discord.com/channels/405163713063288832/405163713063288833/1003) for details"
        );
    }

    #[test]
    fn out_of_range_tag_is_left_alone() {
        let text = "see {message:15}";
        assert_eq!(resolve_references(text, &transcript(10), LOC), text);
        assert_eq!(
            resolve_references("{message:10}", &transcript(10), LOC),
            "{message:10}"
        );
    }

    #[test]
    fn every_occurrence_is_replaced() {
        let out = resolve_references("{message:0} and {message:0}, {message:9}", &transcript(10), LOC);
        assert_eq!(out.matches("/1000)").count(), 2);
        assert!(out.contains("/1009)"));
        assert!(!out.contains("{message:"));
    }

    #[test]
    fn huge_index_does_not_panic() {
        let text = "{message:99999999999999999999999}";
        assert_eq!(resolve_references(text, &transcript(10), LOC), text);
    }

    #[test]
    fn dm_links_use_me() {
        let loc = ChannelLocation {
            guild_id: None,
            channel_id: 5,
        };
        assert_eq!(loc.message_link(6), "https://discord.com/channels/@me/5/6");
    }

    #[test]
    fn cited_indices_are_distinct_and_in_range() {
        let text = "{message:4} {message:1} {message:4} {message:42}";
        assert_eq!(cited_indices(text, &transcript(10)), vec![1, 4]);
    }
}
