//! Digest pipeline, shared by the slash command and mention replies.
//!
//! `run_digest` runs one full invocation:
//! rate-limit gate → extract → trim to budget → complete → resolve
//! references → chunk → commit rate-limit timestamp.
//!
//! Nothing is persisted unless the completion succeeds.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Offset, TimeDelta, TimeZone, Utc};
use regex::{Captures, Regex};
use tracing::info;

use recap_core::config::{DigestConfig, CHUNK_MAX_CHARS, WORKING_BUDGET_TOKENS};
use recap_core::types::{ActionKind, Mention};

use crate::runtime::Completion;

use super::budget::fit_to_budget;
use super::channel::ChatChannel;
use super::chunk::split_chunks;
use super::compose::Composer;
use super::context::DigestContext;
use super::error::PipelineError;
use super::normalize::rewrite_inline;
use super::references::{cited_indices, resolve_references, ChannelLocation};
use super::transcript::{extract, ExtractParams};

/// `{author}` / `{question}` in the mention suffix, substituted in one pass.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(author|question)\}").expect("placeholder pattern is valid"));

/// What to run and how to phrase the request to the model.
#[derive(Debug, Clone)]
pub struct DigestRequest {
    pub action: ActionKind,
    pub bot_id: u64,
    pub suffix: String,
}

impl DigestRequest {
    /// Summary of everything since the channel's previous summary.
    pub fn summary(bot_id: u64, config: &DigestConfig) -> Self {
        Self {
            action: ActionKind::Summary,
            bot_id,
            suffix: config.summary_suffix.clone(),
        }
    }

    /// Answer `question` from `author` using recent channel history.
    ///
    /// `mentions` resolves user mentions inside the question, the same way
    /// transcript lines are rendered.
    pub fn mention_reply(
        bot_id: u64,
        author: &str,
        question: &str,
        mentions: &[Mention],
        config: &DigestConfig,
    ) -> Self {
        let question = rewrite_inline(question, mentions);
        let suffix = PLACEHOLDER.replace_all(&config.mention_suffix, |caps: &Captures| {
            match &caps[1] {
                "author" => author.to_string(),
                _ => question.clone(),
            }
        });
        Self {
            action: ActionKind::MentionReply,
            bot_id,
            suffix: suffix.into_owned(),
        }
    }
}

/// Result of a successful invocation.
#[derive(Debug, Clone)]
pub struct Digest {
    /// Link-resolved output, split for display.
    pub chunks: Vec<String>,
    /// The exact prompt sent to the model.
    pub prompt: String,
    pub completion: Completion,
    pub transcript_len: usize,
    /// Messages dropped to fit the budget.
    pub trimmed: usize,
    pub cost_usd: f64,
}

/// Summary cutoff when a channel has never been summarized.
fn epoch_cutoff() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn cooldown(action: ActionKind, config: &DigestConfig) -> Duration {
    match action {
        ActionKind::Summary => Duration::from_secs(config.summary_cooldown_secs),
        ActionKind::MentionReply => Duration::from_secs(config.mention_cooldown_secs),
    }
}

fn display_offset(config: &DigestConfig) -> FixedOffset {
    FixedOffset::east_opt(config.utc_offset_minutes.saturating_mul(60))
        .unwrap_or_else(|| Utc.fix())
}

/// Run the full pipeline for one invocation in `channel`.
pub async fn run_digest<C: DigestContext + ?Sized>(
    ctx: &C,
    channel: &dyn ChatChannel,
    request: &DigestRequest,
) -> Result<Digest, PipelineError> {
    let agent = ctx.agent();
    let config = agent.config();
    let channel_id = channel.channel_id();

    let permit = ctx
        .limiter()
        .acquire(channel_id, request.action, cooldown(request.action, config))
        .await?;
    let invoked_at = Utc::now();

    let cutoff = match request.action {
        ActionKind::Summary => permit.last_invoked().unwrap_or_else(epoch_cutoff),
        ActionKind::MentionReply => {
            let lookback = i64::try_from(config.mention_lookback_secs)
                .ok()
                .and_then(TimeDelta::try_seconds)
                .unwrap_or(TimeDelta::MAX);
            invoked_at
                .checked_sub_signed(lookback)
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        }
    };

    let params = ExtractParams {
        scan_limit: config.scan_limit,
        cutoff,
        bot_id: request.bot_id,
    };
    let transcript = extract(channel, &params).await?;

    let composer = Composer::new(
        config.prefix.as_str(),
        request.suffix.as_str(),
        display_offset(config),
    );
    let trimmed = fit_to_budget(transcript, &composer, agent.tokenizer(), WORKING_BUDGET_TOKENS)?;

    let completion = agent.complete(trimmed.tier, &trimmed.document.text).await?;

    let location = ChannelLocation {
        guild_id: channel.guild_id(),
        channel_id,
    };
    let cited = cited_indices(&completion.text, &trimmed.transcript);
    let resolved = resolve_references(&completion.text, &trimmed.transcript, location);
    let chunks = split_chunks(&resolved, CHUNK_MAX_CHARS);

    // The next summary starts where this one's history fetch began.
    permit.commit(invoked_at)?;

    let cost_usd = f64::from(completion.usage.total_tokens) / 1000.0 * config.cost_per_1k_tokens;
    info!(
        channel_id,
        action = %request.action,
        tier = %completion.tier,
        prompt_tokens = trimmed.document.tokens,
        total_tokens = completion.usage.total_tokens,
        messages = trimmed.transcript.len(),
        trimmed = trimmed.removed,
        cited = cited.len(),
        chunks = chunks.len(),
        "digest complete"
    );

    Ok(Digest {
        chunks,
        prompt: trimmed.document.text,
        transcript_len: trimmed.transcript.len(),
        trimmed: trimmed.removed,
        completion,
        cost_usd,
    })
}
