use std::sync::{Arc, OnceLock};

use serenity::async_trait;
use serenity::http::Http;
use serenity::model::application::Interaction;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::id::UserId;
use serenity::prelude::{Context, EventHandler};
use tracing::{info, warn};

use recap_agent::pipeline::{run_digest, DigestRequest, PipelineError};
use recap_core::config::DiscordConfig;

use crate::ack::AckHandle;
use crate::channel::{display_name, to_message, DiscordChannel};
use crate::context::DiscordAppContext;
use crate::send;

/// Serenity event handler wired to the digest pipeline.
pub struct DiscordHandler<C: DiscordAppContext + 'static> {
    pub ctx: Arc<C>,
    pub config: DiscordConfig,
    pub bot_id: OnceLock<UserId>,
}

impl<C: DiscordAppContext + 'static> DiscordHandler<C> {
    fn bot_id(&self, ctx: &Context) -> UserId {
        self.bot_id
            .get()
            .copied()
            .unwrap_or_else(|| ctx.cache.current_user().id)
    }
}

#[async_trait]
impl<C: DiscordAppContext + 'static> EventHandler for DiscordHandler<C> {
    async fn ready(&self, ctx: Context, ready: Ready) {
        self.bot_id.set(ready.user.id).ok();
        info!(name = %ready.user.name, "Discord bot connected");
        crate::commands::register_commands(&ctx).await;
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot || !self.config.mention_replies {
            return;
        }

        let bot_id = self.bot_id(&ctx);
        if !msg.mentions_user_id(bot_id) {
            return;
        }

        let question = strip_bot_mention(&msg.content, bot_id.get());
        if question.is_empty() {
            return;
        }

        let mut ack = if self.config.ack_reactions {
            AckHandle::new(Arc::clone(&ctx.http), msg.channel_id, msg.id)
        } else {
            AckHandle::disabled(Arc::clone(&ctx.http), msg.channel_id, msg.id)
        };
        ack.thinking().await;

        let app = Arc::clone(&self.ctx);
        let http = Arc::clone(&ctx.http);
        let author = display_name(&msg.author).to_string();

        tokio::spawn(async move {
            reply_to_mention(app, http, msg, author, question, bot_id, ack).await;
        });
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            let bot_id = self.bot_id(&ctx);
            crate::commands::handle_interaction(&self.ctx, &self.config, bot_id, &ctx, &command)
                .await;
        }
    }
}

/// Remove every mention of the bot (`<@id>` / `<@!id>`) and trim.
pub fn strip_bot_mention(content: &str, bot_id: u64) -> String {
    content
        .replace(&format!("<@{bot_id}>"), "")
        .replace(&format!("<@!{bot_id}>"), "")
        .trim()
        .to_string()
}

async fn reply_to_mention<C: DiscordAppContext + 'static>(
    app: Arc<C>,
    http: Arc<Http>,
    msg: Message,
    author: String,
    question: String,
    bot_id: UserId,
    mut ack: AckHandle,
) {
    let channel = DiscordChannel::new(Arc::clone(&http), msg.channel_id, msg.guild_id);
    let mentions = to_message(&msg).mentions;
    let request = DigestRequest::mention_reply(
        bot_id.get(),
        &author,
        &question,
        &mentions,
        app.agent().config(),
    );

    let result = match run_digest(app.as_ref(), &channel, &request).await {
        Ok(digest) => {
            ack.done_ok().await;
            send::send_reply(&http, msg.channel_id, msg.id, &digest).await
        }
        Err(PipelineError::RateLimited { remaining, .. }) => {
            ack.cooling_down().await;
            let text = format!(
                "I'm still catching my breath. Ask again in {}.",
                send::format_wait(remaining)
            );
            send::send_notice(&http, msg.channel_id, msg.id, &text).await
        }
        Err(PipelineError::InsufficientHistory { .. }) => {
            ack.done_err().await;
            send::send_notice(
                &http,
                msg.channel_id,
                msg.id,
                "There isn't enough recent conversation here for me to go on.",
            )
            .await
        }
        Err(e) => {
            ack.done_err().await;
            warn!(error = %e, channel_id = %msg.channel_id, "mention reply failed");
            send::send_notice(
                &http,
                msg.channel_id,
                msg.id,
                "\u{26a0}\u{fe0f} AI unavailable. Please try again later.",
            )
            .await
        }
    };

    if let Err(e) = result {
        warn!(error = %e, channel_id = %msg.channel_id, "Discord send failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_both_mention_forms() {
        assert_eq!(
            strip_bot_mention("<@42> what did I miss? <@!42>", 42),
            "what did I miss?"
        );
    }

    #[test]
    fn keeps_other_mentions() {
        assert_eq!(
            strip_bot_mention("<@42> what did <@7> say", 42),
            "what did <@7> say"
        );
    }

    #[test]
    fn bare_mention_is_empty() {
        assert!(strip_bot_mention("  <@42>  ", 42).is_empty());
    }
}
