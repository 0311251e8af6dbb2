//! Discord slash commands: `/summarize_chat`.
//!
//! Registration happens in `ready()`. Interactions are dispatched from
//! `interaction_create` in the event handler.

use std::sync::Arc;

use serenity::builder::{
    CreateCommand, CreateInteractionResponse, CreateInteractionResponseMessage,
    EditInteractionResponse,
};
use serenity::model::application::{Command, CommandInteraction};
use serenity::model::id::UserId;
use serenity::prelude::Context;
use tracing::{info, warn};

use recap_agent::pipeline::{run_digest, DigestRequest, PipelineError};
use recap_core::config::DiscordConfig;

use crate::channel::DiscordChannel;
use crate::context::DiscordAppContext;
use crate::send;

pub const SUMMARIZE: &str = "summarize_chat";

/// Register global slash commands. Call from `ready()`.
pub async fn register_commands(ctx: &Context) {
    let commands = vec![CreateCommand::new(SUMMARIZE)
        .description("Summarize the recent conversation in this channel")];

    match Command::set_global_commands(&ctx.http, commands).await {
        Ok(registered) => info!(count = registered.len(), "slash commands registered"),
        Err(e) => warn!(error = %e, "failed to register slash commands"),
    }
}

/// Dispatch a slash command interaction.
pub async fn handle_interaction<C: DiscordAppContext + 'static>(
    app: &Arc<C>,
    config: &DiscordConfig,
    bot_id: UserId,
    ctx: &Context,
    command: &CommandInteraction,
) {
    let result = match command.data.name.as_str() {
        SUMMARIZE => handle_summarize(app, config, bot_id, ctx, command).await,
        other => {
            warn!(command = other, "unknown slash command");
            Ok(())
        }
    };

    if let Err(e) = result {
        warn!(error = %e, command = %command.data.name, "slash command failed");
    }
}

/// `/summarize_chat`: summarize everything since the channel's last summary.
async fn handle_summarize<C: DiscordAppContext + 'static>(
    app: &Arc<C>,
    config: &DiscordConfig,
    bot_id: UserId,
    ctx: &Context,
    command: &CommandInteraction,
) -> Result<(), serenity::Error> {
    // Defer privately; only the invoker sees the status text.
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new().ephemeral(true)),
        )
        .await?;

    if !config.summary_allowed(command.channel_id.get()) {
        return reply(ctx, command, "You can't summarize here.").await;
    }

    let digest_config = app.agent().config();
    let channel = DiscordChannel::new(Arc::clone(&ctx.http), command.channel_id, command.guild_id);
    let request = DigestRequest::summary(bot_id.get(), digest_config);

    match run_digest(app.as_ref(), &channel, &request).await {
        Ok(digest) => match send::send_summary(&ctx.http, command.channel_id, &digest).await {
            Ok(()) => reply(ctx, command, "done").await,
            Err(e) => {
                warn!(error = %e, channel_id = %command.channel_id, "failed to post summary");
                reply(ctx, command, "\u{26a0}\u{fe0f} Could not post the summary here.").await
            }
        },
        Err(PipelineError::RateLimited { remaining, .. }) => {
            let msg = format!(
                "You can only summarize once every {} minutes. Try again in {}.",
                digest_config.summary_cooldown_secs / 60,
                send::format_wait(remaining)
            );
            reply(ctx, command, &msg).await
        }
        Err(PipelineError::InsufficientHistory { found, required }) => {
            let msg = format!(
                "Not enough new messages to summarize yet ({found} of {required})."
            );
            reply(ctx, command, &msg).await
        }
        Err(e) => {
            warn!(error = %e, channel_id = %command.channel_id, "summary failed");
            reply(ctx, command, "\u{26a0}\u{fe0f} Summary failed. Please try again later.").await
        }
    }
}

/// Replace the deferred "thinking" response with `content`.
async fn reply(
    ctx: &Context,
    command: &CommandInteraction,
    content: &str,
) -> Result<(), serenity::Error> {
    command
        .edit_response(&ctx.http, EditInteractionResponse::new().content(content))
        .await
        .map(|_| ())
}
