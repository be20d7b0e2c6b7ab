use tracing::{error, info, warn};

use crate::error::AppError;
use crate::tracking::Tracker;

use super::commands;
use super::handler::event_handler;

/// Shared data accessible in all commands
#[derive(Debug)]
pub struct Data {
    pub tracker: Tracker,
}

pub type Context<'a> = poise::Context<'a, Data, AppError>;

pub fn create_framework(data: Data) -> poise::Framework<Data, AppError> {
    poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::link(),
                commands::unlink(),
                commands::remove(),
                commands::leaderboard(),
                commands::force_reset(),
            ],
            on_error: |error| {
                Box::pin(async move {
                    handle_error(error).await;
                })
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!(
                    bot_name = %ready.user.name,
                    guild_count = ready.guilds.len(),
                    "🎮 Bot is ready"
                );
                Ok(data)
            })
        })
        .build()
}

async fn reply_ephemeral(ctx: Context<'_>, content: String) {
    let reply = poise::CreateReply::default()
        .content(content)
        .ephemeral(true);
    if let Err(e) = ctx.send(reply).await {
        warn!(error = ?e, "🎮 ⚠️ Could not deliver error message");
    }
}

async fn handle_error(error: poise::FrameworkError<'_, Data, AppError>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            let command_name = ctx.command().name.as_str();
            match &error {
                AppError::InvalidTag(_) | AppError::PermissionDenied => warn!(
                    error = %error,
                    command = command_name,
                    user_id = %ctx.author().id,
                    "🎮 ⚠️ Command rejected"
                ),
                _ => error!(
                    error = ?error,
                    command = command_name,
                    user_id = %ctx.author().id,
                    "🎮 ❌ Command execution failed"
                ),
            }
            reply_ephemeral(ctx, error.user_message()).await;
        }
        poise::FrameworkError::ArgumentParse { error, ctx, .. } => {
            warn!(
                error = %error,
                command = ctx.command().name.as_str(),
                "🎮 ⚠️ Invalid command argument"
            );
            reply_ephemeral(ctx, format!("Invalid argument: {}", error)).await;
        }
        poise::FrameworkError::MissingBotPermissions {
            missing_permissions,
            ctx,
            ..
        } => {
            warn!(
                permissions = %missing_permissions,
                command = ctx.command().name.as_str(),
                "🎮 ⚠️ Bot missing permissions"
            );
            reply_ephemeral(ctx, format!("Missing permissions: {}", missing_permissions)).await;
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!(
                error = ?error,
                event = event.snake_case_name(),
                "🎮 ❌ Event handler failed"
            );
        }
        other => {
            error!(error = ?other, "🎮 ❌ Unhandled framework error");
        }
    }
}
