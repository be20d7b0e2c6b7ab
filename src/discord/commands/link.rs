use poise::serenity_prelude as serenity;
use tracing::{info, instrument};

use crate::discord::bot::Context;
use crate::error::AppError;

/// Link a game account to yourself
#[poise::command(slash_command, guild_only)]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn link(
    ctx: Context<'_>,
    #[description = "Player tag, with or without the leading #"] tag: String,
) -> Result<(), AppError> {
    ctx.defer_ephemeral().await?;

    let record = ctx
        .data()
        .tracker
        .link(ctx.author().id.get(), &tag)
        .await?;

    let embed = serenity::CreateEmbed::new()
        .title("Account Linked")
        .description(format!(
            "**{}** (#{}) is now linked to {}",
            record.name,
            record.player_tag,
            ctx.author().name
        ))
        .field("Trophies", record.trophies.to_string(), true)
        .color(0x00ff00);

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;

    info!(player_tag = %record.player_tag, "Account linked via command");

    Ok(())
}
