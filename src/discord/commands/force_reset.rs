use poise::serenity_prelude as serenity;
use tracing::instrument;

use super::caller_privilege;
use crate::discord::bot::Context;
use crate::error::AppError;

/// Back up and reset every counter now (administrators only)
#[poise::command(slash_command, guild_only)]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn force_reset(ctx: Context<'_>) -> Result<(), AppError> {
    let privilege = caller_privilege(ctx);
    ctx.defer_ephemeral().await?;

    let outcome = ctx.data().tracker.force_reset(privilege).await?;

    let embed = serenity::CreateEmbed::new()
        .title("Leaderboard Reset")
        .description(format!(
            "Backup #{} saved, counters of {} player(s) reset.",
            outcome.backup_id, outcome.player_count
        ))
        .color(0x00ff00);

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;

    Ok(())
}
