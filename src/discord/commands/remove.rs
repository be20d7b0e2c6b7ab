use poise::serenity_prelude as serenity;
use tracing::instrument;

use super::caller_privilege;
use crate::discord::bot::Context;
use crate::error::AppError;

/// Remove any player from the leaderboard (administrators only)
#[poise::command(slash_command, guild_only)]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Player tag to remove"] tag: String,
) -> Result<(), AppError> {
    let privilege = caller_privilege(ctx);

    let removed = ctx.data().tracker.remove(privilege, &tag).await?;

    if !removed {
        ctx.send(
            poise::CreateReply::default()
                .content(format!("`{}` is not on the leaderboard.", tag.trim()))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let embed = serenity::CreateEmbed::new()
        .title("Player Removed")
        .description(format!("`{}` was removed from the leaderboard.", tag.trim()))
        .color(0xff6600);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}
