use poise::serenity_prelude as serenity;
use tracing::instrument;

use crate::discord::bot::Context;
use crate::error::AppError;

/// Unlink your game accounts, or only one of them
#[poise::command(slash_command, guild_only)]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn unlink(
    ctx: Context<'_>,
    #[description = "Only unlink this player tag"] tag: Option<String>,
) -> Result<(), AppError> {
    let released = ctx
        .data()
        .tracker
        .unlink(ctx.author().id.get(), tag.as_deref())
        .await?;

    if released == 0 {
        ctx.send(
            poise::CreateReply::default()
                .content("You have no linked account to unlink.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let embed = serenity::CreateEmbed::new()
        .title("Account Unlinked")
        .description(format!("Released {released} linked account(s)."))
        .color(0xff6600);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}
