use tracing::instrument;

use crate::discord::bot::Context;
use crate::discord::embeds;
use crate::error::AppError;
use crate::tracking::PageState;

/// Show the trophy leaderboard
#[poise::command(slash_command, guild_only)]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id, matched))]
pub async fn leaderboard(
    ctx: Context<'_>,
    #[description = "Only show players whose name contains this"] name: Option<String>,
    #[description = "Embed color as hex, e.g. #FF8800"] color: Option<String>,
    #[description = "Hide players below this trophy count"] min_trophies: Option<i64>,
    #[description = "Custom title for the leaderboard"] title: Option<String>,
) -> Result<(), AppError> {
    let state = PageState::new(
        0,
        name.unwrap_or_default(),
        min_trophies,
        color.as_deref().unwrap_or_default(),
    );
    let title = title.as_deref().unwrap_or(embeds::DEFAULT_TITLE);

    let tracker = &ctx.data().tracker;
    let page = tracker.leaderboard(&state).await?;
    tracing::Span::current().record("matched", page.filtered_count);
    let (embed, buttons) = embeds::leaderboard(&page, &state, title, tracker.local_now());

    ctx.send(
        poise::CreateReply::default()
            .embed(embed)
            .components(vec![buttons]),
    )
    .await?;

    Ok(())
}
