use poise::serenity_prelude::{
    self as serenity, ComponentInteraction, CreateInteractionResponse,
    CreateInteractionResponseMessage,
};
use tracing::{debug, error, instrument};

use super::bot::Data;
use super::embeds;
use crate::error::AppError;
use crate::tracking::PageState;

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, AppError>,
    data: &Data,
) -> Result<(), AppError> {
    if let serenity::FullEvent::InteractionCreate {
        interaction: serenity::Interaction::Component(component),
    } = event
    {
        handle_component(ctx, component, data).await?;
    }

    Ok(())
}

/// Redraw a leaderboard message after one of its buttons was pressed.
#[instrument(
    skip_all,
    fields(custom_id = %component.data.custom_id, user_id = %component.user.id)
)]
async fn handle_component(
    ctx: &serenity::Context,
    component: &ComponentInteraction,
    data: &Data,
) -> Result<(), AppError> {
    let Some((action, state)) = PageState::from_custom_id(&component.data.custom_id) else {
        debug!("🎮 Ignoring foreign component");
        return Ok(());
    };

    let state = state.navigate(action);
    // The title is not part of the token, keep whatever the message shows.
    let title = component
        .message
        .embeds
        .first()
        .and_then(|embed| embed.title.as_deref())
        .unwrap_or(embeds::DEFAULT_TITLE);

    let response = match data.tracker.leaderboard(&state).await {
        Ok(page) => {
            let (embed, buttons) = embeds::leaderboard(&page, &state, title, data.tracker.local_now());
            CreateInteractionResponse::UpdateMessage(
                CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .components(vec![buttons]),
            )
        }
        Err(e) => {
            error!(error = ?e, "🎮 ❌ Leaderboard refresh failed");
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(e.user_message())
                    .ephemeral(true),
            )
        }
    };

    component.create_response(ctx, response).await?;

    Ok(())
}
