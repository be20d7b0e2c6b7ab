use chrono::{DateTime, FixedOffset};
use poise::serenity_prelude::{
    ButtonStyle, CreateActionRow, CreateButton, CreateEmbed, CreateEmbedFooter,
};

use crate::tracking::{LeaderboardPage, NavAction, PageState};

pub const DEFAULT_TITLE: &str = "🏆 Trophy Leaderboard";

/// Embed and navigation row for one leaderboard page. The buttons carry
/// `state`, which must describe the page being shown.
pub fn leaderboard(
    page: &LeaderboardPage,
    state: &PageState,
    title: &str,
    updated_at: DateTime<FixedOffset>,
) -> (CreateEmbed, CreateActionRow) {
    let embed = CreateEmbed::new()
        .title(title)
        .description(page.description())
        .color(page.color.value())
        .footer(CreateEmbedFooter::new(footer_text(page, updated_at)));

    let buttons = CreateActionRow::Buttons(vec![
        nav_button(state, NavAction::Refresh, "🔁 Refresh", ButtonStyle::Primary, false),
        nav_button(state, NavAction::Prev, "⬅️ Prev", ButtonStyle::Secondary, !page.has_prev()),
        nav_button(state, NavAction::Next, "➡️ Next", ButtonStyle::Secondary, !page.has_next()),
    ]);

    (embed, buttons)
}

fn nav_button(
    state: &PageState,
    action: NavAction,
    label: &str,
    style: ButtonStyle,
    disabled: bool,
) -> CreateButton {
    CreateButton::new(state.custom_id(action))
        .label(label)
        .style(style)
        .disabled(disabled)
}

fn footer_text(page: &LeaderboardPage, updated_at: DateTime<FixedOffset>) -> String {
    format!(
        "Last updated: {} | Page {}/{}",
        updated_at.format("%d-%m-%Y %I:%M %p"),
        page.page + 1,
        page.page_count
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn footer_shows_local_time_and_page() {
        let at = FixedOffset::east_opt(330 * 60)
            .unwrap()
            .with_ymd_and_hms(2025, 8, 2, 15, 7, 0)
            .unwrap();
        let page = PageState::new(0, "", None, "").render(&[]);

        assert_eq!(
            footer_text(&page, at),
            "Last updated: 02-08-2025 03:07 PM | Page 1/1"
        );
    }

    #[test]
    fn footer_keeps_out_of_range_page_number() {
        let at = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 1, 9, 9, 30, 0)
            .unwrap();
        let page = PageState::new(4, "", None, "").render(&[]);

        assert_eq!(
            footer_text(&page, at),
            "Last updated: 09-01-2025 09:30 AM | Page 5/1"
        );
    }
}
