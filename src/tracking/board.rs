//! Leaderboard pagination and the page-state token carried by its buttons.

use std::cmp::Reverse;
use std::fmt;

use crate::db::PlayerRecord;

pub const PAGE_SIZE: usize = 10;

const EMOJI_TROPHY: &str = "🏆";
const EMOJI_OFFENSE: &str = "⚔️";
const EMOJI_DEFENSE: &str = "🛡️";
const EMPTY_PAGE_TEXT: &str = "No players found.";

// ============================================================================
// Color
// ============================================================================

/// Embed color given as exactly six hex digits, optionally prefixed with `#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedColor(u32);

impl EmbedColor {
    pub const DEFAULT: Self = Self(0x00FFFF);

    pub fn parse(input: &str) -> Option<Self> {
        let hex = input.strip_prefix('#').unwrap_or(input);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok().map(Self)
    }

    /// Like [`EmbedColor::parse`], falling back to [`EmbedColor::DEFAULT`].
    pub fn resolve(input: &str) -> Self {
        Self::parse(input).unwrap_or(Self::DEFAULT)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for EmbedColor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for EmbedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06X}", self.0)
    }
}

// ============================================================================
// Rendering
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// Position in the whole filtered list, starting at 1.
    pub rank: usize,
    pub name: String,
    pub player_tag: String,
    pub trophies: i64,
    pub offense_trophies: i64,
    pub offense_attacks: i64,
    pub defense_trophies: i64,
    pub defense_defenses: i64,
}

impl LeaderboardEntry {
    fn from_record(rank: usize, record: &PlayerRecord) -> Self {
        Self {
            rank,
            name: record.name.clone(),
            player_tag: record.player_tag.clone(),
            trophies: record.trophies,
            offense_trophies: record.offense_trophies,
            offense_attacks: record.offense_attacks,
            defense_trophies: record.defense_trophies,
            defense_defenses: record.defense_defenses,
        }
    }

    pub fn to_line(&self) -> String {
        format!(
            "**{}. {} (#{})**\n{EMOJI_TROPHY} {} | {EMOJI_OFFENSE} +{}/{} | {EMOJI_DEFENSE} -{}/{}",
            self.rank,
            self.name,
            self.player_tag,
            self.trophies,
            self.offense_trophies,
            self.offense_attacks,
            self.defense_trophies,
            self.defense_defenses,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardPage {
    pub entries: Vec<LeaderboardEntry>,
    /// Zero-based index of the requested page, kept even when out of range.
    pub page: usize,
    /// Never below 1.
    pub page_count: usize,
    pub filtered_count: usize,
    pub color: EmbedColor,
}

impl LeaderboardPage {
    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.page_count
    }

    pub fn description(&self) -> String {
        if self.entries.is_empty() {
            return EMPTY_PAGE_TEXT.to_string();
        }

        self.entries
            .iter()
            .map(LeaderboardEntry::to_line)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Build one page of the leaderboard.
///
/// `records` are expected to be the linked players, best first. They are
/// sorted again with a stable sort so equal trophy counts keep store order.
/// Players below `min_trophies` are dropped before the name filter, so ranks
/// and page count only cover what is shown. A page past the end yields no
/// entries rather than an error.
pub fn render(
    records: &[PlayerRecord],
    page: usize,
    name_filter: &str,
    min_trophies: Option<i64>,
    color: &str,
) -> LeaderboardPage {
    let needle = name_filter.to_lowercase();

    let mut filtered: Vec<&PlayerRecord> = records
        .iter()
        .filter(|r| min_trophies.is_none_or(|min| r.trophies >= min))
        .filter(|r| needle.is_empty() || r.name.to_lowercase().contains(&needle))
        .collect();
    filtered.sort_by_key(|r| Reverse(r.trophies));

    let filtered_count = filtered.len();
    let page_count = filtered_count.div_ceil(PAGE_SIZE).max(1);

    let entries = filtered
        .iter()
        .enumerate()
        .skip(page.saturating_mul(PAGE_SIZE))
        .take(PAGE_SIZE)
        .map(|(index, record)| LeaderboardEntry::from_record(index + 1, record))
        .collect();

    LeaderboardPage {
        entries,
        page,
        page_count,
        filtered_count,
        color: EmbedColor::resolve(color),
    }
}

// ============================================================================
// Navigation
// ============================================================================

const CUSTOM_ID_PREFIX: &str = "lb";
/// Discord rejects component custom ids longer than this.
const MAX_CUSTOM_ID_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    Refresh,
    Prev,
    Next,
}

impl NavAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Refresh => "refresh",
            Self::Prev => "prev",
            Self::Next => "next",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "refresh" => Some(Self::Refresh),
            "prev" => Some(Self::Prev),
            "next" => Some(Self::Next),
            _ => None,
        }
    }
}

/// Everything needed to redraw a leaderboard message, round-tripped through
/// the custom id of its buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    pub page: usize,
    /// Matched literally, surrounding spaces included.
    pub filter: String,
    pub min_trophies: Option<i64>,
    pub color: EmbedColor,
}

impl PageState {
    pub fn new(
        page: usize,
        filter: impl Into<String>,
        min_trophies: Option<i64>,
        color: &str,
    ) -> Self {
        Self {
            page,
            filter: filter.into(),
            min_trophies,
            color: EmbedColor::resolve(color),
        }
    }

    /// State after pressing `action` on the page described by `self`.
    pub fn navigate(mut self, action: NavAction) -> Self {
        self.page = match action {
            NavAction::Refresh => self.page,
            NavAction::Prev => self.page.saturating_sub(1),
            NavAction::Next => self.page.saturating_add(1),
        };
        self
    }

    pub fn render(&self, records: &[PlayerRecord]) -> LeaderboardPage {
        render(
            records,
            self.page,
            &self.filter,
            self.min_trophies,
            &self.color.to_string(),
        )
    }

    /// `lb:<action>:<page>:<color>:<min trophies>:<url-encoded filter>`, the
    /// threshold left empty when unset and the filter shortened until the id
    /// fits Discord's limit.
    pub fn custom_id(&self, action: NavAction) -> String {
        let min_trophies = self.min_trophies.map(|m| m.to_string()).unwrap_or_default();
        let head = format!(
            "{CUSTOM_ID_PREFIX}:{}:{}:{}:{min_trophies}:",
            action.as_str(),
            self.page,
            self.color
        );

        let mut filter = self.filter.as_str();
        loop {
            let encoded = urlencoding::encode(filter);
            if head.len() + encoded.len() <= MAX_CUSTOM_ID_LEN {
                return format!("{head}{encoded}");
            }
            filter = match filter.char_indices().next_back() {
                Some((last, _)) => &filter[..last],
                None => "",
            };
        }
    }

    /// Inverse of [`PageState::custom_id`]. `None` for ids this bot did not emit.
    pub fn from_custom_id(custom_id: &str) -> Option<(NavAction, Self)> {
        let mut parts = custom_id.splitn(6, ':');
        if parts.next()? != CUSTOM_ID_PREFIX {
            return None;
        }

        let action = NavAction::parse(parts.next()?)?;
        let page = parts.next()?.parse().ok()?;
        let color = EmbedColor::parse(parts.next()?)?;
        let min_trophies = match parts.next()? {
            "" => None,
            raw => Some(raw.parse().ok()?),
        };
        let filter = urlencoding::decode(parts.next()?).ok()?.into_owned();

        Some((
            action,
            Self {
                page,
                filter,
                min_trophies,
                color,
            },
        ))
    }
}
