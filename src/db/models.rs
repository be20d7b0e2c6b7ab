use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: i64,
    pub player_tag: String,
    pub name: String,
    pub linked_user_id: Option<i64>,
    pub trophies: i64,
    pub prev_trophies: i64,
    pub offense_trophies: i64,
    pub offense_attacks: i64,
    pub defense_trophies: i64,
    pub defense_defenses: i64,
    pub last_reset: NaiveDate,
    /// Bumped on every write touching trophies or counters.
    pub version: i64,
}

/// Full copy of the player table taken right before a reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub taken_at: DateTime<Utc>,
    pub players: Vec<PlayerRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetOutcome {
    pub backup_id: i64,
    pub player_count: usize,
    pub taken_at: DateTime<Utc>,
}
