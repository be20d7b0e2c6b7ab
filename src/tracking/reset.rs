use chrono::{DateTime, NaiveDate, Utc};

use crate::db::{BackupSnapshot, PlayerRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetPlan {
    /// Verbatim copy of the records, to be stored before anything is zeroed.
    pub snapshot: BackupSnapshot,
    pub records: Vec<PlayerRecord>,
}

/// Start a new period: remember the current trophies as the baseline and zero
/// the four period counters. `trophies` itself is left alone.
pub fn plan_reset(records: Vec<PlayerRecord>, now: DateTime<Utc>, today: NaiveDate) -> ResetPlan {
    let reset = records
        .iter()
        .cloned()
        .map(|mut record| {
            record.prev_trophies = record.trophies;
            record.offense_trophies = 0;
            record.offense_attacks = 0;
            record.defense_trophies = 0;
            record.defense_defenses = 0;
            record.last_reset = today;
            record
        })
        .collect();

    ResetPlan {
        snapshot: BackupSnapshot {
            taken_at: now,
            players: records,
        },
        records: reset,
    }
}
