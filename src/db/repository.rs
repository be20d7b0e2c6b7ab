use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;

#[cfg(test)]
use super::models::BackupSnapshot;
use super::models::{PlayerRecord, ResetOutcome};
use crate::clash::PlayerTag;
use crate::error::AppError;
use crate::tracking::{CounterUpdate, plan_reset};

const PLAYER_COLUMN_NAMES: [&str; 12] = [
    "id",
    "player_tag",
    "name",
    "linked_user_id",
    "trophies",
    "prev_trophies",
    "offense_trophies",
    "offense_attacks",
    "defense_trophies",
    "defense_defenses",
    "last_reset",
    "version",
];

fn player_columns() -> String {
    PLAYER_COLUMN_NAMES.join(", ")
}

#[derive(Clone, Debug)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // === Player reads ===

    pub async fn get_all_players(&self) -> Result<Vec<PlayerRecord>, AppError> {
        let columns = player_columns();
        let players = sqlx::query_as::<_, PlayerRecord>(&format!(
            "SELECT {columns} FROM players ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(players)
    }

    /// Linked players, highest trophies first. Ties keep insertion order.
    pub async fn get_linked_players(&self) -> Result<Vec<PlayerRecord>, AppError> {
        let columns = player_columns();
        let players = sqlx::query_as::<_, PlayerRecord>(&format!(
            r#"
            SELECT {columns}
            FROM players
            WHERE linked_user_id IS NOT NULL
            ORDER BY trophies DESC, id ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(players)
    }

    pub async fn get_player_by_tag(
        &self,
        tag: &PlayerTag,
    ) -> Result<Option<PlayerRecord>, AppError> {
        let columns = player_columns();
        let player = sqlx::query_as::<_, PlayerRecord>(&format!(
            "SELECT {columns} FROM players WHERE player_tag = ?"
        ))
        .bind(tag.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(player)
    }

    // === Player writes ===

    /// Create or take over the record of `tag`. The last linker always wins.
    pub async fn link_player(
        &self,
        tag: &PlayerTag,
        name: &str,
        trophies: i64,
        user_id: u64,
        today: NaiveDate,
    ) -> Result<PlayerRecord, AppError> {
        let columns = player_columns();
        let query = format!(
            r#"
            INSERT INTO players (player_tag, name, linked_user_id, trophies, prev_trophies, last_reset)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(player_tag) DO UPDATE SET
                name = excluded.name,
                linked_user_id = excluded.linked_user_id,
                trophies = excluded.trophies,
                prev_trophies = excluded.prev_trophies,
                last_reset = excluded.last_reset,
                version = players.version + 1
            RETURNING {columns}
            "#
        );

        let player = sqlx::query_as::<_, PlayerRecord>(&query)
            .bind(tag.as_str())
            .bind(name)
            .bind(user_id as i64)
            .bind(trophies)
            .bind(trophies)
            .bind(today)
            .fetch_one(&self.pool)
            .await?;
        Ok(player)
    }

    /// Release the records owned by `user_id`, optionally only the one with `tag`.
    pub async fn unlink_owner(
        &self,
        user_id: u64,
        tag: Option<&PlayerTag>,
    ) -> Result<u64, AppError> {
        let result = match tag {
            Some(tag) => {
                sqlx::query(
                    "UPDATE players SET linked_user_id = NULL WHERE linked_user_id = ? AND player_tag = ?",
                )
                .bind(user_id as i64)
                .bind(tag.as_str())
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query("UPDATE players SET linked_user_id = NULL WHERE linked_user_id = ?")
                    .bind(user_id as i64)
                    .execute(&self.pool)
                    .await?
            }
        };
        Ok(result.rows_affected())
    }

    /// Release the record with `tag` whoever owns it.
    pub async fn unlink_tag(&self, tag: &PlayerTag) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE players SET linked_user_id = NULL WHERE player_tag = ? AND linked_user_id IS NOT NULL",
        )
        .bind(tag.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Compare-and-set write of a poll result. Returns `false` when the record
    /// changed since `previous` was read, in which case nothing is written.
    pub async fn apply_poll_update(
        &self,
        previous: &PlayerRecord,
        name: &str,
        update: &CounterUpdate,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE players SET
                name = ?,
                trophies = ?,
                offense_trophies = ?,
                offense_attacks = ?,
                defense_trophies = ?,
                defense_defenses = ?,
                version = version + 1
            WHERE player_tag = ? AND version = ?
            "#,
        )
        .bind(name)
        .bind(update.trophies)
        .bind(update.offense_trophies)
        .bind(update.offense_attacks)
        .bind(update.defense_trophies)
        .bind(update.defense_defenses)
        .bind(&previous.player_tag)
        .bind(previous.version)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    // === Reset & backups ===

    /// Snapshot every player into `backups` then zero the period counters, in
    /// one transaction. A failed backup write rolls everything back.
    ///
    /// The backup row is inserted before anything is read so the transaction
    /// holds the write lock from its first statement. Concurrent poll writes
    /// then wait on the busy timeout instead of failing the reset.
    pub async fn reset_all(
        &self,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<ResetOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        let backup_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO backups (taken_at, player_count, payload) VALUES (?, 0, '[]') RETURNING id",
        )
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::BackupWrite)?;

        let columns = player_columns();
        let records = sqlx::query_as::<_, PlayerRecord>(&format!(
            "SELECT {columns} FROM players ORDER BY id ASC"
        ))
        .fetch_all(&mut *tx)
        .await?;

        let plan = plan_reset(records, now, today);
        let payload = serde_json::to_string(&plan.snapshot.players)?;

        sqlx::query("UPDATE backups SET player_count = ?, payload = ? WHERE id = ?")
            .bind(plan.snapshot.players.len() as i64)
            .bind(payload)
            .bind(backup_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::BackupWrite)?;

        for record in &plan.records {
            sqlx::query(
                r#"
                UPDATE players SET
                    prev_trophies = ?,
                    offense_trophies = ?,
                    offense_attacks = ?,
                    defense_trophies = ?,
                    defense_defenses = ?,
                    last_reset = ?,
                    version = version + 1
                WHERE id = ?
                "#,
            )
            .bind(record.prev_trophies)
            .bind(record.offense_trophies)
            .bind(record.offense_attacks)
            .bind(record.defense_trophies)
            .bind(record.defense_defenses)
            .bind(record.last_reset)
            .bind(record.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(ResetOutcome {
            backup_id,
            player_count: plan.records.len(),
            taken_at: plan.snapshot.taken_at,
        })
    }
}

#[cfg(test)]
impl Repository {
    pub async fn latest_backup(&self) -> Result<Option<BackupSnapshot>, AppError> {
        let row = sqlx::query_as::<_, (DateTime<Utc>, String)>(
            "SELECT taken_at, payload FROM backups ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((taken_at, payload)) => Ok(Some(BackupSnapshot {
                taken_at,
                players: serde_json::from_str(&payload)?,
            })),
            None => Ok(None),
        }
    }

    pub async fn count_backups(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM backups")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
