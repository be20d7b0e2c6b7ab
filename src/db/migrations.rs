use sqlx::SqlitePool;
use tracing::info;

use crate::error::AppError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS players (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_tag TEXT UNIQUE NOT NULL,
    name TEXT NOT NULL,
    linked_user_id INTEGER,
    trophies INTEGER NOT NULL DEFAULT 0,
    prev_trophies INTEGER NOT NULL DEFAULT 0,
    offense_trophies INTEGER NOT NULL DEFAULT 0,
    offense_attacks INTEGER NOT NULL DEFAULT 0,
    defense_trophies INTEGER NOT NULL DEFAULT 0,
    defense_defenses INTEGER NOT NULL DEFAULT 0,
    last_reset TEXT NOT NULL,
    version INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL DEFAULT (unixepoch())
);

CREATE TABLE IF NOT EXISTS backups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    taken_at TEXT NOT NULL,
    player_count INTEGER NOT NULL,
    payload TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_players_trophies ON players(trophies DESC);
CREATE INDEX IF NOT EXISTS idx_players_linked_user ON players(linked_user_id);
"#;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    info!("🗄️ Database migrations completed");
    Ok(())
}
