mod migrations;
mod models;
mod repository;

pub use migrations::run_migrations;
pub use models::{BackupSnapshot, PlayerRecord, ResetOutcome};
pub use repository::Repository;

/// Fresh in-memory database with the schema applied.
#[cfg(test)]
pub(crate) async fn memory_repository() -> Repository {
    use sqlx::sqlite::SqlitePoolOptions;

    // Every in-memory connection is its own database, so keep exactly one alive.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    Repository::new(pool)
}
