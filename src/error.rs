use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Discord error: {0}")]
    Discord(Box<serenity::Error>),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid or unreachable player tag: {0}")]
    InvalidTag(String),

    #[error("Administrator permission required")]
    PermissionDenied,

    #[error("Backup could not be written, reset aborted: {0}")]
    BackupWrite(#[source] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Text shown to the Discord user when a command fails.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidTag(tag) => format!("❌ Invalid or unreachable player tag `{tag}`."),
            Self::PermissionDenied => "❌ Administrator permission required.".into(),
            Self::BackupWrite(_) => "❌ Backup failed, the reset was not applied.".into(),
            Self::Database(_) | Self::Serialization(_) => {
                "❌ Internal error while accessing the leaderboard data.".into()
            }
            Self::Http(_) => "❌ The statistics API could not be reached.".into(),
            Self::Discord(_) | Self::Config(_) => "❌ Something went wrong.".into(),
        }
    }
}

impl From<serenity::Error> for AppError {
    fn from(err: serenity::Error) -> Self {
        AppError::Discord(Box::new(err))
    }
}
