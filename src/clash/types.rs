use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::error::AppError;

pub type StatsResponse<T> = Result<T, StatsError>;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("player {0} not found")]
    NotFound(PlayerTag),

    #[error("HTTP status error: {0}")]
    Status(reqwest::StatusCode),

    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

// ============================================================================
// Player tag
// ============================================================================

/// Normalized player tag: uppercase ASCII letters and digits, no leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerTag(String);

impl PlayerTag {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let normalized = raw.trim().trim_start_matches('#').to_ascii_uppercase();

        if normalized.is_empty() || !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::InvalidTag(raw.trim().to_string()));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segment for the statistics API, `#` included and percent-encoded.
    pub fn to_path_segment(&self) -> String {
        urlencoding::encode(&format!("#{}", self.0)).into_owned()
    }
}

impl fmt::Display for PlayerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Player endpoint
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    pub tag: String,
    pub name: String,
    pub trophies: i64,
}
