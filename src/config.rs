use std::env;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use chrono::FixedOffset;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub clash_api_url: String,
    pub clash_api_token: Option<String>,
    pub database_url: String,
    pub polling_interval_secs: u64,
    pub poll_concurrency: usize,
    pub stats_rate_limit_per_second: NonZeroU32,
    pub stats_timeout_secs: u64,
    pub reset_hour: u32,
    pub reset_minute: u32,
    pub reset_utc_offset_minutes: i32,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        const DEFAULT_POLLING_INTERVAL_SECS: u64 = 120;
        const DEFAULT_POLL_CONCURRENCY: usize = 4;
        const DEFAULT_STATS_RATE_LIMIT_PER_SECOND: u32 = 10;
        const DEFAULT_STATS_TIMEOUT_SECS: u64 = 10;
        const DEFAULT_RESET_HOUR: u32 = 10;
        const DEFAULT_RESET_MINUTE: u32 = 0;
        // Asia/Kolkata, which has no DST.
        const DEFAULT_RESET_UTC_OFFSET_MINUTES: i32 = 330;

        let discord_token = env::var("DISCORD_TOKEN")
            .map_err(|_| AppError::Config("DISCORD_TOKEN must be set".into()))?;

        let clash_api_url = env::var("CLASH_API_URL")
            .map_err(|_| AppError::Config("CLASH_API_URL must be set".into()))?
            .trim_end_matches('/')
            .to_string();

        let clash_api_token = env::var("CLASH_API_TOKEN").ok().filter(|t| !t.is_empty());

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:trophy_board.db".into());

        let polling_interval_secs =
            parse_var("POLLING_INTERVAL_SECS").unwrap_or(DEFAULT_POLLING_INTERVAL_SECS);

        let poll_concurrency = parse_var::<usize>("POLL_CONCURRENCY")
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_POLL_CONCURRENCY);

        let stats_rate_limit_per_second = parse_var("STATS_RATE_LIMIT_PER_SECOND")
            .and_then(NonZeroU32::new)
            .unwrap_or_else(|| {
                NonZeroU32::new(DEFAULT_STATS_RATE_LIMIT_PER_SECOND).unwrap_or(NonZeroU32::MIN)
            });

        let stats_timeout_secs =
            parse_var("STATS_TIMEOUT_SECS").unwrap_or(DEFAULT_STATS_TIMEOUT_SECS);

        let reset_hour = parse_var("RESET_HOUR").unwrap_or(DEFAULT_RESET_HOUR);
        let reset_minute = parse_var("RESET_MINUTE").unwrap_or(DEFAULT_RESET_MINUTE);
        if reset_hour > 23 || reset_minute > 59 {
            return Err(AppError::Config(format!(
                "invalid reset time {reset_hour:02}:{reset_minute:02}"
            )));
        }

        let reset_utc_offset_minutes =
            parse_var("RESET_UTC_OFFSET_MINUTES").unwrap_or(DEFAULT_RESET_UTC_OFFSET_MINUTES);

        let config = Self {
            discord_token,
            clash_api_url,
            clash_api_token,
            database_url,
            polling_interval_secs,
            poll_concurrency,
            stats_rate_limit_per_second,
            stats_timeout_secs,
            reset_hour,
            reset_minute,
            reset_utc_offset_minutes,
        };
        config.reset_offset()?;

        Ok(config)
    }

    /// Timezone used for the daily reset, `last_reset` dates and embed timestamps.
    pub fn reset_offset(&self) -> Result<FixedOffset, AppError> {
        FixedOffset::east_opt(self.reset_utc_offset_minutes * 60).ok_or_else(|| {
            AppError::Config(format!(
                "RESET_UTC_OFFSET_MINUTES out of range: {}",
                self.reset_utc_offset_minutes
            ))
        })
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs.max(1))
    }

    pub fn stats_timeout(&self) -> Duration {
        Duration::from_secs(self.stats_timeout_secs.max(1))
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
