use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use poise::serenity_prelude as serenity;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{error, info};

use clash::ClashClient;
use config::Config;
use db::Repository;
use discord::{Data, create_framework};
use error::AppError;
use tracking::Tracker;

mod clash;
mod config;
mod db;
mod discord;
mod error;
mod logging;
mod poller;
mod tracking;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init();

    if let Err(e) = run().await {
        error!(error = ?e, "🐙 ❌ Fatal error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    info!("🐙 Starting...");

    let config = Config::from_env()?;
    let offset = config.reset_offset()?;

    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    db::run_migrations(&pool).await?;
    info!(database_url = %config.database_url, "🗄️ Database ready");

    let clash = ClashClient::new(
        config.clash_api_url.clone(),
        config.clash_api_token.clone(),
        config.stats_rate_limit_per_second,
        config.stats_timeout(),
        clash::RequestMetrics::new(),
    )?;
    tokio::spawn(clash.metrics().log_loop());

    let tracker = Tracker::new(Repository::new(pool), Arc::new(clash), offset);

    tokio::spawn(poller::start_polling(
        tracker.clone(),
        config.polling_interval(),
        config.poll_concurrency,
    ));
    tokio::spawn(poller::start_reset_schedule(
        tracker.clone(),
        config.reset_hour,
        config.reset_minute,
    ));

    let framework = create_framework(Data { tracker });

    let mut client =
        serenity::ClientBuilder::new(&config.discord_token, serenity::GatewayIntents::non_privileged())
            .framework(framework)
            .await?;

    client.start().await?;

    Ok(())
}
