use std::{fmt::Debug, num::NonZeroU32, sync::Arc, time::Duration};

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use super::metrics::RequestMetrics;
use super::types::{PlayerDto, PlayerTag, StatsError, StatsResponse};
use crate::error::AppError;

/// Anything able to resolve a player tag into its current public profile.
#[async_trait]
pub trait StatsSource: Send + Sync + Debug {
    async fn fetch_player(&self, tag: &PlayerTag) -> StatsResponse<PlayerDto>;
}

#[derive(Debug)]
pub struct ClashClient {
    client: reqwest::Client,
    limiter: DefaultDirectRateLimiter,
    base_url: String,
    /// Bearer token, only needed when talking to the official API directly.
    token: Option<String>,
    metrics: Arc<RequestMetrics>,
}

impl ClashClient {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        rate_limit_per_second: NonZeroU32,
        timeout: Duration,
        metrics: Arc<RequestMetrics>,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            limiter: RateLimiter::direct(Quota::per_second(rate_limit_per_second)),
            base_url: base_url.into(),
            token,
            metrics,
        })
    }

    pub fn metrics(&self) -> Arc<RequestMetrics> {
        self.metrics.clone()
    }

    async fn request<T: DeserializeOwned + Debug>(&self, path: String) -> StatsResponse<T> {
        self.limiter.until_ready().await;
        self.metrics.inc();

        let mut req = self.client.get(path);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let res = req.send().await.inspect_err(|_| self.metrics.inc_failure())?;
        match res.status() {
            StatusCode::OK => res
                .json()
                .await
                .inspect_err(|_| self.metrics.inc_failure())
                .map_err(StatsError::Reqwest),
            status => {
                self.metrics.inc_failure();
                Err(StatsError::Status(status))
            }
        }
    }
}

#[async_trait]
impl StatsSource for ClashClient {
    async fn fetch_player(&self, tag: &PlayerTag) -> StatsResponse<PlayerDto> {
        trace!(%tag, "[CLASH::CLIENT] fetch_player");

        let path = format!("{}/player/{}", self.base_url, tag.to_path_segment());

        match self.request::<PlayerDto>(path).await {
            Err(StatsError::Status(StatusCode::NOT_FOUND)) => {
                debug!(%tag, "player not found on the statistics API");
                Err(StatsError::NotFound(tag.clone()))
            }
            other => other,
        }
    }
}
