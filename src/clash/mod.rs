mod client;
mod metrics;
mod types;

pub use client::{ClashClient, StatsSource};
pub use metrics::RequestMetrics;
pub use types::{PlayerDto, PlayerTag, StatsError, StatsResponse};
