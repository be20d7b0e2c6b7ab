use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, warn};

use crate::tracking::Tracker;

/// Run a poll round every `period`. Rounds never overlap: a round that
/// outlasts the period delays the next tick instead of queueing a burst.
pub async fn start_polling(tracker: Tracker, period: Duration, concurrency: usize) {
    let mut interval = interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        interval_secs = period.as_secs(),
        concurrency, "🔄 Trophy poller started"
    );

    loop {
        interval.tick().await;

        match tracker.poll_round(concurrency).await {
            Ok(report) if report.failures.is_empty() => {
                info!(
                    total = report.total(),
                    updated = report.updated,
                    conflicts = report.conflicts,
                    "🔄 ✅ Poll round finished"
                );
            }
            Ok(report) => {
                let failed: Vec<&str> = report
                    .failures
                    .iter()
                    .map(|f| f.player_tag.as_str())
                    .collect();
                warn!(
                    total = report.total(),
                    updated = report.updated,
                    conflicts = report.conflicts,
                    failed = ?failed,
                    "🔄 ⚠️ Poll round finished with failures"
                );
            }
            Err(e) => error!(error = ?e, "🔄 ❌ Poll round failed"),
        }
    }
}
