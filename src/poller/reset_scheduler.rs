use chrono::{DateTime, Days, FixedOffset, NaiveTime};
use tracing::{error, info};

use crate::error::AppError;
use crate::tracking::Tracker;

/// Run the reset cycle every day at `hour:minute` in the tracker's zone.
pub async fn start_reset_schedule(tracker: Tracker, hour: u32, minute: u32) {
    info!(hour, minute, "🗄️ Reset scheduler started");

    loop {
        let now = tracker.local_now();
        let next = match next_reset_after(now, hour, minute) {
            Ok(next) => next,
            Err(e) => {
                error!(error = ?e, "🗄️ ❌ Cannot compute next reset, scheduler stopped");
                return;
            }
        };

        let wait = (next - now).to_std().unwrap_or_default();
        info!(next = %next, wait_secs = wait.as_secs(), "🗄️ Next reset scheduled");
        tokio::time::sleep(wait).await;

        if let Err(e) = tracker.reset_cycle().await {
            error!(error = ?e, "🗄️ ❌ Reset cycle failed");
        }
    }
}

/// First `hour:minute` strictly after `now`, in the zone of `now`.
pub(crate) fn next_reset_after(
    now: DateTime<FixedOffset>,
    hour: u32,
    minute: u32,
) -> Result<DateTime<FixedOffset>, AppError> {
    let at = NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| AppError::Config(format!("invalid reset time {hour:02}:{minute:02}")))?;

    let today = now.date_naive().and_time(at);
    let naive = if today > now.naive_local() {
        today
    } else {
        today
            .checked_add_days(Days::new(1))
            .ok_or_else(|| AppError::Config("reset date out of range".into()))?
    };

    naive
        .and_local_timezone(*now.offset())
        .single()
        .ok_or_else(|| AppError::Config(format!("ambiguous reset time {naive}")))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(330 * 60).unwrap()
    }

    #[test]
    fn later_today() {
        let now = ist().with_ymd_and_hms(2025, 8, 2, 8, 15, 0).unwrap();

        let next = next_reset_after(now, 10, 0).unwrap();

        assert_eq!(next, ist().with_ymd_and_hms(2025, 8, 2, 10, 0, 0).unwrap());
    }

    #[test]
    fn already_passed_rolls_to_tomorrow() {
        let now = ist().with_ymd_and_hms(2025, 8, 2, 10, 0, 0).unwrap();

        let next = next_reset_after(now, 10, 0).unwrap();

        assert_eq!(next, ist().with_ymd_and_hms(2025, 8, 3, 10, 0, 0).unwrap());
    }

    #[test]
    fn crosses_month_end() {
        let now = ist().with_ymd_and_hms(2025, 8, 31, 23, 59, 0).unwrap();

        let next = next_reset_after(now, 10, 0).unwrap();

        assert_eq!(next, ist().with_ymd_and_hms(2025, 9, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn uses_the_offset_of_now() {
        // 03:00 UTC is 08:30 IST, so 10:00 IST is 04:30 UTC the same day.
        let now = Utc
            .with_ymd_and_hms(2025, 8, 2, 3, 0, 0)
            .unwrap()
            .with_timezone(&ist());

        let next = next_reset_after(now, 10, 0).unwrap();

        assert_eq!(
            next.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2025, 8, 2, 4, 30, 0).unwrap()
        );
    }

    #[test]
    fn rejects_invalid_time() {
        let now = ist().with_ymd_and_hms(2025, 8, 2, 8, 0, 0).unwrap();

        assert!(matches!(next_reset_after(now, 24, 0), Err(AppError::Config(_))));
        assert!(matches!(next_reset_after(now, 10, 60), Err(AppError::Config(_))));
    }
}
