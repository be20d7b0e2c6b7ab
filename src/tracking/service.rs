use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use futures::{StreamExt, stream};
use tracing::{debug, info, instrument, warn};

use super::board::{LeaderboardPage, PageState};
use super::delta::accumulate;
use crate::clash::{PlayerTag, StatsSource};
use crate::db::{PlayerRecord, Repository, ResetOutcome};
use crate::error::AppError;

/// What the caller of a command is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    Member,
    Administrator,
}

impl Privilege {
    fn require_admin(self) -> Result<(), AppError> {
        match self {
            Self::Administrator => Ok(()),
            Self::Member => Err(AppError::PermissionDenied),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollFailure {
    pub player_tag: String,
    pub reason: String,
}

/// Summary of one polling round. A round always completes, failures are per player.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub updated: usize,
    /// Results dropped because the record changed while its fetch was in flight.
    pub conflicts: usize,
    pub failures: Vec<PollFailure>,
}

impl PollReport {
    pub fn total(&self) -> usize {
        self.updated + self.conflicts + self.failures.len()
    }
}

enum PollOutcome {
    Updated,
    Conflict,
    Failed(PollFailure),
}

/// Every leaderboard operation, shared by slash commands, buttons and jobs.
#[derive(Debug, Clone)]
pub struct Tracker {
    db: Repository,
    stats: Arc<dyn StatsSource>,
    offset: FixedOffset,
}

impl Tracker {
    pub fn new(db: Repository, stats: Arc<dyn StatsSource>, offset: FixedOffset) -> Self {
        Self { db, stats, offset }
    }

    pub fn local_now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    fn today(&self) -> NaiveDate {
        self.local_now().date_naive()
    }

    // === Commands ===

    /// Associate `raw_tag` with `user_id`, taking the record over if someone
    /// else linked it before.
    #[instrument(skip(self))]
    pub async fn link(&self, user_id: u64, raw_tag: &str) -> Result<PlayerRecord, AppError> {
        let tag = PlayerTag::parse(raw_tag)?;

        let profile = self.stats.fetch_player(&tag).await.map_err(|e| {
            warn!(%tag, error = %e, "🔗 ❌ Player lookup failed");
            AppError::InvalidTag(tag.to_string())
        })?;

        let record = self
            .db
            .link_player(&tag, &profile.name, profile.trophies, user_id, self.today())
            .await?;

        info!(
            %tag,
            api_tag = %profile.tag,
            name = %record.name,
            trophies = record.trophies,
            "🔗 Player linked"
        );
        Ok(record)
    }

    /// Release what `user_id` owns, only `raw_tag` when given. Returns how many
    /// records were released; zero is not an error.
    #[instrument(skip(self))]
    pub async fn unlink(&self, user_id: u64, raw_tag: Option<&str>) -> Result<u64, AppError> {
        let tag = raw_tag.map(PlayerTag::parse).transpose()?;

        let released = self.db.unlink_owner(user_id, tag.as_ref()).await?;

        info!(released, "🔗 Unlink processed");
        Ok(released)
    }

    /// Administrator unlink of any record. `false` when the tag was not linked.
    #[instrument(skip(self))]
    pub async fn remove(&self, privilege: Privilege, raw_tag: &str) -> Result<bool, AppError> {
        privilege.require_admin()?;
        let tag = PlayerTag::parse(raw_tag)?;

        let removed = self.db.unlink_tag(&tag).await?;

        info!(%tag, removed, "🔗 Remove processed");
        Ok(removed)
    }

    pub async fn leaderboard(&self, state: &PageState) -> Result<LeaderboardPage, AppError> {
        let records = self.db.get_linked_players().await?;
        Ok(state.render(&records))
    }

    #[instrument(skip(self))]
    pub async fn force_reset(&self, privilege: Privilege) -> Result<ResetOutcome, AppError> {
        privilege.require_admin()?;
        self.reset_cycle().await
    }

    // === Jobs ===

    /// Fetch every record, linked or not, and fold the new trophy counts into
    /// its counters. At most `concurrency` fetches run at once.
    #[instrument(skip(self), fields(player_count))]
    pub async fn poll_round(&self, concurrency: usize) -> Result<PollReport, AppError> {
        let records = self.db.get_all_players().await?;
        tracing::Span::current().record("player_count", records.len());

        let mut report = PollReport::default();
        if records.is_empty() {
            debug!("🔄 No players tracked, skipping poll round");
            return Ok(report);
        }

        let mut outcomes = stream::iter(records)
            .map(|record| self.poll_player(record))
            .buffer_unordered(concurrency.max(1));

        while let Some(outcome) = outcomes.next().await {
            match outcome {
                PollOutcome::Updated => report.updated += 1,
                PollOutcome::Conflict => report.conflicts += 1,
                PollOutcome::Failed(failure) => report.failures.push(failure),
            }
        }

        Ok(report)
    }

    async fn poll_player(&self, record: PlayerRecord) -> PollOutcome {
        let failed = |reason: String| {
            warn!(player_tag = %record.player_tag, %reason, "🔄 ⚠️ Failed to poll player");
            PollOutcome::Failed(PollFailure {
                player_tag: record.player_tag.clone(),
                reason,
            })
        };

        let tag = match PlayerTag::parse(&record.player_tag) {
            Ok(tag) => tag,
            Err(e) => return failed(e.to_string()),
        };

        let profile = match self.stats.fetch_player(&tag).await {
            Ok(profile) => profile,
            Err(e) => return failed(e.to_string()),
        };

        let update = accumulate(&record, profile.trophies);
        match self.db.apply_poll_update(&record, &profile.name, &update).await {
            Ok(true) => PollOutcome::Updated,
            Ok(false) => {
                debug!(%tag, version = record.version, "🔄 Record changed during poll, result dropped");
                PollOutcome::Conflict
            }
            Err(e) => failed(e.to_string()),
        }
    }

    /// Back up every record then start a new period.
    #[instrument(skip(self))]
    pub async fn reset_cycle(&self) -> Result<ResetOutcome, AppError> {
        let outcome = self.db.reset_all(Utc::now(), self.today()).await?;

        info!(
            backup_id = outcome.backup_id,
            player_count = outcome.player_count,
            taken_at = %outcome.taken_at,
            "🗄️ Counters reset"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use super::*;
    use crate::clash::{PlayerDto, StatsError, StatsResponse};
    use crate::db::memory_repository;

    #[derive(Debug, Default)]
    struct FakeStats {
        players: Mutex<HashMap<String, (String, i64)>>,
        failing: Mutex<HashSet<String>>,
    }

    impl FakeStats {
        fn set(&self, tag: &str, name: &str, trophies: i64) {
            self.players
                .lock()
                .unwrap()
                .insert(tag.to_string(), (name.to_string(), trophies));
        }

        fn fail(&self, tag: &str) {
            self.failing.lock().unwrap().insert(tag.to_string());
        }
    }

    #[async_trait]
    impl StatsSource for FakeStats {
        async fn fetch_player(&self, tag: &PlayerTag) -> StatsResponse<PlayerDto> {
            if self.failing.lock().unwrap().contains(tag.as_str()) {
                return Err(StatsError::Status(StatusCode::SERVICE_UNAVAILABLE));
            }

            match self.players.lock().unwrap().get(tag.as_str()) {
                Some((name, trophies)) => Ok(PlayerDto {
                    tag: format!("#{tag}"),
                    name: name.clone(),
                    trophies: *trophies,
                }),
                None => Err(StatsError::NotFound(tag.clone())),
            }
        }
    }

    async fn setup() -> (Tracker, Arc<FakeStats>, Repository) {
        let repo = memory_repository().await;
        let stats = Arc::new(FakeStats::default());
        let offset = FixedOffset::east_opt(330 * 60).unwrap();
        let tracker = Tracker::new(repo.clone(), stats.clone(), offset);
        (tracker, stats, repo)
    }

    fn tag(raw: &str) -> PlayerTag {
        PlayerTag::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn link_stores_fetched_profile() {
        let (tracker, stats, _) = setup().await;
        stats.set("2PP", "Chief", 5012);

        let record = tracker.link(7, " #2pp ").await.unwrap();

        assert_eq!(record.player_tag, "2PP");
        assert_eq!(record.name, "Chief");
        assert_eq!(record.linked_user_id, Some(7));
        assert_eq!(record.trophies, 5012);
        assert_eq!(record.prev_trophies, 5012);
        assert_eq!(record.last_reset, tracker.today());
    }

    #[tokio::test]
    async fn relink_moves_ownership_and_keeps_counters() {
        let (tracker, stats, repo) = setup().await;
        stats.set("AAA", "Alpha", 4000);
        tracker.link(1, "AAA").await.unwrap();
        stats.set("AAA", "Alpha", 4050);
        tracker.poll_round(4).await.unwrap();

        let relinked = tracker.link(2, "#AAA").await.unwrap();

        assert_eq!(relinked.linked_user_id, Some(2));
        assert_eq!(relinked.offense_trophies, 50);
        assert_eq!(repo.get_all_players().await.unwrap().len(), 1);
        assert_eq!(tracker.unlink(1, None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn link_rejects_bad_or_unknown_tags() {
        let (tracker, stats, repo) = setup().await;
        stats.fail("DOWN");

        assert!(matches!(tracker.link(1, "#!!").await, Err(AppError::InvalidTag(_))));
        assert!(matches!(tracker.link(1, "").await, Err(AppError::InvalidTag(_))));
        assert!(matches!(
            tracker.link(1, "#MISSING").await,
            Err(AppError::InvalidTag(t)) if t == "MISSING"
        ));
        assert!(matches!(tracker.link(1, "DOWN").await, Err(AppError::InvalidTag(_))));

        assert!(repo.get_all_players().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unlink_without_owned_records_is_noop() {
        let (tracker, stats, repo) = setup().await;
        stats.set("AAA", "Alpha", 4000);
        tracker.link(1, "AAA").await.unwrap();
        let before = repo.get_all_players().await.unwrap();

        assert_eq!(tracker.unlink(99, None).await.unwrap(), 0);
        assert_eq!(tracker.unlink(1, Some("BBB")).await.unwrap(), 0);

        assert_eq!(repo.get_all_players().await.unwrap(), before);
    }

    #[tokio::test]
    async fn unlink_hides_record_from_leaderboard() {
        let (tracker, stats, _) = setup().await;
        stats.set("AAA", "Alpha", 4000);
        stats.set("BBB", "Bravo", 3000);
        tracker.link(1, "AAA").await.unwrap();
        tracker.link(2, "BBB").await.unwrap();

        assert_eq!(tracker.unlink(1, None).await.unwrap(), 1);

        let page = tracker.leaderboard(&PageState::new(0, "", None, "")).await.unwrap();
        let names: Vec<_> = page.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Bravo"]);
    }

    #[tokio::test]
    async fn remove_requires_administrator() {
        let (tracker, stats, repo) = setup().await;
        stats.set("AAA", "Alpha", 4000);
        tracker.link(1, "AAA").await.unwrap();

        let denied = tracker.remove(Privilege::Member, "AAA").await;
        assert!(matches!(denied, Err(AppError::PermissionDenied)));
        let row = repo.get_player_by_tag(&tag("AAA")).await.unwrap().unwrap();
        assert_eq!(row.linked_user_id, Some(1));

        assert!(tracker.remove(Privilege::Administrator, "#aaa").await.unwrap());
        assert!(!tracker.remove(Privilege::Administrator, "AAA").await.unwrap());
        let row = repo.get_player_by_tag(&tag("AAA")).await.unwrap().unwrap();
        assert_eq!(row.linked_user_id, None);
    }

    #[tokio::test]
    async fn failing_fetch_only_skips_that_player() {
        let (tracker, stats, repo) = setup().await;
        for (t, name) in [("AAA", "A"), ("BBB", "B"), ("CCC", "C")] {
            stats.set(t, name, 4000);
            tracker.link(1, t).await.unwrap();
        }
        let b_before = repo.get_player_by_tag(&tag("BBB")).await.unwrap().unwrap();

        stats.set("AAA", "A", 4030);
        stats.set("CCC", "C", 3990);
        stats.fail("BBB");

        let report = tracker.poll_round(2).await.unwrap();

        assert_eq!(report.updated, 2);
        assert_eq!(report.conflicts, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].player_tag, "BBB");
        assert_eq!(report.total(), 3);

        let a = repo.get_player_by_tag(&tag("AAA")).await.unwrap().unwrap();
        assert_eq!((a.trophies, a.offense_trophies, a.offense_attacks), (4030, 30, 1));
        let c = repo.get_player_by_tag(&tag("CCC")).await.unwrap().unwrap();
        assert_eq!((c.trophies, c.defense_trophies, c.defense_defenses), (3990, 10, 1));
        let b = repo.get_player_by_tag(&tag("BBB")).await.unwrap().unwrap();
        assert_eq!(b, b_before);
    }

    #[tokio::test]
    async fn unlinked_records_keep_accumulating() {
        let (tracker, stats, repo) = setup().await;
        stats.set("AAA", "Alpha", 4000);
        tracker.link(1, "AAA").await.unwrap();
        tracker.unlink(1, None).await.unwrap();

        stats.set("AAA", "Alpha Renamed", 4100);
        let report = tracker.poll_round(4).await.unwrap();

        assert_eq!(report.updated, 1);
        let row = repo.get_player_by_tag(&tag("AAA")).await.unwrap().unwrap();
        assert_eq!(row.name, "Alpha Renamed");
        assert_eq!(row.offense_trophies, 100);
        assert_eq!(row.linked_user_id, None);
    }

    #[tokio::test]
    async fn poll_round_on_empty_store() {
        let (tracker, _, _) = setup().await;

        assert_eq!(tracker.poll_round(4).await.unwrap(), PollReport::default());
    }

    #[tokio::test]
    async fn reset_cycle_backs_up_and_zeroes() {
        let (tracker, stats, repo) = setup().await;
        stats.set("AAA", "Alpha", 4000);
        tracker.link(1, "AAA").await.unwrap();
        stats.set("AAA", "Alpha", 4050);
        tracker.poll_round(1).await.unwrap();
        let before = repo.get_all_players().await.unwrap();

        let outcome = tracker.reset_cycle().await.unwrap();

        assert_eq!(outcome.player_count, 1);
        assert_eq!(repo.latest_backup().await.unwrap().unwrap().players, before);
        let row = repo.get_player_by_tag(&tag("AAA")).await.unwrap().unwrap();
        assert_eq!(row.trophies, 4050);
        assert_eq!(row.prev_trophies, 4050);
        assert_eq!(row.offense_trophies, 0);
        assert_eq!(row.offense_attacks, 0);
    }

    #[tokio::test]
    async fn force_reset_requires_administrator() {
        let (tracker, _, repo) = setup().await;

        let denied = tracker.force_reset(Privilege::Member).await;
        assert!(matches!(denied, Err(AppError::PermissionDenied)));
        assert_eq!(repo.count_backups().await.unwrap(), 0);

        tracker.force_reset(Privilege::Administrator).await.unwrap();
        assert_eq!(repo.count_backups().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn leaderboard_pages_through_linked_players() {
        let (tracker, stats, _) = setup().await;
        for i in 0..12 {
            let t = format!("P{i:02}");
            stats.set(&t, &format!("Player {i}"), 5000 - i);
            tracker.link(i as u64, &t).await.unwrap();
        }

        let state = PageState::new(0, "", None, "#ff0000");
        let first = tracker.leaderboard(&state).await.unwrap();
        assert_eq!(first.entries.len(), 10);
        assert_eq!(first.page_count, 2);
        assert_eq!(first.color.value(), 0xFF0000);

        let second = tracker
            .leaderboard(&state.navigate(crate::tracking::NavAction::Next))
            .await
            .unwrap();
        let ranks: Vec<_> = second.entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![11, 12]);
        assert!(!second.has_next());

        let strong = tracker
            .leaderboard(&PageState::new(0, "", Some(4995), ""))
            .await
            .unwrap();
        assert_eq!(strong.filtered_count, 6);
        assert_eq!(strong.page_count, 1);
    }

    /// Runs a reset while the fetch is in flight, as the daily job could.
    #[derive(Debug)]
    struct ResetDuringFetch {
        repo: Repository,
        trophies: i64,
    }

    #[async_trait]
    impl StatsSource for ResetDuringFetch {
        async fn fetch_player(&self, tag: &PlayerTag) -> StatsResponse<PlayerDto> {
            let today = NaiveDate::from_ymd_opt(2025, 8, 2).unwrap();
            self.repo.reset_all(Utc::now(), today).await.unwrap();

            Ok(PlayerDto {
                tag: format!("#{tag}"),
                name: "Alpha".into(),
                trophies: self.trophies,
            })
        }
    }

    #[tokio::test]
    async fn reset_during_fetch_drops_poll_result() {
        let (tracker, stats, repo) = setup().await;
        stats.set("AAA", "Alpha", 4000);
        tracker.link(1, "AAA").await.unwrap();

        let racing = Tracker::new(
            repo.clone(),
            Arc::new(ResetDuringFetch {
                repo: repo.clone(),
                trophies: 4060,
            }),
            tracker.offset,
        );

        let report = racing.poll_round(1).await.unwrap();

        assert_eq!(report.conflicts, 1);
        assert_eq!(report.updated, 0);
        assert!(report.failures.is_empty());

        let row = repo.get_player_by_tag(&tag("AAA")).await.unwrap().unwrap();
        assert_eq!(row.trophies, 4000);
        assert_eq!(row.offense_trophies, 0);
        assert_eq!(row.offense_attacks, 0);
        assert_eq!(repo.count_backups().await.unwrap(), 1);
    }
}
