//! The periodic maintenance jobs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, TimeDelta, Utc, Weekday};
use tracing::{info, warn};

use crate::domain::badge_service::map_event_log_error;
use crate::domain::event::is_streak_milestone;
use crate::domain::ports::{
    ActivityWindow, EventLog, LeagueRepository, MaintenanceRepository, MaintenanceRepositoryError,
};
use crate::domain::{BadgeAwarder, Error, EventPayload, LeagueServiceImpl, NewEvent};

use super::{Schedule, ScheduledJob};

fn map_maintenance_error(error: MaintenanceRepositoryError) -> Error {
    match error {
        MaintenanceRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("maintenance repository unavailable: {message}"))
        }
        MaintenanceRepositoryError::Query { message } => {
            Error::internal(format!("maintenance repository error: {message}"))
        }
    }
}

/// The calendar day before the one containing `now`, as `[start, end)`.
pub fn yesterday(now: DateTime<Utc>) -> ActivityWindow {
    let end = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    ActivityWindow {
        start: end - TimeDelta::days(1),
        end,
    }
}

/// Restores every user to full hearts at midnight.
pub struct HeartRefillJob {
    repo: Arc<dyn MaintenanceRepository>,
    max_hearts: u32,
}

impl HeartRefillJob {
    /// Create the job.
    pub fn new(repo: Arc<dyn MaintenanceRepository>, max_hearts: u32) -> Self {
        Self { repo, max_hearts }
    }
}

#[async_trait]
impl ScheduledJob for HeartRefillJob {
    fn name(&self) -> &'static str {
        "heart_refill"
    }

    fn schedule(&self) -> Schedule {
        Schedule::daily_at(0, 0)
    }

    async fn run(&self, _now: DateTime<Utc>) -> Result<usize, Error> {
        self.repo
            .refill_hearts(self.max_hearts)
            .await
            .map_err(map_maintenance_error)
    }
}

/// Extends or resets streaks from yesterday's passed lessons.
///
/// Milestone lengths log a STREAK_MILESTONE event and every extended user is
/// re-evaluated for badges. Both follow-ups are best effort once the sweep
/// has committed.
pub struct StreakJob {
    repo: Arc<dyn MaintenanceRepository>,
    events: Arc<dyn EventLog>,
    awarder: BadgeAwarder,
}

impl StreakJob {
    /// Create the job.
    pub fn new(
        repo: Arc<dyn MaintenanceRepository>,
        events: Arc<dyn EventLog>,
        awarder: BadgeAwarder,
    ) -> Self {
        Self {
            repo,
            events,
            awarder,
        }
    }
}

#[async_trait]
impl ScheduledJob for StreakJob {
    fn name(&self) -> &'static str {
        "streaks"
    }

    fn schedule(&self) -> Schedule {
        Schedule::daily_at(1, 0)
    }

    async fn run(&self, now: DateTime<Utc>) -> Result<usize, Error> {
        let sweep = self
            .repo
            .update_streaks(yesterday(now), now)
            .await
            .map_err(map_maintenance_error)?;
        info!(
            extended = sweep.extended.len(),
            reset = sweep.reset,
            "streaks updated"
        );

        for &(user_id, streak) in &sweep.extended {
            if is_streak_milestone(streak) {
                let event = NewEvent::for_user(user_id, EventPayload::StreakMilestone { streak });
                if let Err(err) = self.events.append(&event, now).await {
                    let err = map_event_log_error(err);
                    warn!(user_id = %user_id, streak, error = %err, "streak milestone not logged");
                }
            }
            if let Err(err) = self.awarder.evaluate(&user_id).await {
                warn!(user_id = %user_id, error = %err, "badge evaluation after streak failed");
            }
        }
        Ok(sweep.extended.len() + sweep.reset)
    }
}

/// Weekly promotion and demotion.
pub struct LeagueSettlementJob<R> {
    leagues: LeagueServiceImpl<R>,
}

impl<R> LeagueSettlementJob<R> {
    /// Create the job.
    pub fn new(leagues: LeagueServiceImpl<R>) -> Self {
        Self { leagues }
    }
}

#[async_trait]
impl<R> ScheduledJob for LeagueSettlementJob<R>
where
    R: LeagueRepository,
{
    fn name(&self) -> &'static str {
        "league_settlement"
    }

    fn schedule(&self) -> Schedule {
        Schedule::weekly_at(Weekday::Sun, 23, 0)
    }

    async fn run(&self, _now: DateTime<Utc>) -> Result<usize, Error> {
        let outcome = self.leagues.settle_now().await?;
        Ok(outcome.moves.len())
    }
}

/// Deletes expired boosters every hour.
pub struct BoosterSweepJob {
    repo: Arc<dyn MaintenanceRepository>,
}

impl BoosterSweepJob {
    /// Create the job.
    pub fn new(repo: Arc<dyn MaintenanceRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl ScheduledJob for BoosterSweepJob {
    fn name(&self) -> &'static str {
        "booster_sweep"
    }

    fn schedule(&self) -> Schedule {
        Schedule::hourly()
    }

    async fn run(&self, now: DateTime<Utc>) -> Result<usize, Error> {
        self.repo
            .purge_expired_boosters(now)
            .await
            .map_err(map_maintenance_error)
    }
}

/// Closes flash quests whose window has ended.
pub struct FlashQuestSweepJob {
    repo: Arc<dyn MaintenanceRepository>,
}

impl FlashQuestSweepJob {
    /// Create the job.
    pub fn new(repo: Arc<dyn MaintenanceRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl ScheduledJob for FlashQuestSweepJob {
    fn name(&self) -> &'static str {
        "flash_quest_sweep"
    }

    fn schedule(&self) -> Schedule {
        Schedule::every_minutes(10)
    }

    async fn run(&self, now: DateTime<Utc>) -> Result<usize, Error> {
        self.repo
            .deactivate_expired_flash_quests(now)
            .await
            .map_err(map_maintenance_error)
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
