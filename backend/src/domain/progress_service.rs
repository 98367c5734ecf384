//! Progress overview and heart restoration.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    HeartRestoreResult, ProgressRepository, ProgressRepositoryError, ProgressService,
};
use crate::domain::progress::level_for_xp;
use crate::domain::rewards::evaluate_heart_restore;
use crate::domain::{Error, GameRules, ProgressOverview, RewardError, User};

fn map_repository_error(error: ProgressRepositoryError) -> Error {
    match error {
        ProgressRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("progress repository unavailable: {message}"))
        }
        ProgressRepositoryError::Query { message } => {
            Error::internal(format!("progress repository error: {message}"))
        }
        ProgressRepositoryError::InsufficientGems => RewardError::NotEnoughGems.into(),
        ProgressRepositoryError::HeartsFull => RewardError::HeartsFull.into(),
    }
}

/// Progress service implementing [`ProgressService`].
#[derive(Clone)]
pub struct ProgressServiceImpl<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
    rules: GameRules,
}

impl<R> ProgressServiceImpl<R> {
    /// Create the service.
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>, rules: GameRules) -> Self {
        Self { repo, clock, rules }
    }
}

#[async_trait]
impl<R> ProgressService for ProgressServiceImpl<R>
where
    R: ProgressRepository,
{
    async fn overview(&self, user: &User) -> Result<ProgressOverview, Error> {
        let domains = self
            .repo
            .domain_progress(&user.id)
            .await
            .map_err(map_repository_error)?;
        let badges = self
            .repo
            .earned_badges(&user.id)
            .await
            .map_err(map_repository_error)?;
        let active_boosters = self
            .repo
            .active_boosters(&user.id, self.clock.utc())
            .await
            .map_err(map_repository_error)?;

        let progression = &user.progression;
        Ok(ProgressOverview {
            hearts: progression.hearts,
            max_hearts: self.rules.max_hearts,
            streak: progression.streak,
            xp_total: progression.xp_total,
            gems: progression.gems,
            league: progression.league,
            level: level_for_xp(progression.xp_total, self.rules.level_size),
            domains,
            badges,
            active_boosters,
        })
    }

    async fn restore_heart(&self, user: &User) -> Result<HeartRestoreResult, Error> {
        // Fast path on the loaded snapshot; the store re-checks atomically.
        evaluate_heart_restore(user.progression.hearts, user.progression.gems, &self.rules)?;

        let restored = self
            .repo
            .restore_heart(
                &user.id,
                self.rules.restore_heart_cost,
                self.rules.max_hearts,
                self.clock.utc(),
            )
            .await
            .map_err(map_repository_error)?;
        info!(user_id = %user.id, hearts = restored.hearts, gems = restored.gems, "heart restored");
        Ok(HeartRestoreResult {
            hearts: restored.hearts,
            gems: restored.gems,
        })
    }
}

#[cfg(test)]
#[path = "progress_service_tests.rs"]
mod tests;
