//! League overview, weekly settlement and leaderboards.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    LeaderboardService, LeagueOverview, LeagueRepository, LeagueRepositoryError, LeagueService,
};
use crate::domain::social::{clamp_leaderboard_limit, rank_teams};
use crate::domain::{
    Error, League, LeaderboardEntry, SettlementOutcome, TeamLeaderboardEntry, User, league,
};

/// Users listed per league in the overview.
const OVERVIEW_TOP_USERS: u32 = 10;

fn map_repository_error(error: LeagueRepositoryError) -> Error {
    match error {
        LeagueRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("league repository unavailable: {message}"))
        }
        LeagueRepositoryError::Query { message } => {
            Error::internal(format!("league repository error: {message}"))
        }
    }
}

/// League service implementing [`LeagueService`].
#[derive(Clone)]
pub struct LeagueServiceImpl<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
    promotion_percent: u8,
}

impl<R> LeagueServiceImpl<R> {
    /// Create the service; `promotion_percent` is the share of each league
    /// promoted and demoted every week.
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>, promotion_percent: u8) -> Self {
        Self {
            repo,
            clock,
            promotion_percent,
        }
    }
}

impl<R> LeagueServiceImpl<R>
where
    R: LeagueRepository,
{
    /// Settle the current week without an acting user.
    pub async fn settle_now(&self) -> Result<SettlementOutcome, Error> {
        let now = self.clock.utc();
        let standings = self.repo.standings().await.map_err(map_repository_error)?;
        let outcome = league::settle_leagues(&standings, self.promotion_percent, now);
        self.repo
            .apply_settlement(&outcome, now)
            .await
            .map_err(map_repository_error)?;
        info!(
            promoted = outcome.promoted_count(),
            demoted = outcome.demoted_count(),
            leagues = outcome.snapshots.len(),
            "weekly league settlement applied"
        );
        Ok(outcome)
    }
}

#[async_trait]
impl<R> LeagueService for LeagueServiceImpl<R>
where
    R: LeagueRepository,
{
    async fn overview(&self) -> Result<Vec<LeagueOverview>, Error> {
        self.repo
            .overview(OVERVIEW_TOP_USERS)
            .await
            .map_err(map_repository_error)
    }

    async fn settle_week(&self, user: &User) -> Result<SettlementOutcome, Error> {
        if !user.roles.can_verify() {
            return Err(Error::forbidden("Only verifiers and captains can settle leagues"));
        }
        info!(user_id = %user.id, "manual league settlement requested");
        self.settle_now().await
    }
}

/// Leaderboard service implementing [`LeaderboardService`].
#[derive(Clone)]
pub struct LeaderboardServiceImpl<R> {
    repo: Arc<R>,
}

impl<R> LeaderboardServiceImpl<R> {
    /// Create the service.
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<R> LeaderboardService for LeaderboardServiceImpl<R>
where
    R: LeagueRepository,
{
    async fn individual(
        &self,
        league: Option<League>,
        limit: Option<u32>,
    ) -> Result<Vec<LeaderboardEntry>, Error> {
        self.repo
            .individual_leaderboard(league, clamp_leaderboard_limit(limit))
            .await
            .map_err(map_repository_error)
    }

    async fn teams(&self) -> Result<Vec<TeamLeaderboardEntry>, Error> {
        let aggregates = self
            .repo
            .team_aggregates()
            .await
            .map_err(map_repository_error)?;
        Ok(rank_teams(aggregates))
    }
}

#[cfg(test)]
#[path = "league_service_tests.rs"]
mod tests;
