//! Driving ports for leagues and leaderboards.

use async_trait::async_trait;

use crate::domain::{
    Error, League, LeaderboardEntry, SettlementOutcome, TeamLeaderboardEntry, User,
};

use super::LeagueOverview;

/// Domain use-case port for leagues.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeagueService: Send + Sync {
    /// Every league with its population and leaders.
    async fn overview(&self) -> Result<Vec<LeagueOverview>, Error>;

    /// Run the weekly settlement now; verifiers and captains only.
    async fn settle_week(&self, user: &User) -> Result<SettlementOutcome, Error>;
}

/// Domain use-case port for leaderboards.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeaderboardService: Send + Sync {
    /// Players by XP, optionally within a league.
    async fn individual(
        &self,
        league: Option<League>,
        limit: Option<u32>,
    ) -> Result<Vec<LeaderboardEntry>, Error>;

    /// Teams by summed member XP.
    async fn teams(&self) -> Result<Vec<TeamLeaderboardEntry>, Error>;
}
