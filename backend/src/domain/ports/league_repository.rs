//! Port for league standings, settlement and leaderboards.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    League, LeaderboardEntry, LeagueStanding, SettlementOutcome, TeamAggregate, UserSummary,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by league repository adapters.
    pub enum LeagueRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "league repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "league repository query failed: {message}",
    }
}

/// One league with its population and leaders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeagueOverview {
    pub league: League,
    pub member_count: u32,
    pub top_users: Vec<UserSummary>,
}

/// Port for league and leaderboard data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeagueRepository: Send + Sync {
    /// Member count and the `top` users by XP for every league.
    async fn overview(&self, top: u32) -> Result<Vec<LeagueOverview>, LeagueRepositoryError>;

    /// Weekly standings of every user.
    async fn standings(&self) -> Result<Vec<LeagueStanding>, LeagueRepositoryError>;

    /// Apply moves, store snapshots, log league events and reset weekly
    /// baselines in one transaction.
    async fn apply_settlement(
        &self,
        outcome: &SettlementOutcome,
        at: DateTime<Utc>,
    ) -> Result<(), LeagueRepositoryError>;

    /// Users ordered by lifetime XP, optionally within one league.
    async fn individual_leaderboard(
        &self,
        league: Option<League>,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, LeagueRepositoryError>;

    /// Member XP summed per team.
    async fn team_aggregates(&self) -> Result<Vec<TeamAggregate>, LeagueRepositoryError>;
}
