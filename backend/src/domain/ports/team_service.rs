//! Driving port for teams and membership.

use async_trait::async_trait;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{Error, Role, Team, TeamDetails, TeamId, TeamListing, TeamMember, User, UserId};

/// New team payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    #[schema(example = "Green Coders")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Join payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinTeamRequest {
    #[schema(example = "K7QX2MPA")]
    pub invite_code: String,
}

/// Role replacement payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRolesRequest {
    pub roles: Vec<Role>,
}

/// Domain use-case port for teams.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TeamService: Send + Sync {
    /// All teams, highest XP first.
    async fn list(&self) -> Result<Vec<TeamListing>, Error>;

    /// Create a team captained by the caller.
    async fn create(&self, user: &User, request: CreateTeamRequest) -> Result<Team, Error>;

    /// One team with members and recent submissions.
    async fn get(&self, team: &TeamId) -> Result<TeamDetails, Error>;

    /// Join a team by invite code.
    async fn join(&self, user: &User, request: JoinTeamRequest) -> Result<Team, Error>;

    /// Replace a member's roles; captains only.
    async fn update_roles(
        &self,
        user: &User,
        team: &TeamId,
        member: &UserId,
        request: UpdateRolesRequest,
    ) -> Result<TeamMember, Error>;
}
