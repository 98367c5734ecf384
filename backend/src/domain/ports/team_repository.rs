//! Port for team persistence and membership.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    InviteCode, NewTeam, RoleSet, Team, TeamDetails, TeamId, TeamListing, TeamMember, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by team repository adapters.
    pub enum TeamRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "team repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "team repository query failed: {message}",
        /// Another team uses the name.
        DuplicateName => "team name already exists",
        /// The generated invite code collided with an existing one.
        DuplicateInviteCode => "invite code already exists",
        /// The user joined a team meanwhile.
        AlreadyInTeam => "user already belongs to a team",
    }
}

/// Port for teams.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Teams ordered by team XP, highest first.
    async fn list(&self) -> Result<Vec<TeamListing>, TeamRepositoryError>;

    /// Create the team, attach the captain with the given roles and record
    /// TEAM_JOINED in one transaction.
    async fn create(&self, team: &NewTeam, at: DateTime<Utc>)
    -> Result<Team, TeamRepositoryError>;

    /// One team.
    async fn find(&self, id: &TeamId) -> Result<Option<Team>, TeamRepositoryError>;

    /// Team with members and recent submissions.
    async fn find_details(&self, id: &TeamId) -> Result<Option<TeamDetails>, TeamRepositoryError>;

    /// Team owning an invite code.
    async fn find_by_invite_code(
        &self,
        code: &InviteCode,
    ) -> Result<Option<Team>, TeamRepositoryError>;

    /// Attach a teamless user and record TEAM_JOINED.
    async fn join(
        &self,
        team: &Team,
        user: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), TeamRepositoryError>;

    /// A member of the team, if the user belongs to it.
    async fn member(
        &self,
        team: &TeamId,
        user: &UserId,
    ) -> Result<Option<TeamMember>, TeamRepositoryError>;

    /// Replace the roles of a user, returning the updated member view.
    async fn set_roles(
        &self,
        team: &TeamId,
        user: &UserId,
        roles: &RoleSet,
    ) -> Result<TeamMember, TeamRepositoryError>;
}
