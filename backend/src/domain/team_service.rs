//! Team use cases: creation, joining by invite code and role management.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    CreateTeamRequest, JoinTeamRequest, NotificationRelay, TeamRepository, TeamRepositoryError,
    TeamService, UpdateRolesRequest,
};
use crate::domain::{
    Error, InviteCode, NewTeam, Notification, Role, RoleSet, Team, TeamDetails, TeamId,
    TeamListing, TeamMember, TeamName, User, UserId,
};

/// Attempts at generating an unused invite code before giving up.
const INVITE_CODE_ATTEMPTS: usize = 5;
const ALREADY_IN_TEAM: &str = "You are already in a team";

fn map_repository_error(error: TeamRepositoryError) -> Error {
    match error {
        TeamRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("team repository unavailable: {message}"))
        }
        TeamRepositoryError::Query { message } => {
            Error::internal(format!("team repository error: {message}"))
        }
        TeamRepositoryError::DuplicateName => Error::invalid_request("Team name already exists"),
        TeamRepositoryError::DuplicateInviteCode => {
            Error::internal("could not allocate a unique invite code")
        }
        TeamRepositoryError::AlreadyInTeam => Error::invalid_state(ALREADY_IN_TEAM),
    }
}

fn fresh_invite_code() -> InviteCode {
    InviteCode::generate(&mut rand::thread_rng())
}

/// Team service implementing [`TeamService`].
#[derive(Clone)]
pub struct TeamServiceImpl<R> {
    repo: Arc<R>,
    relay: Arc<dyn NotificationRelay>,
    clock: Arc<dyn Clock>,
}

impl<R> TeamServiceImpl<R> {
    /// Create the service.
    pub fn new(repo: Arc<R>, relay: Arc<dyn NotificationRelay>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, relay, clock }
    }
}

fn ensure_teamless(user: &User) -> Result<(), Error> {
    match user.team_id {
        Some(_) => Err(Error::invalid_state(ALREADY_IN_TEAM)),
        None => Ok(()),
    }
}

#[async_trait]
impl<R> TeamService for TeamServiceImpl<R>
where
    R: TeamRepository,
{
    async fn list(&self) -> Result<Vec<TeamListing>, Error> {
        self.repo.list().await.map_err(map_repository_error)
    }

    async fn create(&self, user: &User, request: CreateTeamRequest) -> Result<Team, Error> {
        ensure_teamless(user)?;
        let name =
            TeamName::new(request.name).map_err(|err| Error::invalid_request(err.to_string()))?;
        let description = request
            .description
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());

        let now = self.clock.utc();
        for _ in 0..INVITE_CODE_ATTEMPTS {
            let new_team = NewTeam {
                name: name.clone(),
                description: description.clone(),
                invite_code: fresh_invite_code(),
                captain_id: user.id,
                captain_roles: user.roles.with(Role::Captain),
            };
            match self.repo.create(&new_team, now).await {
                Ok(team) => {
                    info!(team_id = %team.id, captain_id = %user.id, "team created");
                    self.relay
                        .broadcast(Notification::TeamCreated {
                            team_id: team.id,
                            name: team.name.to_string(),
                            captain_id: user.id,
                        })
                        .await;
                    return Ok(team);
                }
                Err(TeamRepositoryError::DuplicateInviteCode) => {
                    warn!("invite code collision, regenerating");
                }
                Err(other) => return Err(map_repository_error(other)),
            }
        }
        Err(map_repository_error(TeamRepositoryError::duplicate_invite_code()))
    }

    async fn get(&self, team: &TeamId) -> Result<TeamDetails, Error> {
        self.repo
            .find_details(team)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("Team not found"))
    }

    async fn join(&self, user: &User, request: JoinTeamRequest) -> Result<Team, Error> {
        ensure_teamless(user)?;
        let code = InviteCode::parse(&request.invite_code)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let team = self
            .repo
            .find_by_invite_code(&code)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("Invalid invite code"))?;

        self.repo
            .join(&team, &user.id, self.clock.utc())
            .await
            .map_err(map_repository_error)?;

        info!(team_id = %team.id, user_id = %user.id, "team joined");
        self.relay
            .broadcast(Notification::TeamMemberJoined {
                team_id: team.id,
                team_name: team.name.to_string(),
                user_id: user.id,
                user_name: user.name.to_string(),
            })
            .await;
        Ok(team)
    }

    async fn update_roles(
        &self,
        actor: &User,
        team: &TeamId,
        member: &UserId,
        request: UpdateRolesRequest,
    ) -> Result<TeamMember, Error> {
        if actor.team_id != Some(*team) || !actor.roles.contains(Role::Captain) {
            return Err(Error::forbidden("Only the team captain can update roles"));
        }
        let roles =
            RoleSet::new(request.roles).map_err(|err| Error::invalid_request(err.to_string()))?;

        self.repo
            .member(team, member)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("Member not found"))?;

        let updated = self
            .repo
            .set_roles(team, member, &roles)
            .await
            .map_err(map_repository_error)?;
        info!(team_id = %team, user_id = %member, roles = ?roles.labels(), "roles updated");
        Ok(updated)
    }
}

#[cfg(test)]
#[path = "team_service_tests.rs"]
mod tests;
