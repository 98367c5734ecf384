//! Team handlers.
//!
//! ```text
//! GET   /api/v1/teams
//! POST  /api/v1/teams {"name":"Green Coders","description":"..."}
//! GET   /api/v1/teams/{id}
//! POST  /api/v1/teams/join {"inviteCode":"K7QX2MPA"}
//! PATCH /api/v1/teams/{teamId}/members/{userId}/roles {"roles":["VERIFIER"]}
//! ```

use actix_web::{HttpResponse, get, patch, post, web};

use crate::domain::ports::{CreateTeamRequest, JoinTeamRequest, UpdateRolesRequest};
use crate::domain::{Team, TeamDetails, TeamId, TeamListing, TeamMember, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::envelope::{created, ok};
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::state::HttpState;

/// All teams, highest XP first, with member counts.
#[utoipa::path(
    get,
    path = "/api/v1/teams",
    responses((status = 200, description = "Teams", body = [TeamListing])),
    tags = ["teams"],
    operation_id = "listTeams",
    security(("BearerAuth" = []))
)]
#[get("/teams")]
pub async fn list_teams(
    state: web::Data<HttpState>,
    _caller: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let teams = state.teams.list().await?;
    Ok(ok(teams))
}

/// Create a team captained by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/teams",
    request_body = CreateTeamRequest,
    responses(
        (status = 201, description = "Team created", body = Team),
        (status = 400, description = "Already in a team or duplicate name", body = ErrorEnvelopeSchema)
    ),
    tags = ["teams"],
    operation_id = "createTeam",
    security(("BearerAuth" = []))
)]
#[post("/teams")]
pub async fn create_team(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    payload: web::Json<CreateTeamRequest>,
) -> ApiResult<HttpResponse> {
    let team = state
        .teams
        .create(caller.user(), payload.into_inner())
        .await?;
    Ok(created(team))
}

/// Join a team by invite code.
#[utoipa::path(
    post,
    path = "/api/v1/teams/join",
    request_body = JoinTeamRequest,
    responses(
        (status = 200, description = "Joined", body = Team),
        (status = 400, description = "Already in a team", body = ErrorEnvelopeSchema),
        (status = 404, description = "Invalid invite code", body = ErrorEnvelopeSchema)
    ),
    tags = ["teams"],
    operation_id = "joinTeam",
    security(("BearerAuth" = []))
)]
#[post("/teams/join")]
pub async fn join_team(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    payload: web::Json<JoinTeamRequest>,
) -> ApiResult<HttpResponse> {
    let team = state.teams.join(caller.user(), payload.into_inner()).await?;
    Ok(ok(team))
}

/// One team with members and its latest submissions.
#[utoipa::path(
    get,
    path = "/api/v1/teams/{id}",
    params(("id" = String, Path, description = "Team identifier")),
    responses(
        (status = 200, description = "Team", body = TeamDetails),
        (status = 404, description = "Team not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["teams"],
    operation_id = "getTeam",
    security(("BearerAuth" = []))
)]
#[get("/teams/{id}")]
pub async fn get_team(
    state: web::Data<HttpState>,
    _caller: AuthenticatedUser,
    path: web::Path<TeamId>,
) -> ApiResult<HttpResponse> {
    let details = state.teams.get(&path.into_inner()).await?;
    Ok(ok(details))
}

/// Replace a member's roles; captains of that team only.
#[utoipa::path(
    patch,
    path = "/api/v1/teams/{team_id}/members/{user_id}/roles",
    params(
        ("team_id" = String, Path, description = "Team identifier"),
        ("user_id" = String, Path, description = "Member identifier")
    ),
    request_body = UpdateRolesRequest,
    responses(
        (status = 200, description = "Updated member", body = TeamMember),
        (status = 400, description = "Empty role list", body = ErrorEnvelopeSchema),
        (status = 403, description = "Caller is not a captain of the team", body = ErrorEnvelopeSchema),
        (status = 404, description = "Member not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["teams"],
    operation_id = "updateMemberRoles",
    security(("BearerAuth" = []))
)]
#[patch("/teams/{team_id}/members/{user_id}/roles")]
pub async fn update_member_roles(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<(TeamId, UserId)>,
    payload: web::Json<UpdateRolesRequest>,
) -> ApiResult<HttpResponse> {
    let (team, member) = path.into_inner();
    let updated = state
        .teams
        .update_roles(caller.user(), &team, &member, payload.into_inner())
        .await?;
    Ok(ok(updated))
}
