//! League and leaderboard handlers.
//!
//! ```text
//! GET  /api/v1/leagues
//! POST /api/v1/leagues/settle-week
//! GET  /api/v1/leaderboard/individual?league=SILVER&limit=20
//! GET  /api/v1/leaderboard/teams
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::ports::LeagueOverview;
use crate::domain::{League, LeaderboardEntry, SettlementOutcome, TeamLeaderboardEntry};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::envelope::ok;
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::state::HttpState;

/// Filters of the individual leaderboard.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// Restrict to one league.
    pub league: Option<League>,
    /// Rows to return; defaults to 50, capped at 100.
    pub limit: Option<u32>,
}

/// Every league with its population and leaders.
#[utoipa::path(
    get,
    path = "/api/v1/leagues",
    responses((status = 200, description = "League overview", body = [LeagueOverview])),
    tags = ["leagues"],
    operation_id = "listLeagues",
    security(("BearerAuth" = []))
)]
#[get("/leagues")]
pub async fn list_leagues(
    state: web::Data<HttpState>,
    _caller: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let leagues = state.leagues.overview().await?;
    Ok(ok(leagues))
}

/// Run the weekly promotion and demotion now.
#[utoipa::path(
    post,
    path = "/api/v1/leagues/settle-week",
    responses(
        (status = 200, description = "Settlement outcome", body = SettlementOutcome),
        (status = 403, description = "Verifiers and captains only", body = ErrorEnvelopeSchema)
    ),
    tags = ["leagues"],
    operation_id = "settleWeek",
    security(("BearerAuth" = []))
)]
#[post("/leagues/settle-week")]
pub async fn settle_week(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let outcome = state.leagues.settle_week(caller.user()).await?;
    Ok(ok(outcome))
}

/// Players ranked by XP.
#[utoipa::path(
    get,
    path = "/api/v1/leaderboard/individual",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Individual leaderboard", body = [LeaderboardEntry]),
        (status = 400, description = "Unknown league", body = ErrorEnvelopeSchema)
    ),
    tags = ["leaderboard"],
    operation_id = "individualLeaderboard",
    security(("BearerAuth" = []))
)]
#[get("/leaderboard/individual")]
pub async fn individual_leaderboard(
    state: web::Data<HttpState>,
    _caller: AuthenticatedUser,
    query: web::Query<LeaderboardQuery>,
) -> ApiResult<HttpResponse> {
    let LeaderboardQuery { league, limit } = query.into_inner();
    let entries = state.leaderboard.individual(league, limit).await?;
    Ok(ok(entries))
}

/// Teams ranked by summed member XP.
#[utoipa::path(
    get,
    path = "/api/v1/leaderboard/teams",
    responses((status = 200, description = "Team leaderboard", body = [TeamLeaderboardEntry])),
    tags = ["leaderboard"],
    operation_id = "teamLeaderboard",
    security(("BearerAuth" = []))
)]
#[get("/leaderboard/teams")]
pub async fn team_leaderboard(
    state: web::Data<HttpState>,
    _caller: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let entries = state.leaderboard.teams().await?;
    Ok(ok(entries))
}
