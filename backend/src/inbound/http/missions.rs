//! Mission handlers.
//!
//! ```text
//! GET  /api/v1/missions?domain=ECO_DESIGN&status=ACTIVE
//! GET  /api/v1/missions/submissions
//! POST /api/v1/missions/{id}/submit {"repositoryUrl":"https://...","notes":"..."}
//! POST /api/v1/missions/submissions/{id}/verify {"status":"APPROVED","notes":"..."}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::ports::{SubmitMissionRequest, VerificationResult, VerifySubmissionRequest};
use crate::domain::{
    Mission, MissionFilter, MissionId, MissionStatus, NirdDomain, Submission, SubmissionId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::envelope::{created, ok};
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::state::HttpState;

/// Mission list filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MissionQuery {
    /// Restrict to one NIRD domain.
    pub domain: Option<NirdDomain>,
    /// Restrict to one lifecycle status.
    pub status: Option<MissionStatus>,
}

impl From<MissionQuery> for MissionFilter {
    fn from(value: MissionQuery) -> Self {
        Self {
            domain: value.domain,
            status: value.status,
        }
    }
}

/// Missions matching the filters.
#[utoipa::path(
    get,
    path = "/api/v1/missions",
    params(MissionQuery),
    responses(
        (status = 200, description = "Missions", body = [Mission]),
        (status = 400, description = "Unknown filter value", body = ErrorEnvelopeSchema)
    ),
    tags = ["missions"],
    operation_id = "listMissions",
    security(("BearerAuth" = []))
)]
#[get("/missions")]
pub async fn list_missions(
    state: web::Data<HttpState>,
    _caller: AuthenticatedUser,
    query: web::Query<MissionQuery>,
) -> ApiResult<HttpResponse> {
    let missions = state.missions.list(query.into_inner().into()).await?;
    Ok(ok(missions))
}

/// Submissions of the caller's team, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/missions/submissions",
    responses(
        (status = 200, description = "Team submissions", body = [Submission]),
        (status = 400, description = "You must be in a team", body = ErrorEnvelopeSchema)
    ),
    tags = ["missions"],
    operation_id = "teamSubmissions",
    security(("BearerAuth" = []))
)]
#[get("/missions/submissions")]
pub async fn team_submissions(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let submissions = state.missions.team_submissions(caller.user()).await?;
    Ok(ok(submissions))
}

/// Submit the caller's team's work for a mission.
#[utoipa::path(
    post,
    path = "/api/v1/missions/{id}/submit",
    params(("id" = String, Path, description = "Mission identifier")),
    request_body = SubmitMissionRequest,
    responses(
        (status = 201, description = "Submission recorded as PENDING", body = Submission),
        (status = 400, description = "You must be in a team", body = ErrorEnvelopeSchema),
        (status = 404, description = "Mission not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["missions"],
    operation_id = "submitMission",
    security(("BearerAuth" = []))
)]
#[post("/missions/{id}/submit")]
pub async fn submit_mission(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<MissionId>,
    payload: Option<web::Json<SubmitMissionRequest>>,
) -> ApiResult<HttpResponse> {
    let request = payload.map(web::Json::into_inner).unwrap_or_default();
    let submission = state
        .missions
        .submit(caller.user(), &path.into_inner(), request)
        .await?;
    Ok(created(submission))
}

/// Approve or reject a pending submission.
#[utoipa::path(
    post,
    path = "/api/v1/missions/submissions/{id}/verify",
    params(("id" = String, Path, description = "Submission identifier")),
    request_body = VerifySubmissionRequest,
    responses(
        (status = 200, description = "Submission resolved", body = VerificationResult),
        (status = 400, description = "Submission already verified", body = ErrorEnvelopeSchema),
        (status = 403, description = "Verifiers and captains only", body = ErrorEnvelopeSchema),
        (status = 404, description = "Submission not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["missions"],
    operation_id = "verifySubmission",
    security(("BearerAuth" = []))
)]
#[post("/missions/submissions/{id}/verify")]
pub async fn verify_submission(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<SubmissionId>,
    payload: web::Json<VerifySubmissionRequest>,
) -> ApiResult<HttpResponse> {
    let result = state
        .missions
        .verify(caller.user(), &path.into_inner(), payload.into_inner())
        .await?;
    Ok(ok(result))
}

#[cfg(test)]
#[path = "missions_tests.rs"]
mod tests;
