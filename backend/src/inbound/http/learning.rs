//! Learning path handlers.
//!
//! ```text
//! GET  /api/v1/path
//! GET  /api/v1/path/units/{id}
//! POST /api/v1/path/lessons/{id}/start
//! POST /api/v1/path/lessons/{id}/submit {"answers":{...},"errorsCount":1}
//! ```

use actix_web::{HttpResponse, get, post, web};

use crate::domain::ports::{LessonSubmission, LessonSubmissionResult};
use crate::domain::{Lesson, LessonId, PathUnit, UnitId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::envelope::ok;
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::state::HttpState;

/// Every unit with completion and lock flags for the caller.
#[utoipa::path(
    get,
    path = "/api/v1/path",
    responses(
        (status = 200, description = "Learning path", body = [PathUnit]),
        (status = 401, description = "Unauthorised", body = ErrorEnvelopeSchema)
    ),
    tags = ["path"],
    operation_id = "getPath",
    security(("BearerAuth" = []))
)]
#[get("/path")]
pub async fn get_path(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let units = state.learning.path(caller.user()).await?;
    Ok(ok(units))
}

/// One unit with its ordered lessons.
#[utoipa::path(
    get,
    path = "/api/v1/path/units/{id}",
    params(("id" = String, Path, description = "Unit identifier")),
    responses(
        (status = 200, description = "Unit", body = PathUnit),
        (status = 404, description = "Unit not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["path"],
    operation_id = "getUnit",
    security(("BearerAuth" = []))
)]
#[get("/path/units/{id}")]
pub async fn get_unit(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<UnitId>,
) -> ApiResult<HttpResponse> {
    let unit = state
        .learning
        .unit(caller.user(), &path.into_inner())
        .await?;
    Ok(ok(unit))
}

/// Check the caller has hearts for a lesson and return its content.
#[utoipa::path(
    post,
    path = "/api/v1/path/lessons/{id}/start",
    params(("id" = String, Path, description = "Lesson identifier")),
    responses(
        (status = 200, description = "Lesson content", body = Lesson),
        (status = 400, description = "Not enough hearts", body = ErrorEnvelopeSchema),
        (status = 404, description = "Lesson not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["path"],
    operation_id = "startLesson",
    security(("BearerAuth" = []))
)]
#[post("/path/lessons/{id}/start")]
pub async fn start_lesson(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<LessonId>,
) -> ApiResult<HttpResponse> {
    let lesson = state
        .learning
        .start_lesson(caller.user(), &path.into_inner())
        .await?;
    Ok(ok(lesson))
}

/// Record a finished lesson and pay out its rewards.
#[utoipa::path(
    post,
    path = "/api/v1/path/lessons/{id}/submit",
    params(("id" = String, Path, description = "Lesson identifier")),
    request_body = LessonSubmission,
    responses(
        (status = 200, description = "Attempt outcome", body = LessonSubmissionResult),
        (status = 400, description = "Invalid attempt or not enough hearts", body = ErrorEnvelopeSchema),
        (status = 404, description = "Lesson not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["path"],
    operation_id = "submitLesson",
    security(("BearerAuth" = []))
)]
#[post("/path/lessons/{id}/submit")]
pub async fn submit_lesson(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<LessonId>,
    payload: web::Json<LessonSubmission>,
) -> ApiResult<HttpResponse> {
    let result = state
        .learning
        .submit_lesson(caller.user(), &path.into_inner(), payload.into_inner())
        .await?;
    Ok(ok(result))
}
