//! Progress handlers.
//!
//! ```text
//! GET  /api/v1/progress
//! POST /api/v1/progress/restore-heart
//! ```

use actix_web::{HttpResponse, get, post, web};

use crate::domain::ProgressOverview;
use crate::domain::ports::HeartRestoreResult;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::envelope::ok;
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::state::HttpState;

/// Balances, level, domain progress, badges and live boosters of the caller.
#[utoipa::path(
    get,
    path = "/api/v1/progress",
    responses(
        (status = 200, description = "Progress overview", body = ProgressOverview),
        (status = 401, description = "Unauthorised", body = ErrorEnvelopeSchema)
    ),
    tags = ["progress"],
    operation_id = "getProgress",
    security(("BearerAuth" = []))
)]
#[get("/progress")]
pub async fn get_progress(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let overview = state.progress.overview(caller.user()).await?;
    Ok(ok(overview))
}

/// Spend gems on one heart.
#[utoipa::path(
    post,
    path = "/api/v1/progress/restore-heart",
    responses(
        (status = 200, description = "Heart restored", body = HeartRestoreResult),
        (status = 400, description = "Hearts already full or not enough gems", body = ErrorEnvelopeSchema)
    ),
    tags = ["progress"],
    operation_id = "restoreHeart",
    security(("BearerAuth" = []))
)]
#[post("/progress/restore-heart")]
pub async fn restore_heart(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let balances = state.progress.restore_heart(caller.user()).await?;
    Ok(ok(balances))
}
