//! CI result webhook.
//!
//! ```text
//! POST /api/v1/webhooks/ci  X-Webhook-Secret: <secret>
//!      {"submissionId":"...","ciRunId":"run-42","status":"passed","result":{...}}
//! ```
//!
//! The caller proves its identity with the shared secret; requests without a
//! matching `X-Webhook-Secret` header never reach the mission service.

use actix_web::{HttpRequest, HttpResponse, post, web};
use tracing::warn;

use crate::domain::Error;
use crate::domain::ports::{CiReport, VerificationResult};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope::ok;
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::state::HttpState;

/// Header carrying the shared webhook secret.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

fn ensure_trusted(state: &HttpState, req: &HttpRequest) -> Result<(), Error> {
    let presented = req
        .headers()
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    match presented {
        Some(secret) if state.webhook_secret.matches(secret) => Ok(()),
        Some(_) => {
            warn!("CI webhook called with a mismatched secret");
            Err(Error::unauthorized("Invalid webhook secret"))
        }
        None => Err(Error::unauthorized("Missing webhook secret")),
    }
}

/// Resolve a pending submission from a CI run.
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/ci",
    request_body = CiReport,
    params(("X-Webhook-Secret" = String, Header, description = "Shared CI secret")),
    responses(
        (status = 200, description = "Submission resolved", body = VerificationResult),
        (status = 400, description = "Submission already verified", body = ErrorEnvelopeSchema),
        (status = 401, description = "Missing or invalid secret", body = ErrorEnvelopeSchema),
        (status = 404, description = "Submission not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["webhooks"],
    operation_id = "ciWebhook",
    security([])
)]
#[post("/webhooks/ci")]
pub async fn ci_webhook(
    state: web::Data<HttpState>,
    req: HttpRequest,
    payload: web::Json<CiReport>,
) -> ApiResult<HttpResponse> {
    ensure_trusted(&state, &req)?;
    let result = state.missions.record_ci_result(payload.into_inner()).await?;
    Ok(ok(result))
}
