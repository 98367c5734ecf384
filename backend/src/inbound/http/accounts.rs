//! Account API handlers.
//!
//! ```text
//! POST  /api/v1/auth/register {"login":"ada_l","name":"Ada","email":"ada@example.org","password":"..."}
//! POST  /api/v1/auth/login {"login":"ada_l","password":"..."}
//! GET   /api/v1/users/me
//! PATCH /api/v1/users/me/accessibility {"dyslexiaFont":true,...}
//! ```

use actix_web::{HttpResponse, get, patch, post, web};

use crate::domain::AccessibilityPreferences;
use crate::domain::ports::{AuthSession, LoginRequest, RegisterRequest, UserProfile};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::envelope::{created, ok};
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::state::HttpState;

/// Create an account and return it with a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthSession),
        (status = 400, description = "Invalid or duplicate input", body = ErrorEnvelopeSchema),
        (status = 503, description = "Service unavailable", body = ErrorEnvelopeSchema)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let session = state.accounts.register(payload.into_inner()).await?;
    Ok(created(session))
}

/// Check credentials and return a fresh bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthSession),
        (status = 401, description = "Invalid credentials", body = ErrorEnvelopeSchema)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let session = state.accounts.login(payload.into_inner()).await?;
    Ok(ok(session))
}

/// Profile of the caller with team, domain progress, badges and boosters.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Caller profile", body = UserProfile),
        (status = 401, description = "Unauthorised", body = ErrorEnvelopeSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser",
    security(("BearerAuth" = []))
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let profile = state.accounts.profile(caller.user()).await?;
    Ok(ok(profile))
}

/// Replace the caller's accessibility preferences.
#[utoipa::path(
    patch,
    path = "/api/v1/users/me/accessibility",
    request_body = AccessibilityPreferences,
    responses(
        (status = 200, description = "Updated user", body = crate::domain::User),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 401, description = "Unauthorised", body = ErrorEnvelopeSchema)
    ),
    tags = ["users"],
    operation_id = "updateAccessibility",
    security(("BearerAuth" = []))
)]
#[patch("/users/me/accessibility")]
pub async fn update_accessibility(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    payload: web::Json<AccessibilityPreferences>,
) -> ApiResult<HttpResponse> {
    let user = state
        .accounts
        .update_accessibility(caller.user(), payload.into_inner())
        .await?;
    Ok(ok(user))
}
