//! Follow graph handlers.
//!
//! ```text
//! GET    /api/v1/users/{id}/follow-stats
//! GET    /api/v1/users/{id}/is-following/{target}
//! POST   /api/v1/users/{id}/follow
//! DELETE /api/v1/users/{id}/follow
//! ```
//!
//! In follow and unfollow the path id names the target; the actor is always
//! the authenticated caller.

use actix_web::{HttpResponse, delete, get, post, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{FollowStats, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::envelope::ok;
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::state::HttpState;

/// Follow relation between two users.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowState {
    pub is_following: bool,
}

/// Follower and following figures of any user.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/follow-stats",
    params(("id" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Follow statistics", body = FollowStats),
        (status = 404, description = "User not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["social"],
    operation_id = "followStats",
    security([])
)]
#[get("/users/{id}/follow-stats")]
pub async fn follow_stats(
    state: web::Data<HttpState>,
    path: web::Path<UserId>,
) -> ApiResult<HttpResponse> {
    let stats = state.social.follow_stats(&path.into_inner()).await?;
    Ok(ok(stats))
}

/// Whether `id` follows `target`.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/is-following/{target}",
    params(
        ("id" = String, Path, description = "Follower"),
        ("target" = String, Path, description = "Followed user")
    ),
    responses(
        (status = 200, description = "Follow state", body = FollowState),
        (status = 401, description = "Unauthorised", body = ErrorEnvelopeSchema)
    ),
    tags = ["social"],
    operation_id = "isFollowing",
    security(("BearerAuth" = []))
)]
#[get("/users/{id}/is-following/{target}")]
pub async fn is_following(
    state: web::Data<HttpState>,
    _caller: AuthenticatedUser,
    path: web::Path<(UserId, UserId)>,
) -> ApiResult<HttpResponse> {
    let (follower, target) = path.into_inner();
    let is_following = state.social.is_following(&follower, &target).await?;
    Ok(ok(FollowState { is_following }))
}

/// Make the caller follow `id`.
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/follow",
    params(("id" = String, Path, description = "User to follow")),
    responses(
        (status = 200, description = "Now following", body = FollowState),
        (status = 400, description = "Self-follow or already following", body = ErrorEnvelopeSchema),
        (status = 404, description = "User not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["social"],
    operation_id = "follow",
    security(("BearerAuth" = []))
)]
#[post("/users/{id}/follow")]
pub async fn follow(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<UserId>,
) -> ApiResult<HttpResponse> {
    state.social.follow(caller.user(), &path.into_inner()).await?;
    Ok(ok(FollowState { is_following: true }))
}

/// Make the caller stop following `id`.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}/follow",
    params(("id" = String, Path, description = "User to unfollow")),
    responses(
        (status = 200, description = "No longer following", body = FollowState),
        (status = 404, description = "Not following this user", body = ErrorEnvelopeSchema)
    ),
    tags = ["social"],
    operation_id = "unfollow",
    security(("BearerAuth" = []))
)]
#[delete("/users/{id}/follow")]
pub async fn unfollow(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<UserId>,
) -> ApiResult<HttpResponse> {
    state
        .social
        .unfollow(caller.user(), &path.into_inner())
        .await?;
    Ok(ok(FollowState {
        is_following: false,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;

    use crate::domain::Error;
    use crate::inbound::http::test_utils::{MockPorts, bearer, read_json, test_app};
    use crate::test_support::sample_user;

    #[actix_web::test]
    async fn follow_targets_the_path_user() {
        let caller = sample_user();
        let caller_id = caller.id;
        let target = UserId::random();
        let mut ports = MockPorts::default();
        ports.authenticate_as(caller);
        ports
            .social
            .expect_follow()
            .withf(move |actor, followed| actor.id == caller_id && *followed == target)
            .times(1)
            .return_once(|_, _| Ok(()));
        let app =
            actix_test::init_service(test_app(ports).service(web::scope("/api/v1").service(follow)))
                .await;

        let request = actix_test::TestRequest::post()
            .uri(&format!("/api/v1/users/{target}/follow"))
            .insert_header(bearer())
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["data"]["isFollowing"], true);
    }

    #[actix_web::test]
    async fn self_follow_is_rejected() {
        let caller = sample_user();
        let caller_id = caller.id;
        let mut ports = MockPorts::default();
        ports.authenticate_as(caller);
        ports
            .social
            .expect_follow()
            .times(1)
            .return_once(|_, _| Err(Error::invalid_request("Cannot follow yourself")));
        let app =
            actix_test::init_service(test_app(ports).service(web::scope("/api/v1").service(follow)))
                .await;

        let request = actix_test::TestRequest::post()
            .uri(&format!("/api/v1/users/{caller_id}/follow"))
            .insert_header(bearer())
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["error"], "Cannot follow yourself");
    }

    #[actix_web::test]
    async fn follow_stats_are_public() {
        let target = UserId::random();
        let mut ports = MockPorts::default();
        ports
            .social
            .expect_follow_stats()
            .withf(move |user| *user == target)
            .times(1)
            .return_once(|_| {
                Ok(FollowStats {
                    followers_count: 2,
                    following_count: 0,
                    followers: Vec::new(),
                    following: Vec::new(),
                })
            });
        let app = actix_test::init_service(
            test_app(ports).service(web::scope("/api/v1").service(follow_stats)),
        )
        .await;

        let request = actix_test::TestRequest::get()
            .uri(&format!("/api/v1/users/{target}/follow-stats"))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["data"]["followersCount"], 2);
    }

    #[actix_web::test]
    async fn malformed_ids_are_rejected_before_the_service() {
        let app = actix_test::init_service(
            test_app(MockPorts::default()).service(web::scope("/api/v1").service(follow_stats)),
        )
        .await;

        let request = actix_test::TestRequest::get()
            .uri("/api/v1/users/not-a-uuid/follow-stats")
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["code"], "invalid_request");
    }
}
