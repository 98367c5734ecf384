//! Tests for mission HTTP handlers.

use super::*;
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::json;

use crate::domain::{
    Error, MissionReward, SubmissionStatus, TeamId, UserId, VerificationDecision,
};
use crate::inbound::http::test_utils::{MockPorts, bearer, read_json, test_app};
use crate::test_support::{sample_submission, sample_user};

#[rstest]
#[case("/api/v1/missions", MissionFilter::default())]
#[case(
    "/api/v1/missions?domain=ACCESSIBILITY",
    MissionFilter { domain: Some(NirdDomain::Accessibility), status: None }
)]
#[case(
    "/api/v1/missions?domain=OPEN_SOURCE&status=ARCHIVED",
    MissionFilter {
        domain: Some(NirdDomain::OpenSource),
        status: Some(MissionStatus::Archived),
    }
)]
#[actix_web::test]
async fn list_translates_query_filters(#[case] uri: &'static str, #[case] expected: MissionFilter) {
    let mut ports = MockPorts::default();
    ports.authenticate_as(sample_user());
    ports
        .missions
        .expect_list()
        .withf(move |filter| *filter == expected)
        .times(1)
        .return_once(|_| Ok(Vec::new()));
    let app = actix_test::init_service(
        test_app(ports).service(web::scope("/api/v1").service(list_missions)),
    )
    .await;

    let request = actix_test::TestRequest::get()
        .uri(uri)
        .insert_header(bearer())
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_web::test]
async fn submit_returns_201_with_a_pending_submission() {
    let caller = sample_user();
    let caller_id = caller.id;
    let mission = MissionId::random();
    let submission = sample_submission(TeamId::random(), mission, caller_id);
    let mut ports = MockPorts::default();
    ports.authenticate_as(caller);
    ports
        .missions
        .expect_submit()
        .withf(move |user, id, req| {
            user.id == caller_id
                && *id == mission
                && req.repository_url.as_deref() == Some("https://git.example.org/green/site")
        })
        .times(1)
        .return_once(move |_, _, _| Ok(submission));
    let app = actix_test::init_service(
        test_app(ports).service(web::scope("/api/v1").service(submit_mission)),
    )
    .await;

    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/missions/{mission}/submit"))
        .insert_header(bearer())
        .set_json(json!({"repositoryUrl": "https://git.example.org/green/site"}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], "PENDING");
}

#[actix_web::test]
async fn submit_accepts_an_empty_body() {
    let caller = sample_user();
    let caller_id = caller.id;
    let mission = MissionId::random();
    let submission = sample_submission(TeamId::random(), mission, caller_id);
    let mut ports = MockPorts::default();
    ports.authenticate_as(caller);
    ports
        .missions
        .expect_submit()
        .withf(|_, _, req| req.repository_url.is_none() && req.notes.is_none())
        .times(1)
        .return_once(move |_, _, _| Ok(submission));
    let app = actix_test::init_service(
        test_app(ports).service(web::scope("/api/v1").service(submit_mission)),
    )
    .await;

    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/missions/{mission}/submit"))
        .insert_header(bearer())
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn verify_reports_the_reward() {
    let mut submission =
        sample_submission(TeamId::random(), MissionId::random(), UserId::random());
    submission.status = SubmissionStatus::Approved;
    let submission_id = submission.id;
    let reward = MissionReward {
        user_xp: 100,
        user_gems: 10,
        team_points: 100,
        team_xp: 100,
    };
    let mut ports = MockPorts::default();
    ports.authenticate_as(sample_user());
    ports
        .missions
        .expect_verify()
        .withf(move |_, id, req| {
            *id == submission_id && req.status == VerificationDecision::Approved
        })
        .times(1)
        .return_once(move |_, _, _| Ok(VerificationResult { submission, reward }));
    let app = actix_test::init_service(
        test_app(ports).service(web::scope("/api/v1").service(verify_submission)),
    )
    .await;

    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/missions/submissions/{submission_id}/verify"))
        .insert_header(bearer())
        .set_json(json!({"status": "APPROVED", "notes": "Looks good"}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["submission"]["status"], "APPROVED");
    assert_eq!(body["data"]["reward"]["userXp"], 100);
}

#[actix_web::test]
async fn verifying_twice_is_an_invalid_state() {
    let mut ports = MockPorts::default();
    ports.authenticate_as(sample_user());
    ports
        .missions
        .expect_verify()
        .times(1)
        .return_once(|_, _, _| Err(Error::invalid_state("Submission already verified")));
    let app = actix_test::init_service(
        test_app(ports).service(web::scope("/api/v1").service(verify_submission)),
    )
    .await;

    let request = actix_test::TestRequest::post()
        .uri(&format!(
            "/api/v1/missions/submissions/{}/verify",
            SubmissionId::random()
        ))
        .insert_header(bearer())
        .set_json(json!({"status": "REJECTED"}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["code"], "invalid_state");
    assert_eq!(body["error"], "Submission already verified");
}

#[actix_web::test]
async fn unknown_decisions_never_reach_the_service() {
    let mut ports = MockPorts::default();
    ports.authenticate_as(sample_user());
    let app = actix_test::init_service(
        test_app(ports).service(web::scope("/api/v1").service(verify_submission)),
    )
    .await;

    let request = actix_test::TestRequest::post()
        .uri(&format!(
            "/api/v1/missions/submissions/{}/verify",
            SubmissionId::random()
        ))
        .insert_header(bearer())
        .set_json(json!({"status": "PENDING"}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
