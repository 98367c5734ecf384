//! Tests for HTTP error mapping.

use super::*;
use actix_web::body::to_bytes;
use actix_web::{App, test as actix_test};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn internal_error_case() -> Error {
    Error::internal("connection string leaked")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"secret": "x"}))
}

#[fixture]
fn invalid_request_case() -> Error {
    Error::invalid_request("Not enough hearts")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"field": "hearts"}))
}

async fn envelope_of(error: &Error, expected_status: StatusCode) -> Value {
    let response = ResponseError::error_response(error);
    assert_eq!(response.status(), expected_status);

    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    serde_json::from_slice(&bytes).expect("envelope JSON")
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::invalid_state("Submission already verified"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::service_unavailable("db down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] error: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), status);
}

#[rstest]
#[actix_web::test]
async fn client_errors_keep_message_and_details(invalid_request_case: Error) {
    let body = envelope_of(&invalid_request_case, StatusCode::BAD_REQUEST).await;

    assert_eq!(
        body,
        json!({
            "success": false,
            "error": "Not enough hearts",
            "code": "invalid_request",
            "details": {"field": "hearts"},
            "traceId": TRACE_ID,
        })
    );
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted(internal_error_case: Error) {
    let response = ResponseError::error_response(&internal_error_case);
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .expect("trace-id header")
        .to_str()
        .expect("ascii header")
        .to_owned();
    assert_eq!(header, TRACE_ID);

    let body = envelope_of(&internal_error_case, StatusCode::INTERNAL_SERVER_ERROR).await;
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(body["code"], "internal_error");
    assert!(body.get("details").is_none());
    assert_eq!(body["traceId"], TRACE_ID);
}

#[rstest]
#[actix_web::test]
async fn errors_without_trace_id_omit_header_and_field() {
    let error = Error::not_found("Lesson not found");

    let response = ResponseError::error_response(&error);
    assert!(response.headers().get(TRACE_ID_HEADER).is_none());

    let body = envelope_of(&error, StatusCode::NOT_FOUND).await;
    assert!(body.get("traceId").is_none());
    assert_eq!(body["success"], false);
}

#[rstest]
fn from_actix_error_is_redacted_internal_error() {
    let err: Error = actix_web::error::ErrorBadRequest("boom").into();

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
    assert_eq!(err.details(), None);
}

#[actix_web::test]
async fn malformed_json_bodies_use_the_envelope() {
    #[derive(serde::Deserialize)]
    struct Body {
        #[expect(dead_code, reason = "only the extraction is under test")]
        count: u32,
    }

    let app = actix_test::init_service(App::new().app_data(json_config()).route(
        "/",
        web::post().to(|_body: web::Json<Body>| async { HttpResponse::Ok().finish() }),
    ))
    .await;

    let request = actix_test::TestRequest::post()
        .uri("/")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"count\": \"many\"}")
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "invalid_request");
}
