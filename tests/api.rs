//! API endpoint integration tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use flora_gateway::api::{self, ApiState};
use tower::ServiceExt;

mod common;
use common::{MockOracle, MockStt, MockTts, OracleBehavior, SttBehavior, build_pipeline};

/// Build a test router over mock engines
fn build_test_router(oracle: OracleBehavior) -> axum::Router {
    let pipeline = build_pipeline(
        MockStt::new(SttBehavior::Unintelligible),
        MockOracle::new(oracle),
        MockTts::new(),
        false,
    );
    api::router(Arc::new(ApiState { pipeline }), None)
}

/// POST a JSON body to /chat
fn chat_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router(OracleBehavior::Answer("unused".to_string()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_index_serves_embedded_page() {
    let app = build_test_router(OracleBehavior::Answer("unused".to_string()));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let page = String::from_utf8(body.to_vec()).unwrap();
    assert!(page.contains("Flora"));
}

#[tokio::test]
async fn test_chat_answers_typed_question() {
    let app = build_test_router(OracleBehavior::Answer(
        "Cacti like infrequent, deep watering.".to_string(),
    ));

    let response = app
        .oneshot(chat_request(serde_json::json!({
            "message": "How do I water a cactus?"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["user_message"], "How do I water a cactus?");
    assert_eq!(json["response"], "Cacti like infrequent, deep watering.");
    assert_eq!(json["error"], false);
    assert!(
        json["audio"]
            .as_str()
            .unwrap()
            .starts_with("data:audio/mp3;base64,")
    );
    assert_eq!(json["user_audio"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_chat_empty_body_is_still_http_200() {
    // Failure is signaled by the error flag, never by the transport status
    let app = build_test_router(OracleBehavior::Answer("unused".to_string()));

    let response = app
        .oneshot(chat_request(serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["error"], true);
    assert_eq!(json["audio"], serde_json::Value::Null);
    assert_eq!(json["user_message"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_chat_oracle_outage_is_flagged_not_failed() {
    let app = build_test_router(OracleBehavior::Unavailable);

    let response = app
        .oneshot(chat_request(serde_json::json!({
            "message": "هل النعناع يحب الظل؟"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["error"], true);
    assert!(json["response"].is_string());
    assert_eq!(json["audio"], serde_json::Value::Null);
}
