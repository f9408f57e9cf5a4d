mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{create_test_app, question_id, send, CANDIDATE};
use serde_json::{json, Value};
use tower::ServiceExt;

fn answers_body(level: u32, correct: usize, total: usize) -> Value {
    let answers: serde_json::Map<String, Value> = (0..total)
        .map(|index| {
            let answer = if index < correct { "a" } else { "c" };
            (question_id(level, index), json!(answer))
        })
        .collect();
    json!({ "answers": answers })
}

fn submit_uri(level: u32) -> String {
    format!(
        "/api/v1/candidates/{}/assessment/levels/{}/submit",
        CANDIDATE, level
    )
}

#[tokio::test]
async fn health_reports_in_memory_storage() {
    let app = create_test_app().await;
    let (status, body) = send(&app.router, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["dependencies"]["storage"]["status"], "in-memory");
}

#[tokio::test]
async fn fresh_candidate_starts_at_level_one() {
    let app = create_test_app().await;
    let (status, body) = send(
        &app.router,
        "GET",
        &format!("/api/v1/candidates/{}/assessment", CANDIDATE),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["level"], 1);
    assert_eq!(body["state"], "available");
    assert_eq!(body["finished"], false);
    assert_eq!(body["levels"][1]["state"], "locked");
    assert_eq!(body["results"], json!({}));
}

#[tokio::test]
async fn level_questions_hide_answer_keys() {
    let app = create_test_app().await;
    let (status, body) = send(
        &app.router,
        "GET",
        &format!("/api/v1/candidates/{}/assessment/levels/1", CANDIDATE),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 10);
    assert!(questions.iter().all(|q| q.get("correct_answer").is_none()));
}

#[tokio::test]
async fn locked_level_questions_are_forbidden() {
    let app = create_test_app().await;
    let (status, body) = send(
        &app.router,
        "GET",
        &format!("/api/v1/candidates/{}/assessment/levels/2", CANDIDATE),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], 403);
    assert_eq!(
        body["message"],
        "You must pass Level 1 before attempting Level 2."
    );
}

#[tokio::test]
async fn submit_then_resubmit_conflicts() {
    let app = create_test_app().await;

    let (status, body) = send(&app.router, "POST", &submit_uri(1), Some(answers_body(1, 6, 10))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["score"], 60);
    assert_eq!(body["passed"], true);

    let (status, body) = send(&app.router, "POST", &submit_uri(1), Some(answers_body(1, 10, 10))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "You have already attempted Level 1.");

    let (_, progress) = send(
        &app.router,
        "GET",
        &format!("/api/v1/candidates/{}/assessment", CANDIDATE),
        None,
    )
    .await;
    assert_eq!(progress["level"], 2);
    assert_eq!(progress["results"]["1"], true);
}

#[tokio::test]
async fn out_of_range_level_is_bad_request() {
    let app = create_test_app().await;

    for level in [0, 4] {
        let (status, body) = send(&app.router, "POST", &submit_uri(level), Some(json!({ "answers": {} }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "level {}", level);
        assert_eq!(body["status"], 400);
    }
    assert!(app.ledger.is_empty().await);
}

#[tokio::test]
async fn non_numeric_level_returns_json_error() {
    let app = create_test_app().await;

    let uri = format!("/api/v1/candidates/{}/assessment/levels/abc", CANDIDATE);
    let (status, body) = send(&app.router, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid path parameter"));

    let uri = format!("/api/v1/candidates/{}/assessment/levels/abc/submit", CANDIDATE);
    let (status, body) = send(&app.router, "POST", &uri, Some(json!({ "answers": {} }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(app.ledger.is_empty().await);
}

#[tokio::test]
async fn unknown_question_is_bad_request() {
    let app = create_test_app().await;
    let (status, body) = send(
        &app.router,
        "POST",
        &submit_uri(1),
        Some(json!({ "answers": { "does-not-exist": "a" } })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Question does-not-exist does not belong to Level 1.");
    assert!(app.ledger.is_empty().await);
}

#[tokio::test]
async fn malformed_body_returns_json_error() {
    let app = create_test_app().await;
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(submit_uri(1))
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], 400);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to parse JSON request body"));
}

#[tokio::test]
async fn unknown_candidate_is_not_found() {
    let app = create_test_app().await;
    let (status, body) = send(&app.router, "GET", "/api/v1/candidates/ghost/assessment", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Candidate ghost not found");
}

#[tokio::test]
async fn responses_carry_trace_id() {
    let app = create_test_app().await;
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-trace-id", "trace-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-trace-id").unwrap(),
        "trace-123"
    );
}

#[tokio::test]
async fn metrics_require_basic_auth() {
    let app = create_test_app().await;
    let (status, _) = send(&app.router, "GET", "/metrics", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
