// Router-level tests exercising the JSON and multipart surfaces end to
// end against in-memory collaborators.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{backend, backend_with, sample_report_json, TestBackend};
use interview_coach::http::{create_router, AppState};
use tower::ServiceExt;

const BOUNDARY: &str = "x-coach-test-boundary";

fn router_for(backend: &TestBackend) -> Router {
    create_router(AppState::new(backend.orchestrator.clone()))
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(
    uri: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"{file_name}\"\r\nContent-Type: audio/webm\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_check_responds_ok() {
    let backend = backend();
    let response = router_for(&backend)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn full_practice_flow_over_http() {
    let backend = backend_with(vec![None, Some(sample_report_json())]);
    let router = router_for(&backend);

    // Start a session
    let response = router
        .clone()
        .oneshot(json_request(
            "/practice/start",
            serde_json::json!({
                "role": "Backend Engineer",
                "userId": "u1",
                "difficulty": "easy",
                "focus": "technical"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let started = body_json(response).await;
    let session_id = started["sessionId"].as_str().unwrap().to_string();
    assert_eq!(started["questions"].as_array().unwrap().len(), 8);
    assert_eq!(started["roundNumber"], 1);
    assert_eq!(started["config"]["difficulty"], "easy");
    assert_eq!(started["config"]["focus"], "technical");
    assert!(started["previousRound"]["sessionId"].is_null());

    // Answer question 0 with audio
    let response = router
        .clone()
        .oneshot(multipart_request(
            "/practice/answer",
            &[
                ("sessionId", session_id.as_str()),
                ("userId", "u1"),
                ("questionIndex", "0"),
                ("questionText", "Tell me about yourself."),
                ("skipped", "false"),
            ],
            Some(("take1.webm", b"spoken answer")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ok"], true);

    // Skip question 1; boolean-as-string is case-insensitive and no file
    // is required
    let response = router
        .clone()
        .oneshot(multipart_request(
            "/practice/answer",
            &[
                ("sessionId", session_id.as_str()),
                ("userId", "u1"),
                ("questionIndex", "1"),
                ("questionText", "Describe a challenge."),
                ("skipped", "TRUE"),
            ],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Finish and collect the report
    let response = router
        .clone()
        .oneshot(json_request(
            "/practice/finish",
            serde_json::json!({ "sessionId": session_id, "userId": "u1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let finished = body_json(response).await;
    assert_eq!(finished["status"], "completed");
    assert_eq!(finished["summary"]["overallScore"], 82);
    let per_question = finished["perQuestion"].as_array().unwrap();
    assert_eq!(per_question.len(), 2);
    assert_eq!(per_question[0]["transcript"], "spoken answer");
    assert_eq!(per_question[1]["skipped"], true);
}

#[tokio::test]
async fn unskipped_answer_without_file_is_rejected() {
    let backend = backend();
    let router = router_for(&backend);

    let response = router
        .clone()
        .oneshot(json_request(
            "/practice/start",
            serde_json::json!({ "role": "Backend Engineer", "userId": "u1" }),
        ))
        .await
        .unwrap();
    let session_id = body_json(response).await["sessionId"]
        .as_str()
        .unwrap()
        .to_string();

    let response = router
        .oneshot(multipart_request(
            "/practice/answer",
            &[
                ("sessionId", session_id.as_str()),
                ("userId", "u1"),
                ("questionIndex", "0"),
                ("questionText", "Q?"),
                ("skipped", "false"),
            ],
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Missing audio");
}

#[tokio::test]
async fn unknown_session_maps_to_404_with_message() {
    let backend = backend();

    let response = router_for(&backend)
        .oneshot(json_request(
            "/practice/finish",
            serde_json::json!({ "sessionId": "missing", "userId": "u1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Session not found");
}

#[tokio::test]
async fn start_without_role_is_rejected() {
    let backend = backend();

    let response = router_for(&backend)
        .oneshot(json_request(
            "/practice/start",
            serde_json::json!({ "role": "  ", "userId": "u1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_question_index_is_rejected() {
    let backend = backend();
    let router = router_for(&backend);

    let response = router
        .clone()
        .oneshot(json_request(
            "/practice/start",
            serde_json::json!({ "role": "Backend Engineer", "userId": "u1" }),
        ))
        .await
        .unwrap();
    let session_id = body_json(response).await["sessionId"]
        .as_str()
        .unwrap()
        .to_string();

    let response = router
        .oneshot(multipart_request(
            "/practice/answer",
            &[
                ("sessionId", session_id.as_str()),
                ("userId", "u1"),
                ("questionIndex", "not-a-number"),
                ("questionText", "Q?"),
                ("skipped", "true"),
            ],
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn refinishing_a_completed_session_conflicts() {
    let backend = backend();
    let router = router_for(&backend);

    let response = router
        .clone()
        .oneshot(json_request(
            "/practice/start",
            serde_json::json!({ "role": "Backend Engineer", "userId": "u1" }),
        ))
        .await
        .unwrap();
    let session_id = body_json(response).await["sessionId"]
        .as_str()
        .unwrap()
        .to_string();

    let finish = serde_json::json!({ "sessionId": session_id, "userId": "u1" });
    let response = router
        .clone()
        .oneshot(json_request("/practice/finish", finish.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(json_request("/practice/finish", finish))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
