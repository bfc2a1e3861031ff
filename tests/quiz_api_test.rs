mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use std::sync::Arc;

use quiz_backend::config::LevelThreshold;
use serde_json::json;
use tower::ServiceExt;

use common::{admin_token, register, send, setup_app, setup_app_with_remote, RecordingStore};

#[tokio::test]
async fn quiz_flow_end_to_end() {
    let mut app = setup_app(LevelThreshold::Fixed(2));
    let token = admin_token(&app.router).await;
    let code = register(&app.router, &token, "Ana Torres").await;
    let r = &app.router;

    let (status, body) = send(
        r,
        "POST",
        &format!("/api/quiz/{}/start", code),
        None,
        Some(json!({ "document": "12345678", "phone": "555-0100" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["level"], 1);
    assert_eq!(body["candidate"]["full_name"], "Ana Torres");
    assert_eq!(body["candidate"]["document"], "12345678");

    // Two correct answers at level 1 move the candidate to level 2.
    let (_, body) = send(r, "GET", &format!("/api/quiz/{}/question", code), None, None).await;
    assert_eq!(body["question"]["id"], 1);
    assert!(body["question"].get("answer").is_none());
    let (status, body) = send(
        r,
        "POST",
        &format!("/api/quiz/{}/answer", code),
        None,
        Some(json!({ "question_id": 1, "answer": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "correct");
    assert_eq!(body["points"], 10);

    let (_, body) = send(r, "GET", &format!("/api/quiz/{}/question", code), None, None).await;
    assert_eq!(body["question"]["id"], 2);
    let (_, body) = send(
        r,
        "POST",
        &format!("/api/quiz/{}/answer", code),
        None,
        Some(json!({ "question_id": 2, "answer": "A" })),
    )
    .await;
    assert_eq!(body["level"], 2);
    assert_eq!(body["correct_at_level"], 0);
    assert!(body["message"].as_str().unwrap().contains("advanced to level 2"));

    let (_, body) = send(r, "GET", &format!("/api/quiz/{}/question", code), None, None).await;
    assert_eq!(body["question"]["id"], 4);
    let (_, body) = send(
        r,
        "POST",
        &format!("/api/quiz/{}/answer", code),
        None,
        Some(json!({ "question_id": 4, "answer": "red" })),
    )
    .await;
    assert_eq!(body["outcome"], "incorrect");
    assert_eq!(body["points"], 20);
    assert_eq!(body["correct_answers"], json!(["green"]));

    let (_, body) = send(r, "GET", &format!("/api/quiz/{}/question", code), None, None).await;
    assert_eq!(body["question"]["id"], 5);
    let (_, body) = send(
        r,
        "POST",
        &format!("/api/quiz/{}/answer", code),
        None,
        Some(json!({ "question_id": 5, "answer": "B" })),
    )
    .await;
    assert_eq!(body["outcome"], "correct");
    assert_eq!(body["has_more_at_level"], false);

    // Level 2 is exhausted, so the next fetch moves on to level 3.
    let (_, body) = send(r, "GET", &format!("/api/quiz/{}/question", code), None, None).await;
    assert_eq!(body["level"], 3);
    assert_eq!(body["question"]["id"], 6);
    assert_eq!(body["question"]["multiple"], true);
    let (_, body) = send(
        r,
        "POST",
        &format!("/api/quiz/{}/answer", code),
        None,
        Some(json!({ "question_id": 6, "answer": ["A"] })),
    )
    .await;
    assert_eq!(body["outcome"], "partial");
    assert_eq!(body["points_awarded"], 5);

    let (status, body) = send(r, "GET", &format!("/api/quiz/{}/question", code), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["complete"], true);
    assert_eq!(body["points"], 35);

    let finished = app.completions.try_recv().expect("completion event");
    assert_eq!(finished.code, code);
    assert_eq!(finished.shown, vec![1, 2, 4, 5, 6]);

    // A completed code stays closed until an administrator reopens it.
    let (status, _) = send(r, "POST", &format!("/api/quiz/{}/start", code), None, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(r, "POST", &format!("/api/quiz/{}/reset", code), None, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        r,
        "POST",
        &format!("/api/admin/candidates/{}/reopen", code),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    let (status, body) = send(r, "POST", &format!("/api/quiz/{}/start", code), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["points"], 0);
    assert_eq!(body["level"], 1);

    let _ = tokio::fs::remove_dir_all(&app.dir).await;
}

#[tokio::test]
async fn pending_question_is_served_again_and_enforced() {
    let app = setup_app(LevelThreshold::Fixed(3));
    let token = admin_token(&app.router).await;
    let code = register(&app.router, &token, "Luis").await;
    let r = &app.router;

    send(r, "POST", &format!("/api/quiz/{}/start", code), None, None).await;
    let (_, first) = send(r, "GET", &format!("/api/quiz/{}/question", code), None, None).await;
    let (_, again) = send(r, "GET", &format!("/api/quiz/{}/question", code), None, None).await;
    assert_eq!(first["question"]["id"], again["question"]["id"]);

    let (status, body) = send(
        r,
        "POST",
        &format!("/api/quiz/{}/answer", code),
        None,
        Some(json!({ "question_id": 3, "answer": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    // A missing answer counts as the first option.
    let (status, body) = send(
        r,
        "POST",
        &format!("/api/quiz/{}/answer", code),
        None,
        Some(json!({ "question_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "correct");

    let (status, body) = send(r, "POST", &format!("/api/quiz/{}/reset", code), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["points"], 0);
    let (_, body) = send(r, "GET", &format!("/api/quiz/{}/question", code), None, None).await;
    assert_eq!(body["question"]["id"], 1);
}

#[tokio::test]
async fn unknown_codes_and_unstarted_sessions_are_rejected() {
    let app = setup_app(LevelThreshold::default());
    let r = &app.router;

    let (status, body) = send(r, "POST", "/api/quiz/NOPE1234/start", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Unknown access code");

    let (status, _) = send(r, "GET", "/api/quiz/NOPE1234/question", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn report_is_returned_as_pdf_and_upload_needs_drive() {
    let app = setup_app(LevelThreshold::default());
    let token = admin_token(&app.router).await;
    let code = register(&app.router, &token, "Marta").await;
    send(&app.router, "POST", &format!("/api/quiz/{}/start", code), None, None).await;

    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/quiz/{}/report", code))
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/pdf");
    assert_eq!(resp.headers()["x-drive-status"], "disabled");
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    let (status, _) = send(
        &app.router,
        "POST",
        &format!("/api/quiz/{}/upload", code),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let _ = tokio::fs::remove_dir_all(&app.dir).await;
}

fn report_request(code: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/quiz/{}/report", code))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn report_and_results_are_uploaded_when_drive_is_configured() {
    let store = Arc::new(RecordingStore::default());
    let app = setup_app_with_remote(LevelThreshold::default(), Some(store.clone()));
    let token = admin_token(&app.router).await;
    let code = register(&app.router, &token, "Lucia").await;
    send(&app.router, "POST", &format!("/api/quiz/{}/start", code), None, None).await;

    let resp = app.router.clone().oneshot(report_request(&code)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-drive-status"], "uploaded");
    assert_eq!(resp.headers()["x-drive-file-id"], "file-1");
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    let (status, body) = send(
        &app.router,
        "POST",
        &format!("/api/quiz/{}/upload", code),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uploaded"], true);
    assert_eq!(body["file_id"], "file-2");
    assert!(body["file_name"].as_str().unwrap().starts_with("quiz_results_"));

    let uploads = store.uploads();
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0].1, "application/pdf");
    assert!(uploads[0].0.starts_with("evaluation_report_"));
    assert_eq!(uploads[1].1, "application/json");
    assert!(uploads[1].2 > 0);

    let _ = tokio::fs::remove_dir_all(&app.dir).await;
}

#[tokio::test]
async fn failed_drive_upload_still_returns_the_report() {
    let store = Arc::new(RecordingStore::failing());
    let app = setup_app_with_remote(LevelThreshold::default(), Some(store.clone()));
    let token = admin_token(&app.router).await;
    let code = register(&app.router, &token, "Pablo").await;
    send(&app.router, "POST", &format!("/api/quiz/{}/start", code), None, None).await;

    let resp = app.router.clone().oneshot(report_request(&code)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/pdf");
    assert_eq!(resp.headers()["x-drive-status"], "failed");
    assert!(resp.headers().get("x-drive-file-id").is_none());
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    let (status, body) = send(
        &app.router,
        "POST",
        &format!("/api/quiz/{}/upload", code),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
    assert!(store.uploads().is_empty());

    let _ = tokio::fs::remove_dir_all(&app.dir).await;
}

#[tokio::test]
async fn blank_contact_fields_do_not_block_start() {
    let app = setup_app(LevelThreshold::default());
    let token = admin_token(&app.router).await;
    let code = register(&app.router, &token, "Elena").await;

    let (status, body) = send(
        &app.router,
        "POST",
        &format!("/api/quiz/{}/start", code),
        None,
        Some(json!({ "full_name": "", "document": "", "email": "", "phone": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["candidate"]["full_name"], "Elena");
    assert_eq!(body["candidate"]["email"], "candidate@example.com");

    let (status, _) = send(
        &app.router,
        "POST",
        &format!("/api/quiz/{}/start", code),
        None,
        Some(json!({ "email": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_question_bank() {
    let app = setup_app(LevelThreshold::default());
    let (status, body) = send(&app.router, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["questions"], 6);
    assert_eq!(body["levels"], json!([1, 2, 3]));
    assert_eq!(body["drive"], false);
}
