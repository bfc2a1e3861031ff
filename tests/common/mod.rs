#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use quiz_backend::{
    config::{Config, LevelThreshold},
    error::{Error, Result},
    models::{
        question::{AnswerKey, Level, Question},
        session::Session,
    },
    services::{
        drive_service::{RemoteStore, UploadedFile},
        question_bank::QuestionBank,
    },
    utils::crypto::hash_password,
    AppState,
};
use serde_json::Value as JsonValue;
use tokio::sync::mpsc;
use tower::ServiceExt;

pub const ADMIN_PASSWORD: &str = "pa55word";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub completions: mpsc::UnboundedReceiver<Session>,
    pub dir: PathBuf,
}

pub fn question(id: u32, level: i64, answer: &[usize]) -> Question {
    Question {
        id,
        level: Level::clamped(level),
        prompt: format!("Question {}", id),
        options: vec!["red".into(), "green".into(), "blue".into(), "black".into()],
        answer: AnswerKey::new(answer.to_vec()),
        image: None,
    }
}

/// Level 1: ids 1-3 (answer A). Level 2: ids 4-5 (answer B). Level 3: id 6 (answers A and C).
pub fn sample_bank() -> QuestionBank {
    QuestionBank::new(vec![
        question(1, 1, &[0]),
        question(2, 1, &[0]),
        question(3, 1, &[0]),
        question(4, 2, &[1]),
        question(5, 2, &[1]),
        question(6, 3, &[0, 2]),
    ])
}

/// In-memory stand-in for Drive. Remembers every upload, or fails them all.
#[derive(Default)]
pub struct RecordingStore {
    pub fail: bool,
    pub uploads: Mutex<Vec<(String, String, usize)>>,
}

impl RecordingStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn uploads(&self) -> Vec<(String, String, usize)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteStore for RecordingStore {
    async fn upload(&self, name: &str, mime_type: &str, data: Vec<u8>) -> Result<UploadedFile> {
        if self.fail {
            return Err(Error::Internal("Drive upload failed with 500".into()));
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((name.to_string(), mime_type.to_string(), data.len()));
        Ok(UploadedFile {
            id: format!("file-{}", uploads.len()),
            name: name.to_string(),
            web_view_link: Some(format!("https://drive.test/file-{}", uploads.len())),
        })
    }
}

pub fn setup_app(threshold: LevelThreshold) -> TestApp {
    setup_app_with_remote(threshold, None)
}

pub fn setup_app_with_remote(
    threshold: LevelThreshold,
    remote: Option<Arc<dyn RemoteStore>>,
) -> TestApp {
    let dir = std::env::temp_dir().join(format!("quiz-api-{}", uuid::Uuid::new_v4()));
    let config = Config {
        jwt_secret: "test_secret_key".into(),
        admin_password_hash: hash_password(ADMIN_PASSWORD).expect("hash"),
        level_threshold: threshold,
        public_rps: 1000,
        questions_file: dir.join("questions.xlsx"),
        reports_dir: dir.join("reports"),
        archive_dir: dir.join("evaluations"),
        ..Config::default()
    };
    let (state, completions) = AppState::new(config, sample_bank(), remote);
    TestApp {
        router: quiz_backend::routes::router(state.clone()),
        state,
        completions,
        dir,
    }
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let req = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };
    (status, body)
}

pub async fn admin_token(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/admin/login",
        None,
        Some(serde_json::json!({ "username": "admin", "password": ADMIN_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

pub async fn register(app: &Router, token: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/admin/candidates",
        Some(token),
        Some(serde_json::json!({ "full_name": name, "email": "candidate@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["code"].as_str().unwrap().to_string()
}
