use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use validator::Validate;

use crate::dto::quiz_dto::{
    NextQuestionResponse, StartQuizRequest, StartQuizResponse, SubmitAnswerRequest,
    SubmitAnswerResponse, UploadResponse,
};
use crate::dto::record_dto::SessionRecord;
use crate::AppState;

#[axum::debug_handler]
pub async fn start_quiz(
    State(state): State<AppState>,
    Path(code): Path<String>,
    payload: Option<Json<StartQuizRequest>>,
) -> crate::error::Result<Response> {
    let req = payload.map(|Json(p)| p).unwrap_or_default().normalized();
    req.validate()?;
    let session = state.sessions.start(&code, req.into_contact()).await?;
    Ok(Json(StartQuizResponse::from(session)).into_response())
}

#[axum::debug_handler]
pub async fn next_question(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> crate::error::Result<Response> {
    let next = state.sessions.next_question(&code).await?;
    Ok(Json(NextQuestionResponse::from(next)).into_response())
}

#[axum::debug_handler]
pub async fn submit_answer(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<SubmitAnswerRequest>,
) -> crate::error::Result<Response> {
    let result = state
        .sessions
        .submit_answer(&code, req.question_id, &req.answer)
        .await?;
    Ok(Json(SubmitAnswerResponse::from(result)).into_response())
}

#[axum::debug_handler]
pub async fn reset_quiz(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> crate::error::Result<Response> {
    let session = state.sessions.reset(&code).await?;
    Ok(Json(StartQuizResponse::from(session)).into_response())
}

/// Streams the PDF back. The Drive upload outcome travels in `x-drive-status`
/// (`uploaded`, `failed` or `disabled`) so the download never depends on it.
#[axum::debug_handler]
pub async fn generate_report(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> crate::error::Result<Response> {
    let session = state.sessions.snapshot(&code).await?;
    let (file_name, bytes) = state.reports.write(&session).await?;

    let mut drive_status = "disabled";
    let mut drive_file_id = None;
    if let Some(remote) = &state.remote {
        match remote.upload(&file_name, "application/pdf", bytes.clone()).await {
            Ok(file) => {
                drive_status = "uploaded";
                drive_file_id = Some(file.id);
            }
            Err(e) => {
                tracing::error!("Report upload failed for {}: {:?}", session.code, e);
                drive_status = "failed";
            }
        }
    }

    let mut response = (StatusCode::OK, bytes).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    headers.insert("x-drive-status", HeaderValue::from_static(drive_status));
    if let Some(id) = drive_file_id.and_then(|id| HeaderValue::from_str(&id).ok()) {
        headers.insert("x-drive-file-id", id);
    }
    Ok(response)
}

#[axum::debug_handler]
pub async fn upload_results(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> crate::error::Result<Response> {
    let remote = state.require_remote()?;
    let session = state.sessions.snapshot(&code).await?;
    let record = SessionRecord::from_session(&session, &state.bank);
    let name = record.file_name();
    let file = remote
        .upload(&name, "application/json", serde_json::to_vec_pretty(&record)?)
        .await?;
    tracing::info!("Results for {} uploaded as {}", session.code, file.id);
    Ok(Json(UploadResponse {
        uploaded: true,
        file_id: file.id,
        file_name: file.name,
        web_view_link: file.web_view_link,
    })
    .into_response())
}
