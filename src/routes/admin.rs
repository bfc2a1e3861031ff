use std::collections::{BTreeMap, HashMap};

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::dto::admin_dto::{
    LevelDistributionResponse, LevelStats, LoginRequest, LoginResponse, RegisterCandidateRequest,
};
use crate::dto::quiz_dto::UploadResponse;
use crate::error::Error;
use crate::services::drive_service::{backup_questions, XLSX_MIME};
use crate::services::export_service::ExportService;
use crate::AppState;

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let (token, expires_at) = state.auth.login(&req.username, &req.password)?;
    Ok(Json(LoginResponse { token, expires_at }).into_response())
}

#[axum::debug_handler]
pub async fn list_candidates(State(state): State<AppState>) -> crate::error::Result<Response> {
    let candidates = state.candidates.list().await;
    Ok(Json(json!({ "total": candidates.len(), "candidates": candidates })).into_response())
}

#[axum::debug_handler]
pub async fn register_candidate(
    State(state): State<AppState>,
    Json(req): Json<RegisterCandidateRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let candidate = state.candidates.register(req.into()).await?;
    Ok((StatusCode::CREATED, Json(candidate)).into_response())
}

#[axum::debug_handler]
pub async fn get_candidate(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> crate::error::Result<Response> {
    let candidate = state.candidates.require(&code).await?;
    let session = state.sessions.snapshot(&code).await.ok();
    let summary = session.as_ref().map(|s| state.reports.summarize(s));
    Ok(Json(json!({
        "candidate": candidate,
        "session": session,
        "summary": summary,
    }))
    .into_response())
}

#[axum::debug_handler]
pub async fn delete_candidate(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> crate::error::Result<Response> {
    let removed = state
        .candidates
        .remove(&code)
        .await
        .ok_or_else(|| Error::NotFound("Unknown access code".to_string()))?;
    state.sessions.discard(&code).await;
    tracing::info!("Candidate {} removed", removed.code);
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[axum::debug_handler]
pub async fn reopen_candidate(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> crate::error::Result<Response> {
    state.sessions.reopen(&code).await?;
    let candidate = state.candidates.require(&code).await?;
    Ok(Json(candidate).into_response())
}

#[axum::debug_handler]
pub async fn get_session(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> crate::error::Result<Response> {
    let session = state.sessions.snapshot(&code).await?;
    let summary = state.reports.summarize(&session);
    let threshold = state.sessions.threshold_at(session.level);
    Ok(Json(json!({
        "session": session,
        "summary": summary,
        "threshold": threshold,
    }))
    .into_response())
}

#[axum::debug_handler]
pub async fn question_levels(State(state): State<AppState>) -> crate::error::Result<Response> {
    let levels: BTreeMap<String, LevelStats> = state
        .bank
        .distribution()
        .into_iter()
        .map(|(level, questions)| {
            (
                level.to_string(),
                LevelStats {
                    questions,
                    threshold: state.sessions.threshold_at(level),
                },
            )
        })
        .collect();
    Ok(Json(LevelDistributionResponse {
        total: state.bank.len(),
        threshold: state.config.level_threshold.to_string(),
        levels,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn export_results(State(state): State<AppState>) -> crate::error::Result<Response> {
    let candidates = state.candidates.list().await;
    let sessions: HashMap<String, _> = state
        .sessions
        .list()
        .await
        .into_iter()
        .map(|s| (s.code.clone(), s))
        .collect();
    let buffer = ExportService::generate_results_xlsx(
        &candidates,
        &sessions,
        state.config.points_per_correct,
        state.config.passing_percentage,
    )?;

    let filename = format!("quiz_results_{}.xlsx", Utc::now().format("%Y%m%d_%H%M%S"));
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        buffer,
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn list_archive(State(state): State<AppState>) -> crate::error::Result<Response> {
    let evaluations = state.archive.list().await?;
    Ok(Json(json!({ "total": evaluations.len(), "evaluations": evaluations })).into_response())
}

#[axum::debug_handler]
pub async fn sync_archive(State(state): State<AppState>) -> crate::error::Result<Response> {
    let remote = state.require_remote()?;
    let report = state.archive.sync(remote.as_ref()).await?;
    Ok(Json(report).into_response())
}

#[axum::debug_handler]
pub async fn upload_report(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> crate::error::Result<Response> {
    let remote = state.require_remote()?;
    let session = state.sessions.snapshot(&code).await?;
    let (name, bytes) = state.reports.write(&session).await?;
    let file = remote.upload(&name, "application/pdf", bytes).await?;
    Ok(Json(UploadResponse {
        uploaded: true,
        file_id: file.id,
        file_name: file.name,
        web_view_link: file.web_view_link,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn backup_question_file(State(state): State<AppState>) -> crate::error::Result<Response> {
    let remote = state.require_remote()?;
    let file = backup_questions(remote.as_ref(), &state.config.questions_file).await?;
    Ok(Json(UploadResponse {
        uploaded: true,
        file_id: file.id,
        file_name: file.name,
        web_view_link: file.web_view_link,
    })
    .into_response())
}
