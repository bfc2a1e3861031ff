pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::Config;
use crate::models::session::Session;
use crate::services::{
    archive_service::ArchiveService, auth_service::AuthService,
    candidate_service::CandidateService, completion_service::CompletionService,
    drive_service::RemoteStore, question_bank::QuestionBank, report_service::ReportService,
    session_service::{ScoringPolicy, SessionService},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub bank: Arc<QuestionBank>,
    pub candidates: CandidateService,
    pub sessions: SessionService,
    pub auth: AuthService,
    pub reports: ReportService,
    pub archive: ArchiveService,
    pub remote: Option<Arc<dyn RemoteStore>>,
}

impl AppState {
    /// Builds the shared state. Finished sessions are delivered on the returned receiver,
    /// which [`AppState::completion_service`] drains.
    pub fn new(
        config: Config,
        bank: QuestionBank,
        remote: Option<Arc<dyn RemoteStore>>,
    ) -> (Self, mpsc::UnboundedReceiver<Session>) {
        let bank = Arc::new(bank);
        let candidates = CandidateService::new();
        let policy = ScoringPolicy {
            threshold: config.level_threshold,
            points_per_correct: config.points_per_correct,
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let sessions = SessionService::new(bank.clone(), candidates.clone(), policy)
            .with_completion_sender(tx);
        let auth = AuthService::new(
            config.jwt_secret.clone(),
            config.admin_username.clone(),
            config.admin_password_hash.clone(),
            config.admin_token_ttl_minutes,
        );
        let reports = ReportService::new(
            config.points_per_correct,
            config.passing_percentage,
            config.reports_dir.clone(),
        );
        let archive = ArchiveService::new(config.archive_dir.clone());

        let state = Self {
            config: Arc::new(config),
            bank,
            candidates,
            sessions,
            auth,
            reports,
            archive,
            remote,
        };
        (state, rx)
    }

    pub fn completion_service(&self) -> CompletionService {
        CompletionService::new(
            self.bank.clone(),
            self.archive.clone(),
            self.reports.clone(),
            self.remote.clone(),
        )
    }

    pub fn require_remote(&self) -> error::Result<Arc<dyn RemoteStore>> {
        self.remote
            .clone()
            .ok_or_else(|| error::Error::Unavailable("Google Drive is not configured".to_string()))
    }
}
