use std::sync::Arc;

use tokio::sync::mpsc;

use crate::dto::record_dto::SessionRecord;
use crate::error::Result;
use crate::models::session::Session;
use crate::services::archive_service::ArchiveService;
use crate::services::drive_service::RemoteStore;
use crate::services::question_bank::QuestionBank;
use crate::services::report_service::ReportService;

/// Archives finished sessions and, when a remote store is configured, uploads them.
#[derive(Clone)]
pub struct CompletionService {
    bank: Arc<QuestionBank>,
    archive: ArchiveService,
    reports: ReportService,
    remote: Option<Arc<dyn RemoteStore>>,
}

impl CompletionService {
    pub fn new(
        bank: Arc<QuestionBank>,
        archive: ArchiveService,
        reports: ReportService,
        remote: Option<Arc<dyn RemoteStore>>,
    ) -> Self {
        Self {
            bank,
            archive,
            reports,
            remote,
        }
    }

    pub async fn handle(&self, session: &Session) -> Result<SessionRecord> {
        let record = SessionRecord::from_session(session, &self.bank);
        let pdf = match self.reports.render(session) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!("Could not render report for {}: {:?}", session.code, e);
                None
            }
        };
        self.archive.store(&record, pdf.as_deref()).await?;

        if let Some(remote) = &self.remote {
            let json = serde_json::to_vec_pretty(&record)?;
            match remote.upload(&record.file_name(), "application/json", json).await {
                Ok(file) => tracing::info!("Evaluation {} saved to Drive as {}", session.code, file.id),
                Err(e) => tracing::error!("Automatic Drive save failed for {}: {:?}", session.code, e),
            }
            if let Some(bytes) = pdf {
                let name = ReportService::file_name(session);
                if let Err(e) = remote.upload(&name, "application/pdf", bytes).await {
                    tracing::error!("Report upload failed for {}: {:?}", session.code, e);
                }
            }
        }
        Ok(record)
    }

    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<Session>) {
        while let Some(session) = rx.recv().await {
            if let Err(e) = self.handle(&session).await {
                tracing::error!(error = ?e, "Completion worker error for {}", session.code);
            }
        }
        tracing::info!("Completion worker stopped");
    }
}
