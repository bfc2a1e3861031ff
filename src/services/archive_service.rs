use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::dto::record_dto::SessionRecord;
use crate::error::Result;
use crate::services::drive_service::RemoteStore;

#[derive(Debug, Clone, Serialize)]
pub struct ArchivedEvaluation {
    pub json_file: String,
    pub pdf_file: Option<String>,
    pub candidate: String,
    pub email: Option<String>,
    pub points: u32,
    pub level: u8,
    pub date: String,
    pub has_pdf: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub exported: usize,
    pub total: usize,
    pub failures: Vec<String>,
}

/// Local directory of finished evaluations, one JSON record and optional PDF per session.
#[derive(Debug, Clone)]
pub struct ArchiveService {
    dir: PathBuf,
}

impl ArchiveService {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn base_name(record: &SessionRecord) -> String {
        let name: String = record
            .candidate
            .full_name
            .trim()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        let name = if name.is_empty() { "Candidate".to_string() } else { name };
        format!(
            "evaluation_{}_{}_{}",
            name,
            record.code,
            record.timestamp.format("%Y%m%d_%H%M%S")
        )
    }

    pub async fn store(&self, record: &SessionRecord, pdf: Option<&[u8]>) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let base = Self::base_name(record);
        let json_path = self.dir.join(format!("{}.json", base));
        tokio::fs::write(&json_path, serde_json::to_vec_pretty(record)?).await?;
        if let Some(bytes) = pdf {
            tokio::fs::write(self.dir.join(format!("{}.pdf", base)), bytes).await?;
        }
        tracing::info!("Evaluation archived at {}", json_path.display());
        Ok(json_path)
    }

    pub async fn list(&self) -> Result<Vec<ArchivedEvaluation>> {
        let mut out = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let record = match Self::read_record(&path).await {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!("Skipping unreadable archive file {}: {}", path.display(), e);
                    continue;
                }
            };
            let pdf_path = path.with_extension("pdf");
            let has_pdf = tokio::fs::try_exists(&pdf_path).await.unwrap_or(false);
            out.push(ArchivedEvaluation {
                json_file: path.display().to_string(),
                pdf_file: has_pdf.then(|| pdf_path.display().to_string()),
                candidate: record.candidate.full_name,
                email: record.candidate.email,
                points: record.evaluation.points,
                level: record.evaluation.level.get(),
                date: record.timestamp.to_rfc3339(),
                has_pdf,
            });
        }
        out.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(out)
    }

    async fn read_record(path: &Path) -> Result<SessionRecord> {
        let raw = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Uploads every archived JSON record. Individual failures are collected, not fatal.
    pub async fn sync(&self, remote: &dyn RemoteStore) -> Result<SyncReport> {
        let archived = self.list().await?;
        let mut report = SyncReport {
            exported: 0,
            total: archived.len(),
            failures: Vec::new(),
        };

        for item in archived {
            let path = PathBuf::from(&item.json_file);
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("evaluation.json")
                .to_string();
            let data = tokio::fs::read(&path).await?;
            match remote.upload(&name, "application/json", data).await {
                Ok(_) => report.exported += 1,
                Err(e) => {
                    tracing::error!("Failed to export {}: {:?}", item.candidate, e);
                    report.failures.push(format!("{}: {}", item.candidate, e));
                }
            }
        }

        tracing::info!("Archive sync: {}/{} evaluations exported", report.exported, report.total);
        Ok(report)
    }
}
