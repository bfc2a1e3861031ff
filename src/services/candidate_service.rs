use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateInfo, CandidateStatus};
use crate::utils::token::{generate_access_code, normalize_code};

pub const ACCESS_CODE_LENGTH: usize = 8;

/// In-memory registry of candidates keyed by access code.
#[derive(Clone, Default)]
pub struct CandidateService {
    entries: Arc<RwLock<HashMap<String, Candidate>>>,
}

impl CandidateService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, info: CandidateInfo) -> Result<Candidate> {
        if info.full_name.trim().is_empty() {
            return Err(Error::BadRequest("full_name is required".to_string()));
        }

        let mut entries = self.entries.write().await;
        let code = loop {
            let candidate = generate_access_code(ACCESS_CODE_LENGTH);
            if !entries.contains_key(&candidate) {
                break candidate;
            }
        };
        let now = Utc::now();
        let candidate = Candidate {
            code: code.clone(),
            info,
            status: CandidateStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        entries.insert(code, candidate.clone());
        tracing::info!("Registered candidate {} ({})", candidate.code, candidate.info.full_name);
        Ok(candidate)
    }

    pub async fn get(&self, code: &str) -> Option<Candidate> {
        self.entries.read().await.get(&normalize_code(code)).cloned()
    }

    pub async fn require(&self, code: &str) -> Result<Candidate> {
        self.get(code)
            .await
            .ok_or_else(|| Error::NotFound("Unknown access code".to_string()))
    }

    pub async fn list(&self) -> Vec<Candidate> {
        let mut all: Vec<Candidate> = self.entries.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.code.cmp(&b.code)));
        all
    }

    pub async fn remove(&self, code: &str) -> Option<Candidate> {
        self.entries.write().await.remove(&normalize_code(code))
    }

    pub async fn set_status(&self, code: &str, status: CandidateStatus) -> Result<Candidate> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&normalize_code(code))
            .ok_or_else(|| Error::NotFound("Unknown access code".to_string()))?;
        entry.status = status;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    pub async fn update_info(&self, code: &str, info: CandidateInfo) -> Result<Candidate> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&normalize_code(code))
            .ok_or_else(|| Error::NotFound("Unknown access code".to_string()))?;
        entry.info = info;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }
}
