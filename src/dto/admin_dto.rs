use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dto::quiz_dto::non_blank;
use crate::models::candidate::CandidateInfo;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterCandidateRequest {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 64))]
    pub document: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

impl From<RegisterCandidateRequest> for CandidateInfo {
    fn from(req: RegisterCandidateRequest) -> Self {
        CandidateInfo {
            full_name: req.full_name,
            document: non_blank(req.document),
            email: Some(req.email),
            phone: non_blank(req.phone),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelDistributionResponse {
    pub total: usize,
    /// `fixed:N` or `auto`.
    pub threshold: String,
    pub levels: BTreeMap<String, LevelStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelStats {
    pub questions: usize,
    pub threshold: u32,
}
