use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::candidate::CandidateInfo;
use crate::models::question::Level;
use crate::models::session::{AnswerRecord, Session};
use crate::services::question_bank::QuestionBank;

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const EVALUATION_TYPE: &str = "Interactive web questionnaire";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub level: Level,
    pub points: u32,
    pub correct_at_level: u32,
    pub total_answered: usize,
    pub shown_questions: Vec<u32>,
    pub complete: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShownQuestion {
    pub id: u32,
    pub prompt: String,
    pub level: Level,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub app_version: String,
    pub evaluation_type: String,
    pub evaluation_date: String,
}

/// JSON export of one session, used for the local archive and Drive uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub timestamp: DateTime<Utc>,
    pub code: String,
    pub candidate: CandidateInfo,
    pub evaluation: EvaluationSummary,
    pub shown_questions: Vec<ShownQuestion>,
    pub answers: Vec<AnswerRecord>,
    pub metadata: RecordMetadata,
}

impl SessionRecord {
    pub fn from_session(session: &Session, bank: &QuestionBank) -> Self {
        let now = Utc::now();
        let shown_questions = session
            .shown
            .iter()
            .filter_map(|id| bank.get(*id))
            .map(|q| ShownQuestion {
                id: q.id,
                prompt: q.prompt.clone(),
                level: q.level,
            })
            .collect();

        Self {
            timestamp: now,
            code: session.code.clone(),
            candidate: session.candidate.clone(),
            evaluation: EvaluationSummary {
                level: session.level,
                points: session.points,
                correct_at_level: session.correct_at_level,
                total_answered: session.answered(),
                shown_questions: session.shown.clone(),
                complete: session.complete,
                started_at: session.started_at,
                finished_at: session.finished_at,
            },
            shown_questions,
            answers: session.answers.clone(),
            metadata: RecordMetadata {
                app_version: APP_VERSION.to_string(),
                evaluation_type: EVALUATION_TYPE.to_string(),
                evaluation_date: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            },
        }
    }

    pub fn file_name(&self) -> String {
        format!("quiz_results_{}.json", self.timestamp.format("%Y%m%d_%H%M%S"))
    }
}
