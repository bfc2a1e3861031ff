use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::candidate::CandidateInfo;
use crate::models::question::{Level, Question};
use crate::models::session::{Outcome, Session};
use crate::services::session_service::{AnswerResult, NextQuestion};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct StartQuizRequest {
    #[validate(length(max = 200))]
    pub full_name: Option<String>,
    #[validate(length(max = 64))]
    pub document: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

/// Trims the value and treats a blank string as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl StartQuizRequest {
    /// Blank contact fields are sent as `""` by the form; they mean "not given".
    pub fn normalized(self) -> Self {
        Self {
            full_name: non_blank(self.full_name),
            document: non_blank(self.document),
            email: non_blank(self.email),
            phone: non_blank(self.phone),
        }
    }

    pub fn into_contact(self) -> CandidateInfo {
        CandidateInfo {
            full_name: self.full_name.unwrap_or_default(),
            document: self.document,
            email: self.email,
            phone: self.phone,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StartQuizResponse {
    pub session_id: uuid::Uuid,
    pub code: String,
    pub candidate: CandidateInfo,
    pub level: Level,
    pub points: u32,
    pub answered: usize,
    pub complete: bool,
}

impl From<Session> for StartQuizResponse {
    fn from(session: Session) -> Self {
        let answered = session.answered();
        Self {
            session_id: session.id,
            code: session.code,
            candidate: session.candidate,
            level: session.level,
            points: session.points,
            answered,
            complete: session.complete,
        }
    }
}

/// A question as the candidate sees it. The answer key is never sent.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: u32,
    pub level: Level,
    pub prompt: String,
    pub options: Vec<String>,
    pub multiple: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            level: q.level,
            multiple: q.answer.is_multi(),
            prompt: q.prompt,
            options: q.options,
            image: q.image,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NextQuestionResponse {
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<PublicQuestion>,
    pub level: Level,
    pub points: u32,
    pub answered: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<NextQuestion> for NextQuestionResponse {
    fn from(next: NextQuestion) -> Self {
        match next {
            NextQuestion::Question {
                question,
                level,
                points,
                answered,
            } => Self {
                complete: false,
                question: Some(question.into()),
                level,
                points,
                answered,
                message: None,
            },
            NextQuestion::Complete {
                level,
                points,
                answered,
            } => Self {
                complete: true,
                question: None,
                level,
                points,
                answered,
                message: Some("The evaluation is complete".to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: u32,
    #[serde(default)]
    pub answer: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitAnswerResponse {
    pub correct: bool,
    pub outcome: Outcome,
    pub message: String,
    pub points_awarded: u32,
    pub points: u32,
    pub level: Level,
    pub correct_at_level: u32,
    pub has_more_at_level: bool,
    pub correct_answers: Vec<String>,
    pub complete: bool,
}

impl From<AnswerResult> for SubmitAnswerResponse {
    fn from(r: AnswerResult) -> Self {
        Self {
            correct: r.outcome.is_correct(),
            outcome: r.outcome,
            message: r.message,
            points_awarded: r.points_awarded,
            points: r.points,
            level: r.level,
            correct_at_level: r.correct_at_level,
            has_more_at_level: r.has_more_at_level,
            correct_answers: r.correct_answers,
            complete: r.complete,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub uploaded: bool,
    pub file_id: String,
    pub file_name: String,
    pub web_view_link: Option<String>,
}
