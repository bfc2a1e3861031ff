use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tokio::sync::{mpsc, RwLock};

use crate::config::LevelThreshold;
use crate::error::{Error, Result};
use crate::models::candidate::{CandidateInfo, CandidateStatus};
use crate::models::question::{Level, Question};
use crate::models::session::{AnswerRecord, Outcome, Session};
use crate::services::candidate_service::CandidateService;
use crate::services::evaluation_service::EvaluationService;
use crate::services::question_bank::QuestionBank;
use crate::utils::token::normalize_code;

#[derive(Debug, Clone, Copy)]
pub struct ScoringPolicy {
    pub threshold: LevelThreshold,
    pub points_per_correct: u32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            threshold: LevelThreshold::default(),
            points_per_correct: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub enum NextQuestion {
    Question {
        question: Question,
        level: Level,
        points: u32,
        answered: usize,
    },
    Complete {
        level: Level,
        points: u32,
        answered: usize,
    },
}

#[derive(Debug, Clone)]
pub struct AnswerResult {
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

/// Sessions keyed by access code. Each operation holds the write lock for its whole state change.
#[derive(Clone)]
pub struct SessionService {
    bank: Arc<QuestionBank>,
    registry: CandidateService,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    policy: ScoringPolicy,
    completions: Option<mpsc::UnboundedSender<Session>>,
}

impl SessionService {
    pub fn new(bank: Arc<QuestionBank>, registry: CandidateService, policy: ScoringPolicy) -> Self {
        Self {
            bank,
            registry,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            policy,
            completions: None,
        }
    }

    pub fn with_completion_sender(mut self, tx: mpsc::UnboundedSender<Session>) -> Self {
        self.completions = Some(tx);
        self
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn policy(&self) -> ScoringPolicy {
        self.policy
    }

    pub fn threshold_at(&self, level: Level) -> u32 {
        self.policy.threshold.for_level(self.bank.count_at(level))
    }

    pub async fn start(&self, code: &str, contact: CandidateInfo) -> Result<Session> {
        let code = normalize_code(code);
        // Completion flips the registry status while holding this lock, so both checks run under it.
        let mut sessions = self.sessions.write().await;
        let candidate = self.registry.require(&code).await?;
        let finished = sessions.get(&code).is_some_and(|s| s.complete);
        if finished || candidate.status == CandidateStatus::Completed {
            return Err(Error::Conflict("This evaluation has already been completed".to_string()));
        }

        let info = merge_contact(candidate.info, contact);
        let session = sessions
            .entry(code.clone())
            .or_insert_with(|| Session::new(&code, info.clone()));
        session.candidate = info.clone();
        let snapshot = session.clone();

        self.registry.update_info(&code, info).await?;
        self.registry.set_status(&code, CandidateStatus::InProgress).await?;
        tracing::info!("Session {} started for {}", snapshot.id, code);
        Ok(snapshot)
    }

    pub async fn next_question(&self, code: &str) -> Result<NextQuestion> {
        let code = normalize_code(code);
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&code)
            .ok_or_else(|| Error::NotFound("Session has not been started".to_string()))?;

        if !session.complete {
            if let Some(pending) = session.current.and_then(|id| self.bank.get(id)) {
                return Ok(NextQuestion::Question {
                    question: pending.clone(),
                    level: session.level,
                    points: session.points,
                    answered: session.answered(),
                });
            }

            let mut next = self.bank.unseen_at(session.level, &session.shown);
            if next.is_none() {
                tracing::info!("No questions left at level {} for {}", session.level, code);
                if let Some(level) = self.bank.next_level_with_unseen(session.level, &session.shown) {
                    session.advance_to(level);
                    next = self.bank.unseen_at(level, &session.shown);
                }
            }

            if let Some(question) = next {
                session.mark_shown(question.id);
                return Ok(NextQuestion::Question {
                    question: question.clone(),
                    level: session.level,
                    points: session.points,
                    answered: session.answered(),
                });
            }

            session.finish();
            self.on_finished(session).await;
        }

        Ok(NextQuestion::Complete {
            level: session.level,
            points: session.points,
            answered: session.answered(),
        })
    }

    pub async fn submit_answer(
        &self,
        code: &str,
        question_id: u32,
        answer: &JsonValue,
    ) -> Result<AnswerResult> {
        let code = normalize_code(code);
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&code)
            .ok_or_else(|| Error::NotFound("Session has not been started".to_string()))?;

        if session.complete {
            return Err(Error::Conflict("Evaluation already completed".to_string()));
        }
        if session.current != Some(question_id) {
            return Err(Error::BadRequest(format!(
                "Question {} is not the pending question",
                question_id
            )));
        }
        let question = self
            .bank
            .get(question_id)
            .ok_or_else(|| Error::NotFound("Question not found".to_string()))?;

        let evaluation =
            EvaluationService::evaluate(question, answer, self.policy.points_per_correct);
        session.points += evaluation.points;
        session.current = None;

        let correct_texts = question.correct_texts();
        let message = match evaluation.outcome {
            Outcome::Correct => {
                session.correct_at_level += 1;
                let threshold = self.threshold_at(session.level);
                if session.correct_at_level >= threshold {
                    let finished_level = session.level;
                    match self.bank.next_level_with_unseen(session.level, &session.shown) {
                        Some(level) => {
                            session.advance_to(level);
                            format!(
                                "Excellent! You completed level {}. You advanced to level {}!",
                                finished_level, level
                            )
                        }
                        None => {
                            session.finish();
                            "Perfect! You have completed all available levels.".to_string()
                        }
                    }
                } else {
                    format!(
                        "Correct! {} more correct answers to advance to the next level.",
                        threshold - session.correct_at_level
                    )
                }
            }
            Outcome::Partial => format!(
                "Partially correct: {} points awarded. The full answer was: {}",
                evaluation.points,
                correct_texts.join(", ")
            ),
            Outcome::Incorrect => {
                format!("Incorrect. The correct answer was: {}", correct_texts.join(", "))
            }
        };

        session.answers.push(AnswerRecord {
            question_id: question.id,
            question_text: question.prompt.clone(),
            level: question.level,
            selected: evaluation.selected.clone(),
            correct: question.answer.indices().to_vec(),
            outcome: evaluation.outcome,
            points_awarded: evaluation.points,
            answered_at: chrono::Utc::now(),
        });

        tracing::info!(
            "Answer for {} on question {}: {:?} (+{} points, level {})",
            code,
            question_id,
            evaluation.outcome,
            evaluation.points,
            session.level
        );

        if session.complete {
            self.on_finished(session).await;
        }

        Ok(AnswerResult {
            outcome: evaluation.outcome,
            message,
            points_awarded: evaluation.points,
            points: session.points,
            level: session.level,
            correct_at_level: session.correct_at_level,
            has_more_at_level: self.bank.remaining_at(session.level, &session.shown) > 0,
            correct_answers: correct_texts,
            complete: session.complete,
        })
    }

    /// Starts over at level 1. Completed evaluations can only be reopened by an administrator.
    pub async fn reset(&self, code: &str) -> Result<Session> {
        let code = normalize_code(code);
        let mut sessions = self.sessions.write().await;
        let candidate = self.registry.require(&code).await?;
        let finished = sessions.get(&code).is_some_and(|s| s.complete);
        if finished || candidate.status == CandidateStatus::Completed {
            return Err(Error::Conflict("Completed evaluations cannot be reset".to_string()));
        }
        let fresh = Session::new(&code, candidate.info);
        sessions.insert(code.clone(), fresh.clone());
        tracing::info!("Session reset for {}", code);
        Ok(fresh)
    }

    pub async fn reopen(&self, code: &str) -> Result<()> {
        let code = normalize_code(code);
        let mut sessions = self.sessions.write().await;
        self.registry.require(&code).await?;
        sessions.remove(&code);
        self.registry.set_status(&code, CandidateStatus::Pending).await?;
        tracing::info!("Evaluation reopened for {}", code);
        Ok(())
    }

    pub async fn discard(&self, code: &str) {
        self.sessions.write().await.remove(&normalize_code(code));
    }

    pub async fn snapshot(&self, code: &str) -> Result<Session> {
        self.sessions
            .read()
            .await
            .get(&normalize_code(code))
            .cloned()
            .ok_or_else(|| Error::NotFound("Session has not been started".to_string()))
    }

    pub async fn list(&self) -> Vec<Session> {
        let mut all: Vec<Session> = self.sessions.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        all
    }

    async fn on_finished(&self, session: &Session) {
        tracing::info!(
            "Evaluation {} completed: {} points, level {}",
            session.code,
            session.points,
            session.level
        );
        if let Err(e) = self
            .registry
            .set_status(&session.code, CandidateStatus::Completed)
            .await
        {
            tracing::warn!("Could not mark {} as completed: {:?}", session.code, e);
        }
        if let Some(tx) = &self.completions {
            if tx.send(session.clone()).is_err() {
                tracing::warn!("Completion worker is not running; {} was not archived", session.code);
            }
        }
    }
}

fn merge_contact(mut base: CandidateInfo, contact: CandidateInfo) -> CandidateInfo {
    let pick = |new: Option<String>, old: Option<String>| {
        new.filter(|v| !v.trim().is_empty()).or(old)
    };
    if !contact.full_name.trim().is_empty() {
        base.full_name = contact.full_name;
    }
    base.document = pick(contact.document, base.document);
    base.email = pick(contact.email, base.email);
    base.phone = pick(contact.phone, base.phone);
    base
}
