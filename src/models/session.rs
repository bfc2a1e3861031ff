use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::candidate::CandidateInfo;
use crate::models::question::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Partial,
    Incorrect,
}

impl Outcome {
    pub fn is_correct(self) -> bool {
        matches!(self, Outcome::Correct)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: u32,
    pub question_text: String,
    pub level: Level,
    pub selected: Vec<usize>,
    pub correct: Vec<usize>,
    pub outcome: Outcome,
    pub points_awarded: u32,
    pub answered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub code: String,
    pub candidate: CandidateInfo,
    pub level: Level,
    pub points: u32,
    pub correct_at_level: u32,
    pub shown: Vec<u32>,
    pub current: Option<u32>,
    pub answers: Vec<AnswerRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub complete: bool,
}

impl Session {
    pub fn new(code: &str, candidate: CandidateInfo) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.to_string(),
            candidate,
            level: Level::MIN,
            points: 0,
            correct_at_level: 0,
            shown: Vec::new(),
            current: None,
            answers: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
            complete: false,
        }
    }

    pub fn has_shown(&self, question_id: u32) -> bool {
        self.shown.contains(&question_id)
    }

    pub fn mark_shown(&mut self, question_id: u32) {
        if !self.has_shown(question_id) {
            self.shown.push(question_id);
        }
        self.current = Some(question_id);
    }

    /// Moves to a higher level. Lower or equal levels are ignored.
    pub fn advance_to(&mut self, level: Level) {
        if level > self.level {
            self.level = level;
            self.correct_at_level = 0;
        }
    }

    pub fn finish(&mut self) {
        if !self.complete {
            self.complete = true;
            self.current = None;
            self.finished_at = Some(Utc::now());
        }
    }

    pub fn answered(&self) -> usize {
        self.answers.len()
    }

    pub fn correct_answers(&self) -> usize {
        self.answers.iter().filter(|a| a.outcome.is_correct()).count()
    }

    /// Share of the maximum attainable points, in percent.
    pub fn accuracy(&self, points_per_correct: u32) -> f64 {
        let max = self.answered() as f64 * points_per_correct as f64;
        if max > 0.0 {
            self.points as f64 / max * 100.0
        } else {
            0.0
        }
    }
}
