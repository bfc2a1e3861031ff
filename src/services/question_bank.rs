use std::collections::{BTreeMap, HashMap};

use crate::models::question::{Level, Question};

/// Immutable question set, kept in load order and indexed by id.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
    by_id: HashMap<u32, usize>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        let mut by_id = HashMap::with_capacity(questions.len());
        let mut unique = Vec::with_capacity(questions.len());
        for q in questions {
            if by_id.contains_key(&q.id) {
                tracing::warn!("Duplicate question id {} ignored", q.id);
                continue;
            }
            by_id.insert(q.id, unique.len());
            unique.push(q);
        }
        Self {
            questions: unique,
            by_id,
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn all(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, id: u32) -> Option<&Question> {
        self.by_id.get(&id).map(|&idx| &self.questions[idx])
    }

    pub fn levels(&self) -> Vec<Level> {
        self.distribution().into_keys().collect()
    }

    pub fn distribution(&self) -> BTreeMap<Level, usize> {
        let mut counts = BTreeMap::new();
        for q in &self.questions {
            *counts.entry(q.level).or_insert(0) += 1;
        }
        counts
    }

    pub fn count_at(&self, level: Level) -> usize {
        self.questions.iter().filter(|q| q.level == level).count()
    }

    pub fn unseen_at(&self, level: Level, shown: &[u32]) -> Option<&Question> {
        self.questions
            .iter()
            .find(|q| q.level == level && !shown.contains(&q.id))
    }

    pub fn remaining_at(&self, level: Level, shown: &[u32]) -> usize {
        self.questions
            .iter()
            .filter(|q| q.level == level && !shown.contains(&q.id))
            .count()
    }

    /// Smallest level above `after` that still has an unseen question.
    pub fn next_level_with_unseen(&self, after: Level, shown: &[u32]) -> Option<Level> {
        self.questions
            .iter()
            .filter(|q| q.level > after && !shown.contains(&q.id))
            .map(|q| q.level)
            .min()
    }
}
