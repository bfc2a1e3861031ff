use serde_json::Value as JsonValue;

use crate::models::question::Question;
use crate::models::session::Outcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub selected: Vec<usize>,
    pub outcome: Outcome,
    pub points: u32,
}

pub struct EvaluationService;

impl EvaluationService {
    /// Resolves a submitted answer into option indices.
    /// Missing or unresolvable submissions fall back to the first option.
    pub fn selection(question: &Question, answer: &JsonValue) -> Vec<usize> {
        let resolve = |value: &JsonValue| -> Option<usize> {
            match value {
                JsonValue::Number(n) => n
                    .as_u64()
                    .map(|i| i as usize)
                    .filter(|&i| i < question.options.len()),
                // In-range numbers are 0-based indices. Otherwise literal option text wins
                // over letters and 1-based numbers.
                JsonValue::String(s) => match s.trim().parse::<usize>() {
                    Ok(i) if i < question.options.len() => Some(i),
                    _ => question
                        .option_by_text(s)
                        .or_else(|| question.resolve_option(s)),
                },
                _ => None,
            }
        };

        let mut selected: Vec<usize> = match answer {
            JsonValue::Array(items) => {
                let resolved: Vec<Option<usize>> = items.iter().map(resolve).collect();
                if !resolved.is_empty() && resolved.iter().all(Option::is_some) {
                    resolved.into_iter().flatten().collect()
                } else {
                    Vec::new()
                }
            }
            JsonValue::Object(map) => map
                .get("selected")
                .and_then(resolve)
                .into_iter()
                .collect(),
            other => resolve(other).into_iter().collect(),
        };
        selected.sort_unstable();
        selected.dedup();

        if selected.is_empty() {
            tracing::warn!(
                "Unresolvable answer {} for question {}, treating as first option",
                answer,
                question.id
            );
            selected.push(0);
        }
        selected
    }

    pub fn evaluate(question: &Question, answer: &JsonValue, points_per_correct: u32) -> Evaluation {
        let selected = Self::selection(question, answer);
        let key = &question.answer;

        let wrong = selected.iter().any(|&i| !key.contains(i));
        let hits = selected.iter().filter(|&&i| key.contains(i)).count();
        let total = key.indices().len();

        let (outcome, points) = if wrong || hits == 0 {
            (Outcome::Incorrect, 0)
        } else if hits == total {
            (Outcome::Correct, points_per_correct)
        } else {
            let partial = points_per_correct as usize * hits / total;
            (Outcome::Partial, partial as u32)
        };

        Evaluation {
            selected,
            outcome,
            points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::question_bank::fixtures::question;
    use serde_json::json;

    #[test]
    fn single_answer_by_index_letter_and_text() {
        let q = question(1, 1, &[2]);
        assert_eq!(EvaluationService::evaluate(&q, &json!(2), 10).outcome, Outcome::Correct);
        assert_eq!(EvaluationService::evaluate(&q, &json!("C"), 10).points, 10);
        assert_eq!(EvaluationService::evaluate(&q, &json!("c1"), 10).outcome, Outcome::Correct);
        assert_eq!(EvaluationService::evaluate(&q, &json!("2"), 10).outcome, Outcome::Correct);
        let wrong = EvaluationService::evaluate(&q, &json!(1), 10);
        assert_eq!(wrong.outcome, Outcome::Incorrect);
        assert_eq!(wrong.points, 0);
    }

    #[test]
    fn numeric_option_text_is_matched_when_not_an_index() {
        let mut q = question(1, 1, &[1]);
        q.options = vec!["3".into(), "4".into(), "5".into(), "6".into()];
        let eval = EvaluationService::evaluate(&q, &json!("4"), 10);
        assert_eq!(eval.selected, vec![1]);
        assert_eq!(eval.outcome, Outcome::Correct);
        assert_eq!(EvaluationService::selection(&q, &json!("6")), vec![3]);
        // Small numbers stay 0-based indices.
        assert_eq!(EvaluationService::selection(&q, &json!("1")), vec![1]);
    }

    #[test]
    fn malformed_submission_counts_as_first_option() {
        let q = question(1, 1, &[0]);
        for answer in [json!(null), json!("zzz"), json!(17), json!({}), json!([])] {
            let eval = EvaluationService::evaluate(&q, &answer, 10);
            assert_eq!(eval.selected, vec![0]);
            assert_eq!(eval.outcome, Outcome::Correct);
        }
    }

    #[test]
    fn multi_select_awards_partial_credit() {
        let q = question(1, 1, &[0, 2, 3]);
        let full = EvaluationService::evaluate(&q, &json!(["A", "C", "D"]), 10);
        assert_eq!(full.outcome, Outcome::Correct);
        assert_eq!(full.points, 10);

        let partial = EvaluationService::evaluate(&q, &json!([0, 3]), 10);
        assert_eq!(partial.outcome, Outcome::Partial);
        assert_eq!(partial.points, 6);

        let with_wrong = EvaluationService::evaluate(&q, &json!(["A", "B"]), 10);
        assert_eq!(with_wrong.outcome, Outcome::Incorrect);
        assert_eq!(with_wrong.points, 0);
    }

    #[test]
    fn object_form_with_selected_index() {
        let q = question(1, 1, &[3]);
        let eval = EvaluationService::evaluate(&q, &json!({"selected": 3}), 10);
        assert_eq!(eval.outcome, Outcome::Correct);
    }
}
