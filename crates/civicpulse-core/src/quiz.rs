//! Quiz questions and answer evaluation.

use serde::{Deserialize, Serialize};

use crate::engagement::QuizAttempt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub explanation: String,
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub question: String,
    pub options: Vec<QuizOption>,
    /// Seconds before the answer is submitted automatically.
    #[serde(default = "default_time_limit")]
    pub time_limit_secs: u32,
    /// Answers faster than this are flagged as quick in the result.
    #[serde(default = "default_speed_bonus_threshold")]
    pub speed_bonus_threshold_secs: u32,
}

fn default_time_limit() -> u32 {
    30
}

fn default_speed_bonus_threshold() -> u32 {
    10
}

impl Quiz {
    pub fn option(&self, id: &str) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.id == id)
    }

    /// No selection, or an id the quiz does not offer, is incorrect.
    pub fn evaluate(&self, selected: Option<&str>) -> bool {
        selected
            .and_then(|id| self.option(id))
            .is_some_and(|o| o.is_correct)
    }

    /// Build the attempt record for a submission after `elapsed_secs`.
    pub fn attempt(&self, selected: Option<String>, elapsed_secs: u32) -> QuizAttempt {
        let is_correct = self.evaluate(selected.as_deref());
        QuizAttempt {
            quiz_id: self.id.clone(),
            selected_option: selected,
            is_correct,
            elapsed_secs: elapsed_secs.min(self.time_limit_secs),
            time_limit_secs: self.time_limit_secs,
        }
    }

    pub fn is_quick(&self, attempt: &QuizAttempt) -> bool {
        attempt.is_correct && attempt.elapsed_secs <= self.speed_bonus_threshold_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Quiz {
        Quiz {
            id: "q2".into(),
            title: "Parliament".into(),
            description: "Legislature".into(),
            question: "How many houses does Indian Parliament have?".into(),
            options: vec![
                QuizOption { id: "a".into(), text: "One".into(), is_correct: false, explanation: String::new() },
                QuizOption { id: "b".into(), text: "Two".into(), is_correct: true, explanation: String::new() },
            ],
            time_limit_secs: 30,
            speed_bonus_threshold_secs: 10,
        }
    }

    #[test]
    fn evaluate_selected_option() {
        let quiz = sample();
        assert!(quiz.evaluate(Some("b")));
        assert!(!quiz.evaluate(Some("a")));
        assert!(!quiz.evaluate(Some("zzz")));
        assert!(!quiz.evaluate(None));
    }

    #[test]
    fn timeout_without_selection_is_incorrect() {
        let quiz = sample();
        let attempt = quiz.attempt(None, 45);
        assert!(!attempt.is_correct);
        assert!(attempt.timed_out());
        assert_eq!(attempt.elapsed_secs, 30);
    }

    #[test]
    fn quick_answers() {
        let quiz = sample();
        assert!(quiz.is_quick(&quiz.attempt(Some("b".into()), 7)));
        assert!(!quiz.is_quick(&quiz.attempt(Some("b".into()), 12)));
        assert!(!quiz.is_quick(&quiz.attempt(Some("a".into()), 2)));
    }
}
