//! Quiz and poll content.
//!
//! Ships with a small built-in civics set. A TOML file with the same shape
//! can replace it (see `catalog_path` in [`Config`](crate::Config)).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result, ValidationError};
use crate::poll::{Poll, PollOption};
use crate::quiz::{Quiz, QuizOption};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
    #[serde(default)]
    pub polls: Vec<Poll>,
}

fn option(id: &str, text: &str, is_correct: bool) -> QuizOption {
    QuizOption {
        id: id.into(),
        text: text.into(),
        is_correct,
        explanation: String::new(),
    }
}

fn quiz(id: &str, title: &str, description: &str, question: &str, options: Vec<QuizOption>) -> Quiz {
    Quiz {
        id: id.into(),
        title: title.into(),
        description: description.into(),
        question: question.into(),
        options,
        time_limit_secs: 30,
        speed_bonus_threshold_secs: 10,
    }
}

impl Catalog {
    pub fn builtin() -> Self {
        Self {
            quizzes: vec![
                quiz(
                    "q1",
                    "Indian Constitution",
                    "Basics",
                    "Who is the head of the Indian State?",
                    vec![
                        option("a", "President", true),
                        option("b", "Prime Minister", false),
                        option("c", "Chief Justice", false),
                    ],
                ),
                quiz(
                    "q2",
                    "Parliament",
                    "Legislature",
                    "How many houses does Indian Parliament have?",
                    vec![
                        option("a", "One", false),
                        option("b", "Two", true),
                        option("c", "Three", false),
                    ],
                ),
                quiz(
                    "q3",
                    "Rights",
                    "Fundamental Rights",
                    "Which article guarantees Right to Equality?",
                    vec![
                        option("a", "Article 14", true),
                        option("b", "Article 21", false),
                        option("c", "Article 32", false),
                    ],
                ),
            ],
            polls: vec![Poll {
                id: "poll1".into(),
                question: "Should voting be compulsory?".into(),
                options: vec![
                    PollOption { id: "a".into(), text: "Yes".into(), votes: 10 },
                    PollOption { id: "b".into(), text: "No".into(), votes: 5 },
                ],
            }],
        }
    }

    /// Load a catalog from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let catalog: Catalog = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(
            quizzes = catalog.quizzes.len(),
            polls = catalog.polls.len(),
            "loaded catalog from {}",
            path.display()
        );
        Ok(catalog)
    }

    pub fn find_quiz(&self, id: &str) -> Result<&Quiz, ValidationError> {
        self.quizzes
            .iter()
            .find(|q| q.id == id)
            .ok_or_else(|| ValidationError::UnknownQuiz(id.to_string()))
    }

    pub fn find_poll(&self, id: &str) -> Result<&Poll, ValidationError> {
        self.polls
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ValidationError::UnknownPoll(id.to_string()))
    }
}
