use chrono::Local;
use clap::Subcommand;
use serde_json::json;

use super::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum QuizAction {
    /// List available quizzes
    List,
    /// Show one quiz question and its options
    Show {
        /// Quiz ID (e.g. "q1")
        id: String,
    },
    /// Submit an answer
    Answer {
        /// Quiz ID
        id: String,
        /// Selected option ID; omit when the timer ran out
        #[arg(long)]
        option: Option<String>,
        /// Seconds taken to answer
        #[arg(long, default_value_t = 0)]
        elapsed: u32,
    },
}

pub fn run(ctx: &Context, action: QuizAction) -> CliResult {
    let catalog = ctx.catalog()?;

    match action {
        QuizAction::List => {
            let quizzes: Vec<_> = catalog
                .quizzes
                .iter()
                .map(|q| json!({ "id": q.id, "title": q.title, "description": q.description }))
                .collect();
            print_json(&quizzes)
        }
        QuizAction::Show { id } => {
            let quiz = catalog.find_quiz(&id)?;
            let options: Vec<_> = quiz
                .options
                .iter()
                .map(|o| json!({ "id": o.id, "text": o.text }))
                .collect();
            print_json(&json!({
                "id": quiz.id,
                "title": quiz.title,
                "question": quiz.question,
                "options": options,
                "time_limit_secs": quiz.time_limit_secs,
            }))
        }
        QuizAction::Answer { id, option, elapsed } => {
            let quiz = catalog.find_quiz(&id)?;
            let db = ctx.open_db()?;
            let uid = ctx.user()?;
            ctx.sign_in(&db)?;

            let attempt = quiz.attempt(option, elapsed);
            let outcome = db.apply_quiz_attempt(uid, &attempt, &Local::now())?;
            let explanation = attempt
                .selected_option
                .as_deref()
                .and_then(|selected| quiz.option(selected))
                .map(|o| o.explanation.clone());

            print_json(&json!({
                "correct": attempt.is_correct,
                "timed_out": attempt.timed_out(),
                "quick": quiz.is_quick(&attempt),
                "explanation": explanation,
                "points_awarded": outcome.points_awarded,
                "streak_extended": outcome.streak_extended,
                "profile": outcome.profile.view(),
            }))
        }
    }
}
