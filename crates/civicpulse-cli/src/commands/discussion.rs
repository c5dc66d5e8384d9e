use chrono::Utc;
use civicpulse_core::community::time_ago;
use civicpulse_core::Discussion;
use clap::Subcommand;
use serde_json::{json, Value};

use super::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum DiscussionAction {
    /// List discussions, newest first
    List,
    /// Show a discussion with its comments
    Show {
        /// Discussion ID
        id: String,
    },
    /// Start a discussion (requires the discuss tier)
    Create {
        /// Discussion title
        title: String,
        /// Discussion body
        content: String,
    },
    /// Delete one of your own discussions
    Delete {
        /// Discussion ID
        id: String,
    },
    /// Report a discussion to moderators
    Report {
        /// Discussion ID
        id: String,
        /// Why it should be reviewed
        #[arg(long)]
        reason: Option<String>,
    },
}

pub fn run(ctx: &Context, action: DiscussionAction) -> CliResult {
    let db = ctx.open_db()?;
    let now = Utc::now();

    match action {
        DiscussionAction::List => {
            let discussions: Vec<_> = db
                .list_discussions()?
                .iter()
                .map(|d| summary(d, now))
                .collect();
            print_json(&discussions)
        }
        DiscussionAction::Show { id } => {
            db.record_view(&id)?;
            let discussion = db.discussion(&id)?;
            let comments: Vec<_> = db
                .list_comments(&id)?
                .into_iter()
                .map(|c| {
                    let ago = time_ago(c.created_at, now);
                    json!({ "comment": c, "ago": ago })
                })
                .collect();
            let mut out = summary(&discussion, now);
            out["content"] = json!(discussion.content);
            out["comments"] = json!(comments);
            print_json(&out)
        }
        DiscussionAction::Create { title, content } => {
            let uid = ctx.user()?;
            ctx.sign_in(&db)?;
            print_json(&db.create_discussion(uid, &title, &content, now)?)
        }
        DiscussionAction::Delete { id } => {
            db.delete_discussion(ctx.user()?, &id)?;
            println!("discussion deleted");
            Ok(())
        }
        DiscussionAction::Report { id, reason } => {
            let uid = ctx.user()?;
            print_json(&db.report_discussion(uid, &id, reason.as_deref(), now)?)
        }
    }
}

fn summary(d: &Discussion, now: chrono::DateTime<Utc>) -> Value {
    json!({
        "id": d.id,
        "title": d.title,
        "author_username": d.author_username,
        "comment_count": d.comment_count,
        "views": d.views,
        "created_at": d.created_at,
        "ago": time_ago(d.created_at, now),
    })
}
