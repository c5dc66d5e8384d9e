use chrono::Utc;
use clap::Subcommand;

use super::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum CommentAction {
    /// Comment on a discussion (requires the comment tier)
    Add {
        /// Discussion ID
        discussion_id: String,
        /// Comment text
        text: String,
    },
    /// List comments on a discussion, oldest first
    List {
        /// Discussion ID
        discussion_id: String,
    },
}

pub fn run(ctx: &Context, action: CommentAction) -> CliResult {
    let db = ctx.open_db()?;

    match action {
        CommentAction::Add { discussion_id, text } => {
            let uid = ctx.user()?;
            ctx.sign_in(&db)?;
            print_json(&db.add_comment(uid, &discussion_id, &text, Utc::now())?)
        }
        CommentAction::List { discussion_id } => print_json(&db.list_comments(&discussion_id)?),
    }
}
