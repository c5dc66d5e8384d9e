use chrono::Utc;
use civicpulse_core::{Database, Poll};
use clap::Subcommand;
use serde_json::{json, Value};

use super::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum PollAction {
    /// List polls with current tallies
    List,
    /// Vote in a poll (once per identity)
    Vote {
        /// Poll ID (e.g. "poll1")
        poll_id: String,
        /// Option ID
        option_id: String,
    },
}

pub fn run(ctx: &Context, action: PollAction) -> CliResult {
    let catalog = ctx.catalog()?;
    let db = ctx.open_db()?;

    match action {
        PollAction::List => {
            let mut polls = Vec::with_capacity(catalog.polls.len());
            for poll in &catalog.polls {
                let voted = match ctx.user() {
                    Ok(uid) => db.voted_option(uid, &poll.id)?,
                    Err(_) => None,
                };
                polls.push(tally_json(&db, poll, voted)?);
            }
            print_json(&polls)
        }
        PollAction::Vote { poll_id, option_id } => {
            let poll = catalog.find_poll(&poll_id)?;
            let uid = ctx.user()?;
            ctx.sign_in(&db)?;

            let profile = db.apply_poll_vote(uid, poll, &option_id, Utc::now())?;
            print_json(&json!({
                "poll": tally_json(&db, poll, Some(option_id))?,
                "profile": profile.view(),
            }))
        }
    }
}

fn tally_json(db: &Database, poll: &Poll, voted: Option<String>) -> CliResult<Value> {
    let tallied = db.poll_tally(poll)?;
    let options: Vec<_> = tallied
        .options
        .iter()
        .map(|o| {
            json!({
                "id": o.id,
                "text": o.text,
                "votes": o.votes,
                "percent": tallied.percent(&o.id),
            })
        })
        .collect();
    Ok(json!({
        "id": tallied.id,
        "question": tallied.question,
        "total_votes": tallied.total_votes(),
        "voted_option": voted,
        "options": options,
    }))
}
