use chrono::Utc;
use clap::Subcommand;

use super::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Create the profile for the acting identity if it does not exist
    Init {
        /// Contact email stored on first creation
        #[arg(long, default_value = "")]
        email: String,
    },
    /// Show the profile with level, tier and unlocks
    Show,
    /// Change the display name
    Rename {
        /// New display name
        username: String,
    },
    /// Change the bio (empty clears it)
    Bio {
        /// New bio text
        text: String,
    },
    /// Change display name and bio together
    Edit {
        #[arg(long)]
        username: String,
        #[arg(long, default_value = "")]
        bio: String,
    },
}

pub fn run(ctx: &Context, action: ProfileAction) -> CliResult {
    let db = ctx.open_db()?;
    let uid = ctx.user()?;

    let profile = match action {
        ProfileAction::Init { email } => db.create_profile_if_missing(uid, &email, Utc::now())?,
        ProfileAction::Show => db.profile(uid)?,
        ProfileAction::Rename { username } => db.update_username(uid, &username)?,
        ProfileAction::Bio { text } => db.update_bio(uid, &text)?,
        ProfileAction::Edit { username, bio } => db.update_profile(uid, &username, &bio)?,
    };
    print_json(&profile.view())
}
