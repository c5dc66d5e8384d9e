use serde_json::json;

use super::{print_json, CliResult, Context};

pub fn run(ctx: &Context) -> CliResult {
    let db = ctx.open_db()?;
    let profile = ctx.sign_in(&db)?;
    let view = profile.view();

    print_json(&json!({
        "points": view.profile.engagement.points,
        "level": view.level,
        "permission_tier": view.permission_tier,
        "unlocked_features": view.unlocked_features,
        "next_unlock": civicpulse_core::next_unlock(view.profile.engagement.points),
        "message": view.next_unlock,
    }))
}
