use civicpulse_core::{choose_pulse, PermissionTier};

use super::{print_json, CliResult, Context};

pub fn run(ctx: &Context) -> CliResult {
    let catalog = ctx.catalog()?;
    // Anonymous callers see what a brand-new member would.
    let tier = match ctx.user() {
        Ok(_) => {
            let db = ctx.open_db()?;
            ctx.sign_in(&db)?.permission_tier()
        }
        Err(_) => PermissionTier::Locked,
    };

    let mut selector = ctx.config.pulse.selector();
    let pulse = choose_pulse(&catalog, tier, selector.as_mut());
    print_json(&pulse)
}
