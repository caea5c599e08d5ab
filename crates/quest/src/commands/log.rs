//! `quest log` -- the activity log, newest first.

use anyhow::{Context, Result, bail};

use quest_engine::activity;

use crate::cli::LogArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, short_time};
use crate::styles::{render_muted, render_xp};

/// Execute the `quest log` command.
pub fn run(ctx: &RuntimeContext, args: &LogArgs) -> Result<()> {
    if args.limit <= 0 {
        bail!("--limit must be positive (got {})", args.limit);
    }
    let store = ctx.open_store()?;

    let entries = activity::recent(&store, args.user, args.limit)
        .with_context(|| format!("failed to load activity for user {}", args.user))?;

    if ctx.json {
        output_json(&entries);
        return Ok(());
    }
    if entries.is_empty() {
        if !ctx.quiet {
            println!("No activity recorded yet.");
        }
        return Ok(());
    }

    for entry in &entries {
        let xp = if entry.xp_change == 0 {
            String::new()
        } else {
            format!(" {}", render_xp(entry.xp_change))
        };
        println!(
            "{}  {:<18} {}{}",
            render_muted(&short_time(&entry.created_at)),
            entry.activity_type,
            entry.description,
            xp
        );
    }
    Ok(())
}
